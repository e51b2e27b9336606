use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::commands::{extract, inventory};
use crate::model::BulletinInventoryManifest;
use crate::util::read_json;

pub fn run(args: StatusArgs) -> Result<()> {
    let inventory_path = inventory::default_manifest_path(&args.cache_root);
    let db_path = args
        .db_path
        .unwrap_or_else(|| extract::default_db_path(&args.cache_root));

    info!(cache_root = %args.cache_root.display(), "status requested");

    if inventory_path.exists() {
        let inventory: BulletinInventoryManifest = read_json(&inventory_path)?;
        let undated = inventory
            .bulletins
            .iter()
            .filter(|entry| entry.filename_date.is_none())
            .count();

        info!(
            generated_at = %inventory.generated_at,
            bulletin_count = inventory.bulletin_count,
            undated_filenames = undated,
            "loaded inventory manifest"
        );
    } else {
        warn!(path = %inventory_path.display(), "inventory manifest missing");
    }

    if db_path.exists() {
        let conn = Connection::open(&db_path)
            .with_context(|| format!("failed to open {}", db_path.display()))?;
        let bulletins = query_count(&conn, "SELECT COUNT(*) FROM bulletin_runs").unwrap_or(0);
        let records = query_count(&conn, "SELECT COUNT(*) FROM case_records").unwrap_or(0);
        let latest = conn
            .query_row(
                "SELECT MAX(publication_date) FROM bulletin_runs",
                [],
                |row| row.get::<_, Option<String>>(0),
            )
            .ok()
            .flatten()
            .unwrap_or_default();

        info!(
            path = %db_path.display(),
            bulletins,
            records,
            latest_publication_date = %latest,
            "database status"
        );
    } else {
        warn!(path = %db_path.display(), "database file missing");
    }

    Ok(())
}

fn query_count(conn: &Connection, sql: &str) -> Result<i64> {
    let count = conn.query_row(sql, [], |row| row.get(0))?;
    Ok(count)
}
