use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};

use super::DB_SCHEMA_VERSION;
use crate::parser::CaseRecord;
use crate::util::now_utc_string;

pub(super) fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    Ok(())
}

pub(super) fn ensure_schema(connection: &Connection) -> Result<()> {
    connection
        .execute_batch(
            "
        CREATE TABLE IF NOT EXISTS metadata (
          key TEXT PRIMARY KEY,
          value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS bulletin_runs (
          source TEXT PRIMARY KEY,
          run_id TEXT NOT NULL,
          sha256 TEXT NOT NULL,
          publication_date TEXT NOT NULL,
          bulletin_number INTEGER,
          status TEXT NOT NULL,
          total_pages INTEGER NOT NULL,
          total_records INTEGER NOT NULL,
          processed_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS case_records (
          record_id INTEGER PRIMARY KEY AUTOINCREMENT,
          source TEXT NOT NULL,
          expediente_id TEXT NOT NULL,
          plaintiff TEXT,
          defendant TEXT,
          judgment_type TEXT NOT NULL,
          status TEXT,
          status_count INTEGER,
          chamber TEXT,
          publication_date TEXT NOT NULL,
          bulletin_number INTEGER,
          page_number INTEGER,
          defendant_ordinal_label TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_case_records_source ON case_records(source);
        CREATE INDEX IF NOT EXISTS idx_case_records_expediente ON case_records(expediente_id);
        CREATE INDEX IF NOT EXISTS idx_case_records_date ON case_records(publication_date);
        ",
        )
        .context("failed to initialize extract schema")?;

    let now = now_utc_string();
    connection.execute(
        "INSERT INTO metadata(key, value) VALUES('db_schema_version', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        [DB_SCHEMA_VERSION],
    )?;
    connection.execute(
        "INSERT INTO metadata(key, value) VALUES('db_updated_at', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        [now],
    )?;

    Ok(())
}

#[derive(Debug, Clone)]
pub(super) struct BulletinRun<'a> {
    pub source: &'a str,
    pub run_id: &'a str,
    pub sha256: &'a str,
    pub publication_date: &'a str,
    pub bulletin_number: Option<u32>,
    pub total_pages: u32,
}

/// True when this exact transcript content already finished a run.
pub(super) fn completed_run_exists(
    connection: &Connection,
    source: &str,
    sha256: &str,
) -> Result<bool> {
    let found = connection
        .query_row(
            "SELECT 1 FROM bulletin_runs WHERE source = ?1 AND sha256 = ?2 AND status = 'completed'",
            params![source, sha256],
            |row| row.get::<_, i64>(0),
        )
        .optional()
        .with_context(|| format!("failed to look up processed bulletin {source}"))?;
    Ok(found.is_some())
}

/// Replaces every stored record of `run.source` in one transaction and marks
/// the bulletin completed.
pub(super) fn replace_bulletin(
    connection: &mut Connection,
    run: &BulletinRun<'_>,
    records: &[CaseRecord],
) -> Result<usize> {
    let tx = connection.transaction()?;

    tx.execute(
        "DELETE FROM case_records WHERE source = ?1",
        params![run.source],
    )
    .with_context(|| format!("failed to clear records of {}", run.source))?;

    {
        let mut statement = tx.prepare(
            "
            INSERT INTO case_records(
              source, expediente_id, plaintiff, defendant, judgment_type, status,
              status_count, chamber, publication_date, bulletin_number, page_number,
              defendant_ordinal_label
            )
            VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            ",
        )?;

        for record in records {
            statement.execute(params![
                run.source,
                &record.expediente_id,
                &record.plaintiff,
                &record.defendant,
                &record.judgment_type,
                record.status.map(|status| status.as_str()),
                record.status_count,
                &record.chamber,
                &record.publication_date,
                record.bulletin_number,
                record.page_number,
                &record.defendant_ordinal_label,
            ])?;
        }
    }

    tx.execute(
        "
        INSERT INTO bulletin_runs(
          source, run_id, sha256, publication_date, bulletin_number, status,
          total_pages, total_records, processed_at
        )
        VALUES(?1, ?2, ?3, ?4, ?5, 'completed', ?6, ?7, ?8)
        ON CONFLICT(source) DO UPDATE SET
          run_id=excluded.run_id,
          sha256=excluded.sha256,
          publication_date=excluded.publication_date,
          bulletin_number=excluded.bulletin_number,
          status=excluded.status,
          total_pages=excluded.total_pages,
          total_records=excluded.total_records,
          processed_at=excluded.processed_at
        ",
        params![
            run.source,
            run.run_id,
            run.sha256,
            run.publication_date,
            run.bulletin_number,
            run.total_pages,
            i64::try_from(records.len()).unwrap_or(i64::MAX),
            now_utc_string(),
        ],
    )
    .with_context(|| format!("failed to record run of {}", run.source))?;

    tx.commit()?;
    Ok(records.len())
}

pub(super) fn count_rows(connection: &Connection, sql: &str) -> Result<i64> {
    let count = connection
        .query_row(sql, [], |row| row.get(0))
        .with_context(|| format!("failed to count rows: {sql}"))?;
    Ok(count)
}
