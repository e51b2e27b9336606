use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use crate::cli::InventoryArgs;
use crate::model::{BulletinEntry, BulletinInventoryManifest};
use crate::parser::BulletinParser;
use crate::util::{date_from_filename, now_utc_string, read_transcript, sha256_file, write_json_pretty};

pub fn run(args: InventoryArgs) -> Result<()> {
    let input_dir = args
        .input_dir
        .unwrap_or_else(|| default_input_dir(&args.cache_root));
    let manifest = build_manifest(&input_dir)?;

    if args.dry_run {
        info!(
            bulletin_count = manifest.bulletin_count,
            source = %manifest.source_directory,
            "inventory dry-run complete"
        );
        return Ok(());
    }

    let manifest_path = args
        .manifest_path
        .unwrap_or_else(|| default_manifest_path(&args.cache_root));

    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote inventory manifest");
    info!(bulletin_count = manifest.bulletin_count, "inventory completed");

    Ok(())
}

pub fn default_input_dir(cache_root: &Path) -> PathBuf {
    cache_root.join("bulletins")
}

pub fn default_manifest_path(cache_root: &Path) -> PathBuf {
    cache_root.join("manifests").join("bulletin_inventory.json")
}

pub fn build_manifest(input_dir: &Path) -> Result<BulletinInventoryManifest> {
    let parser = BulletinParser::new()?;

    let mut paths = discover_transcripts(input_dir)?;
    paths.sort();

    if paths.is_empty() {
        bail!("no bulletin transcripts found in {}", input_dir.display());
    }

    let mut bulletins = Vec::with_capacity(paths.len());
    for path in paths {
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(ToOwned::to_owned)
            .with_context(|| format!("invalid UTF-8 filename: {}", path.display()))?;

        let filename_date = date_from_filename(&filename).map(|date| date.to_string());
        if filename_date.is_none() {
            warn!(file = %filename, "no YYYY-MM-DD date in file name");
        }

        let sha256 = sha256_file(&path)?;
        let page_count = parser.page_count(&read_transcript(&path)?);

        bulletins.push(BulletinEntry {
            filename,
            filename_date,
            sha256,
            page_count,
        });
    }

    bulletins.sort_by(|a, b| {
        a.filename_date
            .cmp(&b.filename_date)
            .then(a.filename.cmp(&b.filename))
    });

    Ok(BulletinInventoryManifest {
        manifest_version: 1,
        generated_at: now_utc_string(),
        source_directory: input_dir.display().to_string(),
        bulletin_count: bulletins.len(),
        bulletins,
    })
}

fn discover_transcripts(input_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut transcripts = Vec::new();

    let entries = fs::read_dir(input_dir)
        .with_context(|| format!("failed to read {}", input_dir.display()))?;

    for entry in entries {
        let entry =
            entry.with_context(|| format!("failed to read entry in {}", input_dir.display()))?;
        let path = entry.path();

        if !entry
            .file_type()
            .with_context(|| format!("failed to inspect file type: {}", path.display()))?
            .is_file()
        {
            continue;
        }

        let is_transcript = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("txt"))
            .unwrap_or(false);

        if is_transcript {
            transcripts.push(path);
        }
    }

    Ok(transcripts)
}
