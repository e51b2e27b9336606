use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use rusqlite::Connection;
use tracing::{info, warn};

use crate::cli::{ExtractArgs, TranscriptMode};
use crate::commands::inventory;
use crate::model::{
    BulletinEntry, BulletinInventoryManifest, BulletinSummary, ExtractCounts, ExtractPaths,
    ExtractRunManifest,
};
use crate::parser::{
    BulletinContext, BulletinParser, CaseRecord, ParseStats, ParserState, SeenRecords,
    split_form_feed_pages,
};
use crate::util::{
    ensure_directory, now_utc_string, read_json, read_transcript, utc_compact_string,
    write_json_pretty,
};

const DB_SCHEMA_VERSION: &str = "0.1.0";

mod db_setup;


use db_setup::{
    BulletinRun, completed_run_exists, configure_connection, count_rows, ensure_schema,
    replace_bulletin,
};

pub fn run(args: ExtractArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("run-{}", utc_compact_string(started_ts));

    let cache_root = args.cache_root.clone();
    let manifest_dir = cache_root.join("manifests");
    ensure_directory(&manifest_dir)?;

    let input_dir = args
        .input_dir
        .clone()
        .unwrap_or_else(|| inventory::default_input_dir(&cache_root));
    let inventory_manifest_path = args
        .inventory_manifest_path
        .clone()
        .unwrap_or_else(|| inventory::default_manifest_path(&cache_root));
    let extract_manifest_path = args.extract_manifest_path.clone().unwrap_or_else(|| {
        manifest_dir.join(format!(
            "extract_run_{}.json",
            utc_compact_string(started_ts)
        ))
    });
    let db_path = args
        .db_path
        .clone()
        .unwrap_or_else(|| default_db_path(&cache_root));

    info!(
        cache_root = %cache_root.display(),
        run_id = %run_id,
        mode = args.mode.as_str(),
        "starting extract"
    );

    let inventory =
        load_or_refresh_inventory(&input_dir, &inventory_manifest_path, args.refresh_inventory)?;

    let mut connection = Connection::open(&db_path)
        .with_context(|| format!("failed to open {}", db_path.display()))?;
    configure_connection(&connection)?;
    ensure_schema(&connection)?;

    let parser = BulletinParser::new()?;
    let mut counts = ExtractCounts {
        bulletin_count: inventory.bulletin_count,
        ..ExtractCounts::default()
    };
    let mut summaries = Vec::new();
    let mut warnings = Vec::new();

    for entry in &inventory.bulletins {
        if !args.force && completed_run_exists(&connection, &entry.filename, &entry.sha256)? {
            info!(bulletin = %entry.filename, "already processed, skipping");
            counts.skipped_already_processed += 1;
            continue;
        }

        let path = input_dir.join(&entry.filename);
        let raw = read_transcript(&path)?;

        let extraction = match extract_bulletin(
            &parser,
            &raw,
            entry,
            args.mode,
            args.bulletin_number,
        ) {
            BulletinOutcome::Extracted(extraction) => extraction,
            BulletinOutcome::MissingDate => {
                let message = format!(
                    "{}: no publication date on the cover page or in the file name",
                    entry.filename
                );
                warn!(bulletin = %entry.filename, "no publication date, skipping bulletin");
                warnings.push(message);
                counts.skipped_without_date += 1;
                continue;
            }
        };

        if args.dump_normalized {
            let dump_path = manifest_dir
                .join("normalized")
                .join(format!("{}.normalized.txt", entry.filename));
            if let Some(parent) = dump_path.parent() {
                ensure_directory(parent)?;
            }
            fs::write(&dump_path, &extraction.normalized_text)
                .with_context(|| format!("failed to write {}", dump_path.display()))?;
        }

        let summary = &extraction.summary;
        let run = BulletinRun {
            source: &entry.filename,
            run_id: &run_id,
            sha256: &entry.sha256,
            publication_date: &summary.publication_date,
            bulletin_number: summary.bulletin_number,
            total_pages: summary.total_pages,
        };
        let inserted = replace_bulletin(&mut connection, &run, &extraction.records)?;

        info!(
            bulletin = %entry.filename,
            publication_date = %summary.publication_date,
            mode = %summary.mode,
            records = inserted,
            cases = summary.parse.cases_located,
            "bulletin extracted"
        );

        counts.processed_bulletin_count += 1;
        counts.pages_parsed += extraction.pages_parsed;
        counts.records_inserted += inserted;
        counts.parse.absorb(&summary.parse);
        summaries.push(extraction.summary);
    }

    counts.records_total = count_rows(&connection, "SELECT COUNT(*) FROM case_records")?;

    let manifest = ExtractRunManifest {
        manifest_version: 1,
        run_id,
        db_schema_version: DB_SCHEMA_VERSION.to_string(),
        status: "completed".to_string(),
        started_at,
        completed_at: now_utc_string(),
        command: render_extract_command(&args),
        mode: args.mode.as_str().to_string(),
        paths: ExtractPaths {
            cache_root: cache_root.display().to_string(),
            input_dir: input_dir.display().to_string(),
            manifest_dir: manifest_dir.display().to_string(),
            inventory_manifest_path: inventory_manifest_path.display().to_string(),
            db_path: db_path.display().to_string(),
        },
        counts,
        bulletins: summaries,
        source_hashes: inventory.bulletins,
        warnings,
    };

    write_json_pretty(&extract_manifest_path, &manifest)?;

    info!(path = %extract_manifest_path.display(), "wrote extract run manifest");
    info!(
        processed = manifest.counts.processed_bulletin_count,
        records = manifest.counts.records_inserted,
        records_total = manifest.counts.records_total,
        "extract completed"
    );

    Ok(())
}

pub fn default_db_path(cache_root: &Path) -> std::path::PathBuf {
    cache_root.join("boletin.sqlite")
}

fn load_or_refresh_inventory(
    input_dir: &Path,
    inventory_manifest_path: &Path,
    refresh_inventory: bool,
) -> Result<BulletinInventoryManifest> {
    if refresh_inventory || !inventory_manifest_path.exists() {
        let manifest = inventory::build_manifest(input_dir)?;
        write_json_pretty(inventory_manifest_path, &manifest)?;
        info!(
            path = %inventory_manifest_path.display(),
            bulletin_count = manifest.bulletin_count,
            "refreshed inventory manifest"
        );
        return Ok(manifest);
    }

    let manifest: BulletinInventoryManifest = read_json(inventory_manifest_path)?;

    info!(
        path = %inventory_manifest_path.display(),
        bulletin_count = manifest.bulletin_count,
        "loaded existing inventory manifest"
    );

    Ok(manifest)
}

#[derive(Debug)]
struct BulletinExtraction {
    summary: BulletinSummary,
    records: Vec<CaseRecord>,
    pages_parsed: usize,
    normalized_text: String,
}

#[derive(Debug)]
enum BulletinOutcome {
    Extracted(BulletinExtraction),
    MissingDate,
}

#[derive(Debug, Default)]
struct ParsedBulletin {
    records: Vec<CaseRecord>,
    stats: ParseStats,
    pages_parsed: usize,
    total_pages: u32,
    first_content_page: u32,
    running_header_lines_removed: usize,
    normalized_text: String,
}

/// Runs one bulletin transcript through the parser with a fresh state.
fn extract_bulletin(
    parser: &BulletinParser,
    raw: &str,
    entry: &BulletinEntry,
    mode: TranscriptMode,
    fallback_bulletin_number: Option<u32>,
) -> BulletinOutcome {
    let mode = match mode {
        TranscriptMode::Auto if parser.has_page_markers(raw) => TranscriptMode::Document,
        TranscriptMode::Auto => TranscriptMode::Pages,
        explicit => explicit,
    };

    let pages = split_form_feed_pages(raw);
    let cover_text = match mode {
        TranscriptMode::Pages => pages.first().copied().unwrap_or_default(),
        _ => raw,
    };
    let cover = parser.parse_cover(cover_text);

    let filename_date = entry
        .filename_date
        .as_deref()
        .and_then(|value| NaiveDate::parse_from_str(value, "%Y-%m-%d").ok());
    let Some(publication_date) = cover.publication_date.or(filename_date) else {
        return BulletinOutcome::MissingDate;
    };

    let bulletin = BulletinContext {
        publication_date: publication_date.format("%Y-%m-%d").to_string(),
        bulletin_number: cover.bulletin_number.or(fallback_bulletin_number),
    };

    let parsed = match mode {
        TranscriptMode::Document => parse_marked_document(parser, raw, &bulletin),
        _ => parse_page_sequence(parser, &pages, cover.columns_start_page, &bulletin),
    };

    BulletinOutcome::Extracted(BulletinExtraction {
        summary: BulletinSummary {
            filename: entry.filename.clone(),
            sha256: entry.sha256.clone(),
            mode: mode.as_str().to_string(),
            publication_date: bulletin.publication_date.clone(),
            bulletin_number: bulletin.bulletin_number,
            total_pages: parsed.total_pages,
            first_content_page: parsed.first_content_page,
            records: parsed.records.len(),
            running_header_lines_removed: parsed.running_header_lines_removed,
            parse: parsed.stats,
        },
        records: parsed.records,
        pages_parsed: parsed.pages_parsed,
        normalized_text: parsed.normalized_text,
    })
}

fn parse_marked_document(
    parser: &BulletinParser,
    raw: &str,
    bulletin: &BulletinContext,
) -> ParsedBulletin {
    let mut state = ParserState::default();
    let mut seen = SeenRecords::default();
    let outcome = parser.parse_document(raw, bulletin, &mut state, &mut seen);
    let total_pages = outcome.total_pages.unwrap_or(1);

    ParsedBulletin {
        records: outcome.records,
        stats: outcome.stats,
        pages_parsed: usize::try_from(total_pages).unwrap_or(usize::MAX),
        total_pages,
        first_content_page: 1,
        running_header_lines_removed: outcome.running_header_lines_removed,
        normalized_text: outcome.normalized_text,
    }
}

/// Content pages in ascending order, threading one parser state.
fn parse_page_sequence(
    parser: &BulletinParser,
    pages: &[&str],
    columns_start_page: Option<u32>,
    bulletin: &BulletinContext,
) -> ParsedBulletin {
    let first_page = first_content_page(columns_start_page, pages.len());
    let mut state = ParserState::default();
    let mut seen = SeenRecords::default();
    let mut parsed = ParsedBulletin {
        total_pages: u32::try_from(pages.len()).unwrap_or(u32::MAX),
        first_content_page: u32::try_from(first_page).unwrap_or(u32::MAX),
        ..ParsedBulletin::default()
    };
    let mut normalized = Vec::new();

    for (index, page) in pages.iter().enumerate().skip(first_page - 1) {
        let page_number = u32::try_from(index + 1).unwrap_or(u32::MAX);
        let outcome = parser.parse_page(page, page_number, bulletin, &mut state, &mut seen);
        parsed.stats.absorb(&outcome.stats);
        parsed.records.extend(outcome.records);
        parsed.pages_parsed += 1;
        normalized.push(parser.normalize(page));
    }

    parsed.normalized_text = normalized.join("\n\u{000C}\n");
    parsed
}

/// 1-based first page holding chamber columns. Page 1 is the cover whenever
/// the transcript has more than one page.
fn first_content_page(columns_start_page: Option<u32>, page_count: usize) -> usize {
    let page_count = page_count.max(1);
    let default = if page_count > 1 { 2 } else { 1 };
    columns_start_page
        .and_then(|page| usize::try_from(page).ok())
        .unwrap_or(default)
        .clamp(1, page_count)
}

fn render_extract_command(args: &ExtractArgs) -> String {
    let mut command = vec![
        "boletin".to_string(),
        "extract".to_string(),
        "--cache-root".to_string(),
        args.cache_root.display().to_string(),
        "--mode".to_string(),
        args.mode.as_str().to_string(),
    ];

    if let Some(path) = &args.input_dir {
        command.push("--input-dir".to_string());
        command.push(path.display().to_string());
    }
    if let Some(path) = &args.inventory_manifest_path {
        command.push("--inventory-manifest-path".to_string());
        command.push(path.display().to_string());
    }
    if let Some(path) = &args.extract_manifest_path {
        command.push("--extract-manifest-path".to_string());
        command.push(path.display().to_string());
    }
    if let Some(path) = &args.db_path {
        command.push("--db-path".to_string());
        command.push(path.display().to_string());
    }
    if let Some(number) = args.bulletin_number {
        command.push("--bulletin-number".to_string());
        command.push(number.to_string());
    }
    if args.force {
        command.push("--force".to_string());
    }
    if args.refresh_inventory {
        command.push("--refresh-inventory".to_string());
    }
    if args.dump_normalized {
        command.push("--dump-normalized".to_string());
    }

    command.join(" ")
}
