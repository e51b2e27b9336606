use serde::{Deserialize, Serialize};

use crate::parser::ParseStats;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulletinEntry {
    pub filename: String,
    /// `YYYY-MM-DD` found in the file name, if any.
    pub filename_date: Option<String>,
    pub sha256: String,
    pub page_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulletinInventoryManifest {
    pub manifest_version: u32,
    pub generated_at: String,
    pub source_directory: String,
    pub bulletin_count: usize,
    pub bulletins: Vec<BulletinEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtractPaths {
    pub cache_root: String,
    pub input_dir: String,
    pub manifest_dir: String,
    pub inventory_manifest_path: String,
    pub db_path: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ExtractCounts {
    pub bulletin_count: usize,
    pub processed_bulletin_count: usize,
    pub skipped_already_processed: usize,
    pub skipped_without_date: usize,
    pub pages_parsed: usize,
    pub records_inserted: usize,
    pub records_total: i64,
    pub parse: ParseStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct BulletinSummary {
    pub filename: String,
    pub sha256: String,
    pub mode: String,
    pub publication_date: String,
    pub bulletin_number: Option<u32>,
    pub total_pages: u32,
    pub first_content_page: u32,
    pub records: usize,
    pub running_header_lines_removed: usize,
    pub parse: ParseStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtractRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub db_schema_version: String,
    pub status: String,
    pub started_at: String,
    pub completed_at: String,
    pub command: String,
    pub mode: String,
    pub paths: ExtractPaths,
    pub counts: ExtractCounts,
    pub bulletins: Vec<BulletinSummary>,
    pub source_hashes: Vec<BulletinEntry>,
    pub warnings: Vec<String>,
}
