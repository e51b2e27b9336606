use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "boletin",
    version,
    about = "Lease-case extraction from OCR'd civil court bulletins"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Inventory(InventoryArgs),
    Extract(ExtractArgs),
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct InventoryArgs {
    #[arg(long, env = "BOLETIN_CACHE_ROOT", default_value = ".cache/boletin")]
    pub cache_root: PathBuf,

    /// Directory holding the bulletin transcripts; defaults to `<cache-root>/bulletins`.
    #[arg(long)]
    pub input_dir: Option<PathBuf>,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ExtractArgs {
    #[arg(long, env = "BOLETIN_CACHE_ROOT", default_value = ".cache/boletin")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub input_dir: Option<PathBuf>,

    #[arg(long)]
    pub inventory_manifest_path: Option<PathBuf>,

    #[arg(long)]
    pub extract_manifest_path: Option<PathBuf>,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = TranscriptMode::Auto)]
    pub mode: TranscriptMode,

    /// Re-process bulletins already recorded as completed.
    #[arg(long, default_value_t = false)]
    pub force: bool,

    #[arg(long, default_value_t = false)]
    pub refresh_inventory: bool,

    /// Used when the cover page does not yield a bulletin number.
    #[arg(long)]
    pub bulletin_number: Option<u32>,

    /// Write the normalized text of each processed bulletin for review.
    #[arg(long, default_value_t = false)]
    pub dump_normalized: bool,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum TranscriptMode {
    Auto,
    Pages,
    Document,
}

impl TranscriptMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Pages => "pages",
            Self::Document => "document",
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, env = "BOLETIN_CACHE_ROOT", default_value = ".cache/boletin")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,
}
