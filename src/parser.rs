mod boundary;
mod chamber;
mod cover;
mod defendants;
mod filings;
mod headers;
mod judgment;
mod normalize;
mod pages;
mod record;

#[cfg(test)]
mod tests;

use anyhow::Result;
use serde::Serialize;
use tracing::debug;

use boundary::{BoundaryMode, CaseLocator};
use chamber::ChamberTracker;
use cover::CoverParser;
use filings::{FilingExtractor, StatusPolicy};
use judgment::{CaseSplitter, SplitOutcome};
use pages::{PageMap, PageSplitter};
use record::{CaseMeta, assemble};

pub use chamber::ParserState;
pub use cover::CoverInfo;
pub use pages::split_form_feed_pages;
pub use record::{BulletinContext, CaseRecord, CaseStatus, SeenRecords};

/// How the transcript was produced, which decides how cases are bounded and
/// which status marker a filing takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestionMode {
    /// One OCR'd page image at a time.
    PageImage,
    /// Extracted PDF text for the whole bulletin with `PAGINA i/n` markers.
    DocumentText,
}

impl IngestionMode {
    fn boundary_mode(self) -> BoundaryMode {
        match self {
            Self::PageImage => BoundaryMode::NextSeparator,
            Self::DocumentText => BoundaryMode::StatusLine,
        }
    }

    fn status_policy(self) -> StatusPolicy {
        match self {
            Self::PageImage => StatusPolicy::NearestFollowing,
            Self::DocumentText => StatusPolicy::LastInCase,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ParseStats {
    pub cases_located: usize,
    pub skipped_without_type: usize,
    pub skipped_contaminated: usize,
    pub skipped_without_filing: usize,
    pub fallback_types: usize,
    pub guard_divergences: usize,
    pub duplicates_suppressed: usize,
}

impl ParseStats {
    pub fn absorb(&mut self, other: &ParseStats) {
        self.cases_located += other.cases_located;
        self.skipped_without_type += other.skipped_without_type;
        self.skipped_contaminated += other.skipped_contaminated;
        self.skipped_without_filing += other.skipped_without_filing;
        self.fallback_types += other.fallback_types;
        self.guard_divergences += other.guard_divergences;
        self.duplicates_suppressed += other.duplicates_suppressed;
    }
}

#[derive(Debug, Default)]
pub struct PageOutcome {
    pub records: Vec<CaseRecord>,
    pub stats: ParseStats,
}

#[derive(Debug, Default)]
pub struct DocumentOutcome {
    pub records: Vec<CaseRecord>,
    pub stats: ParseStats,
    pub total_pages: Option<u32>,
    pub running_header_lines_removed: usize,
    pub normalized_text: String,
}

#[derive(Debug)]
pub struct BulletinParser {
    normalizer: normalize::Normalizer,
    pages: PageSplitter,
    cover: CoverParser,
    chambers: ChamberTracker,
    locator: CaseLocator,
    splitter: CaseSplitter,
    filings: FilingExtractor,
}

impl BulletinParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            normalizer: normalize::Normalizer::new()?,
            pages: PageSplitter::new()?,
            cover: CoverParser::new()?,
            chambers: ChamberTracker::new()?,
            locator: CaseLocator::new()?,
            splitter: CaseSplitter::new()?,
            filings: FilingExtractor::new()?,
        })
    }

    pub fn normalize(&self, raw: &str) -> String {
        self.normalizer.normalize(raw)
    }

    pub fn parse_cover(&self, raw: &str) -> CoverInfo {
        self.cover.parse_cover(&self.normalize(raw))
    }

    pub fn has_page_markers(&self, raw: &str) -> bool {
        self.pages.has_markers(raw)
    }

    /// Largest marker total for marked documents, form-feed pages otherwise.
    pub fn page_count(&self, raw: &str) -> u32 {
        self.pages.marker_total(raw).unwrap_or_else(|| {
            u32::try_from(split_form_feed_pages(raw).len()).unwrap_or(u32::MAX)
        })
    }

    /// Parses one OCR page. The chamber carried in from earlier pages is
    /// read before this page's own mentions are applied to `state`.
    pub fn parse_page(
        &self,
        raw: &str,
        page_number: u32,
        bulletin: &BulletinContext,
        state: &mut ParserState,
        seen: &mut SeenRecords,
    ) -> PageOutcome {
        let text = self.normalize(raw);
        let carried = state.clone();

        let mut stats = ParseStats::default();
        let records = self.parse_block(
            &text,
            IngestionMode::PageImage,
            |_| Some(page_number),
            bulletin,
            &carried,
            seen,
            &mut stats,
        );

        self.chambers.update_chamber(&text, state);
        PageOutcome { records, stats }
    }

    /// Parses a whole marked document in one pass. Without page markers the
    /// text is treated as a single page 1.
    pub fn parse_document(
        &self,
        raw: &str,
        bulletin: &BulletinContext,
        state: &mut ParserState,
        seen: &mut SeenRecords,
    ) -> DocumentOutcome {
        let mut outcome = DocumentOutcome::default();
        let mut page_map = PageMap::default();

        match self.pages.split_marked_pages(raw) {
            Some(document) => {
                outcome.total_pages = document.total_pages;
                outcome.running_header_lines_removed = document.running_header_lines_removed;

                let mut joined = String::new();
                for page in &document.pages {
                    let text = self.normalize(&page.text);
                    if text.is_empty() {
                        continue;
                    }
                    if !joined.is_empty() {
                        joined.push_str("\n\n");
                    }
                    page_map.push(joined.len(), page.number);
                    joined.push_str(&text);
                }
                outcome.normalized_text = joined;
            }
            None => {
                page_map.push(0, 1);
                outcome.normalized_text = self.normalize(raw);
            }
        }

        let carried = state.clone();
        outcome.records = self.parse_block(
            &outcome.normalized_text,
            IngestionMode::DocumentText,
            |position| page_map.page_at(position),
            bulletin,
            &carried,
            seen,
            &mut outcome.stats,
        );

        self.chambers.update_chamber(&outcome.normalized_text, state);
        outcome
    }

    #[allow(clippy::too_many_arguments)]
    fn parse_block(
        &self,
        text: &str,
        mode: IngestionMode,
        page_at: impl Fn(usize) -> Option<u32>,
        bulletin: &BulletinContext,
        carried: &ParserState,
        seen: &mut SeenRecords,
        stats: &mut ParseStats,
    ) -> Vec<CaseRecord> {
        let mut records = Vec::new();

        for span in self.locator.locate_cases(text, mode.boundary_mode()) {
            stats.cases_located += 1;

            let split = match self.splitter.split_case(text, &span) {
                SplitOutcome::Matched(split) => split,
                SplitOutcome::NoJudgmentType => {
                    stats.skipped_without_type += 1;
                    continue;
                }
                SplitOutcome::Contaminated => {
                    stats.skipped_contaminated += 1;
                    continue;
                }
            };

            let filing_text = &text[split.type_end.min(span.end)..span.end];
            let filings = self
                .filings
                .extract_filings(filing_text, mode.status_policy());
            if filings.is_empty() {
                debug!(
                    position = span.separator_start,
                    judgment_type = %split.judgment_type,
                    "no case-file identifier after judgment type, skipping case"
                );
                stats.skipped_without_filing += 1;
                continue;
            }

            if split.fallback_type {
                stats.fallback_types += 1;
            }
            stats.guard_divergences += split.guard_divergences;

            let chamber = self.chambers.chamber_at(text, split.type_start, carried);
            let meta = CaseMeta {
                plaintiff: split.plaintiff.as_deref(),
                judgment_type: &split.judgment_type,
                chamber: chamber.as_deref(),
                page_number: page_at(split.type_start),
                bulletin,
            };
            let assembled = assemble(&meta, &split.defendants, &filings, seen);
            stats.duplicates_suppressed += assembled.duplicates;
            records.extend(assembled.records);
        }

        records
    }
}
