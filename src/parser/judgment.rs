use anyhow::{Context, Result};
use regex::Regex;
use tracing::debug;

use super::boundary::{CaseSpan, SEPARATOR_PATTERN};
use super::defendants::DefendantSplitter;
use super::filings::EXPEDIENTE_PATTERN;
use super::headers::HeaderStripper;
use super::normalize::collapse_whitespace;

/// Complete judgment-type markers. The optional leading token is a garbled
/// chamber code ("3S.", "1a.") that belongs to neither party.
pub const JUDGMENT_TYPE_PATTERN: &str = concat!(
    r"(?i)(?:\b[a-z]{0,3}\d{1,2}[a-z]{0,3}\.?\s+)?",
    r"(?P<kind>",
    r"Controv(?:ersia|\.)?\s*(?:de\s+)?Arrend(?:amiento\b|\.)",
    r"|Especial\s+de\s+Arrendamiento(?:\s+Oral\b)?",
    r"|Ejec(?:utivo|\.)?\s*Merc(?:antil\b|\.)",
    r"|\b(?:[a-z]{2,20}\.\s*){1,4}Arrend(?:amiento\b|\.)",
    r")"
);

/// Last resort: the keyword alone, but only in a complete word form. A
/// truncated "Arrend" with nothing around it is never accepted.
const BARE_JUDGMENT_TYPE_PATTERN: &str = r"(?i)\bArrendamiento\b|\bArrend\.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseSplit {
    pub plaintiff: Option<String>,
    pub judgment_type: String,
    pub defendants: Vec<String>,
    /// Absolute offsets of the whole judgment-type match.
    pub type_start: usize,
    pub type_end: usize,
    pub fallback_type: bool,
    pub guard_divergences: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SplitOutcome {
    Matched(CaseSplit),
    NoJudgmentType,
    /// The type marker sits after the first filing or behind a stray "vs.".
    Contaminated,
}

#[derive(Debug, Clone, Copy)]
struct TypeMatch {
    start: usize,
    end: usize,
    kind_start: usize,
    kind_end: usize,
    fallback: bool,
}

#[derive(Debug)]
pub struct CaseSplitter {
    judgment_type: Regex,
    bare_judgment_type: Regex,
    expediente: Regex,
    separator: Regex,
    headers: HeaderStripper,
    defendants: DefendantSplitter,
}

impl CaseSplitter {
    pub fn new() -> Result<Self> {
        Ok(Self {
            judgment_type: Regex::new(JUDGMENT_TYPE_PATTERN)
                .context("failed to compile judgment type regex")?,
            bare_judgment_type: Regex::new(BARE_JUDGMENT_TYPE_PATTERN)
                .context("failed to compile bare judgment type regex")?,
            expediente: Regex::new(EXPEDIENTE_PATTERN)
                .context("failed to compile expediente regex")?,
            separator: Regex::new(SEPARATOR_PATTERN).context("failed to compile vs. regex")?,
            headers: HeaderStripper::new()?,
            defendants: DefendantSplitter::new()?,
        })
    }

    pub fn defendants(&self) -> &DefendantSplitter {
        &self.defendants
    }

    pub fn split_case(&self, text: &str, span: &CaseSpan) -> SplitOutcome {
        let region = &text[span.separator_end..span.end];
        let first_filing = self.expediente.find(region).map(|found| found.start());

        let Some(type_match) = self.find_type(region) else {
            return SplitOutcome::NoJudgmentType;
        };

        if first_filing.is_some_and(|filing_start| type_match.start >= filing_start) {
            debug!(
                position = span.separator_start,
                "judgment type follows the first filing, skipping case"
            );
            return SplitOutcome::Contaminated;
        }

        let defendant_span = &region[..type_match.start];
        if self.separator.is_match(defendant_span) {
            debug!(
                position = span.separator_start,
                "stray vs. between separator and judgment type, skipping case"
            );
            return SplitOutcome::Contaminated;
        }

        let defendants = self.defendants.split(defendant_span);
        let plaintiff = self
            .headers
            .strip(&text[span.start..span.separator_start]);

        SplitOutcome::Matched(CaseSplit {
            plaintiff,
            judgment_type: collapse_whitespace(
                &region[type_match.kind_start..type_match.kind_end],
            ),
            defendants: defendants.names,
            type_start: span.separator_end + type_match.start,
            type_end: span.separator_end + type_match.end,
            fallback_type: type_match.fallback,
            guard_divergences: defendants.guard_divergences,
        })
    }

    fn find_type(&self, region: &str) -> Option<TypeMatch> {
        if let Some(captures) = self.judgment_type.captures(region) {
            let whole = captures.get(0)?;
            let kind = captures.name("kind")?;
            return Some(TypeMatch {
                start: whole.start(),
                end: whole.end(),
                kind_start: kind.start(),
                kind_end: kind.end(),
                fallback: false,
            });
        }

        let bare = self.bare_judgment_type.find(region)?;
        Some(TypeMatch {
            start: bare.start(),
            end: bare.end(),
            kind_start: bare.start(),
            kind_end: bare.end(),
            fallback: true,
        })
    }
}
