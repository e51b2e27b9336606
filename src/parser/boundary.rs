use anyhow::{Context, Result};
use regex::Regex;

use super::filings::STATUS_PATTERN;
use super::judgment::JUDGMENT_TYPE_PATTERN;
use super::normalize::floor_char_boundary;

pub const SEPARATOR_PATTERN: &str = r"(?i)\bvs\b\.?";

/// Closes the previous case: an abbreviated status marker with optional
/// count, or an explicit "No Publicado". The long form "acuerdos" also
/// appears in page headers and is not a terminator.
const TERMINATOR_PATTERN: &str = r"(?i)(?:\b\d{1,3}\s*)?\b(?:acdos?|sent(?:encias?)?)\b\.?|\bno\s+publicad[oa]s?\b\.?";

const MIN_LOOKBACK: usize = 1_600;
const MAX_LOOKBACK: usize = 8_000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BoundaryMode {
    /// A case runs until the next separator.
    #[default]
    NextSeparator,
    /// A case ends at the line holding the first status marker after its
    /// judgment type, for densely packed extracted PDF text.
    StatusLine,
}

/// Byte offsets into the normalized text for one "actor vs. demandado" case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaseSpan {
    pub start: usize,
    pub separator_start: usize,
    pub separator_end: usize,
    pub end: usize,
}

#[derive(Debug)]
pub struct CaseLocator {
    separator: Regex,
    terminator: Regex,
    judgment_type: Regex,
    status: Regex,
}

impl CaseLocator {
    pub fn new() -> Result<Self> {
        Ok(Self {
            separator: Regex::new(SEPARATOR_PATTERN).context("failed to compile vs. regex")?,
            terminator: Regex::new(TERMINATOR_PATTERN)
                .context("failed to compile case terminator regex")?,
            judgment_type: Regex::new(JUDGMENT_TYPE_PATTERN)
                .context("failed to compile judgment type regex")?,
            status: Regex::new(STATUS_PATTERN).context("failed to compile status regex")?,
        })
    }

    pub fn locate_cases(&self, text: &str, mode: BoundaryMode) -> Vec<CaseSpan> {
        let separators = self
            .separator
            .find_iter(text)
            .map(|found| (found.start(), found.end()))
            .collect::<Vec<(usize, usize)>>();
        if separators.is_empty() {
            return Vec::new();
        }

        let lookback = lookback_window(text.len(), separators.len());
        let mut spans = Vec::with_capacity(separators.len());

        for (index, &(separator_start, separator_end)) in separators.iter().enumerate() {
            let mut start = self.case_start(text, separator_start, lookback);

            if let Some(&(_, previous_end)) = separators[..index]
                .iter()
                .rev()
                .find(|(previous_start, _)| *previous_start >= start)
            {
                start = match text[previous_end..separator_start].find('\n') {
                    Some(offset) => previous_end + offset + 1,
                    None => previous_end,
                };
            }
            start = skip_whitespace(text, start, separator_start);

            let next_separator = separators
                .get(index + 1)
                .map(|(next_start, _)| *next_start)
                .unwrap_or(text.len());
            let end = match mode {
                BoundaryMode::NextSeparator => next_separator,
                BoundaryMode::StatusLine => self
                    .status_line_end(text, separator_end)
                    .map(|line_end| line_end.min(next_separator))
                    .unwrap_or(next_separator),
            };

            spans.push(CaseSpan {
                start,
                separator_start,
                separator_end,
                end,
            });
        }

        // The next case's plaintiff lines do not belong to this case.
        for index in 1..spans.len() {
            let next_start = spans[index].start;
            let current = &mut spans[index - 1];
            if next_start > current.separator_end && next_start < current.end {
                current.end = next_start;
            }
        }

        spans
    }

    fn case_start(&self, text: &str, separator_start: usize, lookback: usize) -> usize {
        let window_start = floor_char_boundary(text, separator_start.saturating_sub(lookback));
        let window = &text[window_start..separator_start];

        if let Some(terminator) = self.terminator.find_iter(window).last() {
            return window_start + terminator.end();
        }

        // Newlines directly in front of the separator would leave an empty
        // plaintiff, so only look before the last non-blank character.
        let content = window.trim_end();
        if let Some(offset) = content.rfind("\n\n") {
            return window_start + offset + 2;
        }
        if let Some(offset) = content.rfind('\n') {
            return window_start + offset + 1;
        }
        window_start
    }

    fn status_line_end(&self, text: &str, from: usize) -> Option<usize> {
        let judgment = self.judgment_type.find_at(text, from)?;
        let status = self.status.find_at(text, judgment.end())?;
        Some(
            text[status.end()..]
                .find('\n')
                .map(|offset| status.end() + offset)
                .unwrap_or(text.len()),
        )
    }
}

fn lookback_window(text_len: usize, separator_count: usize) -> usize {
    let average_gap = text_len / separator_count.max(1);
    average_gap
        .saturating_mul(4)
        .clamp(MIN_LOOKBACK, MAX_LOOKBACK)
}

fn skip_whitespace(text: &str, start: usize, limit: usize) -> usize {
    let region = &text[start..limit];
    start + (region.len() - region.trim_start().len())
}
