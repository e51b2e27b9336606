use std::collections::{HashMap, HashSet};

use anyhow::{Context, Result};
use regex::Regex;

/// "PAGINA 3/12" printed at the top of every page of an extracted PDF.
const PAGE_MARKER_PATTERN: &str = r"(?i)\bP[AÁ]GINA\s+(\d{1,4})\s*/\s*(\d{1,4})\b";

/// A line must repeat at the edge of at least this many pages to count as a
/// running header.
const RUNNING_HEADER_MIN_PAGES: usize = 3;
const RUNNING_HEADER_MAX_LEN: usize = 120;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkedPage {
    pub number: u32,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkedDocument {
    pub pages: Vec<MarkedPage>,
    pub total_pages: Option<u32>,
    pub running_header_lines_removed: usize,
}

/// Page number for any offset of a joined document.
#[derive(Debug, Clone, Default)]
pub struct PageMap {
    starts: Vec<(usize, u32)>,
}

impl PageMap {
    pub fn push(&mut self, offset: usize, page_number: u32) {
        self.starts.push((offset, page_number));
    }

    pub fn page_at(&self, position: usize) -> Option<u32> {
        self.starts
            .iter()
            .take_while(|(offset, _)| *offset <= position)
            .last()
            .map(|(_, page_number)| *page_number)
    }
}

#[derive(Debug)]
pub struct PageSplitter {
    marker: Regex,
}

impl PageSplitter {
    pub fn new() -> Result<Self> {
        Ok(Self {
            marker: Regex::new(PAGE_MARKER_PATTERN)
                .context("failed to compile page marker regex")?,
        })
    }

    pub fn has_markers(&self, raw: &str) -> bool {
        self.marker.is_match(raw)
    }

    /// Largest "of N" seen in the page markers.
    pub fn marker_total(&self, raw: &str) -> Option<u32> {
        self.marker
            .captures_iter(raw)
            .filter_map(|captures| captures.get(2)?.as_str().parse::<u32>().ok())
            .max()
    }

    /// Splits a document on its page markers. A marker opens its page;
    /// anything before the first marker belongs to page 1.
    pub fn split_marked_pages(&self, raw: &str) -> Option<MarkedDocument> {
        let markers = self
            .marker
            .captures_iter(raw)
            .filter_map(|captures| {
                let whole = captures.get(0)?;
                let number = captures.get(1)?.as_str().parse::<u32>().ok()?;
                let total = captures.get(2)?.as_str().parse::<u32>().ok()?;
                Some((whole.start(), whole.end(), number, total))
            })
            .collect::<Vec<_>>();
        if markers.is_empty() {
            return None;
        }

        let mut pages = Vec::with_capacity(markers.len());
        let preamble = raw[..markers[0].0].trim();

        for (index, &(_, marker_end, number, _)) in markers.iter().enumerate() {
            let body_end = markers
                .get(index + 1)
                .map(|(next_start, ..)| *next_start)
                .unwrap_or(raw.len());
            let body = &raw[marker_end..body_end];
            let text = if index == 0 && !preamble.is_empty() {
                format!("{preamble}\n{body}")
            } else {
                body.to_string()
            };
            pages.push(MarkedPage { number, text });
        }

        let total_pages = markers.iter().map(|(.., total)| *total).max();
        let mut document = MarkedDocument {
            pages,
            total_pages,
            running_header_lines_removed: 0,
        };
        document.running_header_lines_removed = strip_running_headers(&mut document.pages);
        Some(document)
    }
}

/// Form-feed separated OCR transcript; page numbers are 1-based positions.
pub fn split_form_feed_pages(raw: &str) -> Vec<&str> {
    raw.split('\u{000C}').collect()
}

/// Drops the first non-empty line of every page when that line repeats at
/// the top of enough pages.
pub fn strip_running_headers(pages: &mut [MarkedPage]) -> usize {
    let candidates = detect_repeated_first_lines(pages);
    if candidates.is_empty() {
        return 0;
    }

    let mut removed = 0usize;
    for page in pages.iter_mut() {
        let mut lines = page.text.lines().map(str::to_string).collect::<Vec<String>>();
        if let Some(index) = first_nonempty_line_index(&lines) {
            let candidate = normalize_edge_line(&lines[index]);
            if !candidate.is_empty() && candidates.contains(&candidate) {
                lines.remove(index);
                removed += 1;
                page.text = lines.join("\n");
            }
        }
    }

    removed
}

fn detect_repeated_first_lines(pages: &[MarkedPage]) -> HashSet<String> {
    let mut counts = HashMap::<String, usize>::new();
    for page in pages {
        let Some(candidate) = page.text.lines().map(str::trim).find(|line| !line.is_empty())
        else {
            continue;
        };

        let normalized = normalize_edge_line(candidate);
        if normalized.is_empty() || normalized.len() > RUNNING_HEADER_MAX_LEN {
            continue;
        }
        *counts.entry(normalized).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .filter_map(|(candidate, count)| {
            if count >= RUNNING_HEADER_MIN_PAGES {
                Some(candidate)
            } else {
                None
            }
        })
        .collect()
}

fn normalize_edge_line(input: &str) -> String {
    input
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ")
        .to_lowercase()
}

fn first_nonempty_line_index(lines: &[String]) -> Option<usize> {
    lines.iter().position(|line| !line.trim().is_empty())
}
