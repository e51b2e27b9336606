use std::collections::HashSet;

use anyhow::{Context, Result};
use regex::{Captures, Regex};

use super::normalize::ceil_char_boundary;
use super::record::CaseStatus;

/// `T.[series] NUM/YEAR/SEQ`, `NUM/YEAR SEQ`, `NUM-YEAR-SEQ` or `NUM-YEAR`.
/// The period after "T" may be missing ("T Ap 12/2024/007").
/// Hyphenated years may have lost a digit to OCR ("203").
pub const EXPEDIENTE_PATTERN: &str = concat!(
    r"(?i)(?:\bT(?:\s*\.\s*|\s+)(?:(?P<series>[a-z]{1,4})\.?\s*)?)?",
    r"\b(?P<number>\d{1,6})",
    r"(?:",
    r"/(?P<slash_year>\d{4})(?:/\s?(?P<slash_seq>\d{1,3})|\s(?P<spaced_seq>\d{3}))?",
    r"|-(?P<dash_year>\d{3,4})(?:-(?P<dash_seq>\d{1,3}))?",
    r")\b"
);

/// "y 006" / ", 006" right after an identifier: same number and year.
const EXPEDIENTE_TAIL_PATTERN: &str = r"^\s*(?:,|\by\b|\be\b)\s*(?P<sequence>\d{3})\b";
const IDENTIFIER_CONTINUES_PATTERN: &str = r"^\s*[-/]\s*\d";
const STATUS_AHEAD_PATTERN: &str = r"(?i)^\s*(?:acdos?|acuerdos?|sent)";

pub const STATUS_PATTERN: &str =
    r"(?i)(?:\b(?P<count>\d{1,3})\s*)?\b(?P<kind>acdos?|acuerdos?|sent(?:encias?)?)\b\.?";

const TAIL_WINDOW: usize = 70;
const STATUS_WINDOW: usize = 200;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusPolicy {
    /// Nearest status after each identifier (or its tails).
    #[default]
    NearestFollowing,
    /// The last status anywhere in the case; cases sometimes restate counts.
    LastInCase,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filing {
    pub expediente_id: String,
    pub status: Option<CaseStatus>,
    pub status_count: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delimiter {
    Slash,
    Hyphen,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ExpedienteParts {
    series: Option<String>,
    number: String,
    year: String,
    sequence: Option<String>,
    delimiter: Delimiter,
}

impl ExpedienteParts {
    fn render(&self) -> String {
        let separator = match self.delimiter {
            Delimiter::Slash => '/',
            Delimiter::Hyphen => '-',
        };
        let mut rendered = String::from("T. ");
        if let Some(series) = &self.series {
            rendered.push_str(series);
            rendered.push(' ');
        }
        rendered.push_str(&self.number);
        rendered.push(separator);
        rendered.push_str(&self.year);
        if let Some(sequence) = &self.sequence {
            rendered.push(separator);
            rendered.push_str(sequence);
        }
        rendered
    }

    fn with_sequence(&self, sequence: &str) -> Self {
        Self {
            sequence: Some(pad_sequence(sequence)),
            ..self.clone()
        }
    }
}

#[derive(Debug)]
pub struct FilingExtractor {
    expediente: Regex,
    tail: Regex,
    identifier_continues: Regex,
    status_ahead: Regex,
    status: Regex,
}

impl FilingExtractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            expediente: Regex::new(EXPEDIENTE_PATTERN)
                .context("failed to compile expediente regex")?,
            tail: Regex::new(EXPEDIENTE_TAIL_PATTERN)
                .context("failed to compile expediente tail regex")?,
            identifier_continues: Regex::new(IDENTIFIER_CONTINUES_PATTERN)
                .context("failed to compile identifier continuation regex")?,
            status_ahead: Regex::new(STATUS_AHEAD_PATTERN)
                .context("failed to compile status lookahead regex")?,
            status: Regex::new(STATUS_PATTERN).context("failed to compile status regex")?,
        })
    }

    /// Filings cited in the text that follows a judgment-type marker, in
    /// document order, unique by identifier.
    pub fn extract_filings(&self, text: &str, policy: StatusPolicy) -> Vec<Filing> {
        let mut groups = Vec::<(Vec<String>, usize)>::new();

        for captures in self.expediente.captures_iter(text) {
            let Some(whole) = captures.get(0) else {
                continue;
            };
            let Some(parts) = parts_from(&captures) else {
                continue;
            };

            let mut ids = vec![parts.render()];
            let mut cursor = whole.end();
            while let Some(tail) = self.tail.captures(&text[cursor..]) {
                let (Some(tail_whole), Some(sequence)) = (tail.get(0), tail.name("sequence"))
                else {
                    break;
                };
                let after = cursor + tail_whole.end();
                if after - whole.end() > TAIL_WINDOW
                    || self.identifier_continues.is_match(&text[after..])
                    || self.status_ahead.is_match(&text[after..])
                {
                    break;
                }
                ids.push(parts.with_sequence(sequence.as_str()).render());
                cursor = after;
            }
            groups.push((ids, cursor));
        }

        // Only text after an identifier can hold its status; otherwise a
        // sequence such as "003 Acdo." would read as a count.
        let case_status = match (policy, groups.last()) {
            (StatusPolicy::LastInCase, Some((_, last_end))) => self
                .status
                .captures_iter(&text[*last_end..])
                .last()
                .map(|captures| status_from(&captures)),
            _ => None,
        };

        let mut filings = Vec::new();
        let mut seen = HashSet::<String>::new();
        for (ids, cursor) in groups {
            let (status, status_count) = match policy {
                StatusPolicy::LastInCase => case_status.unwrap_or((None, None)),
                StatusPolicy::NearestFollowing => {
                    let window_end = ceil_char_boundary(text, cursor + STATUS_WINDOW);
                    self.status
                        .captures(&text[cursor..window_end])
                        .map(|captures| status_from(&captures))
                        .unwrap_or((None, None))
                }
            };

            for expediente_id in ids {
                if seen.insert(expediente_id.clone()) {
                    filings.push(Filing {
                        expediente_id,
                        status,
                        status_count,
                    });
                }
            }
        }

        filings
    }
}

fn parts_from(captures: &Captures) -> Option<ExpedienteParts> {
    let number = captures.name("number")?.as_str().to_string();
    let series = captures.name("series").map(|series| series.as_str().to_string());

    if let Some(year) = captures.name("slash_year") {
        let sequence = captures
            .name("slash_seq")
            .or_else(|| captures.name("spaced_seq"))
            .map(|sequence| pad_sequence(sequence.as_str()));
        return Some(ExpedienteParts {
            series,
            number,
            year: year.as_str().to_string(),
            sequence,
            delimiter: Delimiter::Slash,
        });
    }

    let year = captures.name("dash_year")?;
    Some(ExpedienteParts {
        series,
        number,
        year: repair_year(year.as_str()),
        sequence: captures
            .name("dash_seq")
            .map(|sequence| pad_sequence(sequence.as_str())),
        delimiter: Delimiter::Hyphen,
    })
}

fn status_from(captures: &Captures) -> (Option<CaseStatus>, Option<u32>) {
    let kind = captures
        .name("kind")
        .map(|kind| kind.as_str().to_ascii_lowercase())
        .unwrap_or_default();
    if kind.starts_with("sent") {
        return (Some(CaseStatus::Sent), None);
    }

    let count = captures
        .name("count")
        .and_then(|count| count.as_str().parse::<u32>().ok());
    (Some(CaseStatus::Acdo), count)
}

/// "203" lost its third digit to OCR: re-insert it as "2023".
pub fn repair_year(raw: &str) -> String {
    if raw.len() == 3 && raw.starts_with("20") {
        format!("202{}", &raw[2..])
    } else {
        raw.to_string()
    }
}

pub fn pad_sequence(raw: &str) -> String {
    format!("{raw:0>3}")
}
