use anyhow::{Context, Result};
use regex::Regex;

use super::normalize::chars_before;

/// Optional ordinal, then "SALA CIVIL" with the usual OCR confusions in
/// "CIVIL" (I/1/l/|, dropped final L).
const CHAMBER_PATTERN: &str = r"(?i)\b(?:(?P<ordinal>PRIMERA|SEGUNDA|TERCERA|CUARTA|QUINTA|SEXTA|S[EÉ]PTIMA|OCTAVA|NOVENA|D[EÉ]CIMA)\s+)?SALA\s+C[I1L|]V[I1L|][L1I|]?\b";

/// Ordinal recovery only trusts header-style uppercase words; lowercase
/// "primera" is ordinary prose.
const ORDINAL_PATTERN: &str =
    r"\b(PRIMERA|SEGUNDA|TERCERA|CUARTA|QUINTA|SEXTA|S[EÉ]PTIMA|OCTAVA|NOVENA|D[EÉ]CIMA)\b";

const ORDINAL_LOOKBACK_CHARS: usize = 200;

pub const GENERIC_CHAMBER: &str = "SALA CIVIL";

/// State carried across the pages of one bulletin. Owned by the caller that
/// drives the page loop; pages must be applied in ascending order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParserState {
    pub last_known_chamber: Option<String>,
}

impl ParserState {
    pub fn holds_specific_chamber(&self) -> bool {
        self.last_known_chamber
            .as_deref()
            .map(is_specific_chamber)
            .unwrap_or(false)
    }

    fn observe(&mut self, chamber: &str) {
        if !is_specific_chamber(chamber) && self.holds_specific_chamber() {
            return;
        }
        self.last_known_chamber = Some(chamber.to_string());
    }
}

pub fn is_specific_chamber(chamber: &str) -> bool {
    chamber != GENERIC_CHAMBER
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChamberMention {
    pub position: usize,
    pub name: String,
}

#[derive(Debug)]
pub struct ChamberTracker {
    chamber: Regex,
    ordinal: Regex,
}

impl ChamberTracker {
    pub fn new() -> Result<Self> {
        Ok(Self {
            chamber: Regex::new(CHAMBER_PATTERN).context("failed to compile chamber regex")?,
            ordinal: Regex::new(ORDINAL_PATTERN)
                .context("failed to compile chamber ordinal regex")?,
        })
    }

    pub fn mentions(&self, text: &str) -> Vec<ChamberMention> {
        self.chamber
            .captures_iter(text)
            .filter_map(|captures| {
                let whole = captures.get(0)?;
                let name = match captures.name("ordinal") {
                    Some(ordinal) => specific_chamber_name(ordinal.as_str()),
                    None => self.recover_ordinal(text, whole.start()),
                };
                Some(ChamberMention {
                    position: whole.start(),
                    name,
                })
            })
            .collect()
    }

    fn recover_ordinal(&self, text: &str, position: usize) -> String {
        let window_start = chars_before(text, position, ORDINAL_LOOKBACK_CHARS);
        self.ordinal
            .find_iter(&text[window_start..position])
            .last()
            .map(|ordinal| specific_chamber_name(ordinal.as_str()))
            .unwrap_or_else(|| GENERIC_CHAMBER.to_string())
    }

    /// Applies every mention in `text`, in order, to the carried state.
    pub fn update_chamber(&self, text: &str, state: &mut ParserState) {
        for mention in self.mentions(text) {
            state.observe(&mention.name);
        }
    }

    /// Chamber in force at `position`: the carried state with every in-text
    /// mention up to that point applied.
    pub fn chamber_at(&self, text: &str, position: usize, state: &ParserState) -> Option<String> {
        let mut effective = state.clone();
        for mention in self
            .mentions(text)
            .into_iter()
            .take_while(|mention| mention.position <= position)
        {
            effective.observe(&mention.name);
        }
        effective.last_known_chamber
    }
}

/// Keeps the ordinal's accents as printed ("SÉPTIMA SALA CIVIL").
fn specific_chamber_name(ordinal: &str) -> String {
    format!("{} {}", ordinal.to_uppercase(), GENERIC_CHAMBER)
}
