use anyhow::{Context, Result};
use regex::Regex;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// `<digits>[-/]<year>[-/]` at the end of a line, with the sequence number
/// pushed onto the following line by the OCR wrap.
const WRAPPED_EXPEDIENTE_PATTERN: &str = r"(\d+[-/]\d{3,4}[-/])\n{1,2}(\d{1,3})\b";
const EXCESS_NEWLINES_PATTERN: &str = r"\n{3,}";

#[derive(Debug)]
pub struct Normalizer {
    wrapped_expediente: Regex,
    excess_newlines: Regex,
}

impl Normalizer {
    pub fn new() -> Result<Self> {
        Ok(Self {
            wrapped_expediente: Regex::new(WRAPPED_EXPEDIENTE_PATTERN)
                .context("failed to compile wrapped expediente regex")?,
            excess_newlines: Regex::new(EXCESS_NEWLINES_PATTERN)
                .context("failed to compile excess newline regex")?,
        })
    }

    /// Canonical form consumed by every later stage. Total and idempotent.
    pub fn normalize(&self, raw: &str) -> String {
        let unified = raw.replace("\r\n", "\n").replace('\r', "\n");
        let composed = unified.nfc().map(replace_typographic_quote).collect::<String>();

        let lines = composed
            .split('\n')
            .map(|line| line.split_whitespace().collect::<Vec<&str>>().join(" "))
            .collect::<Vec<String>>();
        let joined = lines.join("\n");

        let collapsed = self.excess_newlines.replace_all(joined.trim(), "\n\n");
        self.repair_wrapped_expedientes(&collapsed)
    }

    fn repair_wrapped_expedientes(&self, text: &str) -> String {
        let mut current = text.to_string();
        // Each pass removes at least one newline, so this converges.
        loop {
            let next = self
                .wrapped_expediente
                .replace_all(&current, "${1}${2}")
                .into_owned();
            if next == current {
                return current;
            }
            current = next;
        }
    }
}

fn replace_typographic_quote(character: char) -> char {
    match character {
        '\u{201C}' | '\u{201D}' | '\u{201E}' => '"',
        '\u{2018}' | '\u{2019}' | '\u{00B4}' => '\'',
        other => other,
    }
}

/// Accent-stripped lowercase view for keyword lookups. Never used for output
/// and never indexed with positions from the primary text.
pub fn fold(text: &str) -> String {
    text.nfd()
        .filter(|character| !is_combining_mark(*character))
        .flat_map(char::to_lowercase)
        .collect()
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<&str>>().join(" ")
}

/// Trims list punctuation around a party name. A trailing period survives
/// when it closes an abbreviation ("S.A. de C.V.", "Lic.").
pub fn clean_name(raw: &str) -> String {
    let mut value = collapse_whitespace(raw);

    loop {
        let trimmed = value
            .trim_matches(|character: char| {
                character.is_whitespace() || matches!(character, ',' | ';' | ':' | '-' | '|')
            })
            .trim_start_matches('.')
            .trim_start()
            .to_string();
        let trimmed = strip_trailing_period(&trimmed);

        if trimmed == value {
            return value;
        }
        value = trimmed;
    }
}

fn strip_trailing_period(value: &str) -> String {
    let Some(stem) = value.strip_suffix('.') else {
        return value.to_string();
    };

    let stem_trimmed = stem.trim_end();
    if stem_trimmed.len() != stem.len() || stem_trimmed.ends_with('.') {
        return stem_trimmed.trim_end_matches('.').trim_end().to_string();
    }

    let last_token = stem_trimmed.rsplit(' ').next().unwrap_or(stem_trimmed);
    if last_token.contains('.') || last_token.chars().count() <= 3 {
        value.to_string()
    } else {
        stem_trimmed.to_string()
    }
}

pub fn floor_char_boundary(text: &str, index: usize) -> usize {
    let mut index = index.min(text.len());
    while index > 0 && !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

pub fn ceil_char_boundary(text: &str, index: usize) -> usize {
    let mut index = index.min(text.len());
    while index < text.len() && !text.is_char_boundary(index) {
        index += 1;
    }
    index
}

/// Byte offset of the position `chars` characters before `end`.
pub fn chars_before(text: &str, end: usize, chars: usize) -> usize {
    let end = floor_char_boundary(text, end);
    if chars == 0 {
        return end;
    }
    text[..end]
        .char_indices()
        .rev()
        .nth(chars - 1)
        .map(|(index, _)| index)
        .unwrap_or(0)
}
