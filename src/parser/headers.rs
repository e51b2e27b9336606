use anyhow::{Context, Result};
use regex::Regex;

use super::normalize::{clean_name, collapse_whitespace};

const ACCORDS_HEADER_PATTERN: &str = r"(?i)^.*?\bACUERDOS\s+DEL\b.*?\b\d{4}\b\s*";
const BULLETIN_HEADER_PATTERN: &str = r"(?i)^.*?\bBOLET[IÍ]N\b.*?\b\d{4}\b\s*";
const CHAMBER_HEADER_PATTERN: &str = r"(?i)^.*?\b(?:PRIMERA|SEGUNDA|TERCERA|CUARTA|QUINTA|SEXTA|S[EÉ]PTIMA|OCTAVA|NOVENA|D[EÉ]CIMA)\s+SALA\b.*?\b\d{4}\b\s*";
/// A line that is nothing but a header. Lines that merely start with one keep
/// their remainder, which the prefix patterns below reduce to the plaintiff.
const HEADER_LINE_PATTERN: &str = concat!(
    r"(?i)^(?:",
    r"(?:(?:PRIMERA|SEGUNDA|TERCERA|CUARTA|QUINTA|SEXTA|S[EÉ]PTIMA|OCTAVA|NOVENA|D[EÉ]CIMA)\s+)?SALA\s+C[I1L|]V[I1L|][L1I|]?\.?",
    r"|BOLET[IÍ]N(?:\s+JUDICIAL)?(?:\b.*\b\d{4})?",
    r"|ACUERDOS\s+DEL\b.*\b\d{4}",
    r"|P[AÁ]GINA\s+\d{1,4}(?:\s*/\s*\d{1,4})?",
    r")$"
);
/// Chamber or bulletin name in front of the plaintiff on the same line, with
/// no date after it.
const CHAMBER_PREFIX_PATTERN: &str = r"(?i)^(?:(?:PRIMERA|SEGUNDA|TERCERA|CUARTA|QUINTA|SEXTA|S[EÉ]PTIMA|OCTAVA|NOVENA|D[EÉ]CIMA)\s+)?SALA\s+C[I1L|]V[I1L|][L1I|]?\.?\s+";
const BULLETIN_PREFIX_PATTERN: &str = r"(?i)^BOLET[IÍ]N(?:\s+JUDICIAL)?\.?\s+";
const WEEKDAY_PATTERN: &str =
    r"(?i)\b(?:lunes|martes|mi[eé]rcoles|jueves|viernes|s[aá]bado|domingo)\b";
const YEAR_PATTERN: &str = r"\b\d{4}\b";
const THROUGH_FIRST_YEAR_PATTERN: &str = r"^.*?\b\d{4}\b\s*";
/// "lo. 3", "l0 12", "I0. 4": page/line numbers OCR reads in front of the
/// first plaintiff.
const LINE_NUMBER_PREFIX_PATTERN: &str = r"(?i)^(?:lo|l0|i0|io|i|l)\.?\s*\d+\s*";
const AS_PREFIX_PATTERN: &str = r"^AS\s+";

/// Removes bulletin boilerplate that the boundary locator leaves in front of
/// the first plaintiff of a page or chamber.
#[derive(Debug)]
pub struct HeaderStripper {
    header_line: Regex,
    accords_header: Regex,
    bulletin_header: Regex,
    chamber_header: Regex,
    chamber_prefix: Regex,
    bulletin_prefix: Regex,
    weekday: Regex,
    year: Regex,
    through_first_year: Regex,
    line_number_prefix: Regex,
    as_prefix: Regex,
}

impl HeaderStripper {
    pub fn new() -> Result<Self> {
        Ok(Self {
            header_line: Regex::new(HEADER_LINE_PATTERN)
                .context("failed to compile header line regex")?,
            accords_header: Regex::new(ACCORDS_HEADER_PATTERN)
                .context("failed to compile accords header regex")?,
            bulletin_header: Regex::new(BULLETIN_HEADER_PATTERN)
                .context("failed to compile bulletin header regex")?,
            chamber_header: Regex::new(CHAMBER_HEADER_PATTERN)
                .context("failed to compile chamber header regex")?,
            chamber_prefix: Regex::new(CHAMBER_PREFIX_PATTERN)
                .context("failed to compile chamber prefix regex")?,
            bulletin_prefix: Regex::new(BULLETIN_PREFIX_PATTERN)
                .context("failed to compile bulletin prefix regex")?,
            weekday: Regex::new(WEEKDAY_PATTERN).context("failed to compile weekday regex")?,
            year: Regex::new(YEAR_PATTERN).context("failed to compile year regex")?,
            through_first_year: Regex::new(THROUGH_FIRST_YEAR_PATTERN)
                .context("failed to compile leading year regex")?,
            line_number_prefix: Regex::new(LINE_NUMBER_PREFIX_PATTERN)
                .context("failed to compile line number prefix regex")?,
            as_prefix: Regex::new(AS_PREFIX_PATTERN).context("failed to compile AS prefix regex")?,
        })
    }

    pub fn strip(&self, raw: &str) -> Option<String> {
        let body = raw
            .lines()
            .map(str::trim)
            .skip_while(|line| self.is_header_line(line))
            .collect::<Vec<&str>>()
            .join(" ");
        let mut value = collapse_whitespace(&body);

        for pattern in [
            &self.accords_header,
            &self.bulletin_header,
            &self.chamber_header,
            &self.chamber_prefix,
            &self.bulletin_prefix,
        ] {
            value = pattern.replace(&value, "").into_owned();
        }

        if self.weekday.is_match(&value) && self.year.is_match(&value) {
            value = self.through_first_year.replace(&value, "").into_owned();
        }

        value = self.line_number_prefix.replace(&value, "").into_owned();
        value = self.as_prefix.replace(&value, "").into_owned();

        let cleaned = clean_name(&value);
        if cleaned.is_empty() {
            None
        } else {
            Some(cleaned)
        }
    }

    fn is_header_line(&self, line: &str) -> bool {
        line.chars().count() <= 3 || self.header_line.is_match(line)
    }
}
