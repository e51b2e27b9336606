use anyhow::{Context, Result};
use chrono::NaiveDate;
use regex::Regex;

use super::normalize::{collapse_whitespace, fold};

/// Matched against folded text, so no accents. The weekday is optional
/// because OCR often breaks it.
const COVER_DATE_PATTERN: &str = concat!(
    r"\b(?:lunes|martes|miercoles|jueves|viernes|sabado|domingo)?\s*",
    r"(\d{1,2})\s*de\s*",
    r"(enero|febrero|marzo|abril|mayo|junio|julio|agosto|septiembre|setiembre|octubre|noviembre|diciembre)",
    r"\s*del?\s*(\d{4})\b"
);
/// "Num. 3", "Núm 3" and the OCR misread "Nun 3".
const BULLETIN_NUMBER_PATTERN: &str = r"\bnu[mn]\.?\s*(\d{1,4})\b";
/// Table-of-contents entry naming the page where the chamber columns begin.
const CHAMBERS_INDEX_PATTERN: &str = r"\bsalas\s+(\d{1,4})\b";

/// The chambers index counts two leading pages that the transcript lacks.
const INDEX_PAGE_OFFSET: u32 = 2;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverInfo {
    pub publication_date: Option<NaiveDate>,
    pub bulletin_number: Option<u32>,
    pub columns_start_page: Option<u32>,
}

#[derive(Debug)]
pub struct CoverParser {
    date: Regex,
    number: Regex,
    chambers_index: Regex,
}

impl CoverParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            date: Regex::new(COVER_DATE_PATTERN).context("failed to compile cover date regex")?,
            number: Regex::new(BULLETIN_NUMBER_PATTERN)
                .context("failed to compile bulletin number regex")?,
            chambers_index: Regex::new(CHAMBERS_INDEX_PATTERN)
                .context("failed to compile chambers index regex")?,
        })
    }

    pub fn parse_cover(&self, text: &str) -> CoverInfo {
        let folded = collapse_whitespace(&fold(text));

        let publication_date = self.date.captures(&folded).and_then(|captures| {
            let day = captures.get(1)?.as_str().parse::<u32>().ok()?;
            let month = month_number(captures.get(2)?.as_str())?;
            let year = captures.get(3)?.as_str().parse::<i32>().ok()?;
            NaiveDate::from_ymd_opt(year, month, day)
        });

        let bulletin_number = self
            .number
            .captures(&folded)
            .and_then(|captures| captures.get(1)?.as_str().parse::<u32>().ok());

        let columns_start_page = self
            .chambers_index
            .captures(&folded)
            .and_then(|captures| captures.get(1)?.as_str().parse::<u32>().ok())
            .map(|page| page.saturating_sub(INDEX_PAGE_OFFSET).max(1));

        CoverInfo {
            publication_date,
            bulletin_number,
            columns_start_page,
        }
    }
}

fn month_number(name: &str) -> Option<u32> {
    let month = match name {
        "enero" => 1,
        "febrero" => 2,
        "marzo" => 3,
        "abril" => 4,
        "mayo" => 5,
        "junio" => 6,
        "julio" => 7,
        "agosto" => 8,
        "septiembre" | "setiembre" => 9,
        "octubre" => 10,
        "noviembre" => 11,
        "diciembre" => 12,
        _ => return None,
    };
    Some(month)
}
