use std::collections::HashSet;

use anyhow::{Context, Result};
use regex::{Captures, Regex};
use tracing::debug;

use super::normalize::{clean_name, collapse_whitespace, fold};

/// Phrases that introduce an alias of the preceding party. Includes the OCR
/// spellings "utliza" and "utiza".
const ALIAS_PATTERN: &str = concat!(
    r"(?i)\b(?:",
    r"quien(?:es)?\s+tambi[eé]n\s+(?:se\s+)?(?:ostenta|hace\s+llamar|es\s+conocid[oa]|utiliza|utliza|utiza|usa)",
    r"|quien(?:es)?\s+(?:se\s+)?(?:ostenta|utiliza|utliza|utiza)",
    r"|tambi[eé]n\s+conocid[oa]s?\s+como",
    r"|anteriormente\s+conocid[oa]s?\s+como",
    r"|tambi[eé]n\s+(?:utiliza|utliza|utiza)",
    r"|antes\s+denominad[oa]",
    r")"
);
const GLUED_CONNECTOR_PATTERN: &str = r"(^|\s)([ye])(\p{Lu}\p{Ll})";
const TRAILING_OTHERS_PATTERN: &str = r"(?i)[\s,;]*\b[ye]\s+otr[oa]s?\b\.?\s*$";
const LIST_CONNECTOR_PATTERN: &str = r"\s[ye]\s+";
const DROPPED_INITIAL_PATTERN: &str = r"(^|\s)(\p{Lu})\s(\p{Ll}{3,})";
const OTHERS_ONLY_PATTERN: &str = r"(?i)^(?:[ye]\s+)?otr[oa]s?\.?$";

/// Legal-entity suffixes that continue a corporate name after a comma.
const CORPORATE_SUFFIX_PATTERN: &str = concat!(
    r"^(?:",
    r"S\.?\s?A\.?\s?P\.?\s?I\.?",
    r"|S\.?\s?A\.?\s?B\.?",
    r"|S\.?\s?de\s?R\.?\s?L\.?",
    r"|S\.?\s?A\.?",
    r"|S\.?\s?C\.?",
    r"|A\.?\s?C\.?",
    r"|C\.?\s?V\.?",
    r"|SOFOM",
    r"|E\.?\s?N\.?\s?R\.?",
    r"|I\.?\s?A\.?\s?P\.?",
    r")(?:$|[^\p{L}])"
);

/// Descriptive words that continue a corporate name after a comma, compared
/// against the folded first word.
const SHARED_CONTINUATION_WORDS: &[&str] = &[
    "institucion",
    "instituci6n",
    "division",
    "divisi6n",
    "grupo",
    "financiero",
    "fiduciario",
    "fideicomiso",
    "notario",
    "publico",
    "director",
    "gerente",
];

/// Recognised by the extended guard only. A comma kept because of one of
/// these is counted as a divergent segmentation.
const EXTENDED_CONTINUATION_WORDS: &[&str] = &[
    "financiera",
    "fiduciaria",
    "sociedad",
    "notaria",
    "publica",
    "organizacion",
    "banca",
];

const NOISE_FRAGMENTS: &[&str] = &[
    "n", "l", "el", "en", "de", "la", "las", "los", "del", "y", "e", "o", "a", "su", "sus",
];

/// Lowercase particles that legitimately follow a one-letter token ("Grupo
/// A del Norte"); never glued onto it.
const PARTICLES: &[&str] = &["del", "los", "las", "por", "con", "para", "sus", "que"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefendantList {
    pub names: Vec<String>,
    pub guard_divergences: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommaRole {
    Separator,
    Continuation,
    ExtendedContinuation,
}

#[derive(Debug)]
pub struct DefendantSplitter {
    alias: Regex,
    glued_connector: Regex,
    trailing_others: Regex,
    list_connector: Regex,
    dropped_initial: Regex,
    others_only: Regex,
    corporate_suffix: Regex,
}

impl DefendantSplitter {
    pub fn new() -> Result<Self> {
        Ok(Self {
            alias: Regex::new(ALIAS_PATTERN).context("failed to compile alias phrase regex")?,
            glued_connector: Regex::new(GLUED_CONNECTOR_PATTERN)
                .context("failed to compile glued connector regex")?,
            trailing_others: Regex::new(TRAILING_OTHERS_PATTERN)
                .context("failed to compile trailing others regex")?,
            list_connector: Regex::new(LIST_CONNECTOR_PATTERN)
                .context("failed to compile list connector regex")?,
            dropped_initial: Regex::new(DROPPED_INITIAL_PATTERN)
                .context("failed to compile dropped initial regex")?,
            others_only: Regex::new(OTHERS_ONLY_PATTERN)
                .context("failed to compile others regex")?,
            corporate_suffix: Regex::new(CORPORATE_SUFFIX_PATTERN)
                .context("failed to compile corporate suffix regex")?,
        })
    }

    /// Splits the raw text between "vs." and the judgment type into
    /// individual party names, first-seen order, case-insensitively unique.
    pub fn split(&self, raw: &str) -> DefendantList {
        let cleaned = collapse_whitespace(raw);

        let without_alias = match self.alias.find(&cleaned) {
            Some(alias) => cleaned[..alias.start()].to_string(),
            None => cleaned.clone(),
        };
        let unglued = self
            .glued_connector
            .replace_all(&without_alias, "${1}${2} ${3}");
        let working = self.trailing_others.replace(&unglued, "").into_owned();

        let mut list = DefendantList::default();
        let mut seen = HashSet::<String>::new();

        for hard_chunk in working.split(';') {
            for comma_chunk in self.split_commas(hard_chunk, &mut list.guard_divergences) {
                for piece in self.split_connectors(&comma_chunk) {
                    let name = clean_name(&self.repair_dropped_initials(&piece));
                    if self.is_noise(&name) {
                        continue;
                    }
                    if seen.insert(name.to_lowercase()) {
                        list.names.push(name);
                    }
                }
            }
        }

        if list.names.is_empty() {
            let fallback = match clean_name(&working) {
                value if value.is_empty() => clean_name(&cleaned),
                value => value,
            };
            if !fallback.is_empty() {
                list.names.push(fallback);
            }
        }

        list
    }

    fn split_commas(&self, chunk: &str, divergences: &mut usize) -> Vec<String> {
        let mut pieces = Vec::new();
        let mut last = 0usize;

        for (index, _) in chunk.match_indices(',') {
            match self.comma_role(&chunk[index + 1..]) {
                CommaRole::Separator => {
                    pieces.push(chunk[last..index].to_string());
                    last = index + 1;
                }
                CommaRole::Continuation => {}
                CommaRole::ExtendedContinuation => {
                    debug!(chunk = %chunk, "comma kept only by the extended continuation guard");
                    *divergences += 1;
                }
            }
        }

        pieces.push(chunk[last..].to_string());
        pieces
    }

    fn comma_role(&self, following: &str) -> CommaRole {
        let following = following.trim_start();
        let starts_uppercase = following
            .chars()
            .next()
            .map(char::is_uppercase)
            .unwrap_or(false);
        if !starts_uppercase || self.corporate_suffix.is_match(following) {
            return CommaRole::Continuation;
        }

        let first_word = following.split_whitespace().next().unwrap_or("");
        let folded = fold(first_word);
        let folded = folded.trim_matches(|character: char| !character.is_alphanumeric());

        if SHARED_CONTINUATION_WORDS.contains(&folded) {
            CommaRole::Continuation
        } else if EXTENDED_CONTINUATION_WORDS.contains(&folded) {
            CommaRole::ExtendedContinuation
        } else {
            CommaRole::Separator
        }
    }

    fn split_connectors(&self, chunk: &str) -> Vec<String> {
        let mut parts = Vec::new();
        let mut last = 0usize;

        for connector in self.list_connector.find_iter(chunk) {
            let next_is_uppercase = chunk[connector.end()..]
                .chars()
                .next()
                .map(char::is_uppercase)
                .unwrap_or(false);
            if next_is_uppercase {
                parts.push(chunk[last..connector.start()].to_string());
                last = connector.end();
            }
        }

        parts.push(chunk[last..].to_string());
        parts
    }

    fn repair_dropped_initials(&self, piece: &str) -> String {
        self.dropped_initial
            .replace_all(piece, |captures: &Captures| {
                let word = &captures[3];
                if PARTICLES.contains(&word) {
                    captures[0].to_string()
                } else {
                    format!("{}{}{}", &captures[1], &captures[2], word)
                }
            })
            .into_owned()
    }

    fn is_noise(&self, name: &str) -> bool {
        name.is_empty()
            || !name.chars().any(char::is_alphabetic)
            || NOISE_FRAGMENTS.contains(&name)
            || self.others_only.is_match(name)
    }
}
