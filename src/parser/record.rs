use std::collections::HashSet;

use serde::Serialize;

use super::filings::Filing;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CaseStatus {
    Acdo,
    Sent,
}

impl CaseStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Acdo => "Acdo",
            Self::Sent => "Sent",
        }
    }
}

/// One (filing, defendant) pair published in a bulletin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaseRecord {
    pub expediente_id: String,
    pub plaintiff: Option<String>,
    pub defendant: Option<String>,
    pub judgment_type: String,
    pub status: Option<CaseStatus>,
    pub status_count: Option<u32>,
    pub publication_date: String,
    pub bulletin_number: Option<u32>,
    pub page_number: Option<u32>,
    pub chamber: Option<String>,
    pub defendant_ordinal_label: Option<String>,
}

/// Identity of a record for duplicate suppression; the ordinal label is
/// positional and not part of it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RecordKey {
    expediente_id: String,
    plaintiff: Option<String>,
    defendant: Option<String>,
    judgment_type: String,
    status: Option<CaseStatus>,
    status_count: Option<u32>,
    publication_date: String,
    bulletin_number: Option<u32>,
    page_number: Option<u32>,
    chamber: Option<String>,
}

impl From<&CaseRecord> for RecordKey {
    fn from(record: &CaseRecord) -> Self {
        Self {
            expediente_id: record.expediente_id.clone(),
            plaintiff: record.plaintiff.clone(),
            defendant: record.defendant.clone(),
            judgment_type: record.judgment_type.clone(),
            status: record.status,
            status_count: record.status_count,
            publication_date: record.publication_date.clone(),
            bulletin_number: record.bulletin_number,
            page_number: record.page_number,
            chamber: record.chamber.clone(),
        }
    }
}

/// Records already emitted for the current bulletin.
#[derive(Debug, Default)]
pub struct SeenRecords {
    keys: HashSet<RecordKey>,
}

impl SeenRecords {
    pub fn insert(&mut self, record: &CaseRecord) -> bool {
        self.keys.insert(RecordKey::from(record))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulletinContext {
    /// ISO `YYYY-MM-DD`.
    pub publication_date: String,
    pub bulletin_number: Option<u32>,
}

/// Case-level fields shared by every record of one case.
#[derive(Debug, Clone)]
pub struct CaseMeta<'a> {
    pub plaintiff: Option<&'a str>,
    pub judgment_type: &'a str,
    pub chamber: Option<&'a str>,
    pub page_number: Option<u32>,
    pub bulletin: &'a BulletinContext,
}

#[derive(Debug, Default)]
pub struct Assembled {
    pub records: Vec<CaseRecord>,
    pub duplicates: usize,
}

/// Cross product of defendants and filings, defendant-major. A case with no
/// recoverable defendant still yields one record per filing.
pub fn assemble(
    meta: &CaseMeta<'_>,
    defendants: &[String],
    filings: &[Filing],
    seen: &mut SeenRecords,
) -> Assembled {
    let mut assembled = Assembled::default();
    let mut push = |record: CaseRecord| {
        if seen.insert(&record) {
            assembled.records.push(record);
        } else {
            assembled.duplicates += 1;
        }
    };

    if defendants.is_empty() {
        for filing in filings {
            push(build_record(meta, filing, None, None));
        }
    } else {
        for (index, defendant) in defendants.iter().enumerate() {
            for filing in filings {
                push(build_record(
                    meta,
                    filing,
                    Some(defendant.clone()),
                    Some(format!("demandado: {}", index + 1)),
                ));
            }
        }
    }

    assembled
}

fn build_record(
    meta: &CaseMeta<'_>,
    filing: &Filing,
    defendant: Option<String>,
    label: Option<String>,
) -> CaseRecord {
    CaseRecord {
        expediente_id: filing.expediente_id.clone(),
        plaintiff: meta.plaintiff.map(str::to_string),
        defendant,
        judgment_type: meta.judgment_type.to_string(),
        status: filing.status,
        status_count: filing.status_count,
        publication_date: meta.bulletin.publication_date.clone(),
        bulletin_number: meta.bulletin.bulletin_number,
        page_number: meta.page_number,
        chamber: meta.chamber.map(str::to_string),
        defendant_ordinal_label: label,
    }
}
