use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// Direction of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryKind {
    Receita,
    Despesa,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Receita => "RECEITA",
            EntryKind::Despesa => "DESPESA",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown entry kind: {0}")]
pub struct EntryKindParseError(pub String);

impl FromStr for EntryKind {
    type Err = EntryKindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RECEITA" => Ok(EntryKind::Receita),
            "DESPESA" => Ok(EntryKind::Despesa),
            other => Err(EntryKindParseError(other.to_string())),
        }
    }
}

/// A "lançamento". Installment bookkeeping:
/// - plain entry: `parent_id`, `total_installments` and `installment` are all `None`;
/// - split parent: `installment == Some(0)`, `total_installments == Some(n)`;
/// - split child: `parent_id` set, `installment` in `1..=n`.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    pub id: i64,
    pub user_id: i64,
    pub description: String,
    pub amount: f64,
    pub date: DateTime<Utc>,
    pub kind: EntryKind,
    pub category_id: Option<i64>,
    pub account_id: Option<i64>,
    pub parent_id: Option<i64>,
    pub total_installments: Option<u32>,
    pub installment: Option<u32>,
    pub settled: bool,
}

impl LedgerEntry {
    pub fn is_installment_parent(&self) -> bool {
        self.parent_id.is_none() && self.installment == Some(0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewEntry {
    pub user_id: i64,
    pub description: String,
    pub amount: f64,
    pub date: DateTime<Utc>,
    pub kind: EntryKind,
    pub category_id: Option<i64>,
    pub account_id: Option<i64>,
    pub parent_id: Option<i64>,
    pub total_installments: Option<u32>,
    pub installment: Option<u32>,
    pub settled: bool,
}

/// Optional narrowing applied when listing a user's entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryFilter {
    pub kind: Option<EntryKind>,
    pub category_id: Option<i64>,
    pub account_id: Option<i64>,
    pub settled: Option<bool>,
}
