use chrono::NaiveDate;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Marque par défaut d'une surveillance dans la table de sortie.
pub const DEFAULT_MARK: &str = "✓";

/// Options d'allocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocOptions {
    /// Graine du tirage aléatoire ; `None` = entropie du système.
    pub seed: Option<u64>,
    /// Texte écrit dans une cellule affectée.
    pub mark: String,
}

impl Default for AllocOptions {
    fn default() -> Self {
        Self {
            seed: None,
            mark: DEFAULT_MARK.to_string(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid date: {value:?}")]
pub struct DateParseError {
    pub value: String,
}

impl DateParseError {
    pub(crate) fn new<S: Into<String>>(value: S) -> Self {
        Self {
            value: value.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum AllocError {
    #[error("missing sheet: {0}")]
    MissingSheet(String),
    #[error("missing column {column:?} in {table}")]
    MissingColumn { table: String, column: String },
    #[error("malformed input at row {row}, column {column:?}: {value:?} ({reason})")]
    MalformedInput {
        row: usize,
        column: String,
        value: String,
        reason: String,
    },
    #[error("invalid exam date at row {row}: {source}")]
    InvalidExamDate {
        row: usize,
        #[source]
        source: DateParseError,
    },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Anomalie de saisie tolérée (le run continue).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum NormalizationWarning {
    /// Champ `Day Off` illisible : l'enseignant est traité comme sans exclusion.
    UnparsableDayOff {
        row: usize,
        teacher: String,
        value: String,
    },
}

/// Journée restée en sous-effectif
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Shortfall {
    pub date: NaiveDate,
    pub required: u32,
    pub assigned: u32,
}

impl Shortfall {
    pub fn missing(&self) -> u32 {
        self.required.saturating_sub(self.assigned)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ViolationKind {
    ExcludedDate,
    ExemptAssigned,
    OverCapacity,
    TotalMismatch,
    UnknownTeacher,
    UnknownDate,
    MissingTeacher,
    DuplicateTeacher,
    MissingDate,
    DuplicateDate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Violation {
    pub kind: ViolationKind,
    pub teacher: Option<String>,
    pub date: Option<NaiveDate>,
    pub detail: String,
}
