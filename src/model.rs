use chrono::NaiveDate;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Noms de colonnes attendus en entrée et produits en sortie.
pub mod columns {
    pub const TEACHERS_SHEET: &str = "Teachers";
    pub const DATES_SHEET: &str = "Dates";

    pub const TEACHER_NAME: &str = "Name of Teacher";
    pub const DAY_OFF: &str = "Day Off";
    pub const EXAM_DATE: &str = "Dates of Examinations";
    pub const REQUIRED: &str = "Required Invigilators";
    pub const TOTAL_DUTIES: &str = "Total Duties";
}

/// Enseignant (surveillant potentiel)
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Teacher {
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "BTreeSet::is_empty"))]
    pub excluded_dates: BTreeSet<NaiveDate>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub exempt: bool,
}

impl Teacher {
    pub fn new<N: Into<String>>(name: N) -> Self {
        Self {
            name: name.into(),
            excluded_dates: BTreeSet::new(),
            exempt: false,
        }
    }

    pub fn exempt<N: Into<String>>(name: N) -> Self {
        Self {
            exempt: true,
            ..Self::new(name)
        }
    }

    pub fn excluding<I: IntoIterator<Item = NaiveDate>>(mut self, dates: I) -> Self {
        self.excluded_dates.extend(dates);
        self
    }

    /// Vrai si l'enseignant peut surveiller à cette date.
    pub fn is_available_on(&self, date: NaiveDate) -> bool {
        !self.exempt && !self.excluded_dates.contains(&date)
    }
}

/// Journée d'examen et nombre de surveillants requis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ExamDate {
    pub date: NaiveDate,
    pub required_count: u32,
}

impl ExamDate {
    pub fn new(date: NaiveDate, required_count: u32) -> Self {
        Self {
            date,
            required_count,
        }
    }
}

/// Table brute (en-têtes + lignes de cellules texte), indépendante du format de fichier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Table {
    pub columns: Vec<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(cells.into_iter().map(Into::into).collect());
    }

    pub fn with_row<I, S>(mut self, cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push_row(cells);
        self
    }

    /// Position d'une colonne, en-têtes comparés après `trim`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.trim() == name)
    }

    /// Cellule d'une ligne ; une ligne trop courte se lit comme vide.
    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// Jeu de données complet : feuilles nommées (`Teachers`, `Dates`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Workbook {
    pub sheets: BTreeMap<String, Table>,
}

impl Workbook {
    pub fn new(teachers: Table, dates: Table) -> Self {
        let mut sheets = BTreeMap::new();
        sheets.insert(columns::TEACHERS_SHEET.to_string(), teachers);
        sheets.insert(columns::DATES_SHEET.to_string(), dates);
        Self { sheets }
    }

    pub fn sheet(&self, name: &str) -> Option<&Table> {
        self.sheets
            .get(name)
            .or_else(|| self.sheets.iter().find(|(k, _)| k.trim() == name).map(|(_, t)| t))
    }
}
