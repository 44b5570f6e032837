//! Normalisation des tables d'entrée vers le modèle (`Teacher`, `ExamDate`).
//!
//! - Dates lues « jour d'abord » (`15-07-2025` → 2025-07-15), forme canonique `YYYY-MM-DD`.
//! - `Day Off` : jetons d'exemption, vide, ou liste de dates séparées par des virgules.
//! - Un champ `Day Off` illisible ne bloque pas le run : aucune exclusion + avertissement.

use crate::allocator::{AllocError, DateParseError, NormalizationWarning};
use crate::model::{columns, ExamDate, Table, Teacher, Workbook};
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::BTreeSet;

/// Jetons (insensibles à la casse) qui exemptent totalement un enseignant.
pub const EXEMPT_TOKENS: [&str; 4] = ["na", "leave", "off", "exempt"];

// Années sur deux chiffres en premier : `%Y` accepterait `25` comme l'an 25.
const DATE_FORMATS: &[&str] = &[
    "%d-%m-%y", "%d/%m/%y", "%d.%m.%y", "%d-%m-%Y", "%d/%m/%Y", "%d.%m.%Y", "%Y-%m-%d", "%Y/%m/%d",
    "%d %B %Y", "%d-%B-%Y", "%d %B, %Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
    "%d/%m/%Y %H:%M",
];

/// Interprétation d'un champ `Day Off`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DayOff {
    /// Jeton `na` / `leave` / `off` / `exempt` : jamais affecté.
    Exempt,
    /// Cellule vide ou `nan` : disponible partout.
    Available,
    Excluded(BTreeSet<NaiveDate>),
}

/// Parse une date jour-d'abord (plusieurs séparateurs, années courtes, horodatages tableur).
pub fn parse_date(raw: &str) -> Result<NaiveDate, DateParseError> {
    let s = raw.trim();
    if s.is_empty() {
        return Err(DateParseError::new(raw));
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
        .ok_or_else(|| DateParseError::new(raw))
}

/// Clé de jointure canonique : `YYYY-MM-DD`.
pub fn canonical(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn parse_day_off(raw: &str) -> Result<DayOff, DateParseError> {
    let s = raw.trim();
    let lower = s.to_ascii_lowercase();
    if EXEMPT_TOKENS.contains(&lower.as_str()) {
        return Ok(DayOff::Exempt);
    }
    if s.is_empty() || lower == "nan" {
        return Ok(DayOff::Available);
    }
    let dates = s
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(parse_date)
        .collect::<Result<BTreeSet<_>, _>>()?;
    Ok(DayOff::Excluded(dates))
}

/// Nombre de surveillants requis ; renvoie la raison du refus sinon.
pub fn parse_required(raw: &str) -> Result<u32, String> {
    let s = raw.trim();
    if s.is_empty() {
        return Err("empty value".to_string());
    }
    let value = match s.parse::<i64>() {
        Ok(v) => v,
        Err(_) => match s.parse::<f64>() {
            Ok(f) if f.is_finite() && f.fract() == 0.0 => f as i64,
            _ => return Err("not an integer".to_string()),
        },
    };
    if value < 0 {
        return Err("negative count".to_string());
    }
    u32::try_from(value).map_err(|_| "count too large".to_string())
}

/// Construit les enseignants depuis la feuille `Teachers` (ordre des lignes conservé).
pub fn teachers_from_table(
    table: &Table,
) -> Result<(Vec<Teacher>, Vec<NormalizationWarning>), AllocError> {
    let name_col = require_column(table, columns::TEACHERS_SHEET, columns::TEACHER_NAME)?;
    let off_col = require_column(table, columns::TEACHERS_SHEET, columns::DAY_OFF)?;

    let mut teachers = Vec::with_capacity(table.rows.len());
    let mut warnings = Vec::new();

    for idx in 0..table.rows.len() {
        if is_blank_row(table, idx) {
            continue;
        }
        let row = idx + 1;
        let name = table.cell(idx, name_col).trim();
        if name.is_empty() {
            return Err(AllocError::MalformedInput {
                row,
                column: columns::TEACHER_NAME.to_string(),
                value: String::new(),
                reason: "empty teacher name".to_string(),
            });
        }
        let raw_off = table.cell(idx, off_col);
        let teacher = match parse_day_off(raw_off) {
            Ok(DayOff::Exempt) => Teacher::exempt(name),
            Ok(DayOff::Available) => Teacher::new(name),
            Ok(DayOff::Excluded(dates)) => Teacher::new(name).excluding(dates),
            Err(err) => {
                tracing::warn!(row, teacher = name, %err, "day off ignored, teacher treated as fully available");
                warnings.push(NormalizationWarning::UnparsableDayOff {
                    row,
                    teacher: name.to_string(),
                    value: raw_off.to_string(),
                });
                Teacher::new(name)
            }
        };
        teachers.push(teacher);
    }

    Ok((teachers, warnings))
}

/// Les deux feuilles normalisées d'un classeur
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub teachers: Vec<Teacher>,
    pub dates: Vec<ExamDate>,
    pub warnings: Vec<NormalizationWarning>,
}

/// Classeur complet → enseignants, dates et avertissements.
pub fn from_workbook(workbook: &Workbook) -> Result<Normalized, AllocError> {
    let teachers_sheet = require_sheet(workbook, columns::TEACHERS_SHEET)?;
    let dates_sheet = require_sheet(workbook, columns::DATES_SHEET)?;
    let (teachers, warnings) = teachers_from_table(teachers_sheet)?;
    let dates = dates_from_table(dates_sheet)?;
    Ok(Normalized {
        teachers,
        dates,
        warnings,
    })
}

/// Construit les journées d'examen depuis la feuille `Dates` (ordre des lignes conservé).
pub fn dates_from_table(table: &Table) -> Result<Vec<ExamDate>, AllocError> {
    let date_col = require_column(table, columns::DATES_SHEET, columns::EXAM_DATE)?;
    let req_col = require_column(table, columns::DATES_SHEET, columns::REQUIRED)?;

    let mut out = Vec::with_capacity(table.rows.len());
    for idx in 0..table.rows.len() {
        if is_blank_row(table, idx) {
            continue;
        }
        let row = idx + 1;
        let date = parse_date(table.cell(idx, date_col))
            .map_err(|source| AllocError::InvalidExamDate { row, source })?;
        let raw_req = table.cell(idx, req_col);
        let required = parse_required(raw_req).map_err(|reason| AllocError::MalformedInput {
            row,
            column: columns::REQUIRED.to_string(),
            value: raw_req.to_string(),
            reason,
        })?;
        out.push(ExamDate::new(date, required));
    }
    Ok(out)
}

fn require_sheet<'a>(workbook: &'a Workbook, name: &str) -> Result<&'a Table, AllocError> {
    workbook
        .sheet(name)
        .ok_or_else(|| AllocError::MissingSheet(name.to_string()))
}

fn require_column(table: &Table, sheet: &str, column: &str) -> Result<usize, AllocError> {
    table
        .column_index(column)
        .ok_or_else(|| AllocError::MissingColumn {
            table: sheet.to_string(),
            column: column.to_string(),
        })
}

fn is_blank_row(table: &Table, idx: usize) -> bool {
    table.rows[idx].iter().all(|c| c.trim().is_empty())
}
