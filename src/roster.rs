use crate::allocator::AllocError;
use crate::model::{columns, Table};
use crate::normalize::{canonical, parse_date};
use chrono::NaiveDate;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Ligne du tableau de service : une par ligne d'enseignant en entrée.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RosterRow {
    pub name: String,
    pub marks: Vec<bool>,
    pub total: u32,
}

impl RosterRow {
    /// Le total est dérivé des marques.
    pub fn new<N: Into<String>>(name: N, marks: Vec<bool>) -> Self {
        let total = marks.iter().filter(|m| **m).count() as u32;
        Self {
            name: name.into(),
            marks,
            total,
        }
    }
}

/// Tableau de service : colonnes = dates (ordre d'entrée), lignes = enseignants.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DutyRoster {
    pub dates: Vec<NaiveDate>,
    pub rows: Vec<RosterRow>,
}

/// Charge par enseignant (min / max / écart / somme des surveillances)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub min: u32,
    pub max: u32,
    pub spread: u32,
    pub total: u32,
}

impl DutyRoster {
    pub fn new(dates: Vec<NaiveDate>, rows: Vec<RosterRow>) -> Self {
        Self { dates, rows }
    }

    pub fn row(&self, name: &str) -> Option<&RosterRow> {
        self.rows.iter().find(|r| r.name == name)
    }

    pub fn is_assigned(&self, name: &str, date: NaiveDate) -> bool {
        let Some(col) = self.dates.iter().position(|d| *d == date) else {
            return false;
        };
        self.rows
            .iter()
            .any(|r| r.name == name && r.marks.get(col).copied().unwrap_or(false))
    }

    /// Noms de service à cette date (un nom répété n'apparaît qu'une fois).
    pub fn assigned_on(&self, date: NaiveDate) -> Vec<&str> {
        let Some(col) = self.dates.iter().position(|d| *d == date) else {
            return Vec::new();
        };
        let mut out: Vec<&str> = Vec::new();
        for row in &self.rows {
            if row.marks.get(col).copied().unwrap_or(false) && !out.contains(&row.name.as_str()) {
                out.push(row.name.as_str());
            }
        }
        out
    }

    pub fn marked_dates<'a>(&'a self, row: &'a RosterRow) -> impl Iterator<Item = NaiveDate> + 'a {
        self.dates
            .iter()
            .zip(row.marks.iter())
            .filter(|(_, marked)| **marked)
            .map(|(date, _)| *date)
    }

    pub fn summary(&self) -> LoadSummary {
        let totals = self.rows.iter().map(|r| r.total);
        let (Some(min), Some(max)) = (totals.clone().min(), totals.clone().max()) else {
            return LoadSummary::default();
        };
        LoadSummary {
            min,
            max,
            spread: max - min,
            total: totals.sum(),
        }
    }

    /// Table de sortie : `Name of Teacher`, une colonne par date, `Total Duties`.
    pub fn to_table(&self, mark: &str) -> Table {
        let mut table = Table::new(
            std::iter::once(columns::TEACHER_NAME.to_string())
                .chain(self.dates.iter().map(|d| canonical(*d)))
                .chain(std::iter::once(columns::TOTAL_DUTIES.to_string())),
        );
        let mut buf = itoa::Buffer::new();
        for row in &self.rows {
            let mut cells = Vec::with_capacity(self.dates.len() + 2);
            cells.push(row.name.clone());
            cells.extend(
                row.marks
                    .iter()
                    .map(|m| if *m { mark.to_string() } else { String::new() }),
            );
            cells.push(buf.format(row.total).to_string());
            table.rows.push(cells);
        }
        table
    }

    /// Relit une table de service ; toute cellule non vide compte comme une marque.
    ///
    /// Le `Total Duties` écrit est conservé tel quel (la vérification le confronte aux marques).
    pub fn from_table(table: &Table) -> Result<Self, AllocError> {
        let name_col = table
            .column_index(columns::TEACHER_NAME)
            .ok_or_else(|| AllocError::MissingColumn {
                table: "roster".to_string(),
                column: columns::TEACHER_NAME.to_string(),
            })?;
        let total_col = table.column_index(columns::TOTAL_DUTIES);

        let mut date_cols = Vec::new();
        let mut dates = Vec::new();
        for (idx, header) in table.columns.iter().enumerate() {
            if idx == name_col || Some(idx) == total_col {
                continue;
            }
            let date = parse_date(header)
                .map_err(|source| AllocError::InvalidExamDate { row: 0, source })?;
            date_cols.push(idx);
            dates.push(date);
        }

        let mut rows = Vec::with_capacity(table.rows.len());
        for idx in 0..table.rows.len() {
            let name = table.cell(idx, name_col).trim();
            if name.is_empty() {
                continue;
            }
            let marks = date_cols
                .iter()
                .map(|c| !table.cell(idx, *c).trim().is_empty())
                .collect();
            let mut row = RosterRow::new(name, marks);
            if let Some(col) = total_col {
                let raw = table.cell(idx, col);
                row.total = crate::normalize::parse_required(raw).map_err(|reason| {
                    AllocError::MalformedInput {
                        row: idx + 1,
                        column: columns::TOTAL_DUTIES.to_string(),
                        value: raw.to_string(),
                        reason,
                    }
                })?;
            }
            rows.push(row);
        }

        Ok(Self { dates, rows })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, day).unwrap()
    }

    fn sample() -> DutyRoster {
        DutyRoster::new(
            vec![d(15), d(16)],
            vec![
                RosterRow::new("A", vec![true, true]),
                RosterRow::new("B", vec![false, true]),
                RosterRow::new("C", vec![false, false]),
            ],
        )
    }

    #[test]
    fn totals_follow_marks() {
        let r = sample();
        assert_eq!(r.row("A").unwrap().total, 2);
        assert_eq!(r.row("B").unwrap().total, 1);
        assert_eq!(
            r.summary(),
            LoadSummary {
                min: 0,
                max: 2,
                spread: 2,
                total: 3
            }
        );
    }

    #[test]
    fn table_layout() {
        let t = sample().to_table("X");
        assert_eq!(
            t.columns,
            vec!["Name of Teacher", "2025-07-15", "2025-07-16", "Total Duties"]
        );
        assert_eq!(t.rows[1], vec!["B", "", "X", "1"]);
    }

    #[test]
    fn reads_back_written_table() {
        let r = sample();
        let back = DutyRoster::from_table(&r.to_table("✓")).unwrap();
        assert_eq!(back, r);
        assert_eq!(back.assigned_on(d(16)), vec!["A", "B"]);
        assert!(back.is_assigned("A", d(15)));
        assert!(!back.is_assigned("C", d(15)));
    }

    #[test]
    fn written_total_is_kept() {
        let table = Table::new(["Name of Teacher", "15-07-2025", "Total Duties"])
            .with_row(["A", "✓", "3"]);
        let r = DutyRoster::from_table(&table).unwrap();
        assert_eq!(r.dates, vec![d(15)]);
        assert_eq!(r.rows[0].marks, vec![true]);
        assert_eq!(r.rows[0].total, 3);
    }

    #[test]
    fn empty_roster_summary() {
        assert_eq!(DutyRoster::default().summary(), LoadSummary::default());
    }
}
