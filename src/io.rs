use crate::allocator::Allocation;
use crate::model::{Table, Workbook};
use anyhow::Context;
use csv::{ReaderBuilder, WriterBuilder};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Lecture d'une table CSV (ligne d'en-tête obligatoire, lignes de longueur libre).
pub fn read_table_csv<P: AsRef<Path>>(path: P) -> anyhow::Result<Table> {
    let path = path.as_ref();
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;

    let mut columns: Vec<String> = rdr
        .headers()
        .with_context(|| format!("reading header of {}", path.display()))?
        .iter()
        .map(str::to_string)
        .collect();
    // export Excel : BOM UTF-8 collé au premier en-tête
    if let Some(first) = columns.first_mut() {
        if let Some(stripped) = first.strip_prefix('\u{feff}') {
            *first = stripped.to_string();
        }
    }

    let mut table = Table::new(columns);
    for rec in rdr.records() {
        let rec = rec.with_context(|| format!("reading {}", path.display()))?;
        table.push_row(rec.iter());
    }
    Ok(table)
}

/// Écriture CSV atomique (fichier temporaire puis renommage).
pub fn write_table_csv<P: AsRef<Path>>(path: P, table: &Table) -> anyhow::Result<()> {
    write_atomic(path.as_ref(), &encode_table_csv(table)?)
}

/// Rendu CSV en mémoire, sans toucher au disque.
pub fn encode_table_csv(table: &Table) -> anyhow::Result<Vec<u8>> {
    let mut w = WriterBuilder::new().flexible(true).from_writer(Vec::new());
    w.write_record(&table.columns)?;
    for row in &table.rows {
        w.write_record(row)?;
    }
    w.into_inner().context("flushing csv buffer")
}

/// Classeur JSON : `{"sheets": {"Teachers": {...}, "Dates": {...}}}`
pub fn load_workbook_json<P: AsRef<Path>>(path: P) -> anyhow::Result<Workbook> {
    let path = path.as_ref();
    let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let workbook: Workbook = serde_json::from_slice(&data)
        .with_context(|| format!("parsing workbook {}", path.display()))?;
    Ok(workbook)
}

pub fn save_workbook_json<P: AsRef<Path>>(path: P, workbook: &Workbook) -> anyhow::Result<()> {
    let json = serde_json::to_vec_pretty(workbook)?;
    write_atomic(path.as_ref(), &json)
}

/// Charge les deux feuilles depuis deux CSV séparés.
pub fn load_workbook_csv<P: AsRef<Path>, Q: AsRef<Path>>(
    teachers: P,
    dates: Q,
) -> anyhow::Result<Workbook> {
    Ok(Workbook::new(
        read_table_csv(teachers)?,
        read_table_csv(dates)?,
    ))
}

/// Export JSON du résultat complet (roster, manques, avertissements)
pub fn export_allocation_json<P: AsRef<Path>>(path: P, allocation: &Allocation) -> anyhow::Result<()> {
    write_atomic(path.as_ref(), &encode_allocation_json(allocation)?)
}

pub fn encode_allocation_json(allocation: &Allocation) -> anyhow::Result<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(allocation)?)
}

/// Classeur `.xlsx` : chaque feuille devient une table (première ligne = en-têtes).
#[cfg(feature = "xlsx")]
pub fn load_workbook_xlsx<P: AsRef<Path>>(path: P) -> anyhow::Result<Workbook> {
    use calamine::{open_workbook, Reader, Xlsx};

    let path = path.as_ref();
    let mut xlsx: Xlsx<_> =
        open_workbook(path).with_context(|| format!("opening {}", path.display()))?;
    let mut workbook = Workbook::default();
    for name in xlsx.sheet_names() {
        let range = xlsx
            .worksheet_range(&name)
            .with_context(|| format!("reading sheet {name} of {}", path.display()))?;
        let mut rows = range.rows();
        let table = match rows.next() {
            Some(header) => {
                let mut table = Table::new(header.iter().map(cell_text));
                for row in rows {
                    table.push_row(row.iter().map(cell_text));
                }
                table
            }
            None => Table::default(),
        };
        workbook.sheets.insert(name, table);
    }
    Ok(workbook)
}

/// Classeur JSON ou `.xlsx`, selon l'extension.
pub fn load_workbook<P: AsRef<Path>>(path: P) -> anyhow::Result<Workbook> {
    let path = path.as_ref();
    let is_xlsx = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("xlsx"));
    if is_xlsx {
        #[cfg(feature = "xlsx")]
        return load_workbook_xlsx(path);
        #[cfg(not(feature = "xlsx"))]
        anyhow::bail!("xlsx support disabled (feature `xlsx`)");
    }
    load_workbook_json(path)
}

// Cellule tableur → texte tel que le lirait un CSV (entiers sans `.0`, dates canoniques).
#[cfg(feature = "xlsx")]
fn cell_text(cell: &calamine::Data) -> String {
    use calamine::{Data, DataType};

    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => itoa::Buffer::new().format(*i).to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => {
            itoa::Buffer::new().format(*f as i64).to_string()
        }
        Data::DateTime(_) | Data::DateTimeIso(_) => cell
            .as_date()
            .map(crate::normalize::canonical)
            .unwrap_or_else(|| cell.to_string()),
        other => other.to_string(),
    }
}

/// Écrit sur disque via un fichier temporaire renommé : jamais de fichier partiel.
pub fn write_atomic(path: &Path, data: &[u8]) -> anyhow::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).with_context(|| "creating temp file")?;
    tmp.write_all(data)?;
    tmp.flush()?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)
        .with_context(|| format!("atomic rename to {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn csv_roundtrip_keeps_ragged_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("teachers.csv");
        fs::write(
            &path,
            "\u{feff}Name of Teacher,Day Off\nAlice,\"15-07-2025, 16-07-2025\"\nBob\n",
        )
        .unwrap();

        let table = read_table_csv(&path).unwrap();
        assert_eq!(table.columns, vec!["Name of Teacher", "Day Off"]);
        assert_eq!(table.cell(0, 1), "15-07-2025, 16-07-2025");
        assert_eq!(table.cell(1, 1), "");

        let out = dir.path().join("copy.csv");
        write_table_csv(&out, &table).unwrap();
        assert_eq!(read_table_csv(&out).unwrap(), table);
    }

    #[cfg(feature = "xlsx")]
    #[test]
    fn spreadsheet_cells_read_like_csv() {
        use calamine::Data;

        assert_eq!(cell_text(&Data::Empty), "");
        assert_eq!(cell_text(&Data::String("15-07-2025".into())), "15-07-2025");
        assert_eq!(cell_text(&Data::Int(3)), "3");
        assert_eq!(cell_text(&Data::Float(4.0)), "4");
        assert_eq!(cell_text(&Data::Float(2.5)), "2.5");
    }

    #[test]
    fn encoding_does_not_touch_disk() {
        let table = Table::new(["Name of Teacher", "Total Duties"]).with_row(["A", "1"]);
        let bytes = encode_table_csv(&table).unwrap();
        assert_eq!(bytes, b"Name of Teacher,Total Duties\nA,1\n");
    }

    #[test]
    fn workbook_json_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("input.json");
        let wb = crate::sample::sample_workbook();
        save_workbook_json(&path, &wb).unwrap();
        assert_eq!(load_workbook_json(&path).unwrap(), wb);
        assert_eq!(load_workbook(&path).unwrap(), wb);
    }
}
