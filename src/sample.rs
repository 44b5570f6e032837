use crate::model::{columns, Table, Workbook};

/// Jeu d'exemple à compléter : six enseignants, quatre journées d'examen.
///
/// Couvre les formes de `Day Off` acceptées : date unique, cellule vide, jeton `na`.
pub fn sample_workbook() -> Workbook {
    let teachers = Table::new([columns::TEACHER_NAME, columns::DAY_OFF])
        .with_row(["Snehasis Banerjee", "15-07-2025"])
        .with_row(["Animesh", "16-07-2025"])
        .with_row(["Goutam Kr. Paul", "18-07-2025"])
        .with_row(["Sudip Bandopadhyay", "17-07-2025"])
        .with_row(["Arup", ""])
        .with_row(["Parnajyoti", "na"]);

    let dates = Table::new([columns::EXAM_DATE, columns::REQUIRED])
        .with_row(["15-07-2025", "3"])
        .with_row(["16-07-2025", "2"])
        .with_row(["18-07-2025", "4"])
        .with_row(["19-07-2025", "1"]);

    Workbook::new(teachers, dates)
}
