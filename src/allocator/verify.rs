use super::{Violation, ViolationKind};
use crate::model::{ExamDate, Teacher};
use crate::normalize::canonical;
use crate::roster::DutyRoster;
use std::collections::{HashMap, HashSet};

/// Revérifie les invariants d'un roster (calculé ou retouché à la main).
pub fn verify(roster: &DutyRoster, teachers: &[Teacher], dates: &[ExamDate]) -> Vec<Violation> {
    let mut out = Vec::new();

    let by_name: HashMap<&str, &Teacher> =
        teachers.iter().map(|t| (t.name.as_str(), t)).collect();

    let mut capacity: HashMap<_, u32> = HashMap::new();
    for exam in dates {
        *capacity.entry(exam.date).or_insert(0) += exam.required_count;
    }

    for date in &roster.dates {
        if !capacity.contains_key(date) {
            out.push(Violation {
                kind: ViolationKind::UnknownDate,
                teacher: None,
                date: Some(*date),
                detail: format!("{} is not an exam date", canonical(*date)),
            });
        }
    }

    for row in &roster.rows {
        let marked = row.marks.iter().filter(|m| **m).count() as u32;
        if marked != row.total {
            out.push(Violation {
                kind: ViolationKind::TotalMismatch,
                teacher: Some(row.name.clone()),
                date: None,
                detail: format!("total {} but {} marks", row.total, marked),
            });
        }

        let Some(teacher) = by_name.get(row.name.as_str()) else {
            out.push(Violation {
                kind: ViolationKind::UnknownTeacher,
                teacher: Some(row.name.clone()),
                date: None,
                detail: "not in teachers table".to_string(),
            });
            continue;
        };

        for date in roster.marked_dates(row) {
            if teacher.exempt {
                out.push(Violation {
                    kind: ViolationKind::ExemptAssigned,
                    teacher: Some(row.name.clone()),
                    date: Some(date),
                    detail: format!("exempt teacher on duty {}", canonical(date)),
                });
            } else if teacher.excluded_dates.contains(&date) {
                out.push(Violation {
                    kind: ViolationKind::ExcludedDate,
                    teacher: Some(row.name.clone()),
                    date: Some(date),
                    detail: format!("on duty on day off {}", canonical(date)),
                });
            }
        }
    }

    // Capacité : un nom répété ne compte qu'une fois par date.
    let mut seen = HashSet::new();
    for date in &roster.dates {
        if !seen.insert(*date) {
            continue;
        }
        let Some(required) = capacity.get(date) else {
            continue;
        };
        let assigned = roster.assigned_on(*date).len() as u32;
        if assigned > *required {
            out.push(Violation {
                kind: ViolationKind::OverCapacity,
                teacher: None,
                date: Some(*date),
                detail: format!("{assigned} on duty, {required} required"),
            });
        }
    }

    // Une ligne par ligne d'enseignant en entrée, une colonne par date d'examen.
    let mut expected_rows: Vec<(&str, usize)> = Vec::new();
    for t in teachers {
        match expected_rows.iter_mut().find(|(n, _)| *n == t.name) {
            Some((_, count)) => *count += 1,
            None => expected_rows.push((t.name.as_str(), 1)),
        }
    }
    for (name, expected) in expected_rows {
        let found = roster.rows.iter().filter(|r| r.name == name).count();
        if found < expected {
            out.push(Violation {
                kind: ViolationKind::MissingTeacher,
                teacher: Some(name.to_string()),
                date: None,
                detail: format!("{found} row(s), {expected} expected"),
            });
        } else if found > expected {
            out.push(Violation {
                kind: ViolationKind::DuplicateTeacher,
                teacher: Some(name.to_string()),
                date: None,
                detail: format!("{found} row(s), {expected} expected"),
            });
        }
    }

    let mut reported = HashSet::new();
    for exam in dates {
        if !roster.dates.contains(&exam.date) && reported.insert(exam.date) {
            out.push(Violation {
                kind: ViolationKind::MissingDate,
                teacher: None,
                date: Some(exam.date),
                detail: format!("no column for {}", canonical(exam.date)),
            });
        }
    }

    reported.clear();
    for (idx, date) in roster.dates.iter().enumerate() {
        if roster.dates[..idx].contains(date) && reported.insert(*date) {
            out.push(Violation {
                kind: ViolationKind::DuplicateDate,
                teacher: None,
                date: Some(*date),
                detail: format!("{} appears more than once", canonical(*date)),
            });
        }
    }

    out
}
