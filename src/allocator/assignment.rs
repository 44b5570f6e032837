use super::{Allocation, Shortfall};
use crate::model::{ExamDate, Teacher};
use crate::normalize::canonical;
use crate::roster::{DutyRoster, RosterRow};
use chrono::NaiveDate;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::{HashMap, HashSet};

pub(super) fn allocate<R: Rng + ?Sized>(
    rng: &mut R,
    teachers: &[Teacher],
    dates: &[ExamDate],
) -> Allocation {
    // Dernière ligne gagnante pour un nom répété ; ordre de première apparition conservé.
    let mut by_name: HashMap<&str, &Teacher> = HashMap::with_capacity(teachers.len());
    let mut names: Vec<&str> = Vec::with_capacity(teachers.len());
    for t in teachers {
        if by_name.insert(t.name.as_str(), t).is_none() {
            names.push(t.name.as_str());
        }
    }

    let mut duty_count: HashMap<&str, u32> = names.iter().map(|n| (*n, 0)).collect();
    let mut on_duty: HashSet<(&str, NaiveDate)> = HashSet::new();
    let mut shortfalls = Vec::new();

    for exam in dates {
        let mut eligible: Vec<&str> = names
            .iter()
            .copied()
            .filter(|n| by_name[n].is_available_on(exam.date) && !on_duty.contains(&(*n, exam.date)))
            .collect();

        // Mélange puis tri stable : hasard entre ex-aequo, moins chargés d'abord.
        eligible.shuffle(rng);
        eligible.sort_by_key(|n| duty_count[n]);

        let take = eligible.len().min(exam.required_count as usize);
        for name in &eligible[..take] {
            on_duty.insert((*name, exam.date));
            if let Some(count) = duty_count.get_mut(name) {
                *count += 1;
            }
        }

        tracing::debug!(
            date = %canonical(exam.date),
            required = exam.required_count,
            eligible = eligible.len(),
            assigned = take,
            "exam date processed"
        );

        let assigned = take as u32;
        if assigned < exam.required_count {
            shortfalls.push(Shortfall {
                date: exam.date,
                required: exam.required_count,
                assigned,
            });
        }
    }

    let mut columns: Vec<NaiveDate> = Vec::with_capacity(dates.len());
    for exam in dates {
        if !columns.contains(&exam.date) {
            columns.push(exam.date);
        }
    }

    let rows = teachers
        .iter()
        .map(|t| {
            let marks: Vec<bool> = columns
                .iter()
                .map(|d| on_duty.contains(&(t.name.as_str(), *d)))
                .collect();
            RosterRow::new(t.name.clone(), marks)
        })
        .collect();

    Allocation {
        roster: DutyRoster::new(columns, rows),
        shortfalls,
        warnings: Vec::new(),
    }
}
