mod assignment;
mod types;
mod verify;

pub use types::{
    AllocError, AllocOptions, DateParseError, NormalizationWarning, Shortfall, Violation,
    ViolationKind, DEFAULT_MARK,
};
pub use verify::verify;

use crate::model::{ExamDate, Teacher, Workbook};
use crate::normalize;
use crate::roster::DutyRoster;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Résultat complet d'un run : roster + créneaux non pourvus + anomalies tolérées.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Allocation {
    pub roster: DutyRoster,
    #[cfg_attr(feature = "serde", serde(default))]
    pub shortfalls: Vec<Shortfall>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub warnings: Vec<NormalizationWarning>,
}

impl Allocation {
    /// Vrai si tous les créneaux sont pourvus et aucune saisie n'a été ignorée.
    pub fn is_complete(&self) -> bool {
        self.shortfalls.is_empty() && self.warnings.is_empty()
    }
}

/// Allocateur glouton : possède sa propre source aléatoire (aucun état global).
#[derive(Debug)]
pub struct Allocator<R> {
    rng: R,
}

impl<R: Rng> Allocator<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Répartit les surveillances, journée par journée dans l'ordre fourni.
    pub fn allocate(&mut self, teachers: &[Teacher], dates: &[ExamDate]) -> Allocation {
        assignment::allocate(&mut self.rng, teachers, dates)
    }

    /// Normalise les deux feuilles puis alloue. Aucune sortie partielle en cas d'erreur.
    pub fn run(&mut self, workbook: &Workbook) -> Result<Allocation, AllocError> {
        let input = normalize::from_workbook(workbook)?;
        let mut allocation = self.allocate(&input.teachers, &input.dates);
        allocation.warnings = input.warnings;
        Ok(allocation)
    }
}

impl Allocator<StdRng> {
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_os_rng() -> Self {
        Self::new(StdRng::from_os_rng())
    }

    pub fn from_options(opts: &AllocOptions) -> Self {
        match opts.seed {
            Some(seed) => Self::seeded(seed),
            None => Self::from_os_rng(),
        }
    }
}

/// Point d'entrée direct : feuilles brutes → allocation.
pub fn assign_duties(workbook: &Workbook, opts: &AllocOptions) -> Result<Allocation, AllocError> {
    Allocator::from_options(opts).run(workbook)
}
