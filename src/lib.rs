#![forbid(unsafe_code)]
//! Examduty — répartition des surveillances d'examens entre enseignants (sans BD).
//!
//! - Entrée : deux tables (enseignants + jours d'indisponibilité, dates + effectifs requis).
//! - Affectation gloutonne, journée par journée : moins chargés d'abord, hasard entre ex-aequo.
//! - Sortie : une table enseignants × dates avec marques et total des surveillances.
//! - Source aléatoire explicite : un run à graine fixe est reproductible.

pub mod allocator;
#[cfg(feature = "serde")]
pub mod io;
pub mod model;
pub mod normalize;
pub mod roster;
pub mod sample;

pub use allocator::{
    assign_duties, verify, AllocError, AllocOptions, Allocation, Allocator, DateParseError,
    NormalizationWarning, Shortfall, Violation, ViolationKind,
};
pub use model::{ExamDate, Table, Teacher, Workbook};
pub use roster::{DutyRoster, LoadSummary, RosterRow};
