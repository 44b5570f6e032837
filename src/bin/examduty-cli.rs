#![forbid(unsafe_code)]
use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use examduty::{
    allocator::{verify, AllocOptions, Allocator, NormalizationWarning, ViolationKind, DEFAULT_MARK},
    io,
    model::Workbook,
    normalize::{self, canonical},
    roster::DutyRoster,
    sample::sample_workbook,
};
use std::path::PathBuf;
#[cfg(feature = "logging")]
use tracing_subscriber::{fmt::Subscriber, EnvFilter};

/// Répartition des surveillances d'examens (sans base de données)
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Active les logs (feature `logging`, filtre via RUST_LOG)
    #[arg(long, global = true)]
    log: bool,

    #[command(subcommand)]
    cmd: Commands,
}

/// Source des deux feuilles : un classeur JSON ou deux CSV.
#[derive(Args, Debug)]
struct InputArgs {
    /// Classeur (.json ou .xlsx) contenant les feuilles `Teachers` et `Dates`
    #[arg(long, conflicts_with_all = ["teachers", "dates"])]
    workbook: Option<PathBuf>,
    /// CSV `Name of Teacher,Day Off`
    #[arg(long, requires = "dates")]
    teachers: Option<PathBuf>,
    /// CSV `Dates of Examinations,Required Invigilators`
    #[arg(long, requires = "teachers")]
    dates: Option<PathBuf>,
}

impl InputArgs {
    fn load(&self) -> Result<Workbook> {
        match (&self.workbook, &self.teachers, &self.dates) {
            (Some(path), _, _) => io::load_workbook(path),
            (None, Some(t), Some(d)) => io::load_workbook_csv(t, d),
            _ => bail!("either --workbook or both --teachers and --dates are required"),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Calculer le tableau de service
    Assign {
        #[command(flatten)]
        input: InputArgs,
        /// CSV de sortie
        #[arg(long)]
        out: PathBuf,
        /// Export JSON complet (roster, manques, avertissements)
        #[arg(long)]
        out_json: Option<PathBuf>,
        /// Graine du tirage (run reproductible)
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long, default_value = DEFAULT_MARK)]
        mark: String,
    },

    /// Vérifier un tableau de service (éventuellement retouché)
    Check {
        #[command(flatten)]
        input: InputArgs,
        /// CSV du tableau de service
        #[arg(long)]
        roster: PathBuf,
    },

    /// Écrire un jeu d'exemple à compléter
    Sample {
        #[arg(long, default_value = ".")]
        dir: PathBuf,
        /// Un seul classeur JSON au lieu de deux CSV
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    #[cfg(feature = "logging")]
    if cli.log {
        let _ = Subscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .try_init();
    }

    let code = match cli.cmd {
        Commands::Assign {
            input,
            out,
            out_json,
            seed,
            mark,
        } => {
            let workbook = input.load()?;
            let opts = AllocOptions { seed, mark };
            let allocation = Allocator::from_options(&opts)
                .run(&workbook)
                .context("allocation failed")?;

            // tout encoder avant d'écrire quoi que ce soit
            let csv = io::encode_table_csv(&allocation.roster.to_table(&opts.mark))?;
            let json = match out_json {
                Some(path) => Some((path, io::encode_allocation_json(&allocation)?)),
                None => None,
            };
            if let Some((path, data)) = &json {
                io::write_atomic(path, data)?;
            }
            io::write_atomic(&out, &csv)?;

            for w in &allocation.warnings {
                match w {
                    NormalizationWarning::UnparsableDayOff { row, teacher, value } => eprintln!(
                        "Warning: row {row}: day off {value:?} for {teacher} ignored (treated as available)"
                    ),
                }
            }
            for s in &allocation.shortfalls {
                eprintln!(
                    "Warning: {} needs {} invigilator(s), {} assigned",
                    canonical(s.date),
                    s.required,
                    s.assigned
                );
            }

            let summary = allocation.roster.summary();
            println!(
                "{} teacher(s) × {} date(s) | {} duties | min {} max {} spread {}",
                allocation.roster.rows.len(),
                allocation.roster.dates.len(),
                summary.total,
                summary.min,
                summary.max,
                summary.spread
            );

            // Code 2 = WARNING/INCOMPLETE
            if allocation.is_complete() {
                0
            } else {
                2
            }
        }
        Commands::Check { input, roster } => {
            let workbook = input.load()?;
            let normalized = normalize::from_workbook(&workbook)?;
            let roster = DutyRoster::from_table(&io::read_table_csv(&roster)?)?;

            let violations = verify(&roster, &normalized.teachers, &normalized.dates);
            if violations.is_empty() {
                println!("OK: no violations");
                0
            } else {
                eprintln!("Found {} violation(s)", violations.len());
                for v in &violations {
                    let kind = match v.kind {
                        ViolationKind::ExcludedDate => "excluded",
                        ViolationKind::ExemptAssigned => "exempt",
                        ViolationKind::OverCapacity => "capacity",
                        ViolationKind::TotalMismatch => "total",
                        ViolationKind::UnknownTeacher => "unknown-teacher",
                        ViolationKind::UnknownDate => "unknown-date",
                        ViolationKind::MissingTeacher => "missing-teacher",
                        ViolationKind::DuplicateTeacher => "duplicate-teacher",
                        ViolationKind::MissingDate => "missing-date",
                        ViolationKind::DuplicateDate => "duplicate-date",
                    };
                    eprintln!(
                        "{kind} | {} | {}",
                        v.teacher.as_deref().unwrap_or("-"),
                        v.detail
                    );
                }
                2
            }
        }
        Commands::Sample { dir, json } => {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("creating {}", dir.display()))?;
            let wb = sample_workbook();
            if json {
                let path = dir.join("sample_input.json");
                io::save_workbook_json(&path, &wb)?;
                println!("{}", path.display());
            } else {
                for (name, file) in [
                    (examduty::model::columns::TEACHERS_SHEET, "teachers.csv"),
                    (examduty::model::columns::DATES_SHEET, "dates.csv"),
                ] {
                    let table = wb.sheet(name).context("sample sheet")?;
                    let path = dir.join(file);
                    io::write_table_csv(&path, table)?;
                    println!("{}", path.display());
                }
            }
            0
        }
    };

    std::process::exit(code);
}
