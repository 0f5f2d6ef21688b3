use care_core::checklist::completion_percentage;
use care_core::clinical::{total_daily_dose, BodyMap, Frequency, Incident, Medication, Seizure};
use care_core::geofence::haversine_meters;
use care_core::scheduling::{find_conflicts, windows_overlap};
use care_core::validation::validate_window;
use care_core::{Appointment, AppointmentStatus, ChecklistItem, StaffId, Validate};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use serde::de::DeserializeOwned;
use std::collections::BTreeSet;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

type CliResult<T> = Result<T, Box<dyn Error>>;

#[derive(Parser)]
#[command(name = "care")]
#[command(about = "Care visit record checks")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum RecordKind {
    Seizure,
    Incident,
    Medication,
    BodyMap,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a clinical record stored as JSON
    Validate {
        /// Kind of record in the file
        #[arg(value_enum)]
        kind: RecordKind,
        /// JSON file holding one record
        file: PathBuf,
    },
    /// Total daily dose in mg for a dose and frequency
    DailyDose {
        /// Dose per administration in mg
        dose: f64,
        /// Frequency, e.g. twice_daily or every_6_hours
        frequency: String,
    },
    /// Great-circle distance in metres between two points
    Distance {
        #[arg(allow_negative_numbers = true)]
        lat1: f64,
        #[arg(allow_negative_numbers = true)]
        lon1: f64,
        #[arg(allow_negative_numbers = true)]
        lat2: f64,
        #[arg(allow_negative_numbers = true)]
        lon2: f64,
    },
    /// Checklist completion percentage
    Completion {
        /// Required items (comma-separated)
        required: String,
        /// Completed items (comma-separated)
        completed: String,
    },
    /// List appointments overlapping a window
    Conflicts {
        /// JSON file holding an array of appointments
        appointments: PathBuf,
        /// Window start (RFC 3339)
        start: DateTime<Utc>,
        /// Window end (RFC 3339)
        end: DateTime<Utc>,
        /// Only consider appointments assigned to this staff member
        #[arg(long)]
        staff: Option<StaffId>,
    },
}

fn read_json<T: DeserializeOwned>(path: &Path) -> CliResult<T> {
    let text = fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    let mut deserializer = serde_json::Deserializer::from_str(&text);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|err| {
        let path = err.path().to_string();
        let path = if path.is_empty() || path == "." {
            "<root>".to_string()
        } else {
            path
        };
        format!("schema mismatch at {path}: {}", err.into_inner()).into()
    })
}

fn validate_record(kind: RecordKind, file: &Path) -> CliResult<Vec<String>> {
    let errors = match kind {
        RecordKind::Seizure => read_json::<Seizure>(file)?.validate(),
        RecordKind::Incident => read_json::<Incident>(file)?.validate(),
        RecordKind::Medication => read_json::<Medication>(file)?.validate(),
        RecordKind::BodyMap => read_json::<BodyMap>(file)?.validate(),
    };
    Ok(errors
        .iter()
        .map(|e| format!("{}: {e}", e.field()))
        .collect())
}

fn parse_items(list: &str) -> CliResult<Vec<ChecklistItem>> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<ChecklistItem>().map_err(Into::into))
        .collect()
}

fn completion(required: &str, completed: &str) -> CliResult<f64> {
    let required = parse_items(required)?;
    let completed: BTreeSet<ChecklistItem> = parse_items(completed)?.into_iter().collect();
    Ok(completion_percentage(&required, &completed))
}

/// Appointments overlapping `[start, end)`. Cancelled appointments never overlap.
fn conflicts(
    appointments: &[Appointment],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    staff: Option<StaffId>,
) -> CliResult<Vec<Appointment>> {
    let ids = match staff {
        Some(staff) => find_conflicts(None, staff, (start, end), appointments)?,
        None => {
            validate_window(start, end)?;
            appointments
                .iter()
                .filter(|a| a.status != AppointmentStatus::Cancelled)
                .filter(|a| windows_overlap((start, end), a.window()))
                .map(|a| a.id)
                .collect()
        }
    };
    Ok(appointments
        .iter()
        .filter(|a| ids.contains(&a.id))
        .cloned()
        .collect())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Validate { kind, file }) => {
            let errors = validate_record(kind, &file)?;
            if errors.is_empty() {
                println!("valid");
            } else {
                for error in &errors {
                    println!("{error}");
                }
                std::process::exit(1);
            }
        }
        Some(Commands::DailyDose { dose, frequency }) => {
            let frequency: Frequency = frequency.parse()?;
            match total_daily_dose(dose, frequency) {
                Some(total) => println!("{total} mg"),
                None => println!("not applicable for {frequency}"),
            }
        }
        Some(Commands::Distance {
            lat1,
            lon1,
            lat2,
            lon2,
        }) => {
            println!("{:.1} m", haversine_meters(lat1, lon1, lat2, lon2));
        }
        Some(Commands::Completion {
            required,
            completed,
        }) => {
            println!("{:.1}%", completion(&required, &completed)?);
        }
        Some(Commands::Conflicts {
            appointments,
            start,
            end,
            staff,
        }) => {
            let appointments: Vec<Appointment> = read_json(&appointments)?;
            let found = conflicts(&appointments, start, end, staff)?;
            if found.is_empty() {
                println!("No conflicts.");
            } else {
                for a in found {
                    println!(
                        "{} {} {} - {} (staff {})",
                        a.id, a.title, a.start_time, a.end_time, a.assigned_staff
                    );
                }
            }
        }
        None => {
            println!("Use --help to see available commands");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Write;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, h, m, 0).unwrap()
    }

    fn write_temp(text: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        file
    }

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["care", "distance", "51.5", "-0.12", "48.85", "2.35"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Distance { lon1, .. }) if lon1 == -0.12
        ));

        let cli = Cli::try_parse_from(["care", "validate", "body-map", "x.json"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Validate { kind: RecordKind::BodyMap, .. })
        ));
    }

    #[test]
    fn validate_reports_every_field_error() {
        let file = write_temp(
            r#"{"appointment": "c3b0a2de-1c7b-4c43-8f5e-2a3d5c6b7e81", "name": "Ibuprofen",
                "strength": 200, "dose": 400, "frequency": "once_daily", "route": "oral"}"#,
        );
        let errors = validate_record(RecordKind::Medication, file.path()).unwrap();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("dose:"));
    }

    #[test]
    fn validate_accepts_open_seizure() {
        let file = write_temp(
            r#"{"appointment": "c3b0a2de-1c7b-4c43-8f5e-2a3d5c6b7e81",
                "start_time": "2026-03-10T09:15:00Z"}"#,
        );
        assert!(validate_record(RecordKind::Seizure, file.path())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn schema_mismatch_names_the_path() {
        let file = write_temp(r#"{"appointment": "c3b0a2de-1c7b-4c43-8f5e-2a3d5c6b7e81", "start_time": 5}"#);
        let err = validate_record(RecordKind::Seizure, file.path()).unwrap_err();
        assert!(err.to_string().contains("start_time"));
    }

    #[test]
    fn completion_uses_required_items_only() {
        assert_eq!(
            completion("hygiene, nutrition", "hygiene,mobility").unwrap(),
            50.0
        );
        assert_eq!(completion("", "hygiene").unwrap(), 0.0);
        assert!(completion("hygiene", "flying").is_err());
    }

    #[test]
    fn conflicts_filter_by_staff_and_skip_cancelled() {
        let nurse = StaffId::new();
        let file = write_temp(&format!(
            r#"[
                {{"title": "A", "client": "0a9f4f63-6d0d-4c5e-9d6e-4b2b8b7c1a11",
                  "assigned_staff": "{nurse}",
                  "start_time": "2026-03-10T09:00:00Z", "end_time": "2026-03-10T10:00:00Z"}},
                {{"title": "B", "client": "0a9f4f63-6d0d-4c5e-9d6e-4b2b8b7c1a11",
                  "assigned_staff": "{nurse}", "status": "cancelled",
                  "start_time": "2026-03-10T09:00:00Z", "end_time": "2026-03-10T10:00:00Z"}},
                {{"title": "C", "client": "0a9f4f63-6d0d-4c5e-9d6e-4b2b8b7c1a11",
                  "assigned_staff": "{other}",
                  "start_time": "2026-03-10T09:30:00Z", "end_time": "2026-03-10T10:30:00Z"}}
            ]"#,
            other = StaffId::new()
        ));
        let appointments: Vec<Appointment> = read_json(file.path()).unwrap();

        let mine = conflicts(&appointments, at(9, 45), at(11, 0), Some(nurse)).unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].title.as_str(), "A");

        let all = conflicts(&appointments, at(9, 45), at(11, 0), None).unwrap();
        assert_eq!(all.len(), 2);

        assert!(conflicts(&appointments, at(10, 0), at(11, 0), Some(nurse))
            .unwrap()
            .is_empty());
        assert!(conflicts(&appointments, at(11, 0), at(10, 0), None).is_err());
    }
}
