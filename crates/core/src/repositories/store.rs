//! In-memory record store.
//!
//! Every record kind lives in one [`Records`] value guarded by a single `RwLock`, so a read sees a
//! consistent snapshot across kinds and a write (for example a conflict check followed by an
//! insert) is atomic.

use crate::clinical::{BodyMap, Incident, Medication, Note, Seizure};
use crate::error::{CareError, CareResult};
use crate::geofence::VisitLocationLog;
use crate::ids::{AppointmentId, ClientId, NoteId, SeizureId, StaffId};
use crate::invoicing::InvoiceGroup;
use crate::model::{Appointment, Client, StaffMember};
use crate::validation::validate_window;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Initial records loaded at startup.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Seed {
    pub staff: Vec<StaffMember>,
    pub clients: Vec<Client>,
    pub appointments: Vec<Appointment>,
    pub invoice_groups: Vec<InvoiceGroup>,
}

impl Seed {
    /// Parses a seed document, reporting the JSON path of any schema mismatch.
    ///
    /// # Errors
    ///
    /// Returns [`CareError::SeedParse`] if the text is not a valid seed document.
    pub fn from_json(text: &str) -> CareResult<Self> {
        let mut deserializer = serde_json::Deserializer::from_str(text);
        serde_path_to_error::deserialize(&mut deserializer).map_err(|err| {
            let path = err.path().to_string();
            let path = if path.is_empty() || path == "." {
                "<root>".to_string()
            } else {
                path
            };
            CareError::SeedParse {
                path,
                message: err.into_inner().to_string(),
            }
        })
    }

    /// # Errors
    ///
    /// - [`CareError::SeedRead`] if the file cannot be read
    /// - [`CareError::SeedParse`] if its contents are not a valid seed document
    pub fn from_file(path: &Path) -> CareResult<Self> {
        let text = fs::read_to_string(path).map_err(CareError::SeedRead)?;
        Self::from_json(&text)
    }
}

/// Every stored record, keyed by id where records are looked up directly.
#[derive(Debug, Default)]
pub(crate) struct Records {
    pub(crate) staff: HashMap<StaffId, StaffMember>,
    pub(crate) clients: HashMap<ClientId, Client>,
    pub(crate) appointments: HashMap<AppointmentId, Appointment>,
    pub(crate) seizures: HashMap<SeizureId, Seizure>,
    pub(crate) incidents: Vec<Incident>,
    pub(crate) medications: Vec<Medication>,
    pub(crate) body_maps: Vec<BodyMap>,
    pub(crate) location_logs: Vec<VisitLocationLog>,
    pub(crate) notes: HashMap<NoteId, Note>,
    /// One invoice group per client.
    pub(crate) invoice_groups: HashMap<ClientId, InvoiceGroup>,
}

impl Records {
    pub(crate) fn appointment(&self, id: AppointmentId) -> CareResult<&Appointment> {
        self.appointments
            .get(&id)
            .ok_or(CareError::AppointmentNotFound(id))
    }

    pub(crate) fn client(&self, id: ClientId) -> CareResult<&Client> {
        self.clients.get(&id).ok_or(CareError::ClientNotFound(id))
    }

    pub(crate) fn note(&self, id: NoteId) -> CareResult<&Note> {
        self.notes.get(&id).ok_or(CareError::NoteNotFound(id))
    }

    pub(crate) fn appointment_list(&self) -> Vec<Appointment> {
        self.appointments.values().cloned().collect()
    }
}

#[derive(Debug, Default)]
pub struct CareStore {
    records: RwLock<Records>,
}

impl CareStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from seed records.
    ///
    /// # Errors
    ///
    /// - [`CareError::InvalidWindow`] if a seeded appointment ends before it starts
    /// - [`CareError::NegativeRate`] if a seeded invoice group has a negative rate
    pub fn from_seed(seed: Seed) -> CareResult<Self> {
        let store = Self::new();
        for staff in seed.staff {
            store.insert_staff(staff)?;
        }
        for client in seed.clients {
            store.insert_client(client)?;
        }
        for appointment in seed.appointments {
            store.insert_appointment(appointment)?;
        }
        for group in seed.invoice_groups {
            store.insert_invoice_group(group)?;
        }
        Ok(store)
    }

    pub(crate) fn read(&self) -> CareResult<RwLockReadGuard<'_, Records>> {
        self.records.read().map_err(|_| CareError::StorePoisoned)
    }

    pub(crate) fn write(&self) -> CareResult<RwLockWriteGuard<'_, Records>> {
        self.records.write().map_err(|_| CareError::StorePoisoned)
    }

    pub fn insert_staff(&self, staff: StaffMember) -> CareResult<()> {
        self.write()?.staff.insert(staff.id, staff);
        Ok(())
    }

    pub fn insert_client(&self, client: Client) -> CareResult<()> {
        self.write()?.clients.insert(client.id, client);
        Ok(())
    }

    /// Stores an appointment as-is, without conflict checks.
    ///
    /// # Errors
    ///
    /// Returns [`CareError::InvalidWindow`] if the appointment ends before it starts.
    pub fn insert_appointment(&self, appointment: Appointment) -> CareResult<()> {
        validate_window(appointment.start_time, appointment.end_time)?;
        self.write()?
            .appointments
            .insert(appointment.id, appointment);
        Ok(())
    }

    /// Stores the invoice group for a client, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`CareError::NegativeRate`] if the hourly rate is negative.
    pub fn insert_invoice_group(&self, group: InvoiceGroup) -> CareResult<()> {
        group.validate()?;
        self.write()?.invoice_groups.insert(group.client, group);
        Ok(())
    }

    pub fn staff_member(&self, id: StaffId) -> CareResult<StaffMember> {
        self.read()?
            .staff
            .get(&id)
            .cloned()
            .ok_or(CareError::StaffNotFound(id))
    }

    pub fn client(&self, id: ClientId) -> CareResult<Client> {
        self.read()?.client(id).cloned()
    }

    pub fn appointment(&self, id: AppointmentId) -> CareResult<Appointment> {
        self.read()?.appointment(id).cloned()
    }

    pub fn appointments(&self) -> CareResult<Vec<Appointment>> {
        Ok(self.read()?.appointment_list())
    }

    /// Applies `change` to the freshest stored copy of an appointment.
    ///
    /// `change` runs on a clone while the write lock is held; the clone replaces the stored record
    /// only if `change` succeeds, so a rejected operation leaves the record untouched.
    pub fn update_appointment<T>(
        &self,
        id: AppointmentId,
        change: impl FnOnce(&mut Appointment) -> CareResult<T>,
    ) -> CareResult<(Appointment, T)> {
        let mut records = self.write()?;
        let mut candidate = records.appointment(id)?.clone();
        let out = change(&mut candidate)?;
        records.appointments.insert(id, candidate.clone());
        Ok((candidate, out))
    }

    /// Same as [`CareStore::update_appointment`] for seizure episodes; `change` also sees the
    /// other records so it can check the owning appointment.
    pub(crate) fn update_seizure(
        &self,
        id: SeizureId,
        change: impl FnOnce(&mut Seizure, &Records) -> CareResult<()>,
    ) -> CareResult<Seizure> {
        let mut records = self.write()?;
        let mut candidate = records
            .seizures
            .get(&id)
            .cloned()
            .ok_or(CareError::SeizureNotFound(id))?;
        change(&mut candidate, &*records)?;
        records.seizures.insert(id, candidate.clone());
        Ok(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AppointmentStatus;
    use std::io::Write;

    const SEED: &str = r#"{
        "staff": [
            {"id": "6f1c0b9e-3a51-4a8e-9a57-0f1a3c1e2d40", "first_name": "Grace",
             "last_name": "Hopper", "role": "nurse"}
        ],
        "clients": [
            {"id": "0a9f4f63-6d0d-4c5e-9d6e-4b2b8b7c1a11", "first_name": "Ada",
             "last_name": "Lovelace", "address": "1 Test Street",
             "latitude": 51.5074, "longitude": -0.1278,
             "care_checklist": ["hygiene", "nutrition"]}
        ],
        "appointments": [
            {"id": "c3b0a2de-1c7b-4c43-8f5e-2a3d5c6b7e81", "title": "Morning visit",
             "client": "0a9f4f63-6d0d-4c5e-9d6e-4b2b8b7c1a11",
             "assigned_staff": "6f1c0b9e-3a51-4a8e-9a57-0f1a3c1e2d40",
             "start_time": "2026-03-10T09:00:00Z", "end_time": "2026-03-10T10:00:00Z"}
        ],
        "invoice_groups": [
            {"name": "Ada care", "client": "0a9f4f63-6d0d-4c5e-9d6e-4b2b8b7c1a11",
             "rate_per_hour": 18.5}
        ]
    }"#;

    #[test]
    fn loads_seed_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(SEED.as_bytes()).expect("write seed");

        let seed = Seed::from_file(file.path()).expect("parse seed");
        let store = CareStore::from_seed(seed).expect("build store");

        let appointments = store.appointments().unwrap();
        assert_eq!(appointments.len(), 1);
        assert_eq!(appointments[0].status, AppointmentStatus::Scheduled);
        let client = store.client(appointments[0].client).unwrap();
        assert_eq!(client.care_checklist.len(), 2);
        assert!(store.staff_member(appointments[0].assigned_staff).is_ok());
    }

    #[test]
    fn seed_mismatch_reports_path() {
        let text = r#"{"clients": [{"first_name": "Ada", "last_name": "L", "address": "x",
                       "care_checklist": ["flying"]}]}"#;
        let err = Seed::from_json(text).unwrap_err();
        match err {
            CareError::SeedParse { path, .. } => assert_eq!(path, "clients[0].care_checklist[0]"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn missing_seed_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Seed::from_file(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, CareError::SeedRead(_)));
    }

    #[test]
    fn seed_with_negative_rate_is_rejected() {
        let text = r#"{"invoice_groups": [{"name": "x",
            "client": "0a9f4f63-6d0d-4c5e-9d6e-4b2b8b7c1a11", "rate_per_hour": -2}]}"#;
        let seed = Seed::from_json(text).unwrap();
        assert!(matches!(
            CareStore::from_seed(seed),
            Err(CareError::NegativeRate(_))
        ));
    }

    #[test]
    fn rejected_update_leaves_record_untouched() {
        let store = CareStore::from_seed(Seed::from_json(SEED).unwrap()).unwrap();
        let id = store.appointments().unwrap()[0].id;

        let result: CareResult<(Appointment, ())> = store.update_appointment(id, |a| {
            a.status = AppointmentStatus::Cancelled;
            Err(CareError::NotStarted)
        });
        assert!(result.is_err());
        assert_eq!(
            store.appointment(id).unwrap().status,
            AppointmentStatus::Scheduled
        );
    }

    #[test]
    fn unknown_appointment_is_not_found() {
        let store = CareStore::new();
        let id = AppointmentId::new();
        assert!(matches!(
            store.appointment(id),
            Err(CareError::AppointmentNotFound(missing)) if missing == id
        ));
    }
}
