use std::sync::Mutex;

use crate::{
    DirectoryError, DirectoryRepository, Doctor, DoctorLocation, Location, LocationFilter,
};

/// The three tables, guarded together so create-doctor's read-count-then-
/// append is a single critical section.
struct Tables {
    doctors: Vec<Doctor>,
    locations: Vec<Location>,
    doctor_locations: Vec<DoctorLocation>,
}

/// In-memory directory store standing in for relational tables.
///
/// Owns the collections explicitly instead of ambient globals, so tests can
/// run against fresh stores. Locations and join rows are fixed at
/// construction; only the doctor table is ever appended to.
pub struct InMemoryDirectory {
    inner: Mutex<Tables>,
}

impl InMemoryDirectory {
    /// Empty store. Mostly useful in tests.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Tables {
                doctors: Vec::new(),
                locations: Vec::new(),
                doctor_locations: Vec::new(),
            }),
        }
    }

    /// Store initialized with the fixed seed data: two doctors, two
    /// locations, and three join rows.
    pub fn seeded() -> Self {
        Self {
            inner: Mutex::new(Tables {
                doctors: vec![
                    Doctor {
                        id: 0,
                        first_name: "John".into(),
                        last_name: "Doe".into(),
                    },
                    Doctor {
                        id: 1,
                        first_name: "Jane".into(),
                        last_name: "Smith".into(),
                    },
                ],
                locations: vec![
                    Location {
                        id: 0,
                        address: "123 Main St".into(),
                    },
                    Location {
                        id: 1,
                        address: "456 Central St".into(),
                    },
                ],
                doctor_locations: vec![
                    DoctorLocation {
                        id: 0,
                        doctor_id: 0,
                        location_id: 0,
                    },
                    DoctorLocation {
                        id: 1,
                        doctor_id: 1,
                        location_id: 0,
                    },
                    DoctorLocation {
                        id: 2,
                        doctor_id: 1,
                        location_id: 1,
                    },
                ],
            }),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Tables>, DirectoryError> {
        self.inner
            .lock()
            .map_err(|_| DirectoryError::Store("mutex poisoned".into()))
    }
}

impl Default for InMemoryDirectory {
    fn default() -> Self {
        Self::seeded()
    }
}

impl DirectoryRepository for InMemoryDirectory {
    fn list_doctors(&self) -> Result<Vec<Doctor>, DirectoryError> {
        let tables = self.lock()?;
        Ok(tables.doctors.clone())
    }

    fn get_doctor(&self, doctor_id: i64) -> Result<Doctor, DirectoryError> {
        let tables = self.lock()?;
        if doctor_id < 0 || doctor_id as usize >= tables.doctors.len() {
            return Err(DirectoryError::NotFound);
        }
        // Ids are dense and never reused, so position doubles as id.
        Ok(tables.doctors[doctor_id as usize].clone())
    }

    fn create_doctor(&self, first_name: String, last_name: String) -> Result<u64, DirectoryError> {
        let mut tables = self.lock()?;
        // The id is simply the next index in the table; holding the lock
        // across count and append keeps ids dense under concurrent creates.
        let id = tables.doctors.len() as u64;
        tables.doctors.push(Doctor {
            id,
            first_name,
            last_name,
        });
        Ok(id)
    }

    fn doctor_locations(
        &self,
        doctor_id: i64,
        filter: LocationFilter,
    ) -> Result<Vec<Location>, DirectoryError> {
        let tables = self.lock()?;
        if doctor_id < 0 || doctor_id as usize >= tables.doctors.len() {
            return Err(DirectoryError::NotFound);
        }
        let doctor_id = doctor_id as u64;

        // Join locations via the doctor_locations table. Rows referencing a
        // missing location id are skipped; duplicates are kept as-is.
        Ok(tables
            .doctor_locations
            .iter()
            .filter(|row| filter.selects(row, doctor_id))
            .filter_map(|row| tables.locations.get(row.location_id as usize))
            .cloned()
            .collect())
    }
}
