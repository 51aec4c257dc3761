//! Domain library for the Doctor Directory.
//!
//! This crate holds the record types, the port (trait), and error
//! definitions, plus the in-memory adapter that stands in for the three
//! relational tables. Keep HTTP and IO concerns out of this crate.

use std::error::Error;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// A doctor record. `id` is dense and zero-based: it always equals the
/// record's position in insertion order, and is never reused or reassigned.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Doctor {
    pub id: u64,
    pub first_name: String,
    pub last_name: String,
}

/// A practice location. Seed data only; no mutation operation exists.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: u64,
    pub address: String,
}

/// A join-table row associating one doctor with one location.
///
/// `doctor_id` and `location_id` are expected to reference existing records
/// but this is not enforced; the seed data satisfies it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoctorLocation {
    pub id: u64,
    pub doctor_id: u64,
    pub location_id: u64,
}

/// Join-filter policy for resolving a doctor's locations.
///
/// The original service filtered join rows with `doctor_id != requested`,
/// collecting the locations of every doctor EXCEPT the one asked for. That
/// is almost certainly a defect relative to the endpoint's documented
/// purpose, but it is the observed wire behavior, so both interpretations
/// are kept as an explicit policy rather than silently picking one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LocationFilter {
    /// Observed behavior: exclude rows matching the requested doctor.
    Legacy,
    /// Intended behavior: include only rows matching the requested doctor.
    Matching,
}

impl LocationFilter {
    /// Whether a join row is selected for the requested doctor under this
    /// policy.
    pub fn selects(&self, row: &DoctorLocation, doctor_id: u64) -> bool {
        match self {
            LocationFilter::Legacy => row.doctor_id != doctor_id,
            LocationFilter::Matching => row.doctor_id == doctor_id,
        }
    }
}

/// Repository port for the directory tables.
///
/// Lookups take `i64` so out-of-range values (including negatives straight
/// from a path segment) flow into the same `NotFound` bound check instead of
/// failing earlier at parse time.
pub trait DirectoryRepository: Send + Sync {
    /// Full ordered doctor table.
    fn list_doctors(&self) -> Result<Vec<Doctor>, DirectoryError>;
    /// Doctor with the given id, or `NotFound` if outside `[0, count)`.
    fn get_doctor(&self, doctor_id: i64) -> Result<Doctor, DirectoryError>;
    /// Append a new doctor and return its assigned id. The count read and
    /// the append happen inside one critical section so ids stay dense
    /// under concurrent creates.
    fn create_doctor(&self, first_name: String, last_name: String) -> Result<u64, DirectoryError>;
    /// Locations joined to the given doctor under the filter policy, in
    /// join-row order. Duplicate locations are preserved.
    fn doctor_locations(
        &self,
        doctor_id: i64,
        filter: LocationFilter,
    ) -> Result<Vec<Location>, DirectoryError>;
}

/// Core domain errors (no external error crates to keep deps at zero).
#[derive(Debug)]
pub enum DirectoryError {
    NotFound,
    MissingField,
    Store(String),
}

impl Display for DirectoryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DirectoryError::NotFound => write!(f, "doctor not found"),
            DirectoryError::MissingField => write!(f, "missing required field"),
            DirectoryError::Store(msg) => write!(f, "store error: {}", msg),
        }
    }
}

impl Error for DirectoryError {}

pub mod adapters;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_filter_excludes_requested_doctor() {
        let row = DoctorLocation {
            id: 0,
            doctor_id: 1,
            location_id: 0,
        };
        assert!(LocationFilter::Legacy.selects(&row, 0));
        assert!(!LocationFilter::Legacy.selects(&row, 1));
    }

    #[test]
    fn matching_filter_selects_requested_doctor() {
        let row = DoctorLocation {
            id: 0,
            doctor_id: 1,
            location_id: 0,
        };
        assert!(LocationFilter::Matching.selects(&row, 1));
        assert!(!LocationFilter::Matching.selects(&row, 0));
    }

    #[test]
    fn error_display() {
        assert_eq!(DirectoryError::NotFound.to_string(), "doctor not found");
        assert_eq!(
            DirectoryError::Store("mutex poisoned".into()).to_string(),
            "store error: mutex poisoned"
        );
    }
}
