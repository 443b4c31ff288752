//! crates/care_directory_core/src/ports.rs
//!
//! Defines the service contracts (traits) the core depends on.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the record store, the clock and the web layer.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};

use crate::domain::{
    Cabinet, Doctor, NewCabinet, NewDoctor, NewPharmacy, NewUser, Pharmacy, User, UserCredentials,
};
use crate::filter::{CabinetFilter, DoctorFilter, PharmacyFilter};
use crate::page::{CabinetSort, DoctorSort, Page, PageRequest, PharmacySort};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// The error type shared by all port and service operations.
///
/// `NotFound` and `Conflict` are distinct outcomes callers render differently,
/// so adapters must never fold them into `Unexpected`.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Clock
//=========================================================================================

/// Source of the current local wall-clock time.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

//=========================================================================================
// Record Stores
//=========================================================================================

#[async_trait]
pub trait PharmacyStore: Send + Sync {
    /// Filtered, sorted and sliced retrieval in one round trip.
    async fn find_page(
        &self,
        filter: &PharmacyFilter,
        page: &PageRequest<PharmacySort>,
    ) -> PortResult<Page<Pharmacy>>;

    /// Every record matching the filter, in a stable store order (ascending id).
    async fn find_all(&self, filter: &PharmacyFilter) -> PortResult<Vec<Pharmacy>>;

    async fn find_by_id(&self, id: i64) -> PortResult<Pharmacy>;

    async fn exists_by_location(&self, longitude: f64, latitude: f64) -> PortResult<bool>;

    async fn exists_by_name_and_location(
        &self,
        name: &str,
        longitude: f64,
        latitude: f64,
    ) -> PortResult<bool>;

    async fn insert(&self, pharmacy: NewPharmacy) -> PortResult<Pharmacy>;

    /// Persists every stored field of `pharmacy` under its id.
    async fn update(&self, pharmacy: &Pharmacy) -> PortResult<Pharmacy>;

    /// Sets the open-tonight flag on all listed ids atomically and returns the
    /// number of rows changed.
    async fn update_open_tonight_bulk(&self, ids: &[i64], open_tonight: bool) -> PortResult<u64>;

    async fn delete(&self, id: i64) -> PortResult<()>;
}

#[async_trait]
pub trait CabinetStore: Send + Sync {
    async fn find_page(
        &self,
        filter: &CabinetFilter,
        page: &PageRequest<CabinetSort>,
    ) -> PortResult<Page<Cabinet>>;

    async fn find_by_id(&self, id: i64) -> PortResult<Cabinet>;

    async fn exists_by_location(&self, longitude: f64, latitude: f64) -> PortResult<bool>;

    async fn exists_by_name_and_location(
        &self,
        name: &str,
        longitude: f64,
        latitude: f64,
    ) -> PortResult<bool>;

    async fn insert(&self, cabinet: NewCabinet) -> PortResult<Cabinet>;

    async fn update(&self, cabinet: &Cabinet) -> PortResult<Cabinet>;

    /// Removes the cabinet together with all of its doctors.
    async fn delete(&self, id: i64) -> PortResult<()>;
}

#[async_trait]
pub trait DoctorStore: Send + Sync {
    async fn find_page(
        &self,
        filter: &DoctorFilter,
        page: &PageRequest<DoctorSort>,
    ) -> PortResult<Page<Doctor>>;

    async fn find_by_id(&self, id: i64) -> PortResult<Doctor>;

    async fn find_by_cabinet(&self, cabinet_id: i64) -> PortResult<Vec<Doctor>>;

    async fn exists_by_name_and_cabinet(&self, name: &str, cabinet_id: i64) -> PortResult<bool>;

    async fn insert(&self, doctor: NewDoctor) -> PortResult<Doctor>;

    /// Persists name, speciality, schedule and the cabinet id of `doctor.cabinet`.
    async fn update(&self, doctor: &Doctor) -> PortResult<Doctor>;

    async fn delete(&self, id: i64) -> PortResult<()>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create_user(&self, user: NewUser) -> PortResult<User>;

    async fn get_user_by_username(&self, username: &str) -> PortResult<UserCredentials>;

    async fn create_auth_session(
        &self,
        token: &str,
        user_id: i64,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    /// Resolves a live (unexpired) token to its user, `Unauthorized` otherwise.
    async fn validate_auth_session(&self, token: &str) -> PortResult<User>;

    async fn delete_auth_session(&self, token: &str) -> PortResult<()>;
}
