//! Application services: the operations the web layer exposes, written
//! against the ports only.

pub mod availability;
pub mod cabinet;
pub mod doctor;
pub mod pharmacy;

pub use availability::{rank_by_distance, AvailabilityQuery, AvailabilityQueryService, AvailabilityStrategy};
pub use cabinet::CabinetService;
pub use doctor::DoctorService;
pub use pharmacy::PharmacyService;
