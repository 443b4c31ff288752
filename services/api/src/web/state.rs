//! services/api/src/web/state.rs
//!
//! Defines the application state shared by every request handler.

use std::sync::Arc;

use care_directory_core::ports::UserStore;
use care_directory_core::services::{
    AvailabilityQueryService, CabinetService, DoctorService, PharmacyService,
};

use crate::config::Config;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub users: Arc<dyn UserStore>,
    pub availability: AvailabilityQueryService,
    pub pharmacies: PharmacyService,
    pub cabinets: CabinetService,
    pub doctors: DoctorService,
}
