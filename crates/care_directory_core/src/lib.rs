pub mod availability;
pub mod domain;
pub mod filter;
pub mod geo;
pub mod page;
pub mod ports;
pub mod services;

pub use domain::{
    BulkUpdateOutcome, Cabinet, CabinetPatch, CabinetRef, District, Doctor, DoctorPatch,
    NewCabinet, NewDoctor, NewPharmacy, NewUser, Pharmacy, PharmacyPatch, Region, Role, Schedule,
    Speciality, User, UserCredentials,
};
pub use filter::{CabinetFilter, DoctorFilter, PharmacyFilter};
pub use geo::{distance_km, GeoPoint};
pub use page::{CabinetSort, DoctorSort, Page, PageRequest, PharmacySort, SortDirection};
pub use ports::{
    CabinetStore, Clock, DoctorStore, PharmacyStore, PortError, PortResult, UserStore,
};
