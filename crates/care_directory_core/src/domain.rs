//! crates/care_directory_core/src/domain.rs
//!
//! Defines the pure, core data structures for the directory: pharmacies,
//! medical cabinets, doctors and the users allowed to curate them.
//! These structs are independent of any database or serialization format.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::geo::GeoPoint;
use crate::ports::{PortError, PortResult};

//=========================================================================================
// Closed Enumerations
//=========================================================================================

/// Declares a closed enumeration whose canonical text form is SCREAMING_SNAKE_CASE.
/// Parsing is case-insensitive and rejects anything outside the declared labels.
macro_rules! labelled_enum {
    ($(#[$meta:meta])* $name:ident, $kind:literal { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = PortError;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                let wanted = raw.trim();
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(wanted))
                    .ok_or_else(|| PortError::InvalidInput(format!("unknown {}: '{}'", $kind, raw)))
            }
        }
    };
}

labelled_enum!(
    /// Top-level administrative region (wilaya).
    Region, "region" {
        Adrar => "ADRAR",
        Assaba => "ASSABA",
        Brakna => "BRAKNA",
        DakhletNouadhibou => "DAKHLET_NOUADHIBOU",
        Gorgol => "GORGOL",
        Guidimaka => "GUIDIMAKA",
        HodhEchChargui => "HODH_ECH_CHARGUI",
        HodhElGharbi => "HODH_EL_GHARBI",
        Inchiri => "INCHIRI",
        NouakchottNord => "NOUAKCHOTT_NORD",
        NouakchottOuest => "NOUAKCHOTT_OUEST",
        NouakchottSud => "NOUAKCHOTT_SUD",
        Tagant => "TAGANT",
        TirisZemmour => "TIRIS_ZEMMOUR",
        Trarza => "TRARZA",
    }
);

labelled_enum!(
    /// Administrative district (moughataa) nested inside a region.
    District, "district" {
        Aoujeft => "AOUJEFT",
        Atar => "ATAR",
        Chinguetti => "CHINGUETTI",
        Ouadane => "OUADANE",
        Barkeol => "BARKEOL",
        Boumdeid => "BOUMDEID",
        Guerou => "GUEROU",
        Kankossa => "KANKOSSA",
        Kiffa => "KIFFA",
        Aleg => "ALEG",
        Bababe => "BABABE",
        Boghe => "BOGHE",
        MagtaLahjar => "MAGTA_LAHJAR",
        Mbagne => "MBAGNE",
        Male => "MALE",
        Nouadhibou => "NOUADHIBOU",
        Chami => "CHAMI",
        Kaedi => "KAEDI",
        Mbout => "MBOUT",
        Maghama => "MAGHAMA",
        Monguel => "MONGUEL",
        Lexeiba => "LEXEIBA",
        Selibaby => "SELIBABY",
        OuldYenge => "OULD_YENGE",
        Ghabou => "GHABOU",
        Wompou => "WOMPOU",
        Amourj => "AMOURJ",
        Bassikounou => "BASSIKOUNOU",
        Djiguenni => "DJIGUENNI",
        Nema => "NEMA",
        Oualata => "OUALATA",
        Timbedra => "TIMBEDRA",
        AdelBagrou => "ADEL_BAGROU",
        NbeiketLahwach => "NBEIKET_LAHWACH",
        Aioun => "AIOUN",
        Kobenni => "KOBENNI",
        Tamchekett => "TAMCHEKETT",
        Tintane => "TINTANE",
        Touil => "TOUIL",
        Akjoujt => "AKJOUJT",
        Benichab => "BENICHAB",
        DarNaim => "DAR_NAIM",
        Teyarett => "TEYARETT",
        Toujounine => "TOUJOUNINE",
        Ksar => "KSAR",
        Sebkha => "SEBKHA",
        TevraghZeina => "TEVRAGH_ZEINA",
        Arafat => "ARAFAT",
        ElMina => "EL_MINA",
        Riyad => "RIYAD",
        Moudjeria => "MOUDJERIA",
        Tichitt => "TICHITT",
        Tidjikja => "TIDJIKJA",
        BirMoghrein => "BIR_MOGHREIN",
        Fderik => "FDERIK",
        Zouerate => "ZOUERATE",
        Boutilimit => "BOUTILIMIT",
        KeurMacene => "KEUR_MACENE",
        Mederdra => "MEDERDRA",
        OuadNaga => "OUAD_NAGA",
        Rkiz => "RKIZ",
        Rosso => "ROSSO",
        Tekane => "TEKANE",
    }
);

labelled_enum!(
    /// Medical speciality of a doctor.
    Speciality, "speciality" {
        GeneralPractice => "GENERAL_PRACTICE",
        Cardiology => "CARDIOLOGY",
        Dermatology => "DERMATOLOGY",
        Dentistry => "DENTISTRY",
        Endocrinology => "ENDOCRINOLOGY",
        Gastroenterology => "GASTROENTEROLOGY",
        Gynecology => "GYNECOLOGY",
        Neurology => "NEUROLOGY",
        Ophthalmology => "OPHTHALMOLOGY",
        Orthopedics => "ORTHOPEDICS",
        Otolaryngology => "OTOLARYNGOLOGY",
        Pediatrics => "PEDIATRICS",
        Psychiatry => "PSYCHIATRY",
        Pulmonology => "PULMONOLOGY",
        Radiology => "RADIOLOGY",
        Urology => "UROLOGY",
    }
);

labelled_enum!(
    /// Role granted to a directory user. Only admins may mutate records.
    Role, "role" {
        Admin => "ADMIN",
    }
);

//=========================================================================================
// Input Validation Helpers
//=========================================================================================

fn require_name(field: &str, value: &str) -> PortResult<()> {
    if value.trim().is_empty() {
        return Err(PortError::InvalidInput(format!("{} cannot be null or empty", field)));
    }
    Ok(())
}

fn require_coordinates(longitude: f64, latitude: f64) -> PortResult<()> {
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err(PortError::InvalidInput(format!(
            "longitude must be within [-180, 180], got {}",
            longitude
        )));
    }
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err(PortError::InvalidInput(format!(
            "latitude must be within [-90, 90], got {}",
            latitude
        )));
    }
    Ok(())
}

//=========================================================================================
// Pharmacy
//=========================================================================================

/// A pharmacy as stored in the directory.
#[derive(Debug, Clone, PartialEq)]
pub struct Pharmacy {
    pub id: i64,
    pub name: String,
    pub longitude: f64,
    pub latitude: f64,
    pub region: Region,
    pub district: District,
    pub image: Option<String>,
    pub open_tonight: bool,
    /// Computed per request by proximity queries; never persisted.
    pub distance_km: Option<f64>,
}

impl Pharmacy {
    pub fn location(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

/// Validated input used to create a pharmacy.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPharmacy {
    pub name: String,
    pub longitude: f64,
    pub latitude: f64,
    pub region: Region,
    pub district: District,
    pub image: Option<String>,
    pub open_tonight: bool,
}

impl NewPharmacy {
    pub fn validate(&self) -> PortResult<()> {
        require_name("name", &self.name)?;
        require_coordinates(self.longitude, self.latitude)
    }
}

/// Field-by-field update of a pharmacy.
///
/// `Some` overwrites, `None` leaves the stored value untouched. The open-tonight
/// flag is not optional: every update carries it and always applies it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PharmacyPatch {
    pub name: Option<String>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub region: Option<Region>,
    pub district: Option<District>,
    pub image: Option<String>,
    pub open_tonight: bool,
}

impl PharmacyPatch {
    pub fn apply_to(&self, pharmacy: &mut Pharmacy) -> PortResult<()> {
        if let Some(name) = &self.name {
            require_name("name", name)?;
            pharmacy.name = name.clone();
        }
        if let Some(region) = self.region {
            pharmacy.region = region;
        }
        if let Some(district) = self.district {
            pharmacy.district = district;
        }
        if let Some(image) = &self.image {
            pharmacy.image = Some(image.clone());
        }
        pharmacy.open_tonight = self.open_tonight;
        if let Some(longitude) = self.longitude {
            pharmacy.longitude = longitude;
        }
        if let Some(latitude) = self.latitude {
            pharmacy.latitude = latitude;
        }
        require_coordinates(pharmacy.longitude, pharmacy.latitude)
    }
}

/// Result of flipping the open-tonight flag on a batch of pharmacies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkUpdateOutcome {
    Updated(u64),
    NothingUpdated,
}

//=========================================================================================
// Cabinet
//=========================================================================================

/// A medical cabinet hosting one or more doctors.
#[derive(Debug, Clone, PartialEq)]
pub struct Cabinet {
    pub id: i64,
    pub name: String,
    pub region: Region,
    pub district: District,
    pub longitude: f64,
    pub latitude: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewCabinet {
    pub name: String,
    pub region: Region,
    pub district: District,
    pub longitude: f64,
    pub latitude: f64,
}

impl NewCabinet {
    pub fn validate(&self) -> PortResult<()> {
        require_name("name", &self.name)?;
        require_coordinates(self.longitude, self.latitude)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CabinetPatch {
    pub name: Option<String>,
    pub region: Option<Region>,
    pub district: Option<District>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
}

impl CabinetPatch {
    pub fn apply_to(&self, cabinet: &mut Cabinet) -> PortResult<()> {
        if let Some(name) = &self.name {
            require_name("name", name)?;
            cabinet.name = name.clone();
        }
        if let Some(region) = self.region {
            cabinet.region = region;
        }
        if let Some(district) = self.district {
            cabinet.district = district;
        }
        if let Some(longitude) = self.longitude {
            cabinet.longitude = longitude;
        }
        if let Some(latitude) = self.latitude {
            cabinet.latitude = latitude;
        }
        require_coordinates(cabinet.longitude, cabinet.latitude)
    }
}

//=========================================================================================
// Doctor
//=========================================================================================

/// Weekday name to free-text opening hours, e.g. `"MONDAY" => "08:00-12:00"`.
pub type Schedule = BTreeMap<String, String>;

/// The slice of a cabinet shown alongside each doctor.
#[derive(Debug, Clone, PartialEq)]
pub struct CabinetRef {
    pub id: i64,
    pub name: String,
    pub longitude: f64,
    pub latitude: f64,
}

impl From<&Cabinet> for CabinetRef {
    fn from(cabinet: &Cabinet) -> Self {
        Self {
            id: cabinet.id,
            name: cabinet.name.clone(),
            longitude: cabinet.longitude,
            latitude: cabinet.latitude,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Doctor {
    pub id: i64,
    pub name: String,
    pub speciality: Speciality,
    pub schedule: Schedule,
    pub cabinet: CabinetRef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewDoctor {
    pub name: String,
    pub speciality: Speciality,
    pub schedule: Schedule,
    pub cabinet_id: i64,
}

impl NewDoctor {
    pub fn validate(&self) -> PortResult<()> {
        require_name("name", &self.name)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DoctorPatch {
    pub name: Option<String>,
    pub speciality: Option<Speciality>,
    pub schedule: Option<Schedule>,
    pub cabinet_id: Option<i64>,
}

impl DoctorPatch {
    /// Applies every field except the cabinet, which the caller resolves first.
    pub fn apply_to(&self, doctor: &mut Doctor) -> PortResult<()> {
        if let Some(name) = &self.name {
            require_name("name", name)?;
            doctor.name = name.clone();
        }
        if let Some(speciality) = self.speciality {
            doctor.speciality = speciality;
        }
        if let Some(schedule) = &self.schedule {
            doctor.schedule = schedule.clone();
        }
        Ok(())
    }
}

//=========================================================================================
// Users
//=========================================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub full_name: String,
    pub username: String,
    pub role: Option<Role>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Some(Role::Admin)
    }
}

// Only used internally for login - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub hashed_password: String,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub full_name: String,
    pub username: String,
    pub hashed_password: String,
    pub role: Option<Role>,
}
