//! crates/care_directory_core/src/filter.rs
//!
//! Composable record filters. Every constraint is optional; active ones are
//! ANDed together. Stores translate them into queries, and `matches` states
//! the exact semantics they must reproduce.

use crate::domain::{Cabinet, District, Doctor, Pharmacy, Region, Speciality};
use crate::ports::PortResult;

/// Blank or whitespace-only input means "no constraint".
fn present(raw: Option<&str>) -> Option<&str> {
    raw.filter(|s| !s.trim().is_empty())
}

fn parse_present<T: std::str::FromStr<Err = crate::ports::PortError>>(
    raw: Option<&str>,
) -> PortResult<Option<T>> {
    present(raw).map(|s| s.parse::<T>()).transpose()
}

fn name_contains(haystack: &str, needle: Option<&str>) -> bool {
    match needle {
        Some(needle) => haystack.to_lowercase().contains(&needle.to_lowercase()),
        None => true,
    }
}

//=========================================================================================
// Pharmacies
//=========================================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PharmacyFilter {
    pub name: Option<String>,
    pub region: Option<Region>,
    pub district: Option<District>,
    /// `Some(flag)` restricts to that flag; `None` accepts both.
    pub open_tonight: Option<bool>,
}

impl PharmacyFilter {
    /// Builds a filter from raw caller input, parsing region and district.
    pub fn parse(
        name: Option<&str>,
        region: Option<&str>,
        district: Option<&str>,
    ) -> PortResult<Self> {
        Ok(Self::default()
            .with_name(name)
            .with_region(parse_present(region)?)
            .with_district(parse_present(district)?))
    }

    pub fn with_name(mut self, name: Option<&str>) -> Self {
        self.name = present(name).map(str::to_string);
        self
    }

    pub fn with_region(mut self, region: Option<Region>) -> Self {
        self.region = region;
        self
    }

    pub fn with_district(mut self, district: Option<District>) -> Self {
        self.district = district;
        self
    }

    pub fn with_open_tonight(mut self, open_tonight: Option<bool>) -> Self {
        self.open_tonight = open_tonight;
        self
    }

    pub fn matches(&self, pharmacy: &Pharmacy) -> bool {
        name_contains(&pharmacy.name, self.name.as_deref())
            && self.region.map_or(true, |r| pharmacy.region == r)
            && self.district.map_or(true, |d| pharmacy.district == d)
            && self.open_tonight.map_or(true, |o| pharmacy.open_tonight == o)
    }
}

//=========================================================================================
// Cabinets
//=========================================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CabinetFilter {
    pub name: Option<String>,
    pub region: Option<Region>,
    pub district: Option<District>,
}

impl CabinetFilter {
    pub fn parse(
        name: Option<&str>,
        region: Option<&str>,
        district: Option<&str>,
    ) -> PortResult<Self> {
        Ok(Self {
            name: present(name).map(str::to_string),
            region: parse_present(region)?,
            district: parse_present(district)?,
        })
    }

    pub fn matches(&self, cabinet: &Cabinet) -> bool {
        name_contains(&cabinet.name, self.name.as_deref())
            && self.region.map_or(true, |r| cabinet.region == r)
            && self.district.map_or(true, |d| cabinet.district == d)
    }
}

//=========================================================================================
// Doctors
//=========================================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DoctorFilter {
    pub name: Option<String>,
    pub speciality: Option<Speciality>,
}

impl DoctorFilter {
    pub fn parse(name: Option<&str>, speciality: Option<&str>) -> PortResult<Self> {
        Ok(Self {
            name: present(name).map(str::to_string),
            speciality: parse_present(speciality)?,
        })
    }

    pub fn matches(&self, doctor: &Doctor) -> bool {
        name_contains(&doctor.name, self.name.as_deref())
            && self.speciality.map_or(true, |s| doctor.speciality == s)
    }
}
