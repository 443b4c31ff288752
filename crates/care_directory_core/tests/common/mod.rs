//! Shared test fixtures: an in-memory record store and a fixed clock.

#![allow(dead_code)]

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use care_directory_core::domain::{
    Cabinet, CabinetRef, District, Doctor, NewCabinet, NewDoctor, NewPharmacy, Pharmacy, Region,
    Schedule, Speciality,
};
use care_directory_core::filter::{CabinetFilter, DoctorFilter, PharmacyFilter};
use care_directory_core::page::{
    CabinetSort, DoctorSort, Page, PageRequest, PharmacySort, SortDirection,
};
use care_directory_core::ports::{
    CabinetStore, Clock, DoctorStore, PharmacyStore, PortError, PortResult,
};
use chrono::{NaiveDate, NaiveDateTime};

//=========================================================================================
// Clock
//=========================================================================================

pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Wednesday 2024-06-12 at noon: no open-tonight restriction.
pub fn weekday_noon() -> Arc<FixedClock> {
    at(2024, 6, 12, 12, 0)
}

/// Wednesday 2024-06-12 at 02:00: night window.
pub fn weekday_night() -> Arc<FixedClock> {
    at(2024, 6, 12, 2, 0)
}

/// Sunday 2024-06-16 at noon.
pub fn sunday_noon() -> Arc<FixedClock> {
    at(2024, 6, 16, 12, 0)
}

fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> Arc<FixedClock> {
    Arc::new(FixedClock(
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, 0)
            .unwrap(),
    ))
}

//=========================================================================================
// In-Memory Store
//=========================================================================================

#[derive(Clone)]
struct StoredDoctor {
    id: i64,
    name: String,
    speciality: Speciality,
    schedule: Schedule,
    cabinet_id: i64,
}

#[derive(Default)]
struct Tables {
    next_id: i64,
    pharmacies: BTreeMap<i64, Pharmacy>,
    cabinets: BTreeMap<i64, Cabinet>,
    doctors: BTreeMap<i64, StoredDoctor>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn doctor_view(&self, d: &StoredDoctor) -> PortResult<Doctor> {
        let cabinet = self
            .cabinets
            .get(&d.cabinet_id)
            .ok_or_else(|| PortError::NotFound(format!("Cabinet {} not found", d.cabinet_id)))?;
        Ok(Doctor {
            id: d.id,
            name: d.name.clone(),
            speciality: d.speciality,
            schedule: d.schedule.clone(),
            cabinet: CabinetRef::from(cabinet),
        })
    }
}

/// A record store held in memory. Every operation runs under one lock,
/// which makes bulk updates trivially atomic.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pharmacy_count(&self) -> usize {
        self.tables.lock().unwrap().pharmacies.len()
    }

    pub fn doctor_count(&self) -> usize {
        self.tables.lock().unwrap().doctors.len()
    }

    pub fn raw_pharmacy(&self, id: i64) -> Option<Pharmacy> {
        self.tables.lock().unwrap().pharmacies.get(&id).cloned()
    }
}

fn paged<T, K>(
    mut items: Vec<T>,
    page: &PageRequest<K>,
    cmp: impl Fn(&T, &T) -> Ordering,
) -> Page<T> {
    items.sort_by(|a, b| match page.direction {
        SortDirection::Ascending => cmp(a, b),
        SortDirection::Descending => cmp(b, a),
    });
    Page::slice(items, page.page, page.size)
}

#[async_trait]
impl PharmacyStore for InMemoryStore {
    async fn find_page(
        &self,
        filter: &PharmacyFilter,
        page: &PageRequest<PharmacySort>,
    ) -> PortResult<Page<Pharmacy>> {
        let matching = self.find_all(filter).await?;
        let sort = page.sort;
        Ok(paged(matching, page, |a, b| {
            let primary = match sort {
                PharmacySort::Id => a.id.cmp(&b.id),
                PharmacySort::Name => a.name.cmp(&b.name),
                PharmacySort::Region => a.region.as_str().cmp(b.region.as_str()),
                PharmacySort::District => a.district.as_str().cmp(b.district.as_str()),
                PharmacySort::OpenTonight => a.open_tonight.cmp(&b.open_tonight),
            };
            primary.then(a.id.cmp(&b.id))
        }))
    }

    async fn find_all(&self, filter: &PharmacyFilter) -> PortResult<Vec<Pharmacy>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .pharmacies
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: i64) -> PortResult<Pharmacy> {
        self.tables
            .lock()
            .unwrap()
            .pharmacies
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Pharmacy not found with id: {}", id)))
    }

    async fn exists_by_location(&self, longitude: f64, latitude: f64) -> PortResult<bool> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .pharmacies
            .values()
            .any(|p| p.longitude == longitude && p.latitude == latitude))
    }

    async fn exists_by_name_and_location(
        &self,
        name: &str,
        longitude: f64,
        latitude: f64,
    ) -> PortResult<bool> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .pharmacies
            .values()
            .any(|p| p.name == name && p.longitude == longitude && p.latitude == latitude))
    }

    async fn insert(&self, new: NewPharmacy) -> PortResult<Pharmacy> {
        let mut tables = self.tables.lock().unwrap();
        let id = tables.next_id();
        let pharmacy = Pharmacy {
            id,
            name: new.name,
            longitude: new.longitude,
            latitude: new.latitude,
            region: new.region,
            district: new.district,
            image: new.image,
            open_tonight: new.open_tonight,
            distance_km: None,
        };
        tables.pharmacies.insert(id, pharmacy.clone());
        Ok(pharmacy)
    }

    async fn update(&self, pharmacy: &Pharmacy) -> PortResult<Pharmacy> {
        let mut tables = self.tables.lock().unwrap();
        let slot = tables
            .pharmacies
            .get_mut(&pharmacy.id)
            .ok_or_else(|| PortError::NotFound(format!("Pharmacy not found with id: {}", pharmacy.id)))?;
        *slot = Pharmacy {
            distance_km: None,
            ..pharmacy.clone()
        };
        Ok(slot.clone())
    }

    async fn update_open_tonight_bulk(&self, ids: &[i64], open_tonight: bool) -> PortResult<u64> {
        let mut tables = self.tables.lock().unwrap();
        let mut updated = 0;
        for id in ids {
            if let Some(p) = tables.pharmacies.get_mut(id) {
                p.open_tonight = open_tonight;
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn delete(&self, id: i64) -> PortResult<()> {
        self.tables
            .lock()
            .unwrap()
            .pharmacies
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| PortError::NotFound(format!("Pharmacy not found with id: {}", id)))
    }
}

#[async_trait]
impl CabinetStore for InMemoryStore {
    async fn find_page(
        &self,
        filter: &CabinetFilter,
        page: &PageRequest<CabinetSort>,
    ) -> PortResult<Page<Cabinet>> {
        let matching: Vec<Cabinet> = {
            let tables = self.tables.lock().unwrap();
            tables.cabinets.values().filter(|c| filter.matches(c)).cloned().collect()
        };
        let sort = page.sort;
        Ok(paged(matching, page, |a, b| {
            let primary = match sort {
                CabinetSort::Id => a.id.cmp(&b.id),
                CabinetSort::Name => a.name.cmp(&b.name),
                CabinetSort::Region => a.region.as_str().cmp(b.region.as_str()),
                CabinetSort::District => a.district.as_str().cmp(b.district.as_str()),
            };
            primary.then(a.id.cmp(&b.id))
        }))
    }

    async fn find_by_id(&self, id: i64) -> PortResult<Cabinet> {
        self.tables
            .lock()
            .unwrap()
            .cabinets
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Cabinet not found with id: {}", id)))
    }

    async fn exists_by_location(&self, longitude: f64, latitude: f64) -> PortResult<bool> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .cabinets
            .values()
            .any(|c| c.longitude == longitude && c.latitude == latitude))
    }

    async fn exists_by_name_and_location(
        &self,
        name: &str,
        longitude: f64,
        latitude: f64,
    ) -> PortResult<bool> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .cabinets
            .values()
            .any(|c| c.name == name && c.longitude == longitude && c.latitude == latitude))
    }

    async fn insert(&self, new: NewCabinet) -> PortResult<Cabinet> {
        let mut tables = self.tables.lock().unwrap();
        let id = tables.next_id();
        let cabinet = Cabinet {
            id,
            name: new.name,
            region: new.region,
            district: new.district,
            longitude: new.longitude,
            latitude: new.latitude,
        };
        tables.cabinets.insert(id, cabinet.clone());
        Ok(cabinet)
    }

    async fn update(&self, cabinet: &Cabinet) -> PortResult<Cabinet> {
        let mut tables = self.tables.lock().unwrap();
        let slot = tables
            .cabinets
            .get_mut(&cabinet.id)
            .ok_or_else(|| PortError::NotFound(format!("Cabinet not found with id: {}", cabinet.id)))?;
        *slot = cabinet.clone();
        Ok(cabinet.clone())
    }

    async fn delete(&self, id: i64) -> PortResult<()> {
        let mut tables = self.tables.lock().unwrap();
        if tables.cabinets.remove(&id).is_none() {
            return Err(PortError::NotFound(format!("Cabinet not found with id: {}", id)));
        }
        tables.doctors.retain(|_, d| d.cabinet_id != id);
        Ok(())
    }
}

#[async_trait]
impl DoctorStore for InMemoryStore {
    async fn find_page(
        &self,
        filter: &DoctorFilter,
        page: &PageRequest<DoctorSort>,
    ) -> PortResult<Page<Doctor>> {
        let matching: Vec<Doctor> = {
            let tables = self.tables.lock().unwrap();
            tables
                .doctors
                .values()
                .map(|d| tables.doctor_view(d))
                .collect::<PortResult<Vec<_>>>()?
                .into_iter()
                .filter(|d| filter.matches(d))
                .collect()
        };
        let sort = page.sort;
        Ok(paged(matching, page, |a, b| {
            let primary = match sort {
                DoctorSort::Id => a.id.cmp(&b.id),
                DoctorSort::Name => a.name.cmp(&b.name),
                DoctorSort::Speciality => a.speciality.as_str().cmp(b.speciality.as_str()),
            };
            primary.then(a.id.cmp(&b.id))
        }))
    }

    async fn find_by_id(&self, id: i64) -> PortResult<Doctor> {
        let tables = self.tables.lock().unwrap();
        let stored = tables
            .doctors
            .get(&id)
            .ok_or_else(|| PortError::NotFound(format!("Doctor not found with id: {}", id)))?;
        tables.doctor_view(stored)
    }

    async fn find_by_cabinet(&self, cabinet_id: i64) -> PortResult<Vec<Doctor>> {
        let tables = self.tables.lock().unwrap();
        tables
            .doctors
            .values()
            .filter(|d| d.cabinet_id == cabinet_id)
            .map(|d| tables.doctor_view(d))
            .collect()
    }

    async fn exists_by_name_and_cabinet(&self, name: &str, cabinet_id: i64) -> PortResult<bool> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .doctors
            .values()
            .any(|d| d.name == name && d.cabinet_id == cabinet_id))
    }

    async fn insert(&self, new: NewDoctor) -> PortResult<Doctor> {
        let mut tables = self.tables.lock().unwrap();
        if !tables.cabinets.contains_key(&new.cabinet_id) {
            return Err(PortError::NotFound(format!("Cabinet not found with id: {}", new.cabinet_id)));
        }
        let id = tables.next_id();
        let stored = StoredDoctor {
            id,
            name: new.name,
            speciality: new.speciality,
            schedule: new.schedule,
            cabinet_id: new.cabinet_id,
        };
        tables.doctors.insert(id, stored.clone());
        tables.doctor_view(&stored)
    }

    async fn update(&self, doctor: &Doctor) -> PortResult<Doctor> {
        let mut tables = self.tables.lock().unwrap();
        let stored = StoredDoctor {
            id: doctor.id,
            name: doctor.name.clone(),
            speciality: doctor.speciality,
            schedule: doctor.schedule.clone(),
            cabinet_id: doctor.cabinet.id,
        };
        let slot = tables
            .doctors
            .get_mut(&doctor.id)
            .ok_or_else(|| PortError::NotFound(format!("Doctor not found with id: {}", doctor.id)))?;
        *slot = stored.clone();
        tables.doctor_view(&stored)
    }

    async fn delete(&self, id: i64) -> PortResult<()> {
        self.tables
            .lock()
            .unwrap()
            .doctors
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| PortError::NotFound(format!("Doctor not found with id: {}", id)))
    }
}

//=========================================================================================
// Builders
//=========================================================================================

pub fn new_pharmacy(name: &str, latitude: f64, longitude: f64, open_tonight: bool) -> NewPharmacy {
    NewPharmacy {
        name: name.to_string(),
        longitude,
        latitude,
        region: Region::NouakchottOuest,
        district: District::TevraghZeina,
        image: None,
        open_tonight,
    }
}

pub fn new_cabinet(name: &str, latitude: f64, longitude: f64) -> NewCabinet {
    NewCabinet {
        name: name.to_string(),
        region: Region::NouakchottSud,
        district: District::Arafat,
        longitude,
        latitude,
    }
}

pub fn new_doctor(name: &str, cabinet_id: i64) -> NewDoctor {
    let mut schedule = Schedule::new();
    schedule.insert("MONDAY".to_string(), "08:00-12:00".to_string());
    NewDoctor {
        name: name.to_string(),
        speciality: Speciality::GeneralPractice,
        schedule,
        cabinet_id,
    }
}
