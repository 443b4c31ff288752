//! crates/care_directory_core/src/services/doctor.rs

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::{CabinetRef, Doctor, DoctorPatch, NewDoctor};
use crate::filter::DoctorFilter;
use crate::page::{DoctorSort, Page, PageRequest};
use crate::ports::{CabinetStore, DoctorStore, PortError, PortResult};

#[derive(Clone)]
pub struct DoctorService {
    doctors: Arc<dyn DoctorStore>,
    cabinets: Arc<dyn CabinetStore>,
}

impl DoctorService {
    pub fn new(doctors: Arc<dyn DoctorStore>, cabinets: Arc<dyn CabinetStore>) -> Self {
        Self { doctors, cabinets }
    }

    pub async fn list(
        &self,
        filter: &DoctorFilter,
        page: &PageRequest<DoctorSort>,
    ) -> PortResult<Page<Doctor>> {
        self.doctors.find_page(filter, page).await
    }

    pub async fn get(&self, id: i64) -> PortResult<Doctor> {
        self.doctors.find_by_id(id).await
    }

    /// Doctors of one cabinet; an unknown cabinet simply has none.
    pub async fn list_by_cabinet(&self, cabinet_id: i64) -> PortResult<Vec<Doctor>> {
        self.doctors.find_by_cabinet(cabinet_id).await
    }

    pub async fn create(&self, new: NewDoctor) -> PortResult<Doctor> {
        new.validate()?;

        if self
            .doctors
            .exists_by_name_and_cabinet(&new.name, new.cabinet_id)
            .await?
        {
            warn!(
                "Rejected doctor '{}': already listed in cabinet {}",
                new.name, new.cabinet_id
            );
            return Err(PortError::Conflict(
                "A doctor with this name already exists in this cabinet".to_string(),
            ));
        }
        // Existence check; NotFound propagates as-is.
        self.cabinets.find_by_id(new.cabinet_id).await?;

        let created = self.doctors.insert(new).await?;
        info!(
            "Created doctor {} ('{}') in cabinet {}",
            created.id, created.name, created.cabinet.id
        );
        Ok(created)
    }

    pub async fn update(&self, id: i64, patch: DoctorPatch) -> PortResult<Doctor> {
        let mut doctor = self.doctors.find_by_id(id).await?;
        patch.apply_to(&mut doctor)?;

        if let Some(cabinet_id) = patch.cabinet_id {
            let cabinet = self.cabinets.find_by_id(cabinet_id).await?;
            doctor.cabinet = CabinetRef::from(&cabinet);
        }

        let updated = self.doctors.update(&doctor).await?;
        info!("Updated doctor {}", id);
        Ok(updated)
    }

    pub async fn delete(&self, id: i64) -> PortResult<()> {
        self.doctors.delete(id).await?;
        info!("Deleted doctor {}", id);
        Ok(())
    }
}
