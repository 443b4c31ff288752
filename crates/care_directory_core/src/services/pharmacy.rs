//! crates/care_directory_core/src/services/pharmacy.rs

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::{BulkUpdateOutcome, NewPharmacy, Pharmacy, PharmacyPatch};
use crate::filter::PharmacyFilter;
use crate::geo::{distance_km, GeoPoint};
use crate::page::{Page, PageRequest, PharmacySort};
use crate::ports::{PharmacyStore, PortError, PortResult};

#[derive(Clone)]
pub struct PharmacyService {
    store: Arc<dyn PharmacyStore>,
}

impl PharmacyService {
    pub fn new(store: Arc<dyn PharmacyStore>) -> Self {
        Self { store }
    }

    /// Unfiltered listing, regardless of opening status.
    pub async fn list_all(&self, page: &PageRequest<PharmacySort>) -> PortResult<Page<Pharmacy>> {
        self.store.find_page(&PharmacyFilter::default(), page).await
    }

    pub async fn get(&self, id: i64) -> PortResult<Pharmacy> {
        self.store.find_by_id(id).await
    }

    /// Like [`get`](Self::get), attaching the distance when the caller's position is known.
    pub async fn get_with_distance(&self, id: i64, origin: Option<GeoPoint>) -> PortResult<Pharmacy> {
        let mut pharmacy = self.store.find_by_id(id).await?;
        if let Some(origin) = origin {
            pharmacy.distance_km = Some(distance_km(Some(origin), Some(pharmacy.location())));
        }
        Ok(pharmacy)
    }

    pub async fn create(&self, new: NewPharmacy) -> PortResult<Pharmacy> {
        new.validate()?;

        if self
            .store
            .exists_by_location(new.longitude, new.latitude)
            .await?
        {
            warn!(
                "Rejected pharmacy '{}': location ({}, {}) already taken",
                new.name, new.longitude, new.latitude
            );
            return Err(PortError::Conflict(
                "A pharmacy already exists at the provided location".to_string(),
            ));
        }
        if self
            .store
            .exists_by_name_and_location(&new.name, new.longitude, new.latitude)
            .await?
        {
            warn!("Rejected pharmacy '{}': duplicate name and location", new.name);
            return Err(PortError::Conflict(
                "A pharmacy with the same name and location already exists".to_string(),
            ));
        }

        let created = self.store.insert(new).await?;
        info!("Created pharmacy {} ('{}')", created.id, created.name);
        Ok(created)
    }

    pub async fn update(&self, id: i64, patch: PharmacyPatch) -> PortResult<Pharmacy> {
        let mut pharmacy = self.store.find_by_id(id).await?;
        patch.apply_to(&mut pharmacy)?;
        let updated = self.store.update(&pharmacy).await?;
        info!("Updated pharmacy {}", id);
        Ok(updated)
    }

    /// Flips the open-tonight flag on every listed pharmacy in one atomic write.
    pub async fn update_open_status_bulk(
        &self,
        ids: &[i64],
        open_tonight: bool,
    ) -> PortResult<BulkUpdateOutcome> {
        if ids.is_empty() {
            return Err(PortError::InvalidInput("No pharmacies selected".to_string()));
        }

        let updated = self.store.update_open_tonight_bulk(ids, open_tonight).await?;
        if updated == 0 {
            warn!("Bulk open-status update matched none of {} ids", ids.len());
            return Ok(BulkUpdateOutcome::NothingUpdated);
        }

        info!(
            "Set open_tonight={} on {} of {} requested pharmacies",
            open_tonight,
            updated,
            ids.len()
        );
        Ok(BulkUpdateOutcome::Updated(updated))
    }

    pub async fn delete(&self, id: i64) -> PortResult<()> {
        self.store.delete(id).await?;
        info!("Deleted pharmacy {}", id);
        Ok(())
    }
}
