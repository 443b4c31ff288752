//! crates/care_directory_core/src/services/cabinet.rs

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::{Cabinet, CabinetPatch, NewCabinet};
use crate::filter::CabinetFilter;
use crate::page::{CabinetSort, Page, PageRequest};
use crate::ports::{CabinetStore, PortError, PortResult};

#[derive(Clone)]
pub struct CabinetService {
    store: Arc<dyn CabinetStore>,
}

impl CabinetService {
    pub fn new(store: Arc<dyn CabinetStore>) -> Self {
        Self { store }
    }

    pub async fn list(
        &self,
        filter: &CabinetFilter,
        page: &PageRequest<CabinetSort>,
    ) -> PortResult<Page<Cabinet>> {
        self.store.find_page(filter, page).await
    }

    pub async fn get(&self, id: i64) -> PortResult<Cabinet> {
        self.store.find_by_id(id).await
    }

    pub async fn create(&self, new: NewCabinet) -> PortResult<Cabinet> {
        new.validate()?;

        if self
            .store
            .exists_by_location(new.longitude, new.latitude)
            .await?
        {
            warn!("Rejected cabinet '{}': location already taken", new.name);
            return Err(PortError::Conflict(
                "A cabinet already exists at the provided location".to_string(),
            ));
        }
        if self
            .store
            .exists_by_name_and_location(&new.name, new.longitude, new.latitude)
            .await?
        {
            warn!("Rejected cabinet '{}': duplicate name and location", new.name);
            return Err(PortError::Conflict(
                "A cabinet with the same name and location already exists".to_string(),
            ));
        }

        let created = self.store.insert(new).await?;
        info!("Created cabinet {} ('{}')", created.id, created.name);
        Ok(created)
    }

    pub async fn update(&self, id: i64, patch: CabinetPatch) -> PortResult<Cabinet> {
        let mut cabinet = self.store.find_by_id(id).await?;
        patch.apply_to(&mut cabinet)?;
        let updated = self.store.update(&cabinet).await?;
        info!("Updated cabinet {}", id);
        Ok(updated)
    }

    /// Deletes the cabinet and, with it, every doctor practising there.
    pub async fn delete(&self, id: i64) -> PortResult<()> {
        self.store.delete(id).await?;
        info!("Deleted cabinet {} and its doctors", id);
        Ok(())
    }
}
