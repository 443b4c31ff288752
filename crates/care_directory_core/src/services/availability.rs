//! crates/care_directory_core/src/services/availability.rs
//!
//! The "available pharmacies" query. The open-tonight restriction is decided
//! per call from the clock; the result is then either paged by the store or,
//! when the caller gave a position, ranked by distance and paged in memory.

use std::sync::Arc;

use tracing::debug;

use crate::availability::open_tonight_constraint;
use crate::domain::Pharmacy;
use crate::filter::PharmacyFilter;
use crate::geo::{distance_km, GeoPoint};
use crate::page::{Page, PageRequest, PharmacySort};
use crate::ports::{Clock, PharmacyStore, PortResult};

/// Caller input for the availability query.
#[derive(Debug, Clone, Default)]
pub struct AvailabilityQuery {
    pub name: Option<String>,
    pub region: Option<String>,
    pub district: Option<String>,
    pub origin: Option<GeoPoint>,
    /// Sort and direction only apply to store-paged queries.
    pub page: PageRequest<PharmacySort>,
}

/// How an availability query is executed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AvailabilityStrategy {
    /// Filter, sort and slice entirely in the store.
    StorePaged,
    /// Load every match, rank by distance from the origin, slice in memory.
    Proximity(GeoPoint),
}

impl AvailabilityQuery {
    pub fn strategy(&self) -> AvailabilityStrategy {
        match self.origin {
            Some(origin) => AvailabilityStrategy::Proximity(origin),
            None => AvailabilityStrategy::StorePaged,
        }
    }
}

/// Attaches the distance from `origin` to every record and orders them nearest
/// first. The sort is stable, so equal distances keep store order.
pub fn rank_by_distance(mut pharmacies: Vec<Pharmacy>, origin: GeoPoint) -> Vec<Pharmacy> {
    for pharmacy in &mut pharmacies {
        pharmacy.distance_km = Some(distance_km(Some(origin), Some(pharmacy.location())));
    }
    pharmacies.sort_by(|a, b| {
        let a = a.distance_km.unwrap_or(f64::MAX);
        let b = b.distance_km.unwrap_or(f64::MAX);
        a.total_cmp(&b)
    });
    pharmacies
}

#[derive(Clone)]
pub struct AvailabilityQueryService {
    store: Arc<dyn PharmacyStore>,
    clock: Arc<dyn Clock>,
}

impl AvailabilityQueryService {
    pub fn new(store: Arc<dyn PharmacyStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// The filter for `query` as of now. Re-evaluated on every call.
    pub fn filter_for(&self, query: &AvailabilityQuery) -> PortResult<PharmacyFilter> {
        let open_tonight = open_tonight_constraint(self.clock.now());
        Ok(PharmacyFilter::parse(
            query.name.as_deref(),
            query.region.as_deref(),
            query.district.as_deref(),
        )?
        .with_open_tonight(open_tonight))
    }

    pub async fn available(&self, query: &AvailabilityQuery) -> PortResult<Page<Pharmacy>> {
        let filter = self.filter_for(query)?;

        match query.strategy() {
            AvailabilityStrategy::StorePaged => {
                debug!(
                    "Store-paged availability query (open_tonight={:?}, page={}, size={})",
                    filter.open_tonight, query.page.page, query.page.size
                );
                self.store.find_page(&filter, &query.page).await
            }
            AvailabilityStrategy::Proximity(origin) => {
                let candidates = self.store.find_all(&filter).await?;
                debug!(
                    "Ranking {} candidate pharmacies by distance (open_tonight={:?})",
                    candidates.len(),
                    filter.open_tonight
                );
                let ranked = rank_by_distance(candidates, origin);
                Ok(Page::slice(ranked, query.page.page, query.page.size))
            }
        }
    }
}
