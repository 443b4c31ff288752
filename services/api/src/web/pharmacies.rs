//! services/api/src/web/pharmacies.rs
//!
//! Pharmacy endpoints: the public availability search and detail view, and the
//! admin-only curation endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use care_directory_core::domain::{BulkUpdateOutcome, NewPharmacy, Pharmacy, PharmacyPatch};
use care_directory_core::geo::GeoPoint;
use care_directory_core::page::PharmacySort;
use care_directory_core::ports::{PortError, PortResult};
use care_directory_core::services::AvailabilityQuery;
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::{IntoParams, ToSchema};

use crate::error::{ApiError, ErrorBody};
use crate::web::rest::{page_request, PageResponse};
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Serialize, ToSchema, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PharmacyDto {
    pub id: i64,
    pub name: String,
    pub longitude: f64,
    pub latitude: f64,
    pub region: String,
    pub district: String,
    pub image: Option<String>,
    pub open_tonight: bool,
    /// Present only when the caller supplied their position.
    #[serde(rename = "distanceInKm", skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
}

impl From<Pharmacy> for PharmacyDto {
    fn from(p: Pharmacy) -> Self {
        Self {
            id: p.id,
            region: p.region.to_string(),
            district: p.district.to_string(),
            name: p.name,
            longitude: p.longitude,
            latitude: p.latitude,
            image: p.image,
            open_tonight: p.open_tonight,
            distance_km: p.distance_km,
        }
    }
}

/// Query string of the availability search.
#[derive(Deserialize, IntoParams, Debug, Default)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct AvailableParams {
    /// Case-insensitive substring of the pharmacy name.
    pub name: Option<String>,
    #[serde(alias = "willaya")]
    pub region: Option<String>,
    #[serde(alias = "moughataa")]
    pub district: Option<String>,
    pub user_longitude: Option<f64>,
    pub user_latitude: Option<f64>,
    pub page: Option<u32>,
    pub size: Option<u32>,
    /// Ignored when both user coordinates are given.
    #[serde(alias = "sortBy")]
    pub sort_field: Option<String>,
    #[serde(alias = "sortDir")]
    pub sort_direction: Option<String>,
}

impl AvailableParams {
    fn into_query(self) -> PortResult<AvailabilityQuery> {
        let origin = GeoPoint::from_parts(self.user_latitude, self.user_longitude);
        // Proximity results are always ordered by distance.
        let (sort_field, sort_direction) = match origin {
            Some(_) => (None, None),
            None => (self.sort_field.as_deref(), self.sort_direction.as_deref()),
        };
        Ok(AvailabilityQuery {
            page: page_request::<PharmacySort>(self.page, self.size, sort_field, sort_direction)?,
            origin,
            name: self.name,
            region: self.region,
            district: self.district,
        })
    }
}

#[derive(Deserialize, IntoParams, Debug, Default)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct LocationParams {
    pub user_longitude: Option<f64>,
    pub user_latitude: Option<f64>,
}

#[derive(Deserialize, IntoParams, Debug, Default)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct AdminListParams {
    pub page: Option<u32>,
    pub size: Option<u32>,
    #[serde(alias = "sortBy")]
    pub sort_field: Option<String>,
    #[serde(alias = "sortDir")]
    pub sort_direction: Option<String>,
}

#[derive(Deserialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreatePharmacyRequest {
    pub name: String,
    pub longitude: f64,
    pub latitude: f64,
    #[serde(alias = "willaya")]
    pub region: String,
    #[serde(alias = "moughataa")]
    pub district: String,
    pub image: Option<String>,
    #[serde(default)]
    pub open_tonight: bool,
}

impl CreatePharmacyRequest {
    fn into_domain(self) -> PortResult<NewPharmacy> {
        Ok(NewPharmacy {
            region: self.region.parse()?,
            district: self.district.parse()?,
            name: self.name,
            longitude: self.longitude,
            latitude: self.latitude,
            image: self.image,
            open_tonight: self.open_tonight,
        })
    }
}

/// Omitted fields keep their stored value, except `openTonight`, which is
/// always written and defaults to `false`.
#[derive(Deserialize, ToSchema, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePharmacyRequest {
    pub name: Option<String>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    #[serde(alias = "willaya")]
    pub region: Option<String>,
    #[serde(alias = "moughataa")]
    pub district: Option<String>,
    pub image: Option<String>,
    #[serde(default)]
    pub open_tonight: bool,
}

impl UpdatePharmacyRequest {
    fn into_patch(self) -> PortResult<PharmacyPatch> {
        Ok(PharmacyPatch {
            region: self.region.as_deref().map(|raw| raw.parse()).transpose()?,
            district: self.district.as_deref().map(|raw| raw.parse()).transpose()?,
            name: self.name,
            longitude: self.longitude,
            latitude: self.latitude,
            image: self.image,
            open_tonight: self.open_tonight,
        })
    }
}

#[derive(Deserialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct BulkOpenStatusRequest {
    #[serde(default)]
    pub ids: Vec<i64>,
    pub open_tonight: bool,
}

#[derive(Serialize, ToSchema, Debug, PartialEq)]
pub struct BulkOpenStatusResponse {
    pub success: bool,
    pub message: String,
    pub updated: u64,
}

impl BulkOpenStatusResponse {
    fn from_outcome(result: PortResult<BulkUpdateOutcome>) -> Result<(StatusCode, Self), ApiError> {
        match result {
            Ok(BulkUpdateOutcome::Updated(count)) => Ok((
                StatusCode::OK,
                Self {
                    success: true,
                    message: format!("Updated {} pharmacies", count),
                    updated: count,
                },
            )),
            Ok(BulkUpdateOutcome::NothingUpdated) => Ok((
                StatusCode::NOT_FOUND,
                Self {
                    success: false,
                    message: "No pharmacies matched the given ids".to_string(),
                    updated: 0,
                },
            )),
            Err(PortError::InvalidInput(message)) => Ok((
                StatusCode::BAD_REQUEST,
                Self {
                    success: false,
                    message,
                    updated: 0,
                },
            )),
            Err(e) => Err(e.into()),
        }
    }
}

//=========================================================================================
// Public Handlers
//=========================================================================================

/// List pharmacies available right now.
///
/// At night (after 23:00 or before 08:00) and all day on Sunday only
/// pharmacies flagged open tonight are listed. With both user coordinates the
/// results are ordered nearest first and carry `distanceInKm`.
#[utoipa::path(
    get,
    path = "/api/pharmacies/available",
    tag = "Pharmacies",
    params(AvailableParams),
    responses(
        (status = 200, description = "One page of available pharmacies", body = PageResponse<PharmacyDto>),
        (status = 400, description = "Unknown region, district or sort field", body = ErrorBody)
    )
)]
pub async fn list_available(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AvailableParams>,
) -> Result<Json<PageResponse<PharmacyDto>>, ApiError> {
    let query = params.into_query()?;
    let page = state.availability.available(&query).await?;
    Ok(Json(PageResponse::from_page(page)))
}

/// Get one pharmacy, with its distance when the caller's position is given.
#[utoipa::path(
    get,
    path = "/api/pharmacies/{id}",
    tag = "Pharmacies",
    params(("id" = i64, Path, description = "Pharmacy id"), LocationParams),
    responses(
        (status = 200, description = "The pharmacy", body = PharmacyDto),
        (status = 404, description = "No pharmacy with this id", body = ErrorBody)
    )
)]
pub async fn get_pharmacy(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(location): Query<LocationParams>,
) -> Result<Json<PharmacyDto>, ApiError> {
    let origin = GeoPoint::from_parts(location.user_latitude, location.user_longitude);
    let pharmacy = state.pharmacies.get_with_distance(id, origin).await?;
    Ok(Json(pharmacy.into()))
}

//=========================================================================================
// Admin Handlers
//=========================================================================================

/// List every pharmacy regardless of opening status.
#[utoipa::path(
    get,
    path = "/api/pharmacies",
    tag = "Pharmacies",
    params(AdminListParams),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "One page of pharmacies", body = PageResponse<PharmacyDto>),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 403, description = "Caller is not an admin", body = ErrorBody)
    )
)]
pub async fn list_pharmacies(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AdminListParams>,
) -> Result<Json<PageResponse<PharmacyDto>>, ApiError> {
    let page = page_request::<PharmacySort>(
        params.page,
        params.size,
        params.sort_field.as_deref(),
        params.sort_direction.as_deref(),
    )?;
    let result = state.pharmacies.list_all(&page).await?;
    Ok(Json(PageResponse::from_page(result)))
}

#[utoipa::path(
    post,
    path = "/api/pharmacies",
    tag = "Pharmacies",
    request_body = CreatePharmacyRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Pharmacy created", body = PharmacyDto),
        (status = 400, description = "Invalid pharmacy", body = ErrorBody),
        (status = 409, description = "Location already taken", body = ErrorBody)
    )
)]
pub async fn create_pharmacy(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreatePharmacyRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let created = state.pharmacies.create(req.into_domain()?).await?;
    Ok((StatusCode::CREATED, Json(PharmacyDto::from(created))))
}

#[utoipa::path(
    put,
    path = "/api/pharmacies/{id}",
    tag = "Pharmacies",
    params(("id" = i64, Path, description = "Pharmacy id")),
    request_body = UpdatePharmacyRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Pharmacy updated", body = PharmacyDto),
        (status = 400, description = "Invalid field value", body = ErrorBody),
        (status = 404, description = "No pharmacy with this id", body = ErrorBody),
        (status = 409, description = "Location already taken", body = ErrorBody)
    )
)]
pub async fn update_pharmacy(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<UpdatePharmacyRequest>,
) -> Result<Json<PharmacyDto>, ApiError> {
    let updated = state.pharmacies.update(id, req.into_patch()?).await?;
    Ok(Json(updated.into()))
}

/// Set the open-tonight flag on several pharmacies at once.
#[utoipa::path(
    patch,
    path = "/api/pharmacies/open-status/bulk",
    tag = "Pharmacies",
    request_body = BulkOpenStatusRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "At least one pharmacy updated", body = BulkOpenStatusResponse),
        (status = 400, description = "No ids given", body = BulkOpenStatusResponse),
        (status = 404, description = "None of the ids matched", body = BulkOpenStatusResponse)
    )
)]
pub async fn update_open_status_bulk(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BulkOpenStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state
        .pharmacies
        .update_open_status_bulk(&req.ids, req.open_tonight)
        .await;
    if let Err(e) = &result {
        if !matches!(e, PortError::InvalidInput(_)) {
            error!("Bulk open-status update failed: {:?}", e);
        }
    }
    let (status, body) = BulkOpenStatusResponse::from_outcome(result)?;
    Ok((status, Json(body)))
}

#[utoipa::path(
    delete,
    path = "/api/pharmacies/{id}",
    tag = "Pharmacies",
    params(("id" = i64, Path, description = "Pharmacy id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "Pharmacy deleted"),
        (status = 404, description = "No pharmacy with this id", body = ErrorBody)
    )
)]
pub async fn delete_pharmacy(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.pharmacies.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
