//! services/api/src/web/cabinets.rs
//!
//! Medical cabinet endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use care_directory_core::domain::{Cabinet, CabinetPatch, NewCabinet};
use care_directory_core::filter::CabinetFilter;
use care_directory_core::page::CabinetSort;
use care_directory_core::ports::PortResult;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::{ApiError, ErrorBody};
use crate::web::rest::{page_request, PageResponse};
use crate::web::state::AppState;

#[derive(Serialize, ToSchema, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CabinetDto {
    pub id: i64,
    pub name: String,
    pub region: String,
    pub district: String,
    pub longitude: f64,
    pub latitude: f64,
}

impl From<Cabinet> for CabinetDto {
    fn from(c: Cabinet) -> Self {
        Self {
            id: c.id,
            region: c.region.to_string(),
            district: c.district.to_string(),
            name: c.name,
            longitude: c.longitude,
            latitude: c.latitude,
        }
    }
}

#[derive(Deserialize, IntoParams, Debug, Default)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct CabinetListParams {
    pub name: Option<String>,
    #[serde(alias = "willaya")]
    pub region: Option<String>,
    #[serde(alias = "moughataa")]
    pub district: Option<String>,
    pub page: Option<u32>,
    pub size: Option<u32>,
    #[serde(alias = "sortBy")]
    pub sort_field: Option<String>,
    #[serde(alias = "sortDir")]
    pub sort_direction: Option<String>,
}

#[derive(Deserialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreateCabinetRequest {
    pub name: String,
    #[serde(alias = "willaya")]
    pub region: String,
    #[serde(alias = "moughataa")]
    pub district: String,
    pub longitude: f64,
    pub latitude: f64,
}

impl CreateCabinetRequest {
    fn into_domain(self) -> PortResult<NewCabinet> {
        Ok(NewCabinet {
            region: self.region.parse()?,
            district: self.district.parse()?,
            name: self.name,
            longitude: self.longitude,
            latitude: self.latitude,
        })
    }
}

#[derive(Deserialize, ToSchema, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCabinetRequest {
    pub name: Option<String>,
    #[serde(alias = "willaya")]
    pub region: Option<String>,
    #[serde(alias = "moughataa")]
    pub district: Option<String>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
}

impl UpdateCabinetRequest {
    fn into_patch(self) -> PortResult<CabinetPatch> {
        Ok(CabinetPatch {
            region: self.region.as_deref().map(|raw| raw.parse()).transpose()?,
            district: self.district.as_deref().map(|raw| raw.parse()).transpose()?,
            name: self.name,
            longitude: self.longitude,
            latitude: self.latitude,
        })
    }
}

#[utoipa::path(
    get,
    path = "/api/cabinets",
    tag = "Cabinets",
    params(CabinetListParams),
    responses(
        (status = 200, description = "One page of cabinets", body = PageResponse<CabinetDto>),
        (status = 400, description = "Unknown region, district or sort field", body = ErrorBody)
    )
)]
pub async fn list_cabinets(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CabinetListParams>,
) -> Result<Json<PageResponse<CabinetDto>>, ApiError> {
    let filter = CabinetFilter::parse(
        params.name.as_deref(),
        params.region.as_deref(),
        params.district.as_deref(),
    )?;
    let page = page_request::<CabinetSort>(
        params.page,
        params.size,
        params.sort_field.as_deref(),
        params.sort_direction.as_deref(),
    )?;
    let result = state.cabinets.list(&filter, &page).await?;
    Ok(Json(PageResponse::from_page(result)))
}

#[utoipa::path(
    get,
    path = "/api/cabinets/{id}",
    tag = "Cabinets",
    params(("id" = i64, Path, description = "Cabinet id")),
    responses(
        (status = 200, description = "The cabinet", body = CabinetDto),
        (status = 404, description = "No cabinet with this id", body = ErrorBody)
    )
)]
pub async fn get_cabinet(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<CabinetDto>, ApiError> {
    Ok(Json(state.cabinets.get(id).await?.into()))
}

#[utoipa::path(
    post,
    path = "/api/cabinets",
    tag = "Cabinets",
    request_body = CreateCabinetRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Cabinet created", body = CabinetDto),
        (status = 400, description = "Invalid cabinet", body = ErrorBody),
        (status = 409, description = "Location already taken", body = ErrorBody)
    )
)]
pub async fn create_cabinet(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateCabinetRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let created = state.cabinets.create(req.into_domain()?).await?;
    Ok((StatusCode::CREATED, Json(CabinetDto::from(created))))
}

#[utoipa::path(
    put,
    path = "/api/cabinets/{id}",
    tag = "Cabinets",
    params(("id" = i64, Path, description = "Cabinet id")),
    request_body = UpdateCabinetRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Cabinet updated", body = CabinetDto),
        (status = 404, description = "No cabinet with this id", body = ErrorBody)
    )
)]
pub async fn update_cabinet(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateCabinetRequest>,
) -> Result<Json<CabinetDto>, ApiError> {
    let updated = state.cabinets.update(id, req.into_patch()?).await?;
    Ok(Json(updated.into()))
}

/// Delete a cabinet together with every doctor practising there.
#[utoipa::path(
    delete,
    path = "/api/cabinets/{id}",
    tag = "Cabinets",
    params(("id" = i64, Path, description = "Cabinet id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "Cabinet and its doctors deleted"),
        (status = 404, description = "No cabinet with this id", body = ErrorBody)
    )
)]
pub async fn delete_cabinet(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.cabinets.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
