//! services/api/src/web/doctors.rs
//!
//! Doctor endpoints. Every doctor is shown with a summary of their cabinet.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use care_directory_core::domain::{CabinetRef, Doctor, DoctorPatch, NewDoctor};
use care_directory_core::filter::DoctorFilter;
use care_directory_core::page::DoctorSort;
use care_directory_core::ports::PortResult;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::{ApiError, ErrorBody};
use crate::web::rest::{page_request, PageResponse};
use crate::web::state::AppState;

#[derive(Serialize, ToSchema, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CabinetSummaryDto {
    pub id: i64,
    pub name: String,
    pub longitude: f64,
    pub latitude: f64,
}

impl From<CabinetRef> for CabinetSummaryDto {
    fn from(c: CabinetRef) -> Self {
        Self {
            id: c.id,
            name: c.name,
            longitude: c.longitude,
            latitude: c.latitude,
        }
    }
}

#[derive(Serialize, ToSchema, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DoctorDto {
    pub id: i64,
    pub name: String,
    pub speciality: String,
    /// Weekday to opening hours, e.g. `"MONDAY": "08:00-12:00"`.
    pub schedule: BTreeMap<String, String>,
    pub cabinet: CabinetSummaryDto,
}

impl From<Doctor> for DoctorDto {
    fn from(d: Doctor) -> Self {
        Self {
            id: d.id,
            speciality: d.speciality.to_string(),
            name: d.name,
            schedule: d.schedule,
            cabinet: d.cabinet.into(),
        }
    }
}

#[derive(Deserialize, IntoParams, Debug, Default)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct DoctorListParams {
    pub name: Option<String>,
    pub speciality: Option<String>,
    pub page: Option<u32>,
    pub size: Option<u32>,
    #[serde(alias = "sortBy")]
    pub sort_field: Option<String>,
    #[serde(alias = "sortDir")]
    pub sort_direction: Option<String>,
}

#[derive(Deserialize, ToSchema, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreateDoctorRequest {
    pub name: String,
    pub speciality: String,
    #[serde(default)]
    pub schedule: BTreeMap<String, String>,
    pub cabinet_id: i64,
}

impl CreateDoctorRequest {
    fn into_domain(self) -> PortResult<NewDoctor> {
        Ok(NewDoctor {
            speciality: self.speciality.parse()?,
            name: self.name,
            schedule: self.schedule,
            cabinet_id: self.cabinet_id,
        })
    }
}

#[derive(Deserialize, ToSchema, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDoctorRequest {
    pub name: Option<String>,
    pub speciality: Option<String>,
    pub schedule: Option<BTreeMap<String, String>>,
    pub cabinet_id: Option<i64>,
}

impl UpdateDoctorRequest {
    fn into_patch(self) -> PortResult<DoctorPatch> {
        Ok(DoctorPatch {
            speciality: self.speciality.as_deref().map(|raw| raw.parse()).transpose()?,
            name: self.name,
            schedule: self.schedule,
            cabinet_id: self.cabinet_id,
        })
    }
}

#[utoipa::path(
    get,
    path = "/api/doctors",
    tag = "Doctors",
    params(DoctorListParams),
    responses(
        (status = 200, description = "One page of doctors", body = PageResponse<DoctorDto>),
        (status = 400, description = "Unknown speciality or sort field", body = ErrorBody)
    )
)]
pub async fn list_doctors(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DoctorListParams>,
) -> Result<Json<PageResponse<DoctorDto>>, ApiError> {
    let filter = DoctorFilter::parse(params.name.as_deref(), params.speciality.as_deref())?;
    let page = page_request::<DoctorSort>(
        params.page,
        params.size,
        params.sort_field.as_deref(),
        params.sort_direction.as_deref(),
    )?;
    let result = state.doctors.list(&filter, &page).await?;
    Ok(Json(PageResponse::from_page(result)))
}

#[utoipa::path(
    get,
    path = "/api/doctors/{id}",
    tag = "Doctors",
    params(("id" = i64, Path, description = "Doctor id")),
    responses(
        (status = 200, description = "The doctor", body = DoctorDto),
        (status = 404, description = "No doctor with this id", body = ErrorBody)
    )
)]
pub async fn get_doctor(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<DoctorDto>, ApiError> {
    Ok(Json(state.doctors.get(id).await?.into()))
}

#[utoipa::path(
    get,
    path = "/api/doctors/cabinet/{cabinet_id}",
    tag = "Doctors",
    params(("cabinet_id" = i64, Path, description = "Cabinet id")),
    responses(
        (status = 200, description = "Doctors practising in the cabinet", body = Vec<DoctorDto>)
    )
)]
pub async fn list_doctors_by_cabinet(
    State(state): State<Arc<AppState>>,
    Path(cabinet_id): Path<i64>,
) -> Result<Json<Vec<DoctorDto>>, ApiError> {
    let doctors = state.doctors.list_by_cabinet(cabinet_id).await?;
    Ok(Json(doctors.into_iter().map(DoctorDto::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/doctors",
    tag = "Doctors",
    request_body = CreateDoctorRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Doctor created", body = DoctorDto),
        (status = 404, description = "Cabinet does not exist", body = ErrorBody),
        (status = 409, description = "Name already used in this cabinet", body = ErrorBody)
    )
)]
pub async fn create_doctor(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateDoctorRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let created = state.doctors.create(req.into_domain()?).await?;
    Ok((StatusCode::CREATED, Json(DoctorDto::from(created))))
}

#[utoipa::path(
    put,
    path = "/api/doctors/{id}",
    tag = "Doctors",
    params(("id" = i64, Path, description = "Doctor id")),
    request_body = UpdateDoctorRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Doctor updated", body = DoctorDto),
        (status = 404, description = "Doctor or target cabinet missing", body = ErrorBody)
    )
)]
pub async fn update_doctor(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateDoctorRequest>,
) -> Result<Json<DoctorDto>, ApiError> {
    let updated = state.doctors.update(id, req.into_patch()?).await?;
    Ok(Json(updated.into()))
}

#[utoipa::path(
    delete,
    path = "/api/doctors/{id}",
    tag = "Doctors",
    params(("id" = i64, Path, description = "Doctor id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "Doctor deleted"),
        (status = 404, description = "No doctor with this id", body = ErrorBody)
    )
)]
pub async fn delete_doctor(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.doctors.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
