//! services/api/src/web/rest.rs
//!
//! Shared REST plumbing: the page envelope, page-request parsing and the
//! master definition for the OpenAPI specification.

use std::str::FromStr;

use care_directory_core::page::{Page, PageRequest, SortDirection, DEFAULT_PAGE_SIZE};
use care_directory_core::ports::{PortError, PortResult};
use serde::Serialize;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi, ToSchema};

use crate::error::ErrorBody;
use crate::web::{auth, cabinets, doctors, pharmacies};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        pharmacies::list_available,
        pharmacies::get_pharmacy,
        pharmacies::list_pharmacies,
        pharmacies::create_pharmacy,
        pharmacies::update_pharmacy,
        pharmacies::update_open_status_bulk,
        pharmacies::delete_pharmacy,
        cabinets::list_cabinets,
        cabinets::get_cabinet,
        cabinets::create_cabinet,
        cabinets::update_cabinet,
        cabinets::delete_cabinet,
        doctors::list_doctors,
        doctors::get_doctor,
        doctors::list_doctors_by_cabinet,
        doctors::create_doctor,
        doctors::update_doctor,
        doctors::delete_doctor,
        auth::authenticate_handler,
        auth::register_handler,
        auth::refresh_token_handler,
        auth::logout_handler,
        auth::check_admin_handler,
    ),
    components(schemas(
        ErrorBody,
        pharmacies::PharmacyDto,
        pharmacies::CreatePharmacyRequest,
        pharmacies::UpdatePharmacyRequest,
        pharmacies::BulkOpenStatusRequest,
        pharmacies::BulkOpenStatusResponse,
        cabinets::CabinetDto,
        cabinets::CreateCabinetRequest,
        cabinets::UpdateCabinetRequest,
        doctors::DoctorDto,
        doctors::CabinetSummaryDto,
        doctors::CreateDoctorRequest,
        doctors::UpdateDoctorRequest,
        auth::AuthenticateRequest,
        auth::RegisterRequest,
        auth::AuthResponse,
        auth::UserDto,
        auth::AdminCheckResponse,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "Pharmacies", description = "Pharmacy directory and night-duty availability."),
        (name = "Cabinets", description = "Medical cabinets."),
        (name = "Doctors", description = "Doctors and their weekly schedules."),
        (name = "Auth", description = "Admin authentication.")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by the admin endpoints.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}

//=========================================================================================
// Paging
//=========================================================================================

/// One page of results as returned to API callers.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse<T> {
    pub content: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_elements: u64,
    pub total_pages: u64,
}

impl<T> PageResponse<T> {
    pub fn from_page<D>(page: Page<D>) -> Self
    where
        T: From<D>,
    {
        let total_pages = page.total_pages();
        let page = page.map(T::from);
        Self {
            content: page.content,
            page: page.page,
            size: page.size,
            total_elements: page.total_elements,
            total_pages,
        }
    }
}

/// Builds a page request from raw query values. Blank or missing sort fields
/// fall back to the record type's default key.
pub fn page_request<S>(
    page: Option<u32>,
    size: Option<u32>,
    sort_field: Option<&str>,
    sort_direction: Option<&str>,
) -> PortResult<PageRequest<S>>
where
    S: FromStr<Err = PortError> + Default,
{
    let sort = match sort_field.filter(|s| !s.trim().is_empty()) {
        Some(raw) => raw.parse::<S>()?,
        None => S::default(),
    };
    let direction = sort_direction
        .map(SortDirection::parse_lenient)
        .unwrap_or_default();
    PageRequest::new(
        page.unwrap_or(0),
        size.unwrap_or(DEFAULT_PAGE_SIZE),
        sort,
        direction,
    )
}
