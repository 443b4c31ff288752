pub mod auth;
pub mod cabinets;
pub mod doctors;
pub mod middleware;
pub mod pharmacies;
pub mod rest;
pub mod state;

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, patch, post, put},
    Router,
};

pub use middleware::{require_admin, require_auth};
pub use state::AppState;

/// Builds every `/api` route. Public reads need no token, session endpoints
/// need a valid token and curation endpoints need the admin role.
pub fn router(state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/api/pharmacies/available", get(pharmacies::list_available))
        .route("/api/pharmacies/{id}", get(pharmacies::get_pharmacy))
        .route("/api/cabinets", get(cabinets::list_cabinets))
        .route("/api/cabinets/{id}", get(cabinets::get_cabinet))
        .route("/api/doctors", get(doctors::list_doctors))
        .route("/api/doctors/{id}", get(doctors::get_doctor))
        .route(
            "/api/doctors/cabinet/{cabinet_id}",
            get(doctors::list_doctors_by_cabinet),
        )
        .route("/api/auth/authenticate", post(auth::authenticate_handler));

    // Routes for any signed-in user
    let session_routes = Router::new()
        .route("/api/auth/refresh-token", post(auth::refresh_token_handler))
        .route("/api/auth/logout", post(auth::logout_handler))
        .route("/api/auth/check-admin", get(auth::check_admin_handler))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    // Admin-only routes
    let admin_routes = Router::new()
        .route("/api/auth/register", post(auth::register_handler))
        .route(
            "/api/pharmacies",
            get(pharmacies::list_pharmacies).post(pharmacies::create_pharmacy),
        )
        .route(
            "/api/pharmacies/{id}",
            put(pharmacies::update_pharmacy).delete(pharmacies::delete_pharmacy),
        )
        .route(
            "/api/pharmacies/open-status/bulk",
            patch(pharmacies::update_open_status_bulk),
        )
        .route("/api/cabinets", post(cabinets::create_cabinet))
        .route(
            "/api/cabinets/{id}",
            put(cabinets::update_cabinet).delete(cabinets::delete_cabinet),
        )
        .route("/api/doctors", post(doctors::create_doctor))
        .route(
            "/api/doctors/{id}",
            put(doctors::update_doctor).delete(doctors::delete_doctor),
        )
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_admin,
        ));

    Router::new()
        .merge(public_routes)
        .merge(session_routes)
        .merge(admin_routes)
        .with_state(state)
}
