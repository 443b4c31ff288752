//! services/api/src/lib.rs
//!
//! The HTTP service around `care_directory_core`: configuration, the
//! PostgreSQL record store and the axum web layer.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
