//! Business logic services.

pub mod auth_service;
pub mod log_filter;
pub mod log_record_service;
