//! Domain models.

pub mod log_record;
pub mod user;
