pub mod activity_service;
pub mod analysis_service;
pub mod auth_service;
pub mod lifecycle_service;
