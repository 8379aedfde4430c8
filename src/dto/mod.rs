pub mod activity_dto;
pub mod analysis_dto;
pub mod auth_dto;
