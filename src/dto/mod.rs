//! DTOs de la API HTTP

pub mod api_response;
pub mod audit_dto;
pub mod vehicle_status_dto;

pub use api_response::ApiResponse;
