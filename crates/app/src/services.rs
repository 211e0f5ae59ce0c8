//! Application services: use-case orchestration over the ports.

pub mod house_service;

pub use house_service::HouseService;
