pub mod auth_service;
pub mod certificate_service;
pub mod image_ingestion;
pub mod mail;
pub mod storage;
