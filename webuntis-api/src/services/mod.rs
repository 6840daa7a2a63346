pub mod http_service;
pub mod untis_service;
