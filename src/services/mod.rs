pub mod indicators;
pub mod report_service;
