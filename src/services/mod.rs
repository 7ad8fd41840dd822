// src/services/mod.rs
pub mod attendance_service;
pub mod auth_service;
pub mod classroom_service;
pub mod export_service;
pub mod history_service;
pub mod student_service;
