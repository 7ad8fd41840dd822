// src/models/mod.rs
pub mod attendance;
pub mod classroom;
pub mod student;
pub mod user;
