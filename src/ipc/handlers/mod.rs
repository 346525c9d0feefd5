pub mod attendance;
pub mod auth;
pub mod classes;
pub mod core;
pub mod crud;
pub mod dashboard;
pub mod fees;
pub mod students;
pub mod teachers;
