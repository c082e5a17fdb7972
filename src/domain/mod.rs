pub mod auth;
pub mod quiz;
pub mod usage;
pub mod user;
