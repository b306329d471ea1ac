pub mod attempt;
pub mod auth;
pub mod quiz;
