pub mod attempt;
pub mod pagination;
pub mod quiz;
pub mod user;
