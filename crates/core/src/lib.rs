//! Core business logic for socialdist.

pub mod representation;
pub mod services;

pub use representation::Representer;
pub use services::*;
