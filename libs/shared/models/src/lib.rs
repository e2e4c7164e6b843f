pub mod error;
pub mod scheduling;
pub mod time;
pub mod validation;
