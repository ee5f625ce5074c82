pub mod error;
pub mod unit;
