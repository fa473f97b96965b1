//! Type definitions for the house price service

pub mod input;
pub mod response;

pub use input::{InputValue, RawInput};
pub use response::{BatchItem, BatchResponse, ErrorResponse, HealthResponse, PredictionResponse};
