//! Type definitions for the estimation service

pub mod estimate;
pub mod request;

pub use estimate::PriceEstimate;
pub use request::EstimateRequest;
