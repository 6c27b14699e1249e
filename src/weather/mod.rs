pub mod error;
pub mod noaa;
pub mod reshape;
