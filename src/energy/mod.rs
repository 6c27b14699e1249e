pub mod eia;
pub mod error;
pub mod normalize;
pub mod series;
