pub mod analysis;
pub mod models;
pub mod pricing;
