//! Fleetcast domain logic.
//!
//! Vehicle feature validation, price model artifacts and inference, the
//! training orchestrator, and the delay-buffer threshold optimizer. This
//! crate performs no I/O; persistence lives in `fleetcast-store` and the
//! HTTP surface in `fleetcast-api`.

pub mod artifact;
pub mod delay;
pub mod encoding;
pub mod error;
pub mod features;
pub mod metrics;
pub mod pricing;
pub mod regression;
pub mod registry;
pub mod schema;
pub mod threshold;
pub mod training;
pub mod types;
