//! Vehicle store backends and their shared configuration and error types.
//!
//! - [`MemoryVehicleStore`](datastores::MemoryVehicleStore): evaluates the
//!   aggregations in process with `carlens_core::aggregate`
//! - `MongoVehicleStore` (feature `mongodb`): runs them server-side as
//!   aggregation pipelines

pub mod config;
pub mod datastores;
pub mod error;

pub use config::*;
pub use datastores::*;
pub use error::*;
