//! [`VehicleStore`](crate::VehicleStore) implementations.

pub mod memory;
#[cfg(feature = "mongodb")]
pub mod mongo;

pub use memory::MemoryVehicleStore;
#[cfg(feature = "mongodb")]
pub use mongo::MongoVehicleStore;
