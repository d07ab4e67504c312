//! Room simulation modules

pub mod physics;
pub mod registry;
pub mod room;
pub mod snapshot;
pub mod state;

pub use registry::RoomRegistry;
pub use room::RoomHandle;
