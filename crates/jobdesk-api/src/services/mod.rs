//! Domain services shared by handlers.

pub mod ownership;

pub use ownership::{JobOwnership, OwnershipService};
