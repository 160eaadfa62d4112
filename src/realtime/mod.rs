pub mod presence;
pub mod registry;
pub mod socket;
