pub mod flight;
pub mod sighting;

pub use flight::*;
pub use sighting::*;
