pub mod error;
pub mod geometry;
pub mod material;
pub mod math;
pub mod medium;
pub mod session;
pub mod snapshot;

pub use error::{GeomediaError, Result};
