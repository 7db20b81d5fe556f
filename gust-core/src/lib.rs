mod config;
mod constants;
mod error;
mod options;
mod stats;

pub use config::*;
pub use constants::*;
pub use error::*;
pub use options::*;
pub use stats::*;
