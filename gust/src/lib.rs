#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

// Lets the `#[scenario]` and `#[transaction]` expansions resolve `::gust` inside this crate too.
extern crate self as gust;

pub mod scenario;
#[doc(hidden)]
pub mod transaction;
pub mod vu;

#[cfg(feature = "cli")]
#[cfg_attr(docsrs, doc(cfg(feature = "cli")))]
pub mod cli;
#[cfg(feature = "http")]
#[cfg_attr(docsrs, doc(cfg(feature = "http")))]
pub mod http;

mod error;
pub(crate) mod measurement;
pub(crate) mod sampler;

pub use error::GustError;
pub use gust_core::{ConfigError, Options, RunStatistics};
pub use gust_macros::{scenario, transaction};
pub use scenario::Scenario;

pub mod prelude {
    pub use crate::scenario::ConfigurableScenario;
    pub use gust_core::{Options, RunStatistics};
    pub use gust_macros::{scenario, transaction};
}
