#![forbid(unsafe_code)]

//! Runtime for lookup widgets.
//!
//! [`FetchRunner`] executes fetches on worker threads and queues their
//! outcomes; [`LookupDriver`] pairs a runner with a widget so a host event
//! loop only has to forward events and call [`LookupDriver::pump`].

pub mod driver;
pub mod fetcher;
pub mod runner;

pub use driver::LookupDriver;
pub use fetcher::Fetcher;
pub use runner::{FetchCompletion, FetchRunner};
