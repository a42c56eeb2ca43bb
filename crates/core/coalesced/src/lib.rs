#[macro_use]
extern crate log;

mod config;
mod error;
mod loader;
mod queue;
mod service;


pub use config::CoalescerConfig;
pub use error::Error;
pub use loader::BatchLoader;
pub use service::{BatchCoalescer, Outcome};
