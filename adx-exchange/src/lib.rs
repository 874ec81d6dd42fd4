#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

mod application;
mod book;
mod escrow;
mod exchange;
mod notify;
mod query;
mod shared;

pub mod error;

pub use application::Application;
pub use exchange::Exchange;
pub use notify::DEFAULT_EVENT_CAPACITY;
pub use shared::SharedExchange;
