pub mod bot;
pub mod chat;
pub mod config;
pub mod kernel;
pub mod runtime;

pub use kernel::reactor::Reactor;
