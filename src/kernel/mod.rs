pub mod buffer;
pub mod classifier;
pub mod event;
pub mod reactor;
pub mod session;
pub mod telemetry;
pub mod time;
pub mod timer;
