//! Session lifecycle telemetry.
//!
//! # SAFETY INVARIANT
//! Telemetry is a write-only side channel of the reactor.
//! It must **never** be read by the session or the classifier.
//!
//! # PRIVACY INVARIANT
//! Events carry session ids, reasons, durations and counts only.
//! Participant names and vote values never enter the recorder.

pub mod event;
pub mod metrics;
pub mod recorder;
