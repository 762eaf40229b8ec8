//! Capture file I/O using libpcap.
//!
//! Traces are small enough to hold in memory; repair needs random access to
//! the whole sequence anyway.

pub mod engine;

pub use engine::{read_trace, write_trace, CaptureError, CapturedFrame, Trace};
