//! # Engine Module
//!
//! Execution machinery for evaluating an oracle over a batch of descriptors.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Oracle selection, overrides and execution settings
//! - **Protocol** ([`protocol`]) - The newline-delimited request/response format spoken with workers
//! - **Workers** ([`worker`]) - Long-lived scoring subprocesses and the [`worker::Worker`] seam
//! - **Dispatch** ([`dispatch`]) - Single-process, threaded and process-pool dispatchers
//! - **Progress Monitoring** ([`progress`]) - Progress reporting callbacks
//! - **Error Handling** ([`error`]) - Engine-specific error types
//!
//! Every dispatcher returns one score per input descriptor, in input order, regardless of
//! the order in which workers complete.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod progress;
pub mod protocol;
pub mod worker;
