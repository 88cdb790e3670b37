//! # Workflows Module
//!
//! High-level entry points that tie the [`core`](crate::core) oracles and the
//! [`engine`](crate::engine) dispatchers together.
//!
//! - **Scoring** ([`scoring`]) - Builds an oracle and the dispatcher selected by a
//!   [`ScoringConfig`](crate::engine::config::ScoringConfig), and scores batches with it.
//! - **Serving** ([`serve`]) - The loop run inside every worker subprocess, answering one
//!   protocol line per descriptor.

pub mod scoring;
pub mod serve;
