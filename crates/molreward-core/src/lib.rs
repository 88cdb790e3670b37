//! # molreward Core Library
//!
//! Reward functions for molecule generators, together with the machinery to evaluate
//! them over large batches of candidate molecules in parallel.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer layout so that scoring logic, execution strategy and
//! user-facing entry points stay independent of each other.
//!
//! - **[`core`]: The Foundation.** A small cheminformatics toolkit (SMILES parsing,
//!   circular fingerprints, atom-contribution logP) and the [`core::oracles::Oracle`]
//!   implementations built on top of it.
//!
//! - **[`engine`]: The Execution Layer.** Configuration, the line-oriented worker protocol,
//!   worker subprocess management and the dispatchers that spread a batch over a pool of
//!   workers while keeping results aligned with the input order.
//!
//! - **[`workflows`]: The Public API.** Builds oracles and dispatchers from configuration and
//!   runs the worker serve loop. This is the entry point used by the `molreward` binary.

pub mod core;
pub mod engine;
pub mod workflows;
