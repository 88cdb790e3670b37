//! # Core Module
//!
//! This module provides the stateless building blocks of molreward: the chemistry
//! needed to interpret molecule descriptors and the scoring oracles built on top
//! of it.
//!
//! ## Architecture
//!
//! - **Chemistry** ([`chem`]) - SMILES parsing, circular fingerprints, Tanimoto
//!   similarity and atom-contribution logP
//! - **Oracles** ([`oracles`]) - The [`oracles::Oracle`] trait and the similarity,
//!   property-range and classifier adapters
//!
//! ## Contract
//!
//! Every oracle maps one descriptor to a reward in `[0, 1]`. Input that cannot be
//! parsed is never an error at this level: it is reported as "unscorable" and
//! scored `0.0` by the layers above.

pub mod chem;
pub mod oracles;
