//! # Chemistry Toolkit
//!
//! A compact, dependency-free chemistry layer sufficient for the scoring oracles:
//! SMILES parsing into a molecular graph, circular count fingerprints with
//! Tanimoto comparison, and an atom-contribution logP estimate.
//!
//! Everything here is deterministic across processes, which the subprocess
//! scoring pool relies on when comparing scores with the in-process path.

pub mod descriptors;
pub mod fingerprint;
pub mod molecule;
pub mod smiles;
