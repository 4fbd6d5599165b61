//! # HierLib
//!
//! HierLib simulates a two level cache hierarchy (L1, an optional victim cache, and L2) over a
//! trace of memory references
//!
//! It counts hits, misses, and write-backs at each level, and turns those counts into an average
//! access time for L1 using a fixed timing model
//!
//! The engine itself never fails: configurations are validated when a [`simulator::Simulator`] is
//! created, and trace parsing errors are reported before an event reaches the caches

/// Splits addresses into tag, set, and block offset for a cache geometry
pub mod address;

/// Contains the set-associative cache used for L1 and L2
pub mod cache;

/// Contains definitions for the hierarchy configuration, which can be read from JSON
pub mod config;

/// Platform specific helpers for reading trace files
pub mod io;

/// Least recently used way selection shared by every cache structure
pub mod replacement;

/// Contains the simulator, which drives one access at a time through the hierarchy
pub mod simulator;

/// Counters collected during simulation and the average access time model
pub mod stats;

/// Trace line parsing
pub mod trace;

/// Fully associative victim cache sitting between L1 and L2
pub mod victim;

#[cfg(test)]
mod test;

/// Contains utilities for generating traces for tests and benchmarks.
pub mod util;
