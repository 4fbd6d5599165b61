use std::io::Read;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use crate::cache::Geometry;
use crate::stats::TimingModel;
use crate::victim::MAX_VICTIM_WAYS;

/// Largest supported cache size exponent. Keeps block sizes and masks inside a u64.
pub const MAX_SIZE_BITS: u32 = 63;

/// Largest supported number of lines in one level, as log2. Anything bigger is almost certainly a
/// typo, and would try to allocate gigabytes.
pub const MAX_LINE_BITS: u32 = 28;

/// Errors found while loading or validating a hierarchy configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{level}: block size 2^{block_bits} times associativity 2^{way_bits} exceeds the cache size 2^{size_bits}")]
    GeometryTooSmall {
        level: &'static str,
        size_bits: u32,
        block_bits: u32,
        way_bits: u32,
    },
    #[error("{level}: cache size 2^{size_bits} is larger than the supported 2^{max}", max = MAX_SIZE_BITS)]
    SizeOutOfRange { level: &'static str, size_bits: u32 },
    #[error("{level}: 2^{line_bits} lines is more than the supported 2^{max}", max = MAX_LINE_BITS)]
    TooManyLines { level: &'static str, line_bits: u32 },
    #[error("L2 {what} exponent ({l2}) must be at least the L1 one ({l1})")]
    Ordering { what: &'static str, l1: u32, l2: u32 },
    #[error("victim cache size {0} is outside 0..={max}", max = MAX_VICTIM_WAYS)]
    VictimOutOfRange(u32),
    #[error("couldn't parse the configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Shape of the whole hierarchy. All sizes are log2 values.
///
/// * `c`: total data size of a level is 2^c bytes
/// * `b`: blocks are 2^b bytes
/// * `s`: each set holds 2^s blocks
/// * `v`: number of blocks in the victim cache, 0 for none. Victim blocks are 2^b1 bytes.
///
/// Missing JSON fields take the default configuration's value.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HierarchyConfig {
    pub c1: u32,
    pub b1: u32,
    pub s1: u32,
    pub v: u32,
    pub c2: u32,
    pub b2: u32,
    pub s2: u32,
    pub timing: TimingModel,
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self {
            c1: 12,
            b1: 5,
            s1: 3,
            v: 3,
            c2: 15,
            b2: 5,
            s2: 4,
            timing: TimingModel::default(),
        }
    }
}

impl HierarchyConfig {
    /// Reads a configuration from JSON. The result is not validated.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ConfigError> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Checks the configuration describes a hierarchy the simulator can build
    ///
    /// L2 must be at least as large, with blocks at least as large, and at least as associative as
    /// L1. The victim cache holds at most four blocks.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::validate_level("L1", self.c1, self.b1, self.s1)?;
        Self::validate_level("L2", self.c2, self.b2, self.s2)?;
        for (what, l1, l2) in [("size", self.c1, self.c2), ("block size", self.b1, self.b2), ("associativity", self.s1, self.s2)] {
            if l2 < l1 {
                return Err(ConfigError::Ordering { what, l1, l2 });
            }
        }
        if self.v as usize > MAX_VICTIM_WAYS {
            return Err(ConfigError::VictimOutOfRange(self.v));
        }
        Ok(())
    }

    fn validate_level(level: &'static str, size_bits: u32, block_bits: u32, way_bits: u32) -> Result<(), ConfigError> {
        if size_bits > MAX_SIZE_BITS {
            return Err(ConfigError::SizeOutOfRange { level, size_bits });
        }
        if block_bits.saturating_add(way_bits) > size_bits {
            return Err(ConfigError::GeometryTooSmall { level, size_bits, block_bits, way_bits });
        }
        let line_bits = size_bits - block_bits;
        if line_bits > MAX_LINE_BITS {
            return Err(ConfigError::TooManyLines { level, line_bits });
        }
        Ok(())
    }

    pub fn l1_geometry(&self) -> Geometry {
        Geometry::from_exponents(self.c1, self.b1, self.s1)
    }

    pub fn l2_geometry(&self) -> Geometry {
        Geometry::from_exponents(self.c2, self.b2, self.s2)
    }

    /// Whether a victim cache sits between L1 and L2
    pub fn has_victim_cache(&self) -> bool {
        self.v > 0
    }
}
