use serde::{Deserialize, Serialize};
use crate::config::HierarchyConfig;

/// Counters collected over a simulation. Can be serialised as part of the output.
///
/// Every counter only ever grows while a trace is simulated. `average_access_time_l1` is left at
/// 0 until the simulator is finalised.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub reads: u64,
    pub writes: u64,
    /// Always `reads + writes`
    pub accesses_l1: u64,
    pub read_misses_l1: u64,
    pub write_misses_l1: u64,
    /// One per L1 miss when a victim cache is present, whether or not it was searched
    pub accesses_vc: u64,
    pub victim_hits: u64,
    /// Includes the extra write probes caused by L1 write-backs
    pub accesses_l2: u64,
    pub read_misses_l2: u64,
    pub write_misses_l2: u64,
    pub write_back_l1: u64,
    pub write_back_l2: u64,
    pub average_access_time_l1: f64,
}

/// Divides, treating an empty denominator as a rate of 0 instead of NaN
fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

impl Statistics {
    pub fn misses_l1(&self) -> u64 {
        self.read_misses_l1 + self.write_misses_l1
    }

    pub fn misses_l2(&self) -> u64 {
        self.read_misses_l2 + self.write_misses_l2
    }

    pub fn miss_rate_l1(&self) -> f64 {
        ratio(self.misses_l1(), self.accesses_l1)
    }

    pub fn miss_rate_l2(&self) -> f64 {
        ratio(self.misses_l2(), self.accesses_l2)
    }

    /// Fraction of victim cache accesses that went on to L2. Only meaningful with a victim cache.
    pub fn miss_rate_vc(&self) -> f64 {
        1.0 - ratio(self.victim_hits, self.accesses_vc)
    }
}

/// Hit times and the memory penalty, in cycles
///
/// Hit times grow linearly with the associativity exponent of the level. The defaults are the
/// standard numbers for this model.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingModel {
    pub l1_base: f64,
    pub l1_per_way_bit: f64,
    pub l2_base: f64,
    pub l2_per_way_bit: f64,
    /// Cost of going to main memory after an L2 miss
    pub memory_penalty: f64,
}

impl Default for TimingModel {
    fn default() -> Self {
        Self {
            l1_base: 4.0,
            l1_per_way_bit: 0.2,
            l2_base: 20.0,
            l2_per_way_bit: 0.4,
            memory_penalty: 500.0,
        }
    }
}

impl TimingModel {
    pub fn hit_time_l1(&self, s1: u32) -> f64 {
        self.l1_base + self.l1_per_way_bit * s1 as f64
    }

    pub fn hit_time_l2(&self, s2: u32) -> f64 {
        self.l2_base + self.l2_per_way_bit * s2 as f64
    }

    /// Average time to service a request that reaches L2
    pub fn average_access_time_l2(&self, config: &HierarchyConfig, stats: &Statistics) -> f64 {
        self.hit_time_l2(config.s2) + stats.miss_rate_l2() * self.memory_penalty
    }

    /// Average time to service a request at L1
    ///
    /// With a victim cache, only the victim misses pay for L2, so the L2 time is scaled by the
    /// victim miss rate. Without one, every L1 miss pays for L2.
    ///
    /// # Arguments
    ///
    /// * `config`: The hierarchy the counters were collected on
    /// * `stats`: The collected counters
    ///
    /// returns: f64
    pub fn average_access_time_l1(&self, config: &HierarchyConfig, stats: &Statistics) -> f64 {
        let aat_l2 = self.average_access_time_l2(config, stats);
        let miss_penalty = if config.v == 0 {
            aat_l2
        } else {
            aat_l2 * stats.miss_rate_vc()
        };
        self.hit_time_l1(config.s1) + stats.miss_rate_l1() * miss_penalty
    }
}

/// Finalised statistics along with the rates they were derived from
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct Report {
    #[serde(flatten)]
    pub statistics: Statistics,
    pub miss_rate_l1: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub miss_rate_vc: Option<f64>,
    pub miss_rate_l2: f64,
    pub average_access_time_l2: f64,
}

impl Report {
    pub fn new(config: &HierarchyConfig, statistics: Statistics) -> Self {
        Self {
            miss_rate_l1: statistics.miss_rate_l1(),
            miss_rate_vc: (config.v > 0).then(|| statistics.miss_rate_vc()),
            miss_rate_l2: statistics.miss_rate_l2(),
            average_access_time_l2: config.timing.average_access_time_l2(config, &statistics),
            statistics,
        }
    }
}
