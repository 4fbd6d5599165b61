mod hierarchy;

use crate::config::HierarchyConfig;
use crate::simulator::Simulator;

/// Direct mapped L1 with four 32 byte sets, and an L2 of `c2`/`s2` with 32 byte blocks
fn small_config(v: u32, c2: u32, s2: u32) -> HierarchyConfig {
    HierarchyConfig { c1: 7, b1: 5, s1: 0, v, c2, b2: 5, s2, ..HierarchyConfig::default() }
}

fn simulator(config: &HierarchyConfig) -> Simulator {
    Simulator::new(config).unwrap()
}
