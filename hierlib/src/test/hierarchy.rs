use crate::cache::AccessKind::{Read, Write};
use crate::config::HierarchyConfig;
use crate::simulator::AccessOutcome;
use crate::util::mixed_trace;
use super::{simulator, small_config};

// Addresses 128 bytes apart share a set in the small L1
const A: u64 = 0x000;
const B: u64 = 0x080;
const C: u64 = 0x100;

#[test]
fn empty_session_finalises() {
    for v in 0..=4 {
        let sim = simulator(&HierarchyConfig { v, ..HierarchyConfig::default() });
        let stats = sim.finalize();
        assert_eq!(stats.accesses_l1, 0);
        assert!(stats.average_access_time_l1.is_finite());
        assert_eq!(stats.average_access_time_l1, 4.0 + 0.2 * 3.0);
    }
}

#[test]
fn repeated_address_misses_once() {
    for n in [1, 2, 10, 1000] {
        let mut sim = simulator(&small_config(0, 10, 1));
        for _ in 0..n {
            sim.access(Read, 0x1234);
        }
        let stats = sim.statistics();
        assert_eq!(stats.accesses_l1, n);
        assert_eq!(stats.read_misses_l1, 1);
        assert_eq!(stats.accesses_l1 - stats.misses_l1(), n - 1);
        assert_eq!(stats.accesses_l2, 1);
        assert_eq!(stats.read_misses_l2, 1);
    }
}

#[test]
fn conflict_evicts_in_direct_mapped_l1() {
    let mut sim = simulator(&small_config(0, 10, 1));
    assert_eq!(sim.access(Read, A), AccessOutcome::L2Miss);
    assert_eq!(sim.access(Read, B), AccessOutcome::L2Miss);
    // B took A's only way, but L2 still has A
    assert_eq!(sim.access(Read, A), AccessOutcome::L2Hit);
    assert_eq!(sim.statistics().read_misses_l1, 3);
}

#[test]
fn lru_in_two_way_l1() {
    let config = HierarchyConfig { c1: 8, b1: 5, s1: 1, v: 0, c2: 12, b2: 5, s2: 2, ..HierarchyConfig::default() };
    let mut sim = simulator(&config);
    // Four sets of two ways, so A, B, and C collide
    sim.access(Read, A);
    sim.access(Read, B);
    assert_eq!(sim.access(Read, A), AccessOutcome::L1Hit);
    // A was refreshed, so C replaces B
    sim.access(Read, C);
    assert!(sim.l1().contains(A));
    assert!(!sim.l1().contains(B));
    assert!(sim.l1().contains(C));
    assert_ne!(sim.access(Read, B), AccessOutcome::L1Hit);
    // And B replaces A, which is now the oldest
    assert!(!sim.l1().contains(A));
}

#[test]
fn empty_ways_fill_lowest_first() {
    let config = HierarchyConfig { c1: 9, b1: 5, s1: 2, v: 0, c2: 12, b2: 5, s2: 2, ..HierarchyConfig::default() };
    let mut sim = simulator(&config);
    sim.access(Read, A);
    sim.access(Read, C);
    let set = sim.l1().set(0);
    assert!(set[0].valid && set[1].valid);
    assert!(!set[2].valid && !set[3].valid);
    assert!(set[0].last_used < set[1].last_used);
}

#[test]
fn victim_cache_swaps_with_l1() {
    let mut sim = simulator(&small_config(1, 10, 1));
    assert_eq!(sim.access(Read, A), AccessOutcome::L2Miss);
    // B evicts A into the victim cache
    assert_eq!(sim.access(Read, B), AccessOutcome::L2Miss);
    assert!(sim.victim().is_some_and(|vc| vc.contains(A)));
    // A comes back from the victim cache, and B takes its place there
    assert_eq!(sim.access(Read, A), AccessOutcome::VictimHit);
    let victim = sim.victim().unwrap();
    assert!(victim.contains(B));
    assert!(!victim.contains(A));
    assert!(sim.l1().contains(A));

    let stats = sim.statistics();
    assert_eq!(stats.accesses_vc, 3);
    assert_eq!(stats.victim_hits, 1);
    // The victim hit never reached L2
    assert_eq!(stats.accesses_l2, 2);

    // L1 hit 4.0, L2 hit 20.4 with every L2 access a miss, and two of three victim accesses missed
    let expected = 4.0 + (20.4 + 500.0) * (2.0 / 3.0);
    assert!((sim.finalize().average_access_time_l1 - expected).abs() < 1e-9);
}

#[test]
fn victim_hit_still_writes_back_dirty_l1_block() {
    let mut sim = simulator(&small_config(1, 10, 1));
    sim.access(Read, A);
    // B evicts the clean A into the victim cache, and B itself is dirty in L1
    sim.access(Write, B);
    let before = sim.statistics();
    assert_eq!(before.write_back_l1, 0);

    // A swaps back in from the victim cache, and the dirty B still has to go to L2
    assert_eq!(sim.access(Read, A), AccessOutcome::VictimHit);
    let after = sim.statistics();
    assert_eq!(after.victim_hits, 1);
    assert_eq!(after.write_back_l1, 1);
    assert_eq!(after.accesses_l2 - before.accesses_l2, 1);
    // L2 already held B from its fill
    assert_eq!(after.write_misses_l2, 0);
    assert!(sim.l2().contains(B));
}

#[test]
fn victim_cache_skipped_on_empty_eviction() {
    let mut sim = simulator(&small_config(2, 10, 1));
    sim.access(Read, A);
    sim.access(Read, A + 0x20);
    let stats = sim.statistics();
    // Both misses filled empty sets, so there was nothing to put in the victim cache
    assert_eq!(stats.accesses_vc, 2);
    assert_eq!(stats.victim_hits, 0);
    assert_eq!(sim.victim().map(|vc| vc.invalid_line_count()), Some(2));
    assert_eq!(stats.accesses_l2, 2);
}

#[test]
fn no_victim_cache_means_no_victim_accesses() {
    let mut sim = simulator(&small_config(0, 10, 1));
    sim.access(Read, A);
    sim.access(Read, B);
    sim.access(Read, A);
    assert!(sim.victim().is_none());
    assert_eq!(sim.statistics().accesses_vc, 0);
}

#[test]
fn dirty_l1_eviction_writes_back_once() {
    let mut sim = simulator(&small_config(0, 10, 1));
    sim.access(Write, A);
    let before = sim.statistics();
    // L2 fills are always reads
    assert_eq!(before.write_misses_l1, 1);
    assert_eq!(before.read_misses_l2, 1);
    assert_eq!(before.write_misses_l2, 0);

    sim.access(Read, B);
    let after = sim.statistics();
    assert_eq!(after.write_back_l1, 1);
    // One fill for B, and one write of A, which L2 already holds
    assert_eq!(after.accesses_l2 - before.accesses_l2, 2);
    assert_eq!(after.write_misses_l2, 0);
    assert_eq!(after.write_back_l2, 0);
}

#[test]
fn clean_eviction_does_not_write_back() {
    let mut sim = simulator(&small_config(0, 10, 1));
    sim.access(Read, A);
    sim.access(Read, B);
    let stats = sim.statistics();
    assert_eq!(stats.write_back_l1, 0);
    assert_eq!(stats.accesses_l2, 2);
}

#[test]
fn dirty_l2_eviction_writes_back() {
    // L2 the same shape as L1, so the two conflict in the same way
    let mut sim = simulator(&small_config(0, 7, 0));
    sim.access(Write, A);
    // A is written into L2, replacing B there
    sim.access(Read, B);
    assert_eq!(sim.statistics().write_back_l1, 1);
    assert_eq!(sim.statistics().write_back_l2, 0);
    // C's fill evicts the dirty A from L2
    sim.access(Read, C);
    let stats = sim.statistics();
    assert_eq!(stats.write_back_l1, 1);
    assert_eq!(stats.write_back_l2, 1);
    assert_eq!(stats.write_misses_l2, 1);
    assert_eq!(stats.read_misses_l2, 3);
}

#[test]
fn write_hit_marks_line_dirty() {
    let mut sim = simulator(&small_config(0, 10, 1));
    sim.access(Read, A);
    assert_eq!(sim.access(Write, A + 4), AccessOutcome::L1Hit);
    sim.access(Read, B);
    assert_eq!(sim.statistics().write_back_l1, 1);
}

#[test]
fn counters_are_consistent() {
    for v in [0, 2, 4] {
        let config = HierarchyConfig { c1: 10, b1: 5, s1: 1, v, c2: 13, b2: 6, s2: 2, ..HierarchyConfig::default() };
        let mut sim = simulator(&config);
        let mut previous = sim.statistics();
        for event in mixed_trace(5000, 14, 30, 42 + v as u64) {
            sim.access(event.kind, event.address);
            let stats = sim.statistics();
            assert_eq!(stats.accesses_l1, stats.reads + stats.writes);
            for (now, then) in [
                (stats.reads, previous.reads),
                (stats.writes, previous.writes),
                (stats.read_misses_l1, previous.read_misses_l1),
                (stats.write_misses_l1, previous.write_misses_l1),
                (stats.accesses_vc, previous.accesses_vc),
                (stats.victim_hits, previous.victim_hits),
                (stats.accesses_l2, previous.accesses_l2),
                (stats.read_misses_l2, previous.read_misses_l2),
                (stats.write_misses_l2, previous.write_misses_l2),
                (stats.write_back_l1, previous.write_back_l1),
                (stats.write_back_l2, previous.write_back_l2),
            ] {
                assert!(now >= then);
            }
            previous = stats;
        }
        let stats = sim.statistics();
        if v > 0 {
            assert_eq!(stats.accesses_vc, stats.misses_l1());
            assert_eq!(stats.accesses_l2, stats.misses_l1() - stats.victim_hits + stats.write_back_l1);
        } else {
            assert_eq!(stats.accesses_l2, stats.misses_l1() + stats.write_back_l1);
        }
    }
}

#[test]
fn finalize_is_idempotent() {
    let mut sim = simulator(&HierarchyConfig::default());
    sim.run(mixed_trace(2000, 16, 25, 7));
    let first = sim.finalize();
    let second = sim.finalize();
    assert_eq!(first, second);
    assert!(first.average_access_time_l1 > 0.0);
    assert_eq!(sim.statistics().average_access_time_l1, 0.0);
}

#[test]
fn victim_cache_lowers_average_access_time() {
    // Two blocks ping-ponging in one direct mapped set
    let trace = [A, B].repeat(500);
    let mut without = simulator(&small_config(0, 10, 1));
    let mut with = simulator(&small_config(1, 10, 1));
    for &address in &trace {
        without.access(Read, address);
        with.access(Read, address);
    }
    let (without, with) = (without.finalize(), with.finalize());
    assert_eq!(with.victim_hits, 998);
    assert!(with.average_access_time_l1 < without.average_access_time_l1);
}

#[test]
fn outcome_codes() {
    assert_eq!(AccessOutcome::L1Hit.code(false), "H1**");
    assert_eq!(AccessOutcome::L1Hit.code(true), "H1****");
    assert_eq!(AccessOutcome::VictimHit.code(true), "M1HV**");
    assert_eq!(AccessOutcome::L2Hit.code(false), "M1H2");
    assert_eq!(AccessOutcome::L2Miss.code(true), "M1MVM2");
}
