use std::io::BufRead;
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};
use crate::address::join_tag_and_set;
use crate::cache::{AccessKind, CacheLevel};
use crate::config::{ConfigError, HierarchyConfig};
use crate::stats::{Report, Statistics};
use crate::trace::{AddressRadix, TraceError, TraceEvent, TraceReader};
use crate::victim::VictimCache;

/// Where a single access was satisfied
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AccessOutcome {
    L1Hit,
    /// Missed L1 and found in the victim cache, so L2 was not searched
    VictimHit,
    L2Hit,
    /// Missed everywhere and went to main memory
    L2Miss,
}

impl AccessOutcome {
    /// The short code for this outcome, e.g. `M1HV**` for an L1 miss that hit the victim cache
    ///
    /// Codes for hierarchies with a victim cache spell out the victim miss (`MV`), and all codes
    /// are padded to the same width within a hierarchy.
    pub fn code(&self, has_victim: bool) -> &'static str {
        match (self, has_victim) {
            (AccessOutcome::L1Hit, false) => "H1**",
            (AccessOutcome::L1Hit, true) => "H1****",
            (AccessOutcome::VictimHit, _) => "M1HV**",
            (AccessOutcome::L2Hit, false) => "M1H2",
            (AccessOutcome::L2Hit, true) => "M1MVH2",
            (AccessOutcome::L2Miss, false) => "M1M2",
            (AccessOutcome::L2Miss, true) => "M1MVM2",
        }
    }
}

/// A simulation session over one hierarchy
///
/// The simulator owns L1, the victim cache if configured, and L2, and pushes each access through
/// them in order. It supports simulating several traces one after another, in which case the
/// counters and the caches carry over, as does the recorded simulation time.
///
/// A session is not meant to be shared between interleaved traces, every method that changes
/// state takes `&mut self`.
#[derive(Debug)]
pub struct Simulator {
    config: HierarchyConfig,
    l1: CacheLevel,
    victim: Option<VictimCache>,
    l2: CacheLevel,
    reads: u64,
    writes: u64,
    write_back_l1: u64,
    write_back_l2: u64,
    simulation_time: Duration,
}

impl Simulator {
    /// Validates the configuration and builds an empty hierarchy for it
    ///
    /// # Arguments
    ///
    /// * `config`: The hierarchy shape, usually from the command line or a JSON file
    ///
    /// returns: Result<Simulator, ConfigError>
    pub fn new(config: &HierarchyConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let l1_geometry = config.l1_geometry();
        let l2_geometry = config.l2_geometry();
        debug!(?l1_geometry, victim_ways = config.v, ?l2_geometry, "building cache hierarchy");
        Ok(Self {
            config: *config,
            l1: CacheLevel::new(l1_geometry),
            victim: config.has_victim_cache().then(|| VictimCache::new(config.v as usize, config.b1)),
            l2: CacheLevel::new(l2_geometry),
            reads: 0,
            writes: 0,
            write_back_l1: 0,
            write_back_l2: 0,
            simulation_time: Duration::new(0, 0),
        })
    }

    /// Simulates one memory reference
    ///
    /// L1 is searched first. On a miss the victim cache, when present, is searched for the
    /// requested block, and a hit there ends the fill. Otherwise L2 is read, whatever the kind of
    /// the original request. Independently of where the fill came from, a dirty block evicted from
    /// L1 is written into L2.
    ///
    /// # Arguments
    ///
    /// * `kind`: Read or write
    /// * `address`: The byte address referenced
    ///
    /// returns: AccessOutcome
    pub fn access(&mut self, kind: AccessKind, address: u64) -> AccessOutcome {
        match kind {
            AccessKind::Read => self.reads += 1,
            AccessKind::Write => self.writes += 1,
        }

        let l1 = self.l1.probe(kind, address);
        if l1.hit {
            self.log_access(kind, address, AccessOutcome::L1Hit);
            return AccessOutcome::L1Hit;
        }

        let l1_set_bits = self.l1.geometry().set_bits;
        let mut victim_hit = false;
        if let Some(victim) = self.victim.as_mut() {
            // The victim cache has no sets, so it needs the full block number of the L1 victim
            let incoming = l1.evicted.map(|line| join_tag_and_set(line.tag, l1.set, l1_set_bits));
            victim_hit = victim.access(address, incoming);
        }

        let outcome = if victim_hit {
            AccessOutcome::VictimHit
        } else {
            let fill = self.l2.probe(AccessKind::Read, address);
            if fill.evicted.is_some_and(|line| line.dirty) {
                self.write_back_l2 += 1;
            }
            if fill.hit {
                AccessOutcome::L2Hit
            } else {
                AccessOutcome::L2Miss
            }
        };

        if let Some(line) = l1.evicted.filter(|line| line.dirty) {
            self.write_back_l1 += 1;
            let write_back_address = self.l1.address_of(&line, l1.set);
            let flush = self.l2.probe(AccessKind::Write, write_back_address);
            if flush.evicted.is_some_and(|line| line.dirty) {
                self.write_back_l2 += 1;
            }
        }

        self.log_access(kind, address, outcome);
        outcome
    }

    fn log_access(&self, kind: AccessKind, address: u64, outcome: AccessOutcome) {
        trace!(?kind, address, code = outcome.code(self.victim.is_some()), "access");
    }

    /// Simulates every event of an already parsed trace
    pub fn run<I: IntoIterator<Item = TraceEvent>>(&mut self, events: I) -> Statistics {
        let start = Instant::now();
        for event in events {
            self.access(event.kind, event.address);
        }
        self.simulation_time += start.elapsed();
        self.statistics()
    }

    /// Simulates a trace read line by line
    ///
    /// Stops at the first line that can't be parsed. Every line before it has been simulated, and
    /// nothing after it has, so the caches and counters are still consistent.
    ///
    /// # Arguments
    ///
    /// * `reader`: The trace source, see [`crate::io::get_reader`] for files
    /// * `radix`: How addresses are written in the trace
    ///
    /// returns: Result<Statistics, TraceError>, the counters so far
    pub fn simulate<R: BufRead>(&mut self, reader: R, radix: AddressRadix) -> Result<Statistics, TraceError> {
        self.simulate_with(reader, radix, |_, _| {})
    }

    /// Same as [`Self::simulate`], additionally handing every event and its outcome to `observer`
    pub fn simulate_with<R, F>(&mut self, reader: R, radix: AddressRadix, mut observer: F) -> Result<Statistics, TraceError>
    where
        R: BufRead,
        F: FnMut(TraceEvent, AccessOutcome),
    {
        let start = Instant::now();
        let mut events = 0u64;
        let result = TraceReader::new(reader, radix).try_for_each(|event| {
            let event = event?;
            let outcome = self.access(event.kind, event.address);
            observer(event, outcome);
            events += 1;
            Ok::<(), TraceError>(())
        });
        self.simulation_time += start.elapsed();
        result?;
        if events == 0 {
            warn!("trace contained no memory references");
        }
        debug!(events, "finished trace");
        Ok(self.statistics())
    }

    /// A snapshot of the counters. The average access time is left at 0, see [`Self::finalize`].
    pub fn statistics(&self) -> Statistics {
        Statistics {
            reads: self.reads,
            writes: self.writes,
            accesses_l1: self.l1.accesses(),
            read_misses_l1: self.l1.read_misses(),
            write_misses_l1: self.l1.write_misses(),
            accesses_vc: self.victim.as_ref().map_or(0, VictimCache::accesses),
            victim_hits: self.victim.as_ref().map_or(0, VictimCache::hits),
            accesses_l2: self.l2.accesses(),
            read_misses_l2: self.l2.read_misses(),
            write_misses_l2: self.l2.write_misses(),
            write_back_l1: self.write_back_l1,
            write_back_l2: self.write_back_l2,
            average_access_time_l1: 0.0,
        }
    }

    /// The final statistics, including the average access time for L1
    ///
    /// Does not change the session, so calling it again gives the same result until more accesses
    /// are simulated
    pub fn finalize(&self) -> Statistics {
        let mut statistics = self.statistics();
        statistics.average_access_time_l1 = self.config.timing.average_access_time_l1(&self.config, &statistics);
        debug!(aat = statistics.average_access_time_l1, "finalised statistics");
        statistics
    }

    /// The final statistics along with the rates derived from them
    pub fn report(&self) -> Report {
        Report::new(&self.config, self.finalize())
    }

    pub fn config(&self) -> &HierarchyConfig {
        &self.config
    }

    pub fn l1(&self) -> &CacheLevel {
        &self.l1
    }

    pub fn victim(&self) -> Option<&VictimCache> {
        self.victim.as_ref()
    }

    pub fn l2(&self) -> &CacheLevel {
        &self.l2
    }

    /// Gets the wall-clock time spent simulating
    pub fn execution_time(&self) -> &Duration {
        &self.simulation_time
    }

    /// Gets the number of never-filled lines for each structure. Useful for analysing cache
    /// performance or debugging
    pub fn invalid_line_counts(&self) -> Vec<(&'static str, usize)> {
        let mut counts = vec![("L1", self.l1.invalid_line_count())];
        if let Some(victim) = &self.victim {
            counts.push(("VC", victim.invalid_line_count()));
        }
        counts.push(("L2", self.l2.invalid_line_count()));
        counts
    }
}
