use crate::address::block_number;
use crate::cache::CacheLine;
use crate::replacement::least_recently_used;

/// Largest supported victim cache, in blocks
pub const MAX_VICTIM_WAYS: usize = 4;

/// A small fully associative buffer for blocks evicted from L1
///
/// Tags are full block numbers (`address >> block_bits`), since there are no set bits. The victim
/// cache tracks no dirty state of its own: write-backs of dirty L1 victims are accounted for by
/// the simulator when the eviction happens.
///
/// A hierarchy without a victim cache has no `VictimCache` at all rather than one with zero ways,
/// see [`crate::simulator::Simulator`]
#[derive(Debug, Clone)]
pub struct VictimCache {
    block_bits: u32,
    lines: Vec<CacheLine>,
    accesses: u64,
    hits: u64,
}

impl VictimCache {
    /// Creates a victim cache with `ways` blocks of `2^block_bits` bytes
    ///
    /// `ways` must be between 1 and [`MAX_VICTIM_WAYS`]
    pub fn new(ways: usize, block_bits: u32) -> Self {
        debug_assert!((1..=MAX_VICTIM_WAYS).contains(&ways));
        Self {
            block_bits,
            lines: vec![CacheLine::default(); ways],
            accesses: 0,
            hits: 0,
        }
    }

    /// Handles an L1 miss
    ///
    /// Every L1 miss counts as a victim cache access. The buffer is only searched when L1 displaced
    /// a valid block, as otherwise there is nothing to swap in.
    ///
    /// On a hit the matching way takes the L1 victim's tag, which models swapping the two blocks
    /// between L1 and the victim cache. On a miss the L1 victim replaces the least recently used
    /// way.
    ///
    /// # Arguments
    ///
    /// * `address`: The address L1 missed on
    /// * `l1_victim`: Block number of the valid line L1 just evicted, if any
    ///
    /// returns: bool, true on a hit
    pub fn access(&mut self, address: u64, l1_victim: Option<u64>) -> bool {
        self.accesses += 1;
        match l1_victim {
            Some(incoming) => self.probe(address, incoming),
            None => false,
        }
    }

    fn probe(&mut self, address: u64, incoming: u64) -> bool {
        let now = self.accesses;
        let tag = block_number(address, self.block_bits);
        for line in self.lines.iter_mut() {
            if line.valid && line.tag == tag {
                line.last_used = now;
                line.tag = incoming;
                self.hits += 1;
                return true;
            }
        }
        let way = least_recently_used(&self.lines);
        let line = &mut self.lines[way];
        line.valid = true;
        line.tag = incoming;
        line.last_used = now;
        false
    }

    /// Checks whether the block containing `address` is buffered, without touching any state
    pub fn contains(&self, address: u64) -> bool {
        let tag = block_number(address, self.block_bits);
        self.lines.iter().any(|l| l.valid && l.tag == tag)
    }

    pub fn lines(&self) -> &[CacheLine] {
        &self.lines
    }

    pub fn ways(&self) -> usize {
        self.lines.len()
    }

    pub fn accesses(&self) -> u64 {
        self.accesses
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn invalid_line_count(&self) -> usize {
        self.lines.iter().filter(|l| !l.valid).count()
    }
}
