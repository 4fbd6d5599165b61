use crate::address::{block_address, decode, DecodedAddress};
use crate::replacement::least_recently_used;

/// The kind of a memory reference
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AccessKind {
    Read,
    Write,
}

/// One way of a set. Lines are created zeroed and then reused in place, they are never removed.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct CacheLine {
    pub tag: u64,
    pub valid: bool,
    pub dirty: bool,
    /// Value of the owning structure's access counter when the line was last touched
    pub last_used: u64,
}

/// Shape of a set-associative cache, all as log2 values
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Geometry {
    pub block_bits: u32,
    pub set_bits: u32,
    pub way_bits: u32,
}

impl Geometry {
    /// Builds the geometry from the total size, block size, and associativity exponents.
    ///
    /// The caller must ensure `block_bits + way_bits <= size_bits`, see
    /// [`crate::config::HierarchyConfig::validate`]
    pub fn from_exponents(size_bits: u32, block_bits: u32, way_bits: u32) -> Self {
        debug_assert!(block_bits + way_bits <= size_bits);
        Self {
            block_bits,
            set_bits: size_bits - block_bits - way_bits,
            way_bits,
        }
    }

    pub fn sets(&self) -> usize {
        1 << self.set_bits
    }

    pub fn ways(&self) -> usize {
        1 << self.way_bits
    }

    pub fn lines(&self) -> usize {
        self.sets() * self.ways()
    }
}

/// Result of a single probe of a cache level
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Probe {
    pub hit: bool,
    /// The valid line displaced by a miss. `None` on hits, and on misses that filled an empty way
    pub evicted: Option<CacheLine>,
    /// Set the address mapped to, which is also the set of the evicted line
    pub set: u64,
    /// Way that hit, or that was filled on a miss
    pub way: usize,
}

/// Maps a (set, way) pair to a position in the flat line storage
#[inline(always)]
pub fn line_index(set: usize, way: usize, ways: usize) -> usize {
    set * ways + way
}

/// A set-associative, write-back cache with least recently used replacement
///
/// Lines live in a single vector, set by set. The level keeps its own access and miss counters,
/// and the access counter doubles as the LRU clock: every probe advances it, and touched lines
/// are stamped with its new value.
#[derive(Debug, Clone)]
pub struct CacheLevel {
    geometry: Geometry,
    lines: Vec<CacheLine>,
    accesses: u64,
    read_misses: u64,
    write_misses: u64,
}

impl CacheLevel {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            lines: vec![CacheLine::default(); geometry.lines()],
            accesses: 0,
            read_misses: 0,
            write_misses: 0,
        }
    }

    /// Looks up an address, installing it on a miss
    ///
    /// On a hit the line's timestamp is refreshed, and a write marks it dirty. On a miss the least
    /// recently used way of the set is overwritten with the new block, which is dirty only if
    /// `kind` is a write, and the displaced line is returned if it was valid.
    ///
    /// # Arguments
    ///
    /// * `kind`: Whether this is a read or a write
    /// * `address`: The byte address being referenced
    ///
    /// returns: Probe
    pub fn probe(&mut self, kind: AccessKind, address: u64) -> Probe {
        self.accesses += 1;
        let now = self.accesses;
        let DecodedAddress { tag, set, .. } = decode(address, self.geometry.block_bits, self.geometry.set_bits);
        let ways = self.geometry.ways();
        let base = line_index(set as usize, 0, ways);
        let lines = &mut self.lines[base..base + ways];
        for (way, line) in lines.iter_mut().enumerate() {
            if line.valid && line.tag == tag {
                line.last_used = now;
                if kind == AccessKind::Write {
                    line.dirty = true;
                }
                return Probe { hit: true, evicted: None, set, way };
            }
        }
        let way = least_recently_used(lines);
        let previous = lines[way];
        lines[way] = CacheLine {
            tag,
            valid: true,
            dirty: kind == AccessKind::Write,
            last_used: now,
        };
        match kind {
            AccessKind::Read => self.read_misses += 1,
            AccessKind::Write => self.write_misses += 1,
        }
        Probe {
            hit: false,
            evicted: previous.valid.then_some(previous),
            set,
            way,
        }
    }

    /// Checks for an address without touching any state. Useful for tests and debugging.
    pub fn contains(&self, address: u64) -> bool {
        let DecodedAddress { tag, set, .. } = decode(address, self.geometry.block_bits, self.geometry.set_bits);
        self.set(set as usize).iter().any(|l| l.valid && l.tag == tag)
    }

    /// The ways of one set
    pub fn set(&self, set: usize) -> &[CacheLine] {
        let ways = self.geometry.ways();
        let base = line_index(set, 0, ways);
        &self.lines[base..base + ways]
    }

    /// The first byte address of the block held by `line`, which lived in `set`
    pub fn address_of(&self, line: &CacheLine, set: u64) -> u64 {
        block_address(line.tag, set, self.geometry.set_bits, self.geometry.block_bits)
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn accesses(&self) -> u64 {
        self.accesses
    }

    pub fn read_misses(&self) -> u64 {
        self.read_misses
    }

    pub fn write_misses(&self) -> u64 {
        self.write_misses
    }

    /// Gets the number of lines which have never been filled
    pub fn invalid_line_count(&self) -> usize {
        self.lines.iter().filter(|l| !l.valid).count()
    }
}
