use crate::cache::AccessKind;
use crate::trace::TraceEvent;

/// `count` accesses of one kind, `stride` bytes apart
pub fn strided_trace(start: u64, stride: u64, count: usize, kind: AccessKind) -> Vec<TraceEvent> {
    (0..count as u64)
        .map(|i| TraceEvent { kind, address: start.wrapping_add(i.wrapping_mul(stride)) })
        .collect()
}

/// A reproducible pseudo-random trace
///
/// Addresses fall within a `2^footprint_bits` byte region, and roughly `write_percent` percent of
/// accesses are writes. The same seed always gives the same trace.
///
/// # Arguments
///
/// * `len`: Number of events
/// * `footprint_bits`: log2 of the address range covered
/// * `write_percent`: Share of writes, 0 to 100
/// * `seed`: Any value, 0 is remapped
///
/// returns: Vec<TraceEvent>
pub fn mixed_trace(len: usize, footprint_bits: u32, write_percent: u64, seed: u64) -> Vec<TraceEvent> {
    // xorshift64, good enough for spreading accesses around
    let mut state = if seed == 0 { 0x9e37_79b9_7f4a_7c15 } else { seed };
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        state
    };
    let mask = crate::address::low_mask(footprint_bits);
    (0..len)
        .map(|_| {
            let kind = if next() % 100 < write_percent { AccessKind::Write } else { AccessKind::Read };
            TraceEvent { kind, address: next() & mask }
        })
        .collect()
}

/// Renders events in the trace file format, one `r`/`w` and hex address per line
pub fn to_trace_text(events: &[TraceEvent]) -> String {
    let mut out = String::with_capacity(events.len() * 20);
    for event in events {
        let op = match event.kind {
            AccessKind::Read => 'r',
            AccessKind::Write => 'w',
        };
        out.push_str(&format!("{op} {:#x}\n", event.address));
    }
    out
}
