use crate::cache::CacheLine;

/// Finds the least recently used way among `lines`
///
/// Timestamps come from the owning structure's access counter, so the smallest timestamp is the
/// oldest use. Never-filled lines keep a timestamp of 0 and are therefore picked first.
///
/// Ties go to the lowest way index. This is observable in the results, so keep the strict
/// comparison.
///
/// # Arguments
///
/// * `lines`: The ways of one set. Must not be empty.
///
/// returns: usize, the way index within `lines`
pub fn least_recently_used(lines: &[CacheLine]) -> usize {
    debug_assert!(!lines.is_empty());
    let mut way = 0;
    let mut min_index = 0;
    let mut min_value = u64::MAX;
    while way < lines.len() {
        if lines[way].last_used < min_value {
            min_value = lines[way].last_used;
            min_index = way;
        }
        way += 1;
    }
    min_index
}
