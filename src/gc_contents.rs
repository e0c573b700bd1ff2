/// GC content of `sequence` in percent (0-100). `S` (strong, G or C) counts
/// as GC; other ambiguity codes do not.
#[inline(always)]
pub fn gc_percent(sequence: &[u8]) -> f64 {
    if sequence.is_empty() {
        return 0.0;
    }
    let gc = sequence
        .iter()
        .map(|c| c.to_ascii_uppercase())
        .filter(|&c| c == b'G' || c == b'C' || c == b'S')
        .count() as f64;
    100.0 * gc / sequence.len() as f64
}
