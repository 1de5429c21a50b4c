//! Offline lore used when no text generator is reachable.

const CANNED_LORE: [&str; 6] = [
    "Entity signature collapsed into a cloud of corrupted sectors. Residual checksum matches a deleted payroll daemon.",
    "Purge complete. The thing was stitched from orphaned inodes and a screensaver nobody remembered installing.",
    "Hostile process terminated. Its last log line repeated an employee badge number four thousand times.",
    "Signal lost. Recovered fragments describe a firmware update that was never supposed to ship.",
    "The intruder unravels into static. Somewhere a fan spins down for the first time in years.",
    "Threat neutralised. Memory dump contains only the word 'overtime', encoded in every format at once.",
];

/// Canned line for the `index`th request, cycling through the pool.
#[must_use]
pub fn canned_line(index: usize) -> &'static str {
    CANNED_LORE[index % CANNED_LORE.len()]
}
