const SUFFIXES: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

/// Formats a raw byte count for humans, e.g. `17179869184` becomes `"16.00 GB"`.
///
/// Values are divided by 1024 for as long as they exceed 1024,
/// stopping at the largest suffix we know of.
pub fn human_readable(bytes: u64, precision: usize) -> String {
    let mut size = bytes as f64;
    let mut suffix_index = 0;
    while size > 1024.0 && suffix_index < SUFFIXES.len() - 1 {
        suffix_index += 1;
        size /= 1024.0;
    }
    format!("{size:.precision$} {}", SUFFIXES[suffix_index])
}
