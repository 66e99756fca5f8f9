//! Field delimiter detection.

use csv::ReaderBuilder;

/// Candidate delimiters in tie-break order.
pub const DELIMITER_CANDIDATES: [u8; 4] = [b',', b';', b'\t', b'|'];

/// Number of non-blank lines inspected.
const SNIFF_LINES: usize = 20;

/// Picks the delimiter whose field count is most consistent with the header.
///
/// A candidate scores the number of sampled lines whose field count equals
/// the header's, provided the header splits into more than one field. Ties
/// keep the earlier candidate; with no scoring candidate the comma wins.
pub fn sniff_delimiter(text: &str) -> u8 {
    let sample: Vec<&str> = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .take(SNIFF_LINES)
        .collect();
    if sample.is_empty() {
        return DELIMITER_CANDIDATES[0];
    }
    let sample = sample.join("\n");

    let mut best = (DELIMITER_CANDIDATES[0], 0usize);
    for delimiter in DELIMITER_CANDIDATES {
        let score = consistency(&sample, delimiter);
        if score > best.1 {
            best = (delimiter, score);
        }
    }
    best.0
}

fn consistency(sample: &str, delimiter: u8) -> usize {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(sample.as_bytes());

    let lengths: Vec<usize> = reader
        .records()
        .filter_map(|record| record.ok().map(|record| record.len()))
        .collect();
    match lengths.first() {
        Some(&header) if header > 1 => lengths.iter().filter(|&&len| len == header).count(),
        _ => 0,
    }
}
