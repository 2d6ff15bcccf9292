//! C9 — deterministic symbol-to-lane partitioning. Lets each worker own a
//! disjoint half of the symbol space with no coordination between them.

/// `A..M` → lane 0, `N..Z` → lane 1 (case-insensitive on the first byte).
/// Non-alphabetic or empty symbols default to lane 0. Takes raw bytes
/// rather than a validated [`crate::types::Symbol`] so ingress can route a
/// message to its lane before paying the cost of constructing one.
pub fn lane_of(symbol: &[u8]) -> u8 {
    match symbol.first() {
        Some(&b) => {
            let upper = b.to_ascii_uppercase();
            if upper.is_ascii_uppercase() && upper > b'M' {
                1
            } else {
                0
            }
        }
        None => 0,
    }
}
