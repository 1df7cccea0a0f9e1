//! Display formatting for unit counts.
//!
//! Counts are stored zero-indexed; everything shown to a person goes through
//! here so that a stored `0` consistently reads as "the 1st".

/// English ordinal suffix for a (one-indexed) number.
///
/// Handles the 11th/12th/13th exceptions.
///
/// # Examples
/// ```
/// use timecrunch_types::formatting::ordinal_suffix;
/// assert_eq!(ordinal_suffix(1), "st");
/// assert_eq!(ordinal_suffix(12), "th");
/// assert_eq!(ordinal_suffix(23), "rd");
/// ```
pub fn ordinal_suffix(n: i64) -> &'static str {
    let n = n.unsigned_abs();
    if (11..=13).contains(&(n % 100)) {
        return "th";
    }
    match n % 10 {
        1 => "st",
        2 => "nd",
        3 => "rd",
        _ => "th",
    }
}

/// Format a one-indexed number as an ordinal.
///
/// # Examples
/// ```
/// use timecrunch_types::formatting::format_ordinal;
/// assert_eq!(format_ordinal(1), "1st");
/// assert_eq!(format_ordinal(2), "2nd");
/// assert_eq!(format_ordinal(111), "111th");
/// ```
pub fn format_ordinal(n: i64) -> String {
    format!("{}{}", n, ordinal_suffix(n))
}

/// Format a zero-indexed stored count for display (`0` -> `"1st"`).
///
/// # Examples
/// ```
/// use timecrunch_types::formatting::format_count;
/// assert_eq!(format_count(0), "1st");
/// assert_eq!(format_count(59), "60th");
/// ```
pub fn format_count(stored: i64) -> String {
    format_ordinal(stored.saturating_add(1))
}

/// Join `(label, one-indexed value)` pairs as `label: 1st, label: 2nd`.
///
/// # Examples
/// ```
/// use timecrunch_types::formatting::format_human_time;
/// let line = format_human_time([("second", 1), ("minute", 3)]);
/// assert_eq!(line, "second: 1st, minute: 3rd");
/// ```
pub fn format_human_time<L, I>(entries: I) -> String
where
    L: std::fmt::Display,
    I: IntoIterator<Item = (L, i64)>,
{
    entries
        .into_iter()
        .map(|(label, value)| format!("{}: {}", label, format_ordinal(value)))
        .collect::<Vec<_>>()
        .join(", ")
}
