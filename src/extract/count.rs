//! Engagement count parsing ("1.2K" -> 1200).

/// Parse a displayed engagement count.
///
/// Everything except digits, `.`, `K`/`k` and `M`/`m` is stripped. With a
/// `K` suffix the leading decimal is multiplied by 1,000 and floored, with
/// `M` by 1,000,000; otherwise the leading integer is used. Anything
/// unparseable is 0.
pub fn parse_count(raw: &str) -> u64 {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | 'K' | 'k' | 'M' | 'm'))
        .collect();

    if cleaned.contains(['K', 'k']) {
        scaled(&cleaned, 1_000.0)
    } else if cleaned.contains(['M', 'm']) {
        scaled(&cleaned, 1_000_000.0)
    } else {
        leading_integer(&cleaned).unwrap_or(0)
    }
}

fn scaled(cleaned: &str, factor: f64) -> u64 {
    match leading_decimal(cleaned) {
        Some(value) if value.is_finite() && value >= 0.0 => (value * factor).floor() as u64,
        _ => 0,
    }
}

/// Longest numeric prefix with at most one decimal point.
fn leading_decimal(s: &str) -> Option<f64> {
    let mut end = 0;
    let mut seen_dot = false;
    for (i, c) in s.char_indices() {
        match c {
            '0'..='9' => end = i + 1,
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
    }
    if end == 0 {
        return None;
    }
    s[..end].parse().ok()
}

fn leading_integer(s: &str) -> Option<u64> {
    let digits: String = s.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// Whether a string contains anything that could be a count.
pub fn has_digits(raw: &str) -> bool {
    raw.chars().any(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suffixes() {
        assert_eq!(parse_count("1.2K"), 1200);
        assert_eq!(parse_count("3M"), 3_000_000);
        assert_eq!(parse_count("2.5m"), 2_500_000);
        assert_eq!(parse_count("15k"), 15_000);
    }

    #[test]
    fn test_plain_numbers() {
        assert_eq!(parse_count("47"), 47);
        assert_eq!(parse_count("1,234"), 1234);
        assert_eq!(parse_count(" 12 Replies "), 12);
    }

    #[test]
    fn test_unparseable_is_zero() {
        assert_eq!(parse_count(""), 0);
        assert_eq!(parse_count("Reply"), 0);
        assert_eq!(parse_count("K"), 0);
        assert_eq!(parse_count(".K"), 0);
    }
}
