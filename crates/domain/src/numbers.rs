//! Permissive parser for request-number lists such as `"1, 3-5 7"`.

use std::collections::BTreeSet;
use tracing::warn;

/// Ranges wider than this are dropped instead of expanded.
pub const MAX_RANGE_SPAN: u32 = 10_000;

/// Parse a free-text number list into sorted, deduplicated
/// positive integers. Unparsable tokens are skipped, never reported.
///
/// ```
/// assert_eq!(domain::parse_numbers("1, 3-5, 7"), vec![1, 3, 4, 5, 7]);
/// assert_eq!(domain::parse_numbers("5-3"), Vec::<u32>::new());
/// ```
pub fn parse_numbers(text: &str) -> Vec<u32> {
    let text = normalize(text);
    let mut numbers = BTreeSet::new();

    for token in text
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
    {
        match token.split_once('-') {
            Some((start, end)) => {
                let (Ok(start), Ok(end)) = (start.trim().parse::<u32>(), end.trim().parse::<u32>())
                else {
                    warn!("Invalid range format: {}", token);
                    continue;
                };
                if start > end {
                    continue;
                }
                if end - start >= MAX_RANGE_SPAN {
                    warn!("Range too wide, ignored: {}", token);
                    continue;
                }
                numbers.extend((start..=end).filter(|n| *n > 0));
            }
            None => match token.parse::<u32>() {
                Ok(n) if n > 0 => {
                    numbers.insert(n);
                }
                Ok(_) => {}
                Err(_) => warn!("Invalid number format: {}", token),
            },
        }
    }

    numbers.into_iter().collect()
}

/// True when `text` holds nothing but digits, separators and hyphens, i.e.
/// it should be read as a number list rather than as request content.
pub fn is_number_list(text: &str) -> bool {
    !text.is_empty()
        && normalize(text)
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_whitespace() || c == ',' || c == '-')
}

// Full-width forms typed through Japanese IMEs.
fn normalize(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '０'..='９' => char::from_u32(c as u32 - '０' as u32 + '0' as u32).unwrap_or(c),
            '，' | '、' => ',',
            '－' | '−' | '‐' => '-',
            _ => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_documented_forms() {
        assert_eq!(parse_numbers("1-3"), vec![1, 2, 3]);
        assert_eq!(parse_numbers("1 3-4"), vec![1, 3, 4]);
        assert_eq!(parse_numbers("1,2,3"), vec![1, 2, 3]);
        assert_eq!(parse_numbers("1, 3-5, 7"), vec![1, 3, 4, 5, 7]);
    }

    #[test]
    fn reversed_range_is_empty() {
        assert!(parse_numbers("5-3").is_empty());
        assert_eq!(parse_numbers("5-3 2"), vec![2]);
    }

    #[test]
    fn garbage_is_skipped() {
        assert!(parse_numbers("abc").is_empty());
        assert!(parse_numbers("").is_empty());
        assert!(parse_numbers("   ,, ").is_empty());
        assert_eq!(parse_numbers("x 4 1-y 2"), vec![2, 4]);
        assert!(parse_numbers("-3").is_empty());
    }

    #[test]
    fn duplicates_collapse_and_sort() {
        assert_eq!(parse_numbers("3 1-3 2,1"), vec![1, 2, 3]);
        assert_eq!(parse_numbers("9 2 5"), vec![2, 5, 9]);
    }

    #[test]
    fn zero_is_not_a_position() {
        assert_eq!(parse_numbers("0 1"), vec![1]);
        assert_eq!(parse_numbers("0-2"), vec![1, 2]);
    }

    #[test]
    fn full_width_input() {
        assert_eq!(parse_numbers("１、３－４"), vec![1, 3, 4]);
        assert_eq!(parse_numbers("2　4"), vec![2, 4]);
    }

    #[test]
    fn long_vowel_and_wave_marks_are_not_dashes() {
        assert!(!is_number_list("ー"));
        assert!(!is_number_list("ーー〜"));
        assert!(!is_number_list("1～3"));
        assert!(is_number_list("1－3"));
    }

    #[test]
    fn oversized_range_is_dropped() {
        assert!(parse_numbers("1-4000000000").is_empty());
        assert_eq!(parse_numbers("1-20000 3"), vec![3]);
    }

    #[test]
    fn number_list_detection() {
        assert!(is_number_list("1,3-5"));
        assert!(is_number_list("２ ３"));
        assert!(!is_number_list(""));
        assert!(!is_number_list("セピアの軌跡"));
        assert!(!is_number_list("1 song"));
    }
}
