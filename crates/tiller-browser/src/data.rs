//! Random fixture data for tests.
//!
//! Suites that create entities on a shared public demo instance need unique
//! names per run, or reruns trip over leftovers from the previous one.

use rand::distributions::Alphanumeric;
use rand::Rng;

/// Generates a random alphanumeric string of the given length.
#[must_use]
pub fn random_string(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// Generates a random integer in `min..=max`.
///
/// # Panics
///
/// Panics if `min > max`.
#[must_use]
pub fn random_number(min: u32, max: u32) -> u32 {
    rand::thread_rng().gen_range(min..=max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_string_has_requested_length_and_charset() {
        let s = random_string(16);
        assert_eq!(s.len(), 16);
        assert!(s.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn random_string_zero_length_is_empty() {
        assert_eq!(random_string(0), "");
    }

    #[test]
    fn random_number_stays_in_range() {
        for _ in 0..100 {
            let n = random_number(10_000, 99_999);
            assert!((10_000..=99_999).contains(&n));
        }
    }

    #[test]
    fn random_number_degenerate_range() {
        assert_eq!(random_number(7, 7), 7);
    }
}
