//! Multipart boundary generation.

use rand::Rng;
use rand::distributions::Alphanumeric;

/// Length of a generated boundary token.
const BOUNDARY_LEN: usize = 32;

/// Generates a fresh random boundary token.
///
/// Tokens are alphanumeric, so they are valid boundary characters without
/// quoting. Uniqueness against the bytes of the enclosed parts is not
/// verified; with 32 random alphanumeric characters a collision is not a
/// practical concern.
#[must_use]
pub fn generate() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(BOUNDARY_LEN)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundary_shape() {
        let b = generate();
        assert_eq!(b.len(), BOUNDARY_LEN);
        assert!(b.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_boundaries_differ_per_call() {
        assert_ne!(generate(), generate());
    }
}
