//! Deterministic CEP sampling over a 5-digit root.
//!
//! Suffixes are unevenly assigned, so the dense policy samples a small
//! spread inside every block of ten rather than walking all 1000
//! suffixes. Pure generation, no I/O.

/// Suffix offsets sampled inside each block of ten by [`dense_samples`].
const DENSE_OFFSETS: [u32; 4] = [0, 1, 4, 7];

/// High-precision sample: 4 offsets per hundred-block step of 10 over the
/// 0-999 suffix range: up to 400 candidate codes per root, in suffix
/// order.
#[must_use]
pub fn dense_samples(root: &str) -> Vec<String> {
    let mut codes = Vec::with_capacity(400);
    for block in (0..1000).step_by(10) {
        for offset in DENSE_OFFSETS {
            codes.push(format!("{root}{:03}", block + offset));
        }
    }
    codes
}

/// Fast estimate sample: every 100th suffix, 10 candidates per root.
#[must_use]
pub fn sparse_samples(root: &str) -> Vec<String> {
    (0..1000)
        .step_by(100)
        .map(|suffix| format!("{root}{suffix:03}"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dense_yields_400_ordered_codes() {
        let codes = dense_samples("03100");
        assert_eq!(codes.len(), 400);
        assert_eq!(codes[0], "03100000");
        assert_eq!(codes[1], "03100001");
        assert_eq!(codes[2], "03100004");
        assert_eq!(codes[3], "03100007");
        assert_eq!(codes[4], "03100010");
        assert_eq!(codes[399], "03100997");
    }

    #[test]
    fn dense_codes_are_all_eight_digits() {
        assert!(dense_samples("00001")
            .iter()
            .all(|c| c.len() == 8 && c.bytes().all(|b| b.is_ascii_digit())));
    }

    #[test]
    fn sparse_yields_every_hundredth_suffix() {
        let codes = sparse_samples("03100");
        assert_eq!(codes.len(), 10);
        assert_eq!(codes[0], "03100000");
        assert_eq!(codes[1], "03100100");
        assert_eq!(codes[9], "03100900");
    }

    #[test]
    fn suffixes_are_zero_padded() {
        let codes = dense_samples("37002");
        assert!(codes.contains(&"37002007".to_string()));
        assert!(codes.contains(&"37002014".to_string()));
    }
}
