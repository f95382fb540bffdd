//! CEP (Brazilian postal code) normalization helpers.
//!
//! A CEP is an opaque 8-digit string: the first 5 digits are the root
//! (coarse delivery zone), the last 3 the suffix. The digits carry no
//! arithmetic meaning beyond grouping.

/// Number of digits in a full CEP.
pub const CEP_LEN: usize = 8;

/// Number of digits in a CEP root.
pub const ROOT_LEN: usize = 5;

/// Normalizes a raw CEP string: strips `-`, `.` and whitespace, then
/// requires exactly 8 ASCII digits. Returns `None` for anything else.
#[must_use]
pub fn normalize(raw: &str) -> Option<String> {
    let digits = strip_separators(raw);
    (digits.len() == CEP_LEN && digits.bytes().all(|b| b.is_ascii_digit())).then_some(digits)
}

/// Lenient variant of [`normalize`] for values read from spreadsheets,
/// where leading zeros are routinely eaten: accepts 1..=8 digits and
/// left-pads with zeros to the full width.
#[must_use]
pub fn normalize_padded(raw: &str) -> Option<String> {
    let digits = strip_separators(raw);
    if digits.is_empty() || digits.len() > CEP_LEN || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(format!("{digits:0>8}"))
}

/// Normalizes a 5-digit root, with the same spreadsheet-friendly left
/// padding as [`normalize_padded`].
#[must_use]
pub fn normalize_root(raw: &str) -> Option<String> {
    let digits = strip_separators(raw);
    if digits.is_empty() || digits.len() > ROOT_LEN || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(format!("{digits:0>5}"))
}

/// The 5-digit root prefix of a normalized CEP.
///
/// # Panics
///
/// Panics if `cep` is shorter than 5 bytes; callers pass values produced
/// by [`normalize`].
#[must_use]
pub fn root_of(cep: &str) -> &str {
    &cep[..ROOT_LEN]
}

fn strip_separators(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && *c != '-' && *c != '.')
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_dash_and_whitespace() {
        assert_eq!(normalize(" 01310-100 ").as_deref(), Some("01310100"));
        assert_eq!(normalize("37.002-970").as_deref(), Some("37002970"));
    }

    #[test]
    fn normalize_rejects_wrong_length() {
        assert_eq!(normalize("1310100"), None);
        assert_eq!(normalize("013101000"), None);
        assert_eq!(normalize(""), None);
    }

    #[test]
    fn normalize_rejects_non_digits() {
        assert_eq!(normalize("0131010O"), None);
        assert_eq!(normalize("abcdefgh"), None);
    }

    #[test]
    fn normalize_padded_restores_leading_zeros() {
        assert_eq!(normalize_padded("1310100").as_deref(), Some("01310100"));
        assert_eq!(normalize_padded("01310-100").as_deref(), Some("01310100"));
    }

    #[test]
    fn normalize_padded_rejects_overlong_and_non_digit() {
        assert_eq!(normalize_padded("123456789"), None);
        assert_eq!(normalize_padded("13x0100"), None);
        assert_eq!(normalize_padded(""), None);
    }

    #[test]
    fn normalize_root_pads_and_rejects() {
        assert_eq!(normalize_root("3100").as_deref(), Some("03100"));
        assert_eq!(normalize_root("03100").as_deref(), Some("03100"));
        assert_eq!(normalize_root("031000"), None);
        assert_eq!(normalize_root("03a00"), None);
    }

    #[test]
    fn root_of_takes_the_first_five_digits() {
        assert_eq!(root_of("01310100"), "01310");
    }
}
