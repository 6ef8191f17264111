//! Identifier normalisation shared by the stop and pole tables.

/// Left-pads `value` with `0` until it is `width` characters long.
///
/// A value already longer than `width` is returned as is; it is never
/// truncated.
pub fn pad(value: &str, width: usize) -> String {
    let missing = width.saturating_sub(value.chars().count());
    let mut padded = "0".repeat(missing);
    padded.push_str(value);
    padded
}

/// `ABCDEFG` becomes `ABCD_EFG`: stop code, then pole number.
///
/// Only 7 character codes have that shape, anything else is returned as is.
pub fn split_compound(code: &str) -> String {
    if code.chars().count() != 7 {
        return code.to_owned();
    }
    let (stop, pole) = match code.char_indices().nth(4) {
        Some((at, _)) => code.split_at(at),
        None => return code.to_owned(),
    };
    format!("{stop}_{pole}")
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn pads_to_width() {
        assert_eq!(pad("3", 7), "0000003");
        assert_eq!(pad("12", 4), "0012");
        assert_eq!(pad("", 2), "00");
    }

    #[test]
    fn longer_values_are_kept() {
        assert_eq!(pad("12345", 4), "12345");
        assert_eq!(pad("1234", 4), "1234");
    }

    #[test]
    fn zero_width_is_identity() {
        assert_eq!(pad("42", 0), "42");
    }

    #[test]
    fn split_seven_chars() {
        assert_eq!(split_compound("0012003"), "0012_003");
        assert_eq!(split_compound("ABCDEFG"), "ABCD_EFG");
    }

    #[test]
    fn split_other_lengths_unchanged() {
        assert_eq!(split_compound("123456"), "123456");
        assert_eq!(split_compound("12345678"), "12345678");
        assert_eq!(split_compound(""), "");
    }
}
