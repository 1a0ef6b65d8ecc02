//! Checksum validators for numeric identifiers

/// Validate a digit string with the Luhn algorithm
///
/// Digits are processed right to left; every digit at an odd position
/// (0-indexed from the right) is doubled, minus 9 when the result exceeds 9.
/// The number is valid when the digit sum is divisible by 10. Any non-digit
/// char makes the input invalid, as does an empty string.
pub fn luhn_valid(digits: &str) -> bool {
    if digits.is_empty() {
        return false;
    }

    let mut total = 0u32;
    for (i, ch) in digits.chars().rev().enumerate() {
        let Some(mut d) = ch.to_digit(10) else {
            return false;
        };
        if i % 2 == 1 {
            d *= 2;
            if d > 9 {
                d -= 9;
            }
        }
        total += d;
    }
    total % 10 == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("73282932000074", true ; "known valid siret")]
    #[test_case("12345678901234", false ; "sequential digits")]
    #[test_case("35600000000048", true ; "another valid siret")]
    #[test_case("00000000000000", true ; "all zeros")]
    #[test_case("73282932000075", false ; "last digit changed")]
    #[test_case("7328293200007a", false ; "non digit")]
    #[test_case("", false ; "empty")]
    fn test_luhn(input: &str, expected: bool) {
        assert_eq!(luhn_valid(input), expected);
    }
}
