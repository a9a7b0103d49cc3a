//! Luhn (mod-10) checksum validator for order numbers.

/// Validates a decimal-digit string by the Luhn algorithm. Rejects
/// empty input, non-digit characters, and the all-zero number (which
/// would otherwise pass the checksum trivially).
pub fn is_valid(number: &str) -> bool {
    if number.is_empty() || !number.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    if number.bytes().all(|b| b == b'0') {
        return false;
    }

    let sum: u32 = number
        .bytes()
        .rev()
        .enumerate()
        .map(|(i, b)| {
            let mut digit = (b - b'0') as u32;
            if i % 2 == 1 {
                digit *= 2;
                if digit > 9 {
                    digit -= 9;
                }
            }
            digit
        })
        .sum();

    sum % 10 == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_valid_numbers() {
        assert!(is_valid("12345678903"));
        assert!(is_valid("2377225624"));
        assert!(is_valid("4561261212345467"));
    }

    #[test]
    fn test_known_invalid_number() {
        assert!(!is_valid("12345678900"));
    }

    #[test]
    fn test_rejects_zero() {
        assert!(!is_valid("0"));
        assert!(!is_valid("0000"));
    }

    #[test]
    fn test_rejects_non_digits_and_empty() {
        assert!(!is_valid(""));
        assert!(!is_valid("-12345678903"));
        assert!(!is_valid("12a45678903"));
    }

    #[test]
    fn test_single_nonzero_digit_is_invalid() {
        assert!(!is_valid("1"));
    }
}
