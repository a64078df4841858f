use once_cell::sync::Lazy;
use regex::Regex;

static NRC_NUMBER_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{6}$").unwrap());

static BILL_MONTH_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{4}-(0[1-9]|1[0-2])$").unwrap());

/// Phone numbers are accepted with 6 to 11 characters once trimmed.
pub fn validate_phone(phone: &str) -> bool {
    let len = phone.trim().chars().count();
    (6..=11).contains(&len)
}

pub fn validate_nrc_number(number: &str) -> bool {
    NRC_NUMBER_REGEX.is_match(number.trim())
}

/// `YYYY-MM`
pub fn validate_bill_month(month: &str) -> bool {
    BILL_MONTH_REGEX.is_match(month)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("091234"));
        assert!(validate_phone(" 09123456789 "));
        assert!(!validate_phone("12345"));
        assert!(!validate_phone("091234567890"));
    }

    #[test]
    fn test_validate_nrc_number() {
        assert!(validate_nrc_number("123456"));
        assert!(!validate_nrc_number("12345"));
        assert!(!validate_nrc_number("1234567"));
        assert!(!validate_nrc_number("12a456"));
    }

    #[test]
    fn test_validate_bill_month() {
        assert!(validate_bill_month("2024-01"));
        assert!(!validate_bill_month("2024-13"));
        assert!(!validate_bill_month("January 2024"));
    }
}
