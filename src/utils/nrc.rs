//! National Registration Card numbers, written as `{state}/{township}({type}){number}`.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::NrcInput;

static NRC_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(.+?)/(.+?)\((.+?)\)(.+)$").unwrap());

/// Empty when any of the four parts is missing.
pub fn format_nrc(nrc: &NrcInput) -> String {
    let parts = [&nrc.state, &nrc.township, &nrc.nrc_type, &nrc.number];
    if parts.iter().any(|part| part.trim().is_empty()) {
        return String::new();
    }
    format!(
        "{}/{}({}){}",
        nrc.state.trim(),
        nrc.township.trim(),
        nrc.nrc_type.trim(),
        nrc.number.trim()
    )
}

pub fn parse_nrc(raw: &str) -> NrcInput {
    match NRC_REGEX.captures(raw.trim()) {
        Some(caps) => NrcInput {
            state: caps[1].to_string(),
            township: caps[2].to_string(),
            nrc_type: caps[3].to_string(),
            number: caps[4].to_string(),
        },
        None => NrcInput::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(state: &str, township: &str, nrc_type: &str, number: &str) -> NrcInput {
        NrcInput {
            state: state.to_string(),
            township: township.to_string(),
            nrc_type: nrc_type.to_string(),
            number: number.to_string(),
        }
    }

    #[test]
    fn test_format_nrc() {
        assert_eq!(format_nrc(&input("12", "KaMaYa", "N", "123456")), "12/KaMaYa(N)123456");
    }

    #[test]
    fn test_format_nrc_missing_part_is_empty() {
        assert_eq!(format_nrc(&input("12", "", "N", "123456")), "");
    }

    #[test]
    fn test_parse_nrc() {
        let parsed = parse_nrc("12/KaMaYa(N)123456");
        assert_eq!(parsed.state, "12");
        assert_eq!(parsed.township, "KaMaYa");
        assert_eq!(parsed.nrc_type, "N");
        assert_eq!(parsed.number, "123456");
    }

    #[test]
    fn test_parse_nrc_not_matching() {
        let parsed = parse_nrc("not an nrc");
        assert!(parsed.state.is_empty());
        assert!(parsed.number.is_empty());
    }
}
