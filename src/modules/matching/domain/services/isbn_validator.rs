use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Characters OCR commonly produces in place of ISBN characters
const OCR_SUBSTITUTIONS: [(char, char); 10] = [
    ('@', '9'),
    ('O', '0'),
    ('I', '1'),
    ('l', '1'),
    ('S', '5'),
    ('G', '6'),
    ('B', '8'),
    ('>', '7'),
    ('?', '8'),
    ('_', '-'),
];

/// Upper bound on pairwise substitution variants tried per token
const MAX_PAIR_COMBINATIONS: usize = 6;

static ISBN13_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"97[89](?:[\s-]?\d){10}").expect("valid ISBN-13 pattern"));

static ISBN10_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b\d(?:[\s-]?\d){8}[\s-]?[\dXx]\b").expect("valid ISBN-10 pattern")
});

static SUSPECT_TOKEN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9A-Za-z@>?_\-]{10,17}").expect("valid token pattern"));

/// Outcome of a corruption-repair attempt
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IsbnRepair {
    /// Candidates that pass ISBN-10 or ISBN-13 validation, in discovery order
    pub valid: Vec<String>,
    /// Every cleaned variant that was considered, valid or not
    pub candidates: Vec<String>,
}

impl IsbnRepair {
    pub fn is_empty(&self) -> bool {
        self.valid.is_empty()
    }
}

/// ISBN cleaning, checksum validation, conversion and OCR repair
pub struct IsbnValidator;

impl IsbnValidator {
    /// Keep digits and `X` (uppercased), drop everything else
    pub fn clean(raw: &str) -> String {
        raw.chars()
            .filter_map(|c| match c {
                '0'..='9' => Some(c),
                'x' | 'X' => Some('X'),
                _ => None,
            })
            .collect()
    }

    pub fn is_valid_isbn13(isbn: &str) -> bool {
        if isbn.len() != 13 || !isbn.bytes().all(|b| b.is_ascii_digit()) {
            return false;
        }
        match Self::calculate_isbn13_check_digit(&isbn[..12]) {
            Some(check) => isbn.ends_with(check),
            None => false,
        }
    }

    pub fn is_valid_isbn10(isbn: &str) -> bool {
        if isbn.len() != 10 {
            return false;
        }

        let mut checksum = 0u32;
        for (i, c) in isbn.chars().enumerate() {
            let value = match c {
                '0'..='9' => c as u32 - '0' as u32,
                'X' | 'x' if i == 9 => 10,
                _ => return false,
            };
            checksum += (10 - i as u32) * value;
        }

        checksum % 11 == 0
    }

    /// Check digit for a 12-digit ISBN-13 body (weights alternate 1, 3)
    pub fn calculate_isbn13_check_digit(body: &str) -> Option<char> {
        if body.len() != 12 || !body.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        let checksum: u32 = body
            .bytes()
            .enumerate()
            .map(|(i, b)| {
                let digit = (b - b'0') as u32;
                if i % 2 == 0 {
                    digit
                } else {
                    digit * 3
                }
            })
            .sum();

        let check = (10 - checksum % 10) % 10;
        char::from_digit(check, 10)
    }

    /// Check digit for a 9-digit ISBN-10 body (`X` stands for 10)
    pub fn calculate_isbn10_check_digit(body: &str) -> Option<char> {
        if body.len() != 9 || !body.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        let checksum: u32 = body
            .bytes()
            .enumerate()
            .map(|(i, b)| (10 - i as u32) * (b - b'0') as u32)
            .sum();

        match (11 - checksum % 11) % 11 {
            10 => Some('X'),
            check => char::from_digit(check, 10),
        }
    }

    pub fn convert_isbn10_to_isbn13(isbn10: &str) -> Option<String> {
        let cleaned = Self::clean(isbn10);
        if !Self::is_valid_isbn10(&cleaned) {
            return None;
        }

        let body = format!("978{}", &cleaned[..9]);
        let check = Self::calculate_isbn13_check_digit(&body)?;
        Some(format!("{}{}", body, check))
    }

    /// Only `978`-prefixed ISBN-13s have an ISBN-10 form
    pub fn convert_isbn13_to_isbn10(isbn13: &str) -> Option<String> {
        let cleaned = Self::clean(isbn13);
        if !Self::is_valid_isbn13(&cleaned) || !cleaned.starts_with("978") {
            return None;
        }

        let body = &cleaned[3..12];
        let check = Self::calculate_isbn10_check_digit(body)?;
        Some(format!("{}{}", body, check))
    }

    /// Canonical ISBN-13 form of any valid ISBN-10/13 input
    pub fn normalize_to_isbn13(raw: &str) -> Option<String> {
        let cleaned = Self::clean(raw);
        if Self::is_valid_isbn13(&cleaned) {
            Some(cleaned)
        } else if Self::is_valid_isbn10(&cleaned) {
            Self::convert_isbn10_to_isbn13(&cleaned)
        } else {
            None
        }
    }

    /// Try to recover valid ISBNs from OCR-corrupted text
    ///
    /// Substitutions are applied one at a time, all together, and in a
    /// capped number of pairs. When the token contains no substitutable
    /// characters the cleaned text itself is the only variant.
    pub fn fix_corrupted_isbn(text: &str) -> IsbnRepair {
        let applicable: Vec<(char, char)> = OCR_SUBSTITUTIONS
            .iter()
            .copied()
            .filter(|(from, _)| text.contains(*from))
            .collect();

        let mut variants: Vec<String> = Vec::new();
        if applicable.is_empty() {
            variants.push(text.to_string());
        } else {
            if applicable.len() > 1 {
                variants.push(Self::apply_substitutions(text, &applicable));
            }
            for sub in &applicable {
                variants.push(Self::apply_substitutions(text, std::slice::from_ref(sub)));
            }

            let mut pairs = 0;
            'outer: for (i, a) in applicable.iter().enumerate() {
                for b in applicable.iter().skip(i + 1) {
                    if pairs >= MAX_PAIR_COMBINATIONS {
                        break 'outer;
                    }
                    variants.push(Self::apply_substitutions(text, &[*a, *b]));
                    pairs += 1;
                }
            }
        }

        let mut repair = IsbnRepair::default();
        let mut seen_candidates = HashSet::new();
        let mut seen_valid = HashSet::new();

        for variant in variants {
            let cleaned = Self::clean(&variant);
            if cleaned.is_empty() || !seen_candidates.insert(cleaned.clone()) {
                continue;
            }

            if let Some(valid) = Self::repair_candidate(&cleaned) {
                if seen_valid.insert(valid.clone()) {
                    repair.valid.push(valid);
                }
            }
            repair.candidates.push(cleaned);
        }

        repair
    }

    /// Scan free text for ISBNs, repairing corrupted tokens where possible
    pub fn extract_isbns_from_text(text: &str) -> Vec<String> {
        let mut found: Vec<String> = Vec::new();
        let mut seen = HashSet::new();
        let mut claimed_spans: Vec<(usize, usize)> = Vec::new();
        let mut to_repair: Vec<&str> = Vec::new();

        let mut push = |isbn: String, found: &mut Vec<String>| {
            if seen.insert(isbn.clone()) {
                found.push(isbn);
            }
        };

        for m in ISBN13_PATTERN.find_iter(text) {
            claimed_spans.push((m.start(), m.end()));
            let cleaned = Self::clean(m.as_str());
            if Self::is_valid_isbn13(&cleaned) {
                push(cleaned, &mut found);
            } else {
                to_repair.push(m.as_str());
            }
        }

        for m in ISBN10_PATTERN.find_iter(text) {
            if overlaps(&claimed_spans, m.start(), m.end()) {
                continue;
            }
            claimed_spans.push((m.start(), m.end()));
            let cleaned = Self::clean(m.as_str());
            if Self::is_valid_isbn10(&cleaned) {
                push(cleaned, &mut found);
            } else {
                to_repair.push(m.as_str());
            }
        }

        for m in SUSPECT_TOKEN_PATTERN.find_iter(text) {
            if overlaps(&claimed_spans, m.start(), m.end()) {
                continue;
            }
            let digits = m.as_str().chars().filter(char::is_ascii_digit).count();
            if digits >= 6 {
                to_repair.push(m.as_str());
            }
        }

        for token in to_repair {
            for isbn in Self::fix_corrupted_isbn(token).valid {
                push(isbn, &mut found);
            }
        }

        found
    }

    fn apply_substitutions(text: &str, subs: &[(char, char)]) -> String {
        text.chars()
            .map(|c| {
                subs.iter()
                    .find(|(from, _)| *from == c)
                    .map_or(c, |(_, to)| *to)
            })
            .collect()
    }

    fn repair_candidate(cleaned: &str) -> Option<String> {
        let all_digits = cleaned.bytes().all(|b| b.is_ascii_digit());
        match cleaned.len() {
            13 if Self::is_valid_isbn13(cleaned) => Some(cleaned.to_string()),
            13 if all_digits => {
                let body = &cleaned[..12];
                Self::calculate_isbn13_check_digit(body).map(|c| format!("{}{}", body, c))
            }
            12 if all_digits => {
                Self::calculate_isbn13_check_digit(cleaned).map(|c| format!("{}{}", cleaned, c))
            }
            10 if Self::is_valid_isbn10(cleaned) => Some(cleaned.to_string()),
            _ => None,
        }
    }
}

fn overlaps(spans: &[(usize, usize)], start: usize, end: usize) -> bool {
    spans.iter().any(|&(s, e)| start < e && s < end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_clean_keeps_digits_and_x() {
        assert_eq!(IsbnValidator::clean("ISBN 0-8044-2957-x"), "080442957X");
        assert_eq!(IsbnValidator::clean("978-0-13-468599-1"), "9780134685991");
    }

    #[test]
    fn test_known_isbn13_is_valid() {
        assert!(IsbnValidator::is_valid_isbn13("9780134685991"));
        assert!(IsbnValidator::is_valid_isbn13("9780306406157"));
        assert!(!IsbnValidator::is_valid_isbn13("9780306406158"));
        assert!(!IsbnValidator::is_valid_isbn13("978030640615"));
    }

    #[test]
    fn test_known_isbn10_is_valid() {
        assert!(IsbnValidator::is_valid_isbn10("0306406152"));
        assert!(IsbnValidator::is_valid_isbn10("080442957X"));
        assert!(!IsbnValidator::is_valid_isbn10("0306406153"));
        assert!(!IsbnValidator::is_valid_isbn10("03064X6152"));
    }

    #[test]
    fn test_isbn10_to_isbn13() {
        assert_eq!(
            IsbnValidator::convert_isbn10_to_isbn13("0306406152").as_deref(),
            Some("9780306406157")
        );
        assert!(IsbnValidator::convert_isbn10_to_isbn13("0306406153").is_none());
    }

    #[test]
    fn test_isbn13_to_isbn10() {
        assert_eq!(
            IsbnValidator::convert_isbn13_to_isbn10("9780306406157").as_deref(),
            Some("0306406152")
        );
        assert_eq!(
            IsbnValidator::convert_isbn13_to_isbn10("9780804429573").as_deref(),
            Some("080442957X")
        );
    }

    #[test]
    fn test_normalize_to_isbn13() {
        assert_eq!(
            IsbnValidator::normalize_to_isbn13("0-306-40615-2").as_deref(),
            Some("9780306406157")
        );
        assert!(IsbnValidator::normalize_to_isbn13("12345").is_none());
    }

    #[test]
    fn test_fix_capital_o_corruption() {
        let repair = IsbnValidator::fix_corrupted_isbn("978O123456789");
        assert!(!repair.is_empty());
        assert!(repair
            .valid
            .iter()
            .all(|isbn| IsbnValidator::is_valid_isbn13(isbn) || IsbnValidator::is_valid_isbn10(isbn)));
        assert!(repair.candidates.contains(&"9780123456789".to_string()));
    }

    #[test]
    fn test_fix_at_sign_corruption() {
        let repair = IsbnValidator::fix_corrupted_isbn("@780134685991");
        assert_eq!(repair.valid.first().map(String::as_str), Some("9780134685991"));
    }

    #[test]
    fn test_fix_completes_twelve_digits() {
        let repair = IsbnValidator::fix_corrupted_isbn("978013468599");
        assert_eq!(repair.valid, vec!["9780134685991".to_string()]);
    }

    #[test]
    fn test_fix_rejects_garbage() {
        let repair = IsbnValidator::fix_corrupted_isbn("hello");
        assert!(repair.is_empty());
    }

    #[test]
    fn test_extract_from_text() {
        let text = "See Effective Java (ISBN 978-0-13-468599-1) and also 0-306-40615-2.";
        let found = IsbnValidator::extract_isbns_from_text(text);
        assert_eq!(
            found,
            vec!["9780134685991".to_string(), "0306406152".to_string()]
        );
    }

    #[test]
    fn test_extract_repairs_corrupted_token() {
        let found = IsbnValidator::extract_isbns_from_text("isbn: 978O13468S991 printed");
        assert!(found.contains(&"9780134685991".to_string()));
    }

    #[test]
    fn test_extract_ignores_plain_words() {
        assert!(IsbnValidator::extract_isbns_from_text("Programming Languages Overview").is_empty());
    }

    proptest! {
        #[test]
        fn prop_computed_check_digit_validates(body in "[0-9]{12}") {
            let check = IsbnValidator::calculate_isbn13_check_digit(&body).unwrap();
            let isbn = format!("{}{}", body, check);
            prop_assert!(IsbnValidator::is_valid_isbn13(&isbn));
        }

        #[test]
        fn prop_single_digit_flip_invalidates(body in "[0-9]{12}", pos in 0usize..13, bump in 1u8..10) {
            let check = IsbnValidator::calculate_isbn13_check_digit(&body).unwrap();
            let mut bytes = format!("{}{}", body, check).into_bytes();
            bytes[pos] = b'0' + ((bytes[pos] - b'0' + bump) % 10);
            let flipped = String::from_utf8(bytes).unwrap();
            prop_assert!(!IsbnValidator::is_valid_isbn13(&flipped));
        }

        #[test]
        fn prop_isbn10_conversion_validates(body in "[0-9]{9}") {
            let check = IsbnValidator::calculate_isbn10_check_digit(&body).unwrap();
            let isbn10 = format!("{}{}", body, check);
            prop_assert!(IsbnValidator::is_valid_isbn10(&isbn10));
            let isbn13 = IsbnValidator::convert_isbn10_to_isbn13(&isbn10).unwrap();
            prop_assert!(IsbnValidator::is_valid_isbn13(&isbn13));
        }
    }
}
