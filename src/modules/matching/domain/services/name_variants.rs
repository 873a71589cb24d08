use std::collections::HashSet;
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

/// Default n-gram window size for author name tokens
pub const DEFAULT_NGRAM_SIZE: usize = 2;

/// Contiguous token windows of size `n`, joined by a single space
///
/// Fewer than `n` tokens yields the whole sequence as one gram.
pub fn ngrams(tokens: &[String], n: usize) -> Vec<String> {
    if tokens.is_empty() || n == 0 {
        return Vec::new();
    }
    if tokens.len() < n {
        return vec![tokens.join(" ")];
    }
    tokens.windows(n).map(|window| window.join(" ")).collect()
}

/// Lowercased, accent-free name tokens in "given ... family" order
///
/// "Tolkien, J. R. R." becomes ["j", "r", "r", "tolkien"].
pub fn name_tokens(name: &str) -> Vec<String> {
    let folded: String = name
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase();

    let ordered = match folded.split_once(',') {
        Some((family, given)) if !given.trim().is_empty() => format!("{} {}", given, family),
        _ => folded,
    };

    ordered
        .split(|c: char| c.is_whitespace() || c == '.')
        .map(|part| part.trim_matches(|c: char| !c.is_alphanumeric() && c != '-'))
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

/// Spellings under which the same author is commonly catalogued
///
/// Includes "first last", "last, first", "f. last", the bare family name,
/// the full token sequence and its n-grams.
pub fn author_name_variants(name: &str, ngram_size: usize) -> HashSet<String> {
    let tokens = name_tokens(name);
    let mut variants = HashSet::new();

    let Some(last) = tokens.last() else {
        return variants;
    };

    variants.insert(last.clone());
    if tokens.len() == 1 {
        return variants;
    }

    let first = &tokens[0];
    let given = &tokens[..tokens.len() - 1];

    variants.insert(tokens.join(" "));
    variants.insert(format!("{} {}", first, last));
    variants.insert(format!("{}, {}", last, first));

    let initials = given
        .iter()
        .filter_map(|part| part.chars().next())
        .map(|c| format!("{}.", c))
        .collect::<Vec<_>>()
        .join(" ");
    variants.insert(format!("{} {}", initials, last));

    variants.extend(ngrams(&tokens, ngram_size));
    variants
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_ngrams_windows() {
        assert_eq!(
            ngrams(&tokens(&["john", "ronald", "tolkien"]), 2),
            vec!["john ronald", "ronald tolkien"]
        );
    }

    #[test]
    fn test_ngrams_short_input() {
        assert_eq!(ngrams(&tokens(&["tolkien"]), 2), vec!["tolkien"]);
        assert!(ngrams(&[], 2).is_empty());
    }

    #[test]
    fn test_name_tokens_reorders_inverted_names() {
        assert_eq!(name_tokens("Tolkien, J. R. R."), tokens(&["j", "r", "r", "tolkien"]));
        assert_eq!(name_tokens("José Saramago"), tokens(&["jose", "saramago"]));
    }

    #[test]
    fn test_author_variants_common_forms() {
        let variants = author_name_variants("Mark Lutz", DEFAULT_NGRAM_SIZE);
        assert!(variants.contains("mark lutz"));
        assert!(variants.contains("lutz, mark"));
        assert!(variants.contains("m. lutz"));
        assert!(variants.contains("lutz"));
    }

    #[test]
    fn test_author_variants_match_across_spellings() {
        let a = author_name_variants("Lutz, Mark", DEFAULT_NGRAM_SIZE);
        let b = author_name_variants("M. Lutz", DEFAULT_NGRAM_SIZE);
        assert!(a.intersection(&b).next().is_some());
    }

    #[test]
    fn test_author_variants_empty_name() {
        assert!(author_name_variants("  ", DEFAULT_NGRAM_SIZE).is_empty());
    }
}
