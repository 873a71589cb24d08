mod utils;

use bookmatch::modules::matching::domain::services::{cosine_similarity, TermVector};
use bookmatch::modules::matching::{
    BookMatcher, FuzzyMatcher, IsbnMatcher, IsbnValidator, SearchQuery, SemanticMatcher,
    FUZZY_MATCHER_NAME, ISBN_MATCHER_NAME, SEMANTIC_MATCHER_NAME,
};
use proptest::prelude::*;
use serde_json::json;
use utils::factories::catalogue_source;

#[test]
fn corrupted_isbn_with_letter_o_is_repaired() {
    let repair = IsbnValidator::fix_corrupted_isbn("978O123456789");
    assert!(
        repair
            .valid
            .iter()
            .any(|candidate| IsbnValidator::is_valid_isbn13(candidate)),
        "expected a valid ISBN-13 among {:?}",
        repair.candidates
    );
}

#[test]
fn transposition_of_digits_five_apart_escapes_isbn13_checksum() {
    // Swapping adjacent digits that differ by 5 keeps the weighted sum
    // unchanged mod 10
    assert!(IsbnValidator::is_valid_isbn13("9780000000507"));
    assert!(IsbnValidator::is_valid_isbn13("9780000000057"));

    // Other adjacent swaps are caught
    assert!(IsbnValidator::is_valid_isbn13("9780134685991"));
    assert!(!IsbnValidator::is_valid_isbn13("9780134658991"));
}

#[tokio::test]
async fn isbn_matcher_finds_record_by_isbn10() {
    let matcher = IsbnMatcher::new(catalogue_source());
    let results = matcher
        .search(&SearchQuery::new().with_isbn("0-441-01359-7"))
        .await;

    assert!(!results.is_empty());
    assert_eq!(results[0].title(), Some("Dune"));
    assert!(results[0].score() >= 0.95);
    assert_eq!(results[0].algorithm(), ISBN_MATCHER_NAME);
}

#[tokio::test]
async fn isbn_matcher_extracts_isbn_from_free_text() {
    let matcher = IsbnMatcher::new(catalogue_source());
    let query = SearchQuery::new().with_text_content("Copyright page. ISBN 978-0-13-468599-1 Printed in USA");

    assert!(matcher.is_suitable_for_query(&query));
    let results = matcher.search(&query).await;
    assert_eq!(results[0].title(), Some("Effective Java"));
    assert_eq!(
        results[0].details().unwrap()["match_method"],
        json!("extracted_from_text")
    );
}

#[tokio::test]
async fn fuzzy_matcher_tolerates_typos() {
    let matcher = FuzzyMatcher::new(catalogue_source());
    let results = matcher
        .search(&SearchQuery::new().with_title("Pythno Programing"))
        .await;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].title(), Some("Python Programming"));
    assert!(results[0].score() >= 0.6);
    assert_eq!(results[0].algorithm(), FUZZY_MATCHER_NAME);
}

#[tokio::test]
async fn fuzzy_matcher_matches_author_only_query() {
    let matcher = FuzzyMatcher::new(catalogue_source());
    let results = matcher
        .search(&SearchQuery::new().with_author("Frank Herbert"))
        .await;
    assert_eq!(results[0].title(), Some("Dune"));
}

#[tokio::test]
async fn semantic_matcher_matches_description_terms() {
    let matcher = SemanticMatcher::new(catalogue_source());
    let query = SearchQuery::new().with_text_content("spice melange on a desert planet");

    assert!(matcher.is_suitable_for_query(&query));
    let results = matcher.search(&query).await;
    assert_eq!(results[0].title(), Some("Dune"));
    assert!(results[0].score() >= 0.5);
    assert_eq!(results[0].algorithm(), SEMANTIC_MATCHER_NAME);
}

#[tokio::test]
async fn semantic_matcher_handles_reordered_author_names() {
    let matcher = SemanticMatcher::new(catalogue_source());
    let query = SearchQuery::new()
        .with_title("Effective Java")
        .with_author("Bloch, Joshua");

    let results = matcher.search(&query).await;
    assert_eq!(results[0].title(), Some("Effective Java"));
    assert_eq!(
        results[0].details().unwrap()["author_similarity"],
        json!(1.0)
    );
}

fn vector(terms: &[String]) -> TermVector {
    terms
        .iter()
        .enumerate()
        .map(|(i, term)| (term.clone(), 1.0 + i as f64))
        .collect()
}

proptest! {
    #[test]
    fn cosine_of_vector_with_itself_is_one(terms in prop::collection::hash_set("[a-z]{1,8}", 1..12)) {
        let terms: Vec<String> = terms.into_iter().collect();
        let v = vector(&terms);
        prop_assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn cosine_of_disjoint_vocabularies_is_zero(
        left in prop::collection::hash_set("[a-m]{1,6}", 1..8),
        right in prop::collection::hash_set("[n-z]{1,6}", 1..8),
    ) {
        let left: Vec<String> = left.into_iter().collect();
        let right: Vec<String> = right.into_iter().collect();
        prop_assert_eq!(cosine_similarity(&vector(&left), &vector(&right)), 0.0);
    }
}
