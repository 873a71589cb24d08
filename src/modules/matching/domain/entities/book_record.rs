use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::search_result::Metadata;

/// A candidate book record supplied by a `CandidateSource`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookRecord {
    pub id: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub authors: Vec<String>,
    pub isbn_10: Option<String>,
    pub isbn_13: Option<String>,
    pub publisher: Option<String>,
    pub year: Option<i32>,
    pub description: Option<String>,
    pub language: Option<String>,
}

impl BookRecord {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_authors<I, S>(mut self, authors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.authors = authors.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_isbn_13(mut self, isbn: impl Into<String>) -> Self {
        self.isbn_13 = Some(isbn.into());
        self
    }

    pub fn with_isbn_10(mut self, isbn: impl Into<String>) -> Self {
        self.isbn_10 = Some(isbn.into());
        self
    }

    pub fn with_publisher(mut self, publisher: impl Into<String>) -> Self {
        self.publisher = Some(publisher.into());
        self
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Title plus subtitle, as used for text similarity
    pub fn full_title(&self) -> String {
        match &self.subtitle {
            Some(subtitle) if !subtitle.is_empty() => format!("{}: {}", self.title, subtitle),
            _ => self.title.clone(),
        }
    }

    /// Every ISBN the record carries, ISBN-13 first
    pub fn isbns(&self) -> Vec<&str> {
        self.isbn_13
            .iter()
            .chain(self.isbn_10.iter())
            .map(String::as_str)
            .collect()
    }

    /// Flattens the record into the metadata map carried by `SearchResult`
    pub fn to_metadata(&self) -> Metadata {
        let mut metadata = Metadata::new();
        metadata.insert("id".to_string(), json!(self.id));
        metadata.insert("title".to_string(), json!(self.title));
        metadata.insert("authors".to_string(), json!(self.authors));

        let optional: [(&str, Option<Value>); 7] = [
            ("subtitle", self.subtitle.as_ref().map(|v| json!(v))),
            ("isbn_10", self.isbn_10.as_ref().map(|v| json!(v))),
            ("isbn_13", self.isbn_13.as_ref().map(|v| json!(v))),
            ("publisher", self.publisher.as_ref().map(|v| json!(v))),
            ("year", self.year.map(|v| json!(v))),
            ("description", self.description.as_ref().map(|v| json!(v))),
            ("language", self.language.as_ref().map(|v| json!(v))),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                metadata.insert(key.to_string(), value);
            }
        }

        metadata
    }
}
