use serde::{Deserialize, Serialize};

use crate::modules::matching::traits::MatcherOptions;

/// A partial, possibly noisy bibliographic query
///
/// Built once by the caller (usually a text-extraction or CLI layer) and
/// then only read. Every field is optional; matchers decide for themselves
/// whether a query carries enough signal for them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchQuery {
    title: Option<String>,
    authors: Vec<String>,
    isbn: Option<String>,
    publisher: Option<String>,
    year: Option<i32>,
    text_content: Option<String>,
    options: MatcherOptions,
}

impl SearchQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = non_blank(title.into());
        self
    }

    pub fn with_authors<I, S>(mut self, authors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.authors = authors
            .into_iter()
            .filter_map(|a| non_blank(a.into()))
            .collect();
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        if let Some(author) = non_blank(author.into()) {
            self.authors.push(author);
        }
        self
    }

    pub fn with_isbn(mut self, isbn: impl Into<String>) -> Self {
        self.isbn = non_blank(isbn.into());
        self
    }

    pub fn with_publisher(mut self, publisher: impl Into<String>) -> Self {
        self.publisher = non_blank(publisher.into());
        self
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_text_content(mut self, text: impl Into<String>) -> Self {
        self.text_content = non_blank(text.into());
        self
    }

    pub fn with_options(mut self, options: MatcherOptions) -> Self {
        self.options = options;
        self
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn authors(&self) -> &[String] {
        &self.authors
    }

    pub fn isbn(&self) -> Option<&str> {
        self.isbn.as_deref()
    }

    pub fn publisher(&self) -> Option<&str> {
        self.publisher.as_deref()
    }

    pub fn year(&self) -> Option<i32> {
        self.year
    }

    pub fn text_content(&self) -> Option<&str> {
        self.text_content.as_deref()
    }

    pub fn options(&self) -> &MatcherOptions {
        &self.options
    }

    pub fn has_title(&self) -> bool {
        self.title.is_some()
    }

    pub fn has_authors(&self) -> bool {
        !self.authors.is_empty()
    }

    /// True when no searchable field is set
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.authors.is_empty()
            && self.isbn.is_none()
            && self.publisher.is_none()
            && self.year.is_none()
            && self.text_content.is_none()
    }

    /// Number of characters across title, authors and free text
    pub fn descriptive_text_len(&self) -> usize {
        let title = self.title.as_deref().map_or(0, |t| t.chars().count());
        let authors: usize = self.authors.iter().map(|a| a.chars().count()).sum();
        let text = self.text_content.as_deref().map_or(0, |t| t.chars().count());
        title + authors + text
    }

    /// Short human-readable label used in log lines
    pub fn describe(&self) -> String {
        if let Some(isbn) = &self.isbn {
            return format!("isbn:{}", isbn);
        }
        match (&self.title, self.authors.first()) {
            (Some(title), Some(author)) => format!("{} / {}", title, author),
            (Some(title), None) => title.clone(),
            (None, Some(author)) => format!("by {}", author),
            (None, None) => self
                .text_content
                .as_deref()
                .map(|t| t.chars().take(40).collect())
                .unwrap_or_else(|| "<empty>".to_string()),
        }
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
