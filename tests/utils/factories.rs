/// Test data factories using builder pattern
///
/// Provides convenient methods to create test data with sensible defaults
use bookmatch::modules::matching::{BookRecord, InMemoryCandidateSource, SearchResult};
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

static NEXT_ID: AtomicUsize = AtomicUsize::new(1);

pub struct BookFactory {
    id: String,
    title: String,
    authors: Vec<String>,
    isbn_13: Option<String>,
    isbn_10: Option<String>,
    publisher: Option<String>,
    year: Option<i32>,
    description: Option<String>,
}

impl Default for BookFactory {
    fn default() -> Self {
        Self {
            id: format!("book-{}", NEXT_ID.fetch_add(1, Ordering::Relaxed)),
            title: "Test Book".to_string(),
            authors: Vec::new(),
            isbn_13: None,
            isbn_10: None,
            publisher: None,
            year: None,
            description: None,
        }
    }
}

impl BookFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    pub fn with_author(mut self, author: &str) -> Self {
        self.authors.push(author.to_string());
        self
    }

    pub fn with_isbn_13(mut self, isbn: &str) -> Self {
        self.isbn_13 = Some(isbn.to_string());
        self
    }

    pub fn with_isbn_10(mut self, isbn: &str) -> Self {
        self.isbn_10 = Some(isbn.to_string());
        self
    }

    pub fn with_publisher(mut self, publisher: &str) -> Self {
        self.publisher = Some(publisher.to_string());
        self
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn build(self) -> BookRecord {
        let mut record = BookRecord::new(self.id, self.title).with_authors(self.authors);
        if let Some(isbn) = self.isbn_13 {
            record = record.with_isbn_13(isbn);
        }
        if let Some(isbn) = self.isbn_10 {
            record = record.with_isbn_10(isbn);
        }
        if let Some(publisher) = self.publisher {
            record = record.with_publisher(publisher);
        }
        if let Some(year) = self.year {
            record = record.with_year(year);
        }
        if let Some(description) = self.description {
            record = record.with_description(description);
        }
        record
    }
}

/// A small catalogue mixing programming and fiction titles
pub fn sample_catalogue() -> Vec<BookRecord> {
    vec![
        BookFactory::new()
            .with_id("effective-java")
            .with_title("Effective Java")
            .with_author("Joshua Bloch")
            .with_isbn_13("9780134685991")
            .with_publisher("Addison-Wesley")
            .with_year(2018)
            .with_description("Best practices for the Java platform")
            .build(),
        BookFactory::new()
            .with_id("python-programming")
            .with_title("Python Programming")
            .with_author("John Zelle")
            .with_isbn_13("9781590282755")
            .with_publisher("Franklin, Beedle")
            .with_year(2016)
            .with_description("An introduction to computer science using Python")
            .build(),
        BookFactory::new()
            .with_id("python-crash-course")
            .with_title("Python Crash Course")
            .with_author("Eric Matthes")
            .with_publisher("No Starch Press")
            .with_year(2019)
            .build(),
        BookFactory::new()
            .with_id("dune")
            .with_title("Dune")
            .with_author("Frank Herbert")
            .with_isbn_10("0441013597")
            .with_publisher("Ace")
            .with_year(1990)
            .with_description("Desert planet Arrakis and the spice melange")
            .build(),
        BookFactory::new()
            .with_id("rust-book")
            .with_title("The Rust Programming Language")
            .with_author("Steve Klabnik")
            .with_author("Carol Nichols")
            .with_publisher("No Starch Press")
            .with_year(2019)
            .build(),
    ]
}

pub fn catalogue_source() -> Arc<InMemoryCandidateSource> {
    Arc::new(InMemoryCandidateSource::new(sample_catalogue()))
}

/// Result carrying only a title and an author, tagged with `algorithm`
pub fn result(score: f64, title: &str, author: &str, algorithm: &str) -> SearchResult {
    let metadata = json!({"title": title, "authors": [author]});
    SearchResult::new(score, metadata.as_object().cloned().unwrap(), algorithm).unwrap()
}
