//! Storage capability for books.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use bookshelf_http::error::AppError;

use super::models::{Book, NewBook};

pub mod memory;
pub mod postgres;

pub use memory::InMemoryBookRepository;
pub use postgres::PgBookRepository;

/// Unexpected persistence failure. Missing rows are not errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("no book identifiers left")]
    IdsExhausted,
}

impl From<StorageError> for AppError {
    fn from(error: StorageError) -> Self {
        AppError::Internal(anyhow::Error::new(error))
    }
}

/// Restricts `list` to a subset of the shelf.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookFilter {
    /// Case-insensitive substring matched against title or author
    pub search: Option<String>,
}

impl BookFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn search(term: impl Into<String>) -> Self {
        Self {
            search: Some(term.into()),
        }
    }

    pub fn matches(&self, book: &Book) -> bool {
        match &self.search {
            None => true,
            Some(term) => {
                let term = term.to_lowercase();
                book.title.to_lowercase().contains(&term)
                    || book.author.to_lowercase().contains(&term)
            }
        }
    }
}

/// Every call is a single atomic operation against the store.
#[async_trait]
pub trait BookRepository: Send + Sync {
    async fn find(&self, id: i32) -> Result<Option<Book>, StorageError>;

    /// Books matching `filter`, ordered by id.
    async fn list(&self, filter: &BookFilter) -> Result<Vec<Book>, StorageError>;

    async fn insert(&self, book: NewBook) -> Result<Book, StorageError>;

    /// Returns false when no row with `book.id` exists.
    async fn update(&self, book: &Book) -> Result<bool, StorageError>;

    /// Returns false when no row with `id` exists.
    async fn delete(&self, id: i32) -> Result<bool, StorageError>;
}

pub type SharedBookRepository = Arc<dyn BookRepository>;

#[cfg(test)]
mod tests {
    use super::*;

    fn book(title: &str, author: &str) -> Book {
        Book {
            id: 1,
            title: title.to_string(),
            author: author.to_string(),
            rating: None,
        }
    }

    #[test]
    fn test_filter_matches_title_or_author_ignoring_case() {
        let filter = BookFilter::search("GAIMAN");
        assert!(filter.matches(&book("Anansi Boys", "Neil Gaiman")));
        assert!(!filter.matches(&book("Dune", "Frank Herbert")));
        assert!(BookFilter::search("dun").matches(&book("Dune", "Frank Herbert")));
        assert!(BookFilter::all().matches(&book("Dune", "Frank Herbert")));
    }
}
