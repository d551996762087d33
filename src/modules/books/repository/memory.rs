use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{BookFilter, BookRepository, StorageError};
use crate::modules::books::models::{Book, NewBook};

#[derive(Debug)]
struct Shelf {
    last_id: i32,
    books: BTreeMap<i32, Book>,
}

/// Process-local repository; identifiers are never reused.
#[derive(Debug)]
pub struct InMemoryBookRepository {
    shelf: RwLock<Shelf>,
}

impl InMemoryBookRepository {
    pub fn new() -> Self {
        Self {
            shelf: RwLock::new(Shelf {
                last_id: 0,
                books: BTreeMap::new(),
            }),
        }
    }
}

impl Default for InMemoryBookRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BookRepository for InMemoryBookRepository {
    async fn find(&self, id: i32) -> Result<Option<Book>, StorageError> {
        Ok(self.shelf.read().await.books.get(&id).cloned())
    }

    async fn list(&self, filter: &BookFilter) -> Result<Vec<Book>, StorageError> {
        let shelf = self.shelf.read().await;
        Ok(shelf
            .books
            .values()
            .filter(|book| filter.matches(book))
            .cloned()
            .collect())
    }

    async fn insert(&self, book: NewBook) -> Result<Book, StorageError> {
        let mut shelf = self.shelf.write().await;
        let id = shelf
            .last_id
            .checked_add(1)
            .ok_or(StorageError::IdsExhausted)?;
        shelf.last_id = id;

        let book = Book {
            id,
            title: book.title,
            author: book.author,
            rating: book.rating,
        };
        shelf.books.insert(id, book.clone());
        Ok(book)
    }

    async fn update(&self, book: &Book) -> Result<bool, StorageError> {
        let mut shelf = self.shelf.write().await;
        match shelf.books.get_mut(&book.id) {
            Some(stored) => {
                *stored = book.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: i32) -> Result<bool, StorageError> {
        Ok(self.shelf.write().await.books.remove(&id).is_some())
    }
}
