use async_trait::async_trait;
use sqlx::PgPool;

use super::{BookFilter, BookRepository, StorageError};
use crate::modules::books::models::{Book, NewBook};

type BookRow = (i32, String, String, Option<i32>);

const SELECT_BOOKS: &str = "SELECT id, title, author, rating FROM books";

/// Book repository over the `books` table.
#[derive(Clone)]
pub struct PgBookRepository {
    pool: PgPool,
}

impl PgBookRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn into_book((id, title, author, rating): BookRow) -> Book {
    Book {
        id,
        title,
        author,
        rating,
    }
}

/// `ILIKE` pattern matching `term` literally anywhere in the column.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

#[async_trait]
impl BookRepository for PgBookRepository {
    async fn find(&self, id: i32) -> Result<Option<Book>, StorageError> {
        let row = sqlx::query_as::<_, BookRow>(&format!("{} WHERE id = $1", SELECT_BOOKS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(into_book))
    }

    async fn list(&self, filter: &BookFilter) -> Result<Vec<Book>, StorageError> {
        let rows = match filter.search.as_deref() {
            Some(term) => {
                sqlx::query_as::<_, BookRow>(&format!(
                    "{} WHERE title ILIKE $1 OR author ILIKE $1 ORDER BY id",
                    SELECT_BOOKS
                ))
                .bind(like_pattern(term))
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, BookRow>(&format!("{} ORDER BY id", SELECT_BOOKS))
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(rows.into_iter().map(into_book).collect())
    }

    async fn insert(&self, book: NewBook) -> Result<Book, StorageError> {
        let row = sqlx::query_as::<_, BookRow>(
            "INSERT INTO books (title, author, rating) VALUES ($1, $2, $3) \
             RETURNING id, title, author, rating",
        )
        .bind(book.title)
        .bind(book.author)
        .bind(book.rating)
        .fetch_one(&self.pool)
        .await?;
        Ok(into_book(row))
    }

    async fn update(&self, book: &Book) -> Result<bool, StorageError> {
        let result =
            sqlx::query("UPDATE books SET title = $2, author = $3, rating = $4 WHERE id = $1")
                .bind(book.id)
                .bind(&book.title)
                .bind(&book.author)
                .bind(book.rating)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: i32) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::{SystemTime, UNIX_EPOCH};

    use bookshelf_kernel::Module;

    use super::*;
    use crate::modules::books::BooksModule;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("gaiman"), "%gaiman%");
        assert_eq!(like_pattern("100%_\\"), "%100\\%\\_\\\\%");
        assert_eq!(like_pattern(""), "%%");
    }

    /// Repository over a migrated database; rows are tagged with a unique
    /// marker so the test never depends on, or disturbs, existing books.
    async fn migrated_repository() -> (PgBookRepository, String) {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let pool = PgPool::connect(&url).await.unwrap();

        let module = BooksModule::new(Arc::new(PgBookRepository::new(pool.clone())));
        let migrations: Vec<_> = module
            .migrations()
            .into_iter()
            .map(|migration| (module.name().to_string(), migration))
            .collect();
        bookshelf_db::run_migrations(&pool, &migrations).await.unwrap();

        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        (PgBookRepository::new(pool), format!("shelf-{}", nanos))
    }

    fn new_book(title: String, author: &str, rating: Option<i32>) -> NewBook {
        NewBook {
            title,
            author: author.to_string(),
            rating,
        }
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL pointing at a disposable PostgreSQL database"]
    async fn test_queries_against_postgres() {
        let (repository, marker) = migrated_repository().await;

        let percent = repository
            .insert(new_book(format!("{} 100%", marker), "Neil Gaiman", None))
            .await
            .unwrap();
        let digits = repository
            .insert(new_book(format!("{} 1000", marker), "Frank Herbert", Some(4)))
            .await
            .unwrap();
        assert!(digits.id > percent.id);
        assert_eq!(percent.rating, None);
        assert_eq!(repository.find(percent.id).await.unwrap(), Some(percent.clone()));

        let ids = |books: Vec<Book>| books.into_iter().map(|b| b.id).collect::<Vec<_>>();

        // ILIKE over both columns, ordered by id
        let tagged = repository
            .list(&BookFilter::search(marker.to_uppercase()))
            .await
            .unwrap();
        assert_eq!(ids(tagged), vec![percent.id, digits.id]);

        // `%` in the term is literal, so "1000" must not match
        let literal = repository
            .list(&BookFilter::search(format!("{} 100%", marker)))
            .await
            .unwrap();
        assert_eq!(ids(literal), vec![percent.id]);

        let mut rated = percent.clone();
        rated.rating = Some(5);
        assert!(repository.update(&rated).await.unwrap());
        assert_eq!(repository.find(rated.id).await.unwrap(), Some(rated.clone()));

        assert!(repository.delete(rated.id).await.unwrap());
        assert!(!repository.delete(rated.id).await.unwrap());
        assert!(!repository.update(&rated).await.unwrap());
        assert_eq!(repository.find(rated.id).await.unwrap(), None);

        assert!(repository.delete(digits.id).await.unwrap());
    }
}
