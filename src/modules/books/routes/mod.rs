//! HTTP handlers for the books module.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    response::{IntoResponse, Response},
    routing::{get, patch},
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;

use bookshelf_http::error::{self, AppError};

use super::models::{
    rating_from_json, Book, BookCreated, BookDeleted, BooksPage, RatingUpdated, ShelfRequest,
};
use super::pagination::{paginate, parse_page, BOOKS_PER_SHELF};
use super::repository::{BookFilter, BookRepository, SharedBookRepository};

/// Application context injected into every books handler.
#[derive(Clone)]
pub struct BooksState {
    pub repository: SharedBookRepository,
}

/// Query string shared by the shelf endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ShelfQuery {
    /// Kept as text so that non-numeric values fall back to page 1
    pub page: Option<String>,
    pub search: Option<String>,
}

pub fn router(state: BooksState) -> Router {
    Router::new()
        .route("/", get(list_books).post(create_or_search_books))
        .route("/health", get(health_check))
        .route("/{book_id}", patch(patch_book_rating).delete(delete_book))
        .method_not_allowed_fallback(error::method_not_allowed)
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "books module is healthy"
}

async fn list_books(
    State(state): State<BooksState>,
    query: Result<Query<ShelfQuery>, QueryRejection>,
) -> Result<Json<BooksPage>, AppError> {
    let Query(query) = query.map_err(|e| AppError::bad_request(e.body_text()))?;
    let page = parse_page(query.page.as_deref())?;
    let filter = match query.search {
        Some(term) => BookFilter::search(term.trim()),
        None => BookFilter::all(),
    };

    shelf_page(state.repository.as_ref(), &filter, page)
        .await
        .map(Json)
}

/// `POST /books` either searches (`{search}`) or creates a book.
async fn create_or_search_books(
    State(state): State<BooksState>,
    query: Result<Query<ShelfQuery>, QueryRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, AppError> {
    let Query(query) = query.map_err(|e| AppError::bad_request(e.body_text()))?;
    let page = parse_page(query.page.as_deref())?;
    let Json(body) = body.map_err(|e| AppError::bad_request(e.body_text()))?;

    match ShelfRequest::from_json(&body)? {
        ShelfRequest::Search(term) => {
            let found = shelf_page(state.repository.as_ref(), &BookFilter::search(term), page)
                .await?;
            Ok(Json(found).into_response())
        }
        ShelfRequest::Create(new_book) => {
            let book = state.repository.insert(new_book).await?;
            tracing::info!(book_id = book.id, "book created");

            let (books, total_books) = page_after_write(state.repository.as_ref(), page).await?;
            Ok(Json(BookCreated {
                success: true,
                created_book_id: book.id,
                books,
                total_books,
            })
            .into_response())
        }
    }
}

async fn patch_book_rating(
    State(state): State<BooksState>,
    book_id: Result<Path<i32>, PathRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<RatingUpdated>, AppError> {
    let book_id = book_id_from(book_id)?;

    let mut book = state
        .repository
        .find(book_id)
        .await?
        .ok_or_else(|| book_not_found(book_id))?;

    let Json(body) = body.map_err(|e| AppError::bad_request(e.body_text()))?;
    book.rating = Some(rating_from_json(&body)?);

    // The row may have been deleted since it was read.
    if !state.repository.update(&book).await? {
        return Err(book_not_found(book_id));
    }
    tracing::info!(book_id, rating = ?book.rating, "book rating updated");

    Ok(Json(RatingUpdated {
        success: true,
        updated_book_id: book_id,
    }))
}

async fn delete_book(
    State(state): State<BooksState>,
    book_id: Result<Path<i32>, PathRejection>,
    query: Result<Query<ShelfQuery>, QueryRejection>,
) -> Result<Json<BookDeleted>, AppError> {
    let book_id = book_id_from(book_id)?;
    let Query(query) = query.map_err(|e| AppError::bad_request(e.body_text()))?;
    let page = parse_page(query.page.as_deref())?;

    if !state.repository.delete(book_id).await? {
        return Err(book_not_found(book_id));
    }
    tracing::info!(book_id, "book deleted");

    let (books, total_books) = page_after_write(state.repository.as_ref(), page).await?;
    Ok(Json(BookDeleted {
        success: true,
        deleted_book_id: book_id,
        books,
        total_books,
    }))
}

/// Page of matching books; 404 when the page is past the end of a
/// non-empty result.
async fn shelf_page(
    repository: &dyn BookRepository,
    filter: &BookFilter,
    page: u32,
) -> Result<BooksPage, AppError> {
    let books = repository.list(filter).await?;
    let total_books = books.len();
    let books = paginate(&books, page, BOOKS_PER_SHELF)
        .map_err(|e| AppError::not_found(e.to_string()))?;

    tracing::debug!(page, total_books, search = ?filter.search, "shelf listed");

    Ok(BooksPage {
        success: true,
        books,
        total_books,
    })
}

/// Page of the whole shelf after a committed write; an out-of-range page
/// is reported as empty instead of failing the request.
async fn page_after_write(
    repository: &dyn BookRepository,
    page: u32,
) -> Result<(Vec<Book>, usize), AppError> {
    let books = repository.list(&BookFilter::all()).await?;
    let total_books = books.len();
    let books = paginate(&books, page, BOOKS_PER_SHELF).unwrap_or_default();
    Ok((books, total_books))
}

fn book_id_from(book_id: Result<Path<i32>, PathRejection>) -> Result<i32, AppError> {
    book_id
        .map(|Path(id)| id)
        .map_err(|_| AppError::not_found("resource not found"))
}

fn book_not_found(book_id: i32) -> AppError {
    AppError::not_found(format!("book {} not found", book_id))
}
