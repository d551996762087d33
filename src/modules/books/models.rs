use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use bookshelf_http::error::AppError;

/// A book on the shelf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// Identifier assigned by the store
    pub id: i32,
    pub title: String,
    pub author: String,
    /// Unbounded; `None` when the book was never rated
    pub rating: Option<i32>,
}

/// A book that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub rating: Option<i32>,
}

/// What a `POST /books` body asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShelfRequest {
    Create(NewBook),
    Search(String),
}

/// Rejected client input; always answered with 400.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("request body must be a JSON object")]
    NotAnObject,
    #[error("'{0}' is required")]
    Missing(&'static str),
    #[error("'{0}' must be a non-empty string")]
    NotText(&'static str),
    #[error("'rating' must be an integer")]
    InvalidRating,
    #[error("'search' must be a string")]
    InvalidSearch,
    #[error("'page' must be 1 or greater")]
    InvalidPage,
}

impl From<ValidationError> for AppError {
    fn from(error: ValidationError) -> Self {
        AppError::bad_request(error.to_string())
    }
}

impl ShelfRequest {
    /// Interpret a `POST /books` body: a non-blank `{search}` searches,
    /// anything else must describe a new book.
    pub fn from_json(body: &Value) -> Result<Self, ValidationError> {
        let fields = body.as_object().ok_or(ValidationError::NotAnObject)?;

        match fields.get("search") {
            None | Some(Value::Null) => {}
            Some(Value::String(term)) if term.trim().is_empty() => {}
            Some(Value::String(term)) => return Ok(ShelfRequest::Search(term.trim().to_string())),
            Some(_) => return Err(ValidationError::InvalidSearch),
        }

        Ok(ShelfRequest::Create(NewBook {
            title: required_text(fields, "title")?,
            author: required_text(fields, "author")?,
            rating: fields.get("rating").map(coerce_rating).transpose()?.flatten(),
        }))
    }
}

/// Rating carried by a `PATCH /books/{id}` body; absent or null is rejected.
pub fn rating_from_json(body: &Value) -> Result<i32, ValidationError> {
    let fields = body.as_object().ok_or(ValidationError::NotAnObject)?;
    let rating = fields
        .get("rating")
        .ok_or(ValidationError::Missing("rating"))?;
    coerce_rating(rating)?.ok_or(ValidationError::Missing("rating"))
}

fn required_text(fields: &Map<String, Value>, name: &'static str) -> Result<String, ValidationError> {
    match fields.get(name) {
        None | Some(Value::Null) => Err(ValidationError::Missing(name)),
        Some(Value::String(text)) if !text.trim().is_empty() => Ok(text.clone()),
        Some(_) => Err(ValidationError::NotText(name)),
    }
}

/// Accepts integers, integral floats and numeric strings; null means unset.
fn coerce_rating(value: &Value) -> Result<Option<i32>, ValidationError> {
    match value {
        Value::Null => Ok(None),
        Value::Number(number) => {
            if let Some(int) = number.as_i64() {
                return i32::try_from(int)
                    .map(Some)
                    .map_err(|_| ValidationError::InvalidRating);
            }
            match number.as_f64() {
                Some(float)
                    if float.fract() == 0.0
                        && float >= f64::from(i32::MIN)
                        && float <= f64::from(i32::MAX) =>
                {
                    Ok(Some(float as i32))
                }
                _ => Err(ValidationError::InvalidRating),
            }
        }
        Value::String(text) => text
            .trim()
            .parse::<i32>()
            .map(Some)
            .map_err(|_| ValidationError::InvalidRating),
        _ => Err(ValidationError::InvalidRating),
    }
}

/// `GET /books` and search results.
#[derive(Debug, Serialize, Deserialize)]
pub struct BooksPage {
    pub success: bool,
    pub books: Vec<Book>,
    pub total_books: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BookCreated {
    pub success: bool,
    pub created_book_id: i32,
    pub books: Vec<Book>,
    pub total_books: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RatingUpdated {
    pub success: bool,
    pub updated_book_id: i32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BookDeleted {
    pub success: bool,
    pub deleted_book_id: i32,
    pub books: Vec<Book>,
    pub total_books: usize,
}
