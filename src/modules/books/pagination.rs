//! Fixed-size, 1-based pages over an ordered collection.

use thiserror::Error;

use super::models::ValidationError;

/// Books per page.
pub const BOOKS_PER_SHELF: usize = 8;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("page {page} is out of range")]
pub struct PageOutOfRange {
    pub page: u32,
}

/// Slice `[(page-1)*size, page*size)` out of `items`.
///
/// An empty collection yields an empty page for any page number; a
/// non-empty collection with nothing at `page` is out of range.
pub fn paginate<T: Clone>(items: &[T], page: u32, size: usize) -> Result<Vec<T>, PageOutOfRange> {
    if items.is_empty() {
        return Ok(Vec::new());
    }

    let start = (page.saturating_sub(1) as usize).saturating_mul(size);
    if page == 0 || size == 0 || start >= items.len() {
        return Err(PageOutOfRange { page });
    }

    let end = start.saturating_add(size).min(items.len());
    Ok(items[start..end].to_vec())
}

/// Read the `page` query parameter.
///
/// Absent or non-numeric values fall back to page 1; numbers below 1 are
/// rejected.
pub fn parse_page(raw: Option<&str>) -> Result<u32, ValidationError> {
    let Some(parsed) = raw.and_then(|value| value.trim().parse::<i64>().ok()) else {
        return Ok(1);
    };

    if parsed < 1 {
        return Err(ValidationError::InvalidPage);
    }

    Ok(u32::try_from(parsed).unwrap_or(u32::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pages_are_contiguous_windows() {
        let items: Vec<u32> = (1..=17).collect();
        assert_eq!(paginate(&items, 1, 8).unwrap(), (1..=8).collect::<Vec<_>>());
        assert_eq!(paginate(&items, 2, 8).unwrap(), (9..=16).collect::<Vec<_>>());
        assert_eq!(paginate(&items, 3, 8).unwrap(), vec![17]);
        assert_eq!(paginate(&items, 4, 8), Err(PageOutOfRange { page: 4 }));
    }

    #[test]
    fn test_exact_multiple_has_no_trailing_page() {
        let items: Vec<u32> = (1..=16).collect();
        assert_eq!(paginate(&items, 2, 8).unwrap().len(), 8);
        assert!(paginate(&items, 3, 8).is_err());
    }

    #[test]
    fn test_empty_collection_is_never_out_of_range() {
        let items: Vec<u32> = Vec::new();
        assert_eq!(paginate(&items, 1, 8), Ok(Vec::new()));
        assert_eq!(paginate(&items, 42, 8), Ok(Vec::new()));
    }

    #[test]
    fn test_huge_page_does_not_overflow() {
        let items = vec![1, 2, 3];
        assert!(paginate(&items, u32::MAX, BOOKS_PER_SHELF).is_err());
    }

    #[test]
    fn test_page_parameter_parsing() {
        assert_eq!(parse_page(None), Ok(1));
        assert_eq!(parse_page(Some("3")), Ok(3));
        assert_eq!(parse_page(Some("abc")), Ok(1));
        assert_eq!(parse_page(Some("")), Ok(1));
        assert_eq!(parse_page(Some("0")), Err(ValidationError::InvalidPage));
        assert_eq!(parse_page(Some("-2")), Err(ValidationError::InvalidPage));
        assert_eq!(parse_page(Some("99999999999")), Ok(u32::MAX));
    }
}
