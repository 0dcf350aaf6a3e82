use crate::error::ValidationError;
use crate::models::{BookmarkInput, NewBookmark};
use reqwest::Url;

/// Check a url string parses as an absolute URL
pub fn validate_url(url: &str) -> Result<Url, ValidationError> {
    Url::parse(url).map_err(|e| ValidationError::InvalidUrl(e.to_string()))
}

/// Validate raw input and turn it into an insert row for `user_id`.
///
/// Checks run in order title, url presence, url syntax; the first failure wins.
pub fn validate_input(input: &BookmarkInput, user_id: &str) -> Result<NewBookmark, ValidationError> {
    let title = input.title.trim();
    if title.is_empty() {
        return Err(ValidationError::EmptyTitle);
    }

    let url = input.url.trim();
    if url.is_empty() {
        return Err(ValidationError::EmptyUrl);
    }
    validate_url(url)?;

    Ok(NewBookmark {
        user_id: user_id.to_string(),
        url: url.to_string(),
        title: title.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Field;
    use rstest::rstest;

    #[test]
    fn test_valid_input_is_trimmed() {
        let input = BookmarkInput::new("  Go  ", " https://go.dev ");
        let row = validate_input(&input, "u1").unwrap();
        assert_eq!(row.title, "Go");
        assert_eq!(row.url, "https://go.dev");
        assert_eq!(row.user_id, "u1");
    }

    #[rstest]
    #[case("", "https://x.com", Field::Title)]
    #[case("   ", "https://x.com", Field::Title)]
    #[case("", "", Field::Title)] // title is checked first
    #[case("X", "", Field::Url)]
    #[case("X", "   ", Field::Url)]
    #[case("X", "not a url", Field::Url)]
    #[case("X", "example.com", Field::Url)] // relative, no scheme
    #[case("X", "https://", Field::Url)]
    fn test_invalid_input(#[case] title: &str, #[case] url: &str, #[case] field: Field) {
        let err = validate_input(&BookmarkInput::new(title, url), "u1").unwrap_err();
        assert_eq!(err.field(), field);
    }

    #[test]
    fn test_empty_url_is_distinguished_from_malformed() {
        let empty = validate_input(&BookmarkInput::new("X", ""), "u1").unwrap_err();
        let malformed = validate_input(&BookmarkInput::new("X", "::"), "u1").unwrap_err();
        assert_eq!(empty, ValidationError::EmptyUrl);
        assert!(matches!(malformed, ValidationError::InvalidUrl(_)));
    }

    #[rstest]
    #[case("https://go.dev")]
    #[case("http://localhost:8080/path?q=1")]
    #[case("mailto:someone@example.com")]
    fn test_valid_urls(#[case] url: &str) {
        assert!(validate_url(url).is_ok());
    }
}
