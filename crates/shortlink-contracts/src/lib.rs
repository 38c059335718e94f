// Shortlink contracts
//
// DTOs exchanged with the shortlink service plus the pure helpers around
// them (URL composition, URL validation).

pub mod collection;
pub mod validation;

pub use collection::{ShortenUrlRequest, UrlCollection};
pub use validation::{
    validate_url_exists, validate_url_length, validate_url_syntax, ValidationError, MAX_URL_LEN,
    MIN_URL_LEN,
};
