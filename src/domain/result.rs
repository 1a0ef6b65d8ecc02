//! Result type alias for Caviardeur

use super::errors::CaviardeurError;

/// Result type alias for Caviardeur operations
///
/// # Examples
///
/// ```
/// use caviardeur::domain::result::Result;
/// use caviardeur::domain::errors::CaviardeurError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(CaviardeurError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, CaviardeurError>;
