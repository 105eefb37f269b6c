//! Field name validation.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("FIELD_EMPTY")]
    FieldEmpty,
    #[error("FIELD_DOTTED")]
    FieldDotted,
    #[error("FIELD_OPERATOR")]
    FieldOperator,
}

/// Validate a field name so that it renders unambiguously in a dot-joined path.
///
/// # Errors
///
/// Returns an error if the name:
/// - is empty
/// - contains a `.` (it would read as two steps)
/// - starts with `$` (reserved for store operators)
///
/// All-digit names are accepted: the store resolves `byYear.2024` against an
/// object as a field and against a list as an index.
///
/// # Example
///
/// ```
/// use docstate_path::validate_field_name;
///
/// validate_field_name("dc:title").unwrap();
/// validate_field_name("a.b").unwrap_err();
/// validate_field_name("$set").unwrap_err();
/// validate_field_name("2024").unwrap();
/// ```
pub fn validate_field_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::FieldEmpty);
    }
    if name.contains('.') {
        return Err(ValidationError::FieldDotted);
    }
    if name.starts_with('$') {
        return Err(ValidationError::FieldOperator);
    }
    Ok(())
}
