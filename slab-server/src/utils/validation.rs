//! Input validation helpers
//!
//! Centralized text length constants and validation functions.
//! Everything here runs before any record store call.

use shared::error::{AppError, ErrorCode};
use shared::models::RecordFields;

// ── Text length limits ──────────────────────────────────────────────

/// Names: player, brand, category
pub const MAX_NAME_LEN: usize = 200;

/// Grade descriptions
pub const MAX_NOTE_LEN: usize = 500;

/// Short identifiers: year, card_number, grade, label_type
pub const MAX_SHORT_TEXT_LEN: usize = 100;

// ── Validation helpers ──────────────────────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::with_message(
            ErrorCode::RequiredField,
            format!("{field} must not be empty"),
        )
        .with_detail("field", field));
    }
    if value.len() > max_len {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.len()
        ))
        .with_detail("field", field));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> Result<(), AppError> {
    if let Some(v) = value
        && v.len() > max_len
    {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            v.len()
        ))
        .with_detail("field", field));
    }
    Ok(())
}

/// Validate record fields for issuance or update.
///
/// Expects fields already passed through [`RecordFields::normalized`].
pub fn validate_record_fields(fields: &RecordFields) -> Result<(), AppError> {
    if fields.grade.is_empty() {
        return Err(AppError::new(ErrorCode::GradeRequired).with_detail("field", "grade"));
    }
    validate_required_text(fields.grade.as_str(), "grade", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&fields.category, "category", MAX_NAME_LEN)?;
    validate_optional_text(&fields.brand, "brand", MAX_NAME_LEN)?;
    validate_optional_text(&fields.player, "player", MAX_NAME_LEN)?;
    validate_optional_text(&fields.year, "year", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&fields.card_number, "card_number", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&fields.label_type, "label_type", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&fields.grade_description, "grade_description", MAX_NOTE_LEN)?;

    if let Some(year) = &fields.year
        && !(year.len() == 4 && year.bytes().all(|b| b.is_ascii_digit()))
    {
        return Err(AppError::with_message(
            ErrorCode::InvalidFormat,
            format!("year must be four digits, got {year:?}"),
        )
        .with_detail("field", "year"));
    }
    Ok(())
}
