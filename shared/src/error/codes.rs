//! Unified error codes for the slab label pipeline
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 4xxx: Record errors
//! - 5xxx: Artifact errors
//! - 6xxx: Label errors (code generation, rendering, batches)
//! - 7xxx: Print errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 4xxx: Record ====================
    /// Record not found
    RecordNotFound = 4001,
    /// Record id is malformed
    RecordIdInvalid = 4002,
    /// Grade is missing
    GradeRequired = 4003,

    // ==================== 5xxx: Artifact ====================
    /// Artifact not found
    ArtifactNotFound = 5001,
    /// Artifact key is malformed
    ArtifactKeyInvalid = 5002,
    /// Uploaded image could not be decoded
    InvalidImage = 5003,
    /// Uploaded image exceeds the size limit
    ImageTooLarge = 5004,

    // ==================== 6xxx: Label ====================
    /// Verification code could not be generated
    CodeGenerationFailed = 6001,
    /// Label could not be rendered
    LabelRenderFailed = 6002,
    /// Batch count must be at least one
    BatchEmpty = 6101,
    /// One or more records in a batch failed to be created
    BatchCreationFailed = 6102,

    // ==================== 7xxx: Print ====================
    /// Printer not available
    PrinterNotAvailable = 7001,
    /// Print job failed
    PrintFailed = 7002,
    /// Nothing to print
    NothingToPrint = 7003,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Blob storage error
    StorageError = 9003,
    /// Timeout error
    TimeoutError = 9004,
    /// Configuration error
    ConfigError = 9005,
}

impl ErrorCode {
    /// Every code, in numeric order
    pub const ALL: [ErrorCode; 28] = [
        ErrorCode::Success,
        ErrorCode::Unknown,
        ErrorCode::ValidationFailed,
        ErrorCode::NotFound,
        ErrorCode::AlreadyExists,
        ErrorCode::InvalidRequest,
        ErrorCode::InvalidFormat,
        ErrorCode::RequiredField,
        ErrorCode::ValueOutOfRange,
        ErrorCode::RecordNotFound,
        ErrorCode::RecordIdInvalid,
        ErrorCode::GradeRequired,
        ErrorCode::ArtifactNotFound,
        ErrorCode::ArtifactKeyInvalid,
        ErrorCode::InvalidImage,
        ErrorCode::ImageTooLarge,
        ErrorCode::CodeGenerationFailed,
        ErrorCode::LabelRenderFailed,
        ErrorCode::BatchEmpty,
        ErrorCode::BatchCreationFailed,
        ErrorCode::PrinterNotAvailable,
        ErrorCode::PrintFailed,
        ErrorCode::NothingToPrint,
        ErrorCode::InternalError,
        ErrorCode::DatabaseError,
        ErrorCode::StorageError,
        ErrorCode::TimeoutError,
        ErrorCode::ConfigError,
    ];

    /// Get the numeric code value
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this code represents success
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the default message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // Record
            ErrorCode::RecordNotFound => "Record not found",
            ErrorCode::RecordIdInvalid => "Record id is invalid",
            ErrorCode::GradeRequired => "Grade is required",

            // Artifact
            ErrorCode::ArtifactNotFound => "Artifact not found",
            ErrorCode::ArtifactKeyInvalid => "Artifact key is invalid",
            ErrorCode::InvalidImage => "Image could not be decoded",
            ErrorCode::ImageTooLarge => "Image is too large",

            // Label
            ErrorCode::CodeGenerationFailed => "Verification code generation failed",
            ErrorCode::LabelRenderFailed => "Label rendering failed",
            ErrorCode::BatchEmpty => "Batch count must be at least one",
            ErrorCode::BatchCreationFailed => "Batch record creation failed",

            // Print
            ErrorCode::PrinterNotAvailable => "Printer not available",
            ErrorCode::PrintFailed => "Print job failed",
            ErrorCode::NothingToPrint => "Nothing to print",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::StorageError => "Storage error",
            ErrorCode::TimeoutError => "Operation timed out",
            ErrorCode::ConfigError => "Configuration error",
        }
    }
}

/// Error returned when converting an unknown u16 into [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        ErrorCode::ALL
            .into_iter()
            .find(|code| code.code() == value)
            .ok_or(InvalidErrorCode(value))
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
