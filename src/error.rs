//! Error types for layout optimization and pricing.

use serde::Serialize;
use thiserror::Error;

/// Machine-readable error kind, stable across releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ValidationError,
    InfeasiblePiece,
    InsufficientStock,
    InsufficientSuppliedBoards,
    UnknownCatalogKey,
    RequestTooLarge,
    InvariantViolation,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ValidationError => "validation_error",
            ErrorKind::InfeasiblePiece => "infeasible_piece",
            ErrorKind::InsufficientStock => "insufficient_stock",
            ErrorKind::InsufficientSuppliedBoards => "insufficient_supplied_boards",
            ErrorKind::UnknownCatalogKey => "unknown_catalog_key",
            ErrorKind::RequestTooLarge => "request_too_large",
            ErrorKind::InvariantViolation => "invariant_violation",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum OptimizeError {
    #[error("invalid {field}: {message}")]
    Validation { field: String, message: String },

    #[error(
        "panel {} '{label}' ({width}x{length} mm) does not fit any stock sheet in an allowed orientation",
        .panel_index + 1
    )]
    InfeasiblePiece {
        panel_index: usize,
        label: String,
        width: u32,
        length: u32,
    },

    #[error(
        "no stock sheet left for panel {} '{label}' ({width}x{length} mm): every fitting sheet size is used up",
        .panel_index + 1
    )]
    StockExhausted {
        panel_index: usize,
        label: String,
        width: u32,
        length: u32,
    },

    #[error("insufficient boards: need {required}, client supplies {supplied}")]
    InsufficientSuppliedBoards { required: usize, supplied: u32 },

    #[error("no catalog price for {core_type} {thickness_mm}mm {company} color {color_code}")]
    UnknownCatalogKey {
        core_type: String,
        thickness_mm: u32,
        company: String,
        color_code: String,
    },

    #[error("request too large: {reason}")]
    RequestTooLarge { reason: String },

    #[error("layout invariant violated{}: {message}", .board.map(|b| format!(" on board {}", b + 1)).unwrap_or_default())]
    InvariantViolation {
        board: Option<usize>,
        message: String,
    },
}

impl OptimizeError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        OptimizeError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            OptimizeError::Validation { .. } => ErrorKind::ValidationError,
            OptimizeError::InfeasiblePiece { .. } => ErrorKind::InfeasiblePiece,
            OptimizeError::StockExhausted { .. } => ErrorKind::InsufficientStock,
            OptimizeError::InsufficientSuppliedBoards { .. } => {
                ErrorKind::InsufficientSuppliedBoards
            }
            OptimizeError::UnknownCatalogKey { .. } => ErrorKind::UnknownCatalogKey,
            OptimizeError::RequestTooLarge { .. } => ErrorKind::RequestTooLarge,
            OptimizeError::InvariantViolation { .. } => ErrorKind::InvariantViolation,
        }
    }
}

pub type Result<T> = std::result::Result<T, OptimizeError>;
