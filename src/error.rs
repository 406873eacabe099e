//! Custom error types for branchbook
//!
//! This module defines the error hierarchy for the application using thiserror
//! for ergonomic error definitions.

use thiserror::Error;

/// The main error type for branchbook operations
#[derive(Error, Debug)]
pub enum BranchbookError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Validation errors for inputs and data models
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Duplicate entity errors
    #[error("{entity_type} already exists: {identifier}")]
    Duplicate {
        entity_type: &'static str,
        identifier: String,
    },

    /// Business rule rejected by a procedure
    #[error("Rejected: {0}")]
    Rejected(String),

    /// Not enough stock to fulfil a sale
    #[error("Insufficient stock for '{product}': need {needed}, have {available}")]
    InsufficientStock {
        product: String,
        needed: i64,
        available: i64,
    },

    /// Export errors
    #[error("Export error: {0}")]
    Export(String),

    /// Storage errors
    #[error("Storage error: {0}")]
    Storage(String),
}

impl BranchbookError {
    /// Create a "not found" error for branches
    pub fn branch_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Branch",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for warehouses
    pub fn warehouse_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Warehouse",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for categories
    pub fn category_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Category",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for products
    pub fn product_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Product",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for stock audits
    pub fn audit_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Stock audit",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for a store row
    pub fn row_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Row",
            identifier: identifier.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Business-rule failures that a procedure reports in its response
    /// envelope instead of failing the call.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::Rejected(_)
                | Self::InsufficientStock { .. }
                | Self::Validation(_)
                | Self::NotFound { .. }
        )
    }
}

impl From<std::io::Error> for BranchbookError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for BranchbookError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for branchbook operations
pub type BranchbookResult<T> = Result<T, BranchbookError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BranchbookError::Config("test error".into());
        assert_eq!(err.to_string(), "Configuration error: test error");
    }

    #[test]
    fn test_not_found_error() {
        let err = BranchbookError::branch_not_found("Downtown");
        assert_eq!(err.to_string(), "Branch not found: Downtown");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_insufficient_stock_error() {
        let err = BranchbookError::InsufficientStock {
            product: "Rice 5kg".into(),
            needed: 12,
            available: 3,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for 'Rice 5kg': need 12, have 3"
        );
        assert!(err.is_rejection());
    }

    #[test]
    fn test_storage_error_is_not_rejection() {
        assert!(!BranchbookError::Storage("disk full".into()).is_rejection());
        assert!(BranchbookError::Rejected("audit already approved".into()).is_rejection());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: BranchbookError = io_err.into();
        assert!(matches!(err, BranchbookError::Io(_)));
    }
}
