use thiserror::Error;

use crate::tensor::DType;

/// Main error type for tensor and autograd operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TensorError {
    /// Dimension, broadcast, slice and permutation errors
    #[error("Shape error: {0}")]
    ShapeError(String),

    /// Binary operation across two different element types
    #[error("Type mismatch: expected {expected} tensor, got {got}")]
    TypeMismatch { expected: DType, got: DType },

    /// Operation is not valid for the current state of its operand
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Operation has no defined semantics for the element type
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// Config file and logging setup errors
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl TensorError {
    /// Create a shape error with an optional hint
    pub fn shape_error(expected: &str, got: &str, suggestion: Option<&str>) -> Self {
        let message = if let Some(sugg) = suggestion {
            format!("Expected {}, got {}. Suggestion: {}", expected, got, sugg)
        } else {
            format!("Expected {}, got {}", expected, got)
        };
        TensorError::ShapeError(message)
    }

    /// Create an out-of-range index error
    pub fn index_error(what: &str, index: isize, len: usize) -> Self {
        TensorError::ShapeError(format!(
            "{} index {} out of range for length {}",
            what, index, len
        ))
    }

    pub fn overflow(operation: &str, dtype: DType) -> Self {
        TensorError::InvalidState(format!("Integer overflow in {} on {} tensor", operation, dtype))
    }

    pub fn unsupported(operation: &str, dtype: DType) -> Self {
        TensorError::UnsupportedOperation(format!(
            "{} is not defined for {} tensors",
            operation, dtype
        ))
    }
}

impl From<std::io::Error> for TensorError {
    fn from(err: std::io::Error) -> Self {
        TensorError::ConfigurationError(err.to_string())
    }
}

impl From<serde_json::Error> for TensorError {
    fn from(err: serde_json::Error) -> Self {
        TensorError::ConfigurationError(err.to_string())
    }
}

/// Result type for tensor operations
pub type TensorResult<T> = Result<T, TensorError>;

/// Extra debugging information attached to an error on its way out
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    pub operation: String,
    pub tensor_shapes: Vec<String>,
    pub suggestions: Vec<String>,
}

impl ErrorContext {
    pub fn new(operation: &str) -> Self {
        Self {
            operation: operation.to_string(),
            ..Default::default()
        }
    }

    pub fn with_shape(mut self, shape: &str) -> Self {
        self.tensor_shapes.push(shape.to_string());
        self
    }

    pub fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.suggestions.push(suggestion.to_string());
        self
    }

    pub fn to_error_message(&self) -> String {
        let mut message = format!("Operation: {}", self.operation);

        if !self.tensor_shapes.is_empty() {
            message.push_str(&format!("\nTensor shapes: {}", self.tensor_shapes.join(", ")));
        }

        if !self.suggestions.is_empty() {
            message.push_str("\nSuggestions:");
            for suggestion in &self.suggestions {
                message.push_str(&format!("\n  - {}", suggestion));
            }
        }

        message
    }
}

/// Helper trait for adding context to errors
pub trait WithContext<T> {
    fn with_context<F>(self, f: F) -> TensorResult<T>
    where
        F: FnOnce() -> ErrorContext;
}

impl<T> WithContext<T> for TensorResult<T> {
    fn with_context<F>(self, f: F) -> TensorResult<T>
    where
        F: FnOnce() -> ErrorContext,
    {
        self.map_err(|e| {
            let context = f();
            match e {
                TensorError::ShapeError(msg) => {
                    TensorError::ShapeError(format!("{}\nContext: {}", msg, context.to_error_message()))
                }
                TensorError::InvalidState(msg) => {
                    TensorError::InvalidState(format!("{}\nContext: {}", msg, context.to_error_message()))
                }
                TensorError::UnsupportedOperation(msg) => TensorError::UnsupportedOperation(format!(
                    "{}\nContext: {}",
                    msg,
                    context.to_error_message()
                )),
                _ => e,
            }
        })
    }
}

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ShapeMismatch,
    TypeMismatch,
    InvalidState,
    Unsupported,
    ConfigInvalid,
}

impl TensorError {
    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            TensorError::ShapeError(_) => ErrorCode::ShapeMismatch,
            TensorError::TypeMismatch { .. } => ErrorCode::TypeMismatch,
            TensorError::InvalidState(_) => ErrorCode::InvalidState,
            TensorError::UnsupportedOperation(_) => ErrorCode::Unsupported,
            TensorError::ConfigurationError(_) => ErrorCode::ConfigInvalid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_error() {
        let error = TensorError::shape_error("[2, 3]", "[3, 2]", Some("Transpose the right operand"));
        assert!(error.to_string().contains("Expected [2, 3], got [3, 2]"));
        assert!(error.to_string().contains("Transpose the right operand"));
    }

    #[test]
    fn test_error_context() {
        let result: TensorResult<()> = Err(TensorError::ShapeError("inner dimensions differ".to_string()));
        let err = result
            .with_context(|| {
                ErrorContext::new("matmul")
                    .with_shape("[2, 3]")
                    .with_shape("[4, 5]")
                    .with_suggestion("Check the inner dimensions")
            })
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("Operation: matmul"));
        assert!(message.contains("Tensor shapes: [2, 3], [4, 5]"));
        assert!(message.contains("Check the inner dimensions"));
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(TensorError::ShapeError("x".into()).code(), ErrorCode::ShapeMismatch);
        let mismatch = TensorError::TypeMismatch { expected: DType::F32, got: DType::I32 };
        assert_eq!(mismatch.code(), ErrorCode::TypeMismatch);
        assert_eq!(mismatch.to_string(), "Type mismatch: expected float32 tensor, got int32");
        assert_eq!(TensorError::unsupported("sin_", DType::I64).code(), ErrorCode::Unsupported);
        let overflow = TensorError::overflow("sum", DType::U8);
        assert_eq!(overflow.code(), ErrorCode::InvalidState);
        assert_eq!(overflow.to_string(), "Invalid state: Integer overflow in sum on uint8 tensor");
    }
}
