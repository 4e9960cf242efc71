pub mod ids;
pub mod customer;

pub use ids::{CourierId, CustomerId, OrderId, ProductId, Sequence};
pub use customer::{Customer, CustomerDirectory, NewCustomer};

/// Business outcomes returned to the immediate caller.
///
/// Everything except `Invariant` is an expected result the caller may retry,
/// re-prompt or abandon. `Invariant` marks a corrupted internal state and
/// aborts the operation that hit it.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoreError {
    #[error("{entity} not found: {id}")]
    NotFound {
        entity: &'static str,
        id: String,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Insufficient stock for {product}: requested {requested}, available {available}")]
    InsufficientStock {
        product: String,
        requested: u32,
        available: u32,
    },

    #[error("No courier available")]
    NoCourierAvailable,

    #[error("Internal invariant violated: {0}")]
    Invariant(String),
}

impl CoreError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        CoreError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        CoreError::InvalidInput(msg.into())
    }
}

pub type CoreResult<T> = Result<T, CoreError>;

/// Rejects blank required text fields.
pub fn require_text(field: &str, value: &str) -> CoreResult<()> {
    if value.trim().is_empty() {
        return Err(CoreError::invalid(format!("{field} must not be blank")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::not_found("Product", ProductId(7));
        assert_eq!(err.to_string(), "Product not found: 7");

        let err = CoreError::InsufficientStock {
            product: "Trail Runner".to_string(),
            requested: 3,
            available: 1,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Trail Runner: requested 3, available 1"
        );
    }

    #[test]
    fn test_require_text() {
        assert!(require_text("name", "Ada").is_ok());
        assert!(matches!(require_text("name", "   "), Err(CoreError::InvalidInput(_))));
    }
}
