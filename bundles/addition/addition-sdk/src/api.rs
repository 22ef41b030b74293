/// Name the addition service is registered under.
pub const SERVICE_NAME: &str = "com.example.additionservice";

/// Integer addition.
///
/// Providers register it as `dyn AdditionService`; consumers must narrow to the same type.
pub trait AdditionService: Send + Sync {
    /// Add two numbers and return the sum.
    ///
    /// # Errors
    /// Returns `AdditionError::Overflow` if the sum does not fit in `i64`.
    fn add(&self, a: i64, b: i64) -> Result<i64, AdditionError>;
}

/// Error type for addition operations
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AdditionError {
    #[error("{a} + {b} overflows")]
    Overflow { a: i64, b: i64 },
}
