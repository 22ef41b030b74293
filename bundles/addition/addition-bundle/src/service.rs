use addition_sdk::{AdditionError, AdditionService};
use tracing::debug;

/// Checked `i64` addition.
#[derive(Debug, Default, Clone, Copy)]
pub struct AdditionServiceImpl;

impl AdditionService for AdditionServiceImpl {
    fn add(&self, a: i64, b: i64) -> Result<i64, AdditionError> {
        debug!(a, b, "performing addition");
        a.checked_add(b).ok_or(AdditionError::Overflow { a, b })
    }
}
