//! Pipeline trait.
use crate::error::Error;

/// This trait must be implemented for each pipeline stage,
/// and is generic over the return type so that
/// any stage that needs to surface counts or a report to the
/// caller can use the trait aswell.
pub trait Pipeline<T> {
    fn run(&self) -> Result<T, Error>;
}
