//! Predictor trait — "fill these fields given this prompt".
//!
//! One predictor call is one model round trip. The loops call it exactly once
//! per hop and treat any error as fatal for the invocation.

use async_trait::async_trait;

use crate::error::PredictError;
use crate::signature::Schema;
use crate::values::Values;

#[async_trait]
pub trait Predictor: Send + Sync {
    /// Fill the output fields of `schema` from the input `values`.
    ///
    /// The returned map must contain every output field of `schema`. It may
    /// contain more; callers ignore anything they did not ask for.
    async fn predict(
        &self,
        schema: &Schema,
        values: &Values,
    ) -> std::result::Result<Values, PredictError>;
}
