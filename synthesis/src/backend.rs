//! The generative backend boundary.
//!
//! The engine depends only on this trait. Model identity, provider and
//! transport are implementation details of each backend.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::BackendError;
use crate::schema::JsonSchema;

/// An opaque text + instructions -> structured JSON function.
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    /// Get the name of this backend.
    fn name(&self) -> &str;

    /// Produce a JSON value matching `schema` for the given instructions and text.
    async fn complete(
        &self,
        system_instructions: &str,
        user_text: &str,
        schema: &JsonSchema,
        max_tokens: u32,
    ) -> Result<Value, BackendError>;

    /// Check if the backend can be called (API key set, etc.).
    fn is_available(&self) -> bool {
        true
    }
}
