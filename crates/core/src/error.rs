use crate::types::DbId;
use crate::validation::rules::FieldError;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The row does not exist or is not owned by the caller. Owner-scoped
    /// queries cannot tell the two cases apart.
    #[error("{entity} with id {id} not found or not owned by caller")]
    NotFoundOrForbidden { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Validation failed: {} required field(s) incomplete", .0.len())]
    ValidationFailed(Vec<FieldError>),

    #[error("Persistence failed after {attempts} attempt(s): {message}")]
    Persistence { attempts: u32, message: String },

    #[error("Profile generation failed: {0}")]
    ProfileGeneration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
