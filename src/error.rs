// 🚨 Error taxonomy for the classroom economy
// Library code returns `vivaa_town::Result<T>`; binaries wrap it in anyhow.

use crate::schema::ValidationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EconomyError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("validation failed: {}", format_validation(.0))]
    Validation(Vec<ValidationError>),

    #[error("insufficient funds: need {needed:.2}, available {available:.2}")]
    InsufficientFunds { needed: f64, available: f64 },

    #[error("insufficient shares: requested {requested}, held {held}")]
    InsufficientShares { requested: u32, held: u32 },

    #[error("job {job_id} has no open positions (max {max_positions})")]
    JobFull { job_id: String, max_positions: u32 },

    #[error("student {student_id} already holds achievement {achievement_id}")]
    AlreadyAwarded {
        student_id: String,
        achievement_id: String,
    },

    #[error("{entity} {id} belongs to another classroom than {classroom_id}")]
    ClassroomMismatch {
        entity: &'static str,
        id: String,
        classroom_id: String,
    },

    #[error("savings account {0} is already closed")]
    AccountClosed(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl EconomyError {
    pub fn not_found(entity: &'static str, id: &str) -> Self {
        EconomyError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Reject a record whose classroom differs from the acting student's
    pub fn ensure_same_classroom(
        entity: &'static str,
        id: &str,
        record_classroom: &str,
        classroom_id: &str,
    ) -> Result<()> {
        if record_classroom != classroom_id {
            return Err(EconomyError::ClassroomMismatch {
                entity,
                id: id.to_string(),
                classroom_id: classroom_id.to_string(),
            });
        }
        Ok(())
    }

    /// True for errors caused by the caller's input rather than the backend
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            EconomyError::Storage(_)
                | EconomyError::Serialization(_)
                | EconomyError::Csv(_)
                | EconomyError::Io(_)
        )
    }
}

impl From<Vec<ValidationError>> for EconomyError {
    fn from(errors: Vec<ValidationError>) -> Self {
        EconomyError::Validation(errors)
    }
}

fn format_validation(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, EconomyError>;
