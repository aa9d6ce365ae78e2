use thiserror::Error;

#[derive(Error, Debug)]
pub enum RosterError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Job title '{job_title}' has no usable shift pattern")]
    InvalidPattern { job_title: String },

    #[error("Schedule for {location}/{job_title} period {period} is approved and locked")]
    Locked {
        location: String,
        job_title: String,
        period: String,
    },

    #[error("Saved schedule '{schedule_id}' not found")]
    ScheduleNotFound { schedule_id: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type RosterResult<T> = Result<T, RosterError>;
