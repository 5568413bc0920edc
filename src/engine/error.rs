use ulid::Ulid;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Booking against a doctor that does not exist or is not taking appointments.
    #[error("doctor not found or inactive: {0}")]
    DoctorUnavailable(Ulid),
    #[error("appointment overlap detected: conflicts with {0}")]
    Overlap(Ulid),
    #[error("invalid appointment: {0}")]
    InvalidAppointment(&'static str),
    #[error("doctor not found: {0}")]
    DoctorNotFound(Ulid),
    #[error("already exists: {0}")]
    AlreadyExists(Ulid),
    #[error("limit exceeded: {0}")]
    LimitExceeded(&'static str),
    #[error("WAL error: {0}")]
    WalError(String),
}

/// Transport-neutral status class for an [`EngineError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorStatus {
    BadRequest,
    NotFound,
    Conflict,
    Internal,
}

impl ErrorStatus {
    /// The matching HTTP status code.
    pub fn http_code(self) -> u16 {
        match self {
            ErrorStatus::BadRequest => 400,
            ErrorStatus::NotFound => 404,
            ErrorStatus::Conflict => 409,
            ErrorStatus::Internal => 500,
        }
    }
}

impl EngineError {
    pub fn status(&self) -> ErrorStatus {
        match self {
            EngineError::DoctorUnavailable(_)
            | EngineError::InvalidAppointment(_)
            | EngineError::LimitExceeded(_) => ErrorStatus::BadRequest,
            EngineError::DoctorNotFound(_) => ErrorStatus::NotFound,
            EngineError::Overlap(_) | EngineError::AlreadyExists(_) => ErrorStatus::Conflict,
            EngineError::WalError(_) => ErrorStatus::Internal,
        }
    }

    /// Postgres SQLSTATE reported on the wire.
    pub fn sqlstate(&self) -> &'static str {
        match self {
            EngineError::DoctorUnavailable(_) => "23503", // foreign_key_violation
            EngineError::Overlap(_) => "23P01",           // exclusion_violation
            EngineError::InvalidAppointment(_) => "22023", // invalid_parameter_value
            EngineError::DoctorNotFound(_) => "P0002",    // no_data_found
            EngineError::AlreadyExists(_) => "23505",     // unique_violation
            EngineError::LimitExceeded(_) => "54000",     // program_limit_exceeded
            EngineError::WalError(_) => "58030",          // io_error
        }
    }
}
