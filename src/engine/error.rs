use ulid::Ulid;

#[derive(Debug)]
pub enum ClinicError {
    NotFound(Ulid),
    UnknownStaff(Ulid),
    UnknownService(Ulid),
    InvalidTimestamp(String),
    Validation(&'static str),
    LimitExceeded(&'static str),
    WalError(String),
}

impl std::fmt::Display for ClinicError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClinicError::NotFound(id) => write!(f, "not found: {id}"),
            ClinicError::UnknownStaff(id) => write!(f, "unknown staff: {id}"),
            ClinicError::UnknownService(id) => write!(f, "unknown service: {id}"),
            ClinicError::InvalidTimestamp(raw) => {
                write!(f, "invalid RFC 3339 timestamp: {raw:?}")
            }
            ClinicError::Validation(msg) => write!(f, "validation failed: {msg}"),
            ClinicError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
            ClinicError::WalError(e) => write!(f, "WAL error: {e}"),
        }
    }
}

impl std::error::Error for ClinicError {}
