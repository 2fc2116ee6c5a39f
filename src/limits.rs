//! Hard caps on client-supplied input. Requests past a cap are rejected with
//! `ClinicError::LimitExceeded` before any state is touched.

pub const MAX_STAFF: usize = 256;
pub const MAX_SERVICES: usize = 256;
pub const MAX_FAQ_ENTRIES: usize = 512;
pub const MAX_SESSIONS: usize = 10_000;
pub const MAX_BOOKINGS: usize = 50_000;

pub const MAX_NAME_LEN: usize = 256;
pub const MAX_TEXT_LEN: usize = 4_096;
pub const MAX_TIMESTAMP_LEN: usize = 64;
pub const MAX_QUESTION_LEN: usize = 2_000;

/// Longest accepted wire request line, in bytes.
pub const MAX_LINE_LEN: usize = 1 << 20;
