pub mod api;
pub mod compactor;
pub mod engine;
pub mod limits;
pub mod model;
pub mod observability;
pub mod prompt;
pub mod seed;
pub mod wal;
pub mod wire;
