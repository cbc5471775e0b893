pub mod read_only;

pub use read_only::{ensure_read_only, validate_read_only};
