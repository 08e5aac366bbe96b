pub mod audit;
pub mod retry;
pub mod shutdown;
pub mod types;

pub use audit::AuditTrail;
pub use retry::{retry_with_backoff, RetryConfig};
pub use shutdown::*;
pub use types::*;
