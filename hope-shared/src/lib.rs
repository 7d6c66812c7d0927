pub mod types;
pub mod errors;
pub mod extract;
pub mod middleware;
pub mod clients;
pub mod session;

pub use types::*;
pub use errors::{AppError, ErrorCode, AppResult};
pub use session::SessionIssuer;
