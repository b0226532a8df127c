pub mod config;
pub mod error;
pub mod types;

pub use config::{DatabaseConfig, JwtConfig, ServerConfig};
pub use error::AppError;
pub use types::{ApiResponse, PaymentStatus, ProgressStatus, UserRole};
