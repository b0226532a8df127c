pub mod extract;
pub mod jwt;
pub mod password;

pub use extract::OptionalClaims;
pub use jwt::{Claims, JwtService};
pub use password::PasswordService;
