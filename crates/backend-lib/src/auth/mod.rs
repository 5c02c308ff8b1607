// ============================
// crates/backend-lib/src/auth/mod.rs
// ============================
//! Authentication module.
pub mod password;
pub mod rate_limit;
mod service;
mod service_impl;
pub mod session;
pub mod token;

pub use password::{validate_password_strength, PasswordRequirements, ScryptHasher, MIN_PASSWORD_LENGTH};
pub use rate_limit::AuthRateLimiter;
pub use service::AuthService;
pub use service_impl::DefaultAuth;
pub use session::SessionResolver;
pub use token::{Claims, SigningKey, TokenError, TokenService};
