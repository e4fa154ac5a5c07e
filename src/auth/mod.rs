//! Password hashing, session tokens and the request extractors built on
//! them.

pub mod extract;
pub mod password;
pub mod token;

pub use extract::{AuthUser, MaybeAuthUser};
pub use password::{check_password_strength, hash_password, verify_password};
pub use token::{Claims, TokenService};

/// Name of the session cookie.
pub const AUTH_COOKIE: &str = "auth-token";
