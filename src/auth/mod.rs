//! Credentials, authentication and access policy
//!
//! # Module Structure
//!
//! - [`auth::jwt`](crate::auth::jwt) - Credential issuing and verification
//! - [`auth::middleware`](crate::auth::middleware) - The authentication layer and the `AuthUser` extractor
//! - [`auth::password`](crate::auth::password) - Password hashing
//! - [`auth::policy`](crate::auth::policy) - Role table and the task executor check
//!
//! # Security Features
//!
//! - **Password Hashing**: Argon2id PHC strings
//! - **Credentials**: HS256 signed tokens with a fixed subject and issuer,
//!   a `username` claim and a configurable lifetime in minutes
//! - **Claims**: decoded into a typed structure; unknown or missing claims
//!   are rejected
//!
//! # Request Pipeline
//!
//! ```text
//! authenticate  ->  require_role(class)  ->  handler  ->  ensure_executor (status change only)
//! ```
//!
//! The identity established by [`middleware::authenticate`] lives in the
//! request extensions and is read back with [`middleware::AuthUser`]:
//!
//! ```ignore
//! async fn whoami(AuthUser(identity): AuthUser) -> String {
//!     identity.name
//! }
//! ```

/// Credential codec.
pub mod jwt;
/// Authentication layer and extractors for protected routes.
pub mod middleware;
/// Password hashing behind a trait seam.
pub mod password;
/// Role table and resource ownership checks.
pub mod policy;
