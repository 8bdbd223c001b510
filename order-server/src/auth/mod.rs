//! 认证授权模块
//!
//! - [`JwtService`] - JWT 令牌校验
//! - [`CurrentUser`] - 当前用户上下文 (axum extractor)
//! - [`permissions`] - 权限常量
//!
//! Rider scans do not use JWTs; the rider token is the credential (see
//! [`crate::rider`]).

pub mod extractor;
pub mod jwt;
pub mod permissions;

pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService};
