//! HTTP surfaces. The axum handlers, routes and auth-gate middleware live in
//! [`axum`] behind the `axum_api` feature.

#[cfg(feature = "axum_api")]
pub mod axum;
