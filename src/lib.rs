#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Coffee Shop API
//!
//! A drinks menu served over HTTP. Anyone can read the menu; the detailed
//! recipes and every change to the menu require a bearer token issued by an
//! external identity provider carrying the matching permission.
//!
//! ## Module Organization
//!
//! - [`models`] - The drink record and its short/long projections
//! - [`storage`] - The `DrinkStore` seam and its Postgres implementation
//! - [`auth`] - Token verification and permission checks
//! - [`web`] - Routes, handlers, middleware and the error envelope
//! - [`config`] - Layered settings
//! - [`logging`] - Tracing subscriber setup

pub mod auth;
pub mod config;
pub mod logging;
pub mod models;
pub mod storage;
pub mod web;

pub use auth::{AuthClaims, AuthError, Permission, TokenVerifier};
pub use config::{ConfigError, Settings};
pub use models::{Drink, DrinkError};
pub use storage::{DrinkStore, PgDrinkStore};
pub use web::{create_app, ApiError, AppState};
