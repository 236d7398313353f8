//! SubScribe Tracker
//!
//! Subscription tracking with AI-assisted detection from pasted emails.
//!
//! ## Standalone
//!
//! Run the binary:
//! ```bash
//! subscribe-tracker-server
//! ```
//!
//! ## Embedded (Axum)
//!
//! When the `server` feature is enabled, this crate can be embedded into a larger Axum app:
//! ```rust,ignore
//! use axum::Router;
//! use subscribe_tracker::infrastructure::AppConfig;
//! use subscribe_tracker::server::{build_state_from_env, router};
//!
//! let cfg = AppConfig::from_env()?;
//! let state = build_state_from_env(cfg)?;
//! let app = Router::new().nest("/subscribe", router(state));
//! ```
//!
//! ## Library
//!
//! Without the server, drive a [`ScanOrchestrator`] directly with your own
//! [`SubscriptionDetector`] and [`CategoryClassifier`] implementations.

pub mod application;
pub mod domain;
pub mod infrastructure;

// Enabled behind the `server` feature so the core library can be used without Axum.
#[cfg(feature = "server")]
pub mod server;

pub use application::*;
pub use domain::*;
pub use infrastructure::*;

#[cfg(feature = "server")]
pub use server::*;
