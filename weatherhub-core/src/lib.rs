//! Core library for the `weatherhub` dashboard.
//!
//! This crate defines:
//! - The weather document schema and display formatting
//! - A predictable state store with pure reducers
//! - Weather fetching that lets the latest search win
//! - Accounts and per-user saved cities over pluggable auth / document-store services
//!
//! It is used by `weatherhub-cli`, but can also be driven by other front ends.

pub mod app;
pub mod auth;
pub mod config;
pub mod document;
pub mod error;
pub mod favorites;
pub mod fetch;
pub mod firebase;
pub mod format;
pub mod memory;
pub mod model;
pub mod provider;
pub mod session;
pub mod store;
pub mod view;

pub use app::Dashboard;
pub use config::Config;
pub use error::{AuthError, DocumentError, FetchError};
pub use fetch::{FetchOutcome, WeatherFetcher};
pub use model::{DEFAULT_CITY, UserProfile, WeatherDocument};
pub use provider::{ForecastQuery, QueryTemplate, WeatherProvider};
pub use store::{AppState, Store};
pub use view::Tab;
