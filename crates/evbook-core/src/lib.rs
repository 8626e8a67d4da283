//! Core library for evbook: the session store, the auth-guarded API client
//! and the models of the charging booking service.
//!
//! ```text
//! caller ─▶ RequestAugmenter ─▶ network ─▶ ResponseGuard ─▶ SessionTerminator
//!               │ bearer token                 │ 401 on a guarded endpoint
//!               ▼                              ▼
//!          SessionStore ◀───────────── logout + redirect to sign-in
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod guard;
pub mod models;
pub mod storage;

pub use api::{ApiClient, ApiError, ClientSettings};
pub use auth::{AuthError, Session, SessionStore, User};
pub use config::Config;
pub use guard::{GuardConfig, Navigator, Router};
pub use models::{Booking, BookingRequest, BookingStatus, Locale, Station, StationStatus};
