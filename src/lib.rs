//! A client for the campus carpool marketplace API.
//!
//! The [`SessionContext`] keeps track of who is logged in, the [`ApiClient`]
//! authenticates every request with the session's token, and the functions
//! in [`endpoints`] cover searching, posting, and booking rides.

#![forbid(unsafe_code)]

#[cfg(test)]
#[macro_use]
extern crate pretty_assertions;

mod capabilities;
mod client;
mod config;
mod context;
pub mod endpoints;
mod guard;
mod id;
mod navigation;
mod rides;
mod session;
mod storage;
mod user;

pub use capabilities::{Capabilities, Capability};
pub use client::{ApiClient, ApiError};
pub use config::{Config, InvalidEndpoint, DEFAULT_BASE_URL};
pub use context::{
    AuthEvent, AuthState, MissingProvider, SessionContext, Snapshot,
};
pub use guard::{Decision, Guard};
pub use id::Id;
pub use navigation::{Navigator, Route};
pub use rides::{
    AdminMetrics, Booking, BookingStatus, BookingWithRide, NewRide, Ride,
    RideSearch, RideStatus,
};
pub use session::Session;
pub use storage::{CredentialStore, FileStore, MemoryStore, StorageError};
pub use user::{Registration, User};

/// The default user agent to use when communicating with the API server.
pub const DEFAULT_USER_AGENT: &str =
    concat!(env!("CARGO_PKG_NAME"), "-", env!("CARGO_PKG_VERSION"));
