//! The carpool API's endpoints.
//!
//! Every function sends its request through an [`ApiClient`], so the current
//! bearer token is attached automatically and an expired token ends the
//! session.
//!
//! [`ApiClient`]: crate::ApiClient

mod admin;
mod auth;
mod bookings;
mod rides;

pub use admin::admin_metrics;
pub use auth::{login, me, register};
pub use bookings::{cancel_booking, my_bookings};
pub use rides::{
    book_ride, create_ride, get_ride, my_rides, ride_bookings, search_rides,
};
