use crate::{ApiClient, ApiError, Booking, Id, NewRide, Ride, RideSearch};
use reqwest::Method;
use serde_derive::Serialize;

/// Find rides matching some filters.
pub async fn search_rides(
    client: &ApiClient,
    search: &RideSearch,
) -> Result<Vec<Ride>, ApiError> {
    log::trace!("Search: {:#?}", search);
    let request = client.request(Method::GET, &["rides"])?.query(search);
    client.send(request).await
}

pub async fn get_ride(
    client: &ApiClient,
    ride: &Id,
) -> Result<Ride, ApiError> {
    let request = client.request(Method::GET, &["rides", ride.as_str()])?;
    client.send(request).await
}

/// Offer a new ride. Only drivers may do this.
pub async fn create_ride(
    client: &ApiClient,
    ride: &NewRide,
) -> Result<Ride, ApiError> {
    log::trace!("Payload: {:#?}", ride);
    let request = client.request(Method::POST, &["rides"])?.json(ride);
    client.send(request).await
}

/// The rides offered by the logged-in driver.
pub async fn my_rides(client: &ApiClient) -> Result<Vec<Ride>, ApiError> {
    let request = client
        .request(Method::GET, &["rides", "driver", "my-rides"])?;
    client.send(request).await
}

/// Everyone who booked seats on one of the logged-in driver's rides.
pub async fn ride_bookings(
    client: &ApiClient,
    ride: &Id,
) -> Result<Vec<Booking>, ApiError> {
    let request = client
        .request(Method::GET, &["rides", ride.as_str(), "bookings"])?;
    client.send(request).await
}

/// Reserve seats on a ride.
pub async fn book_ride(
    client: &ApiClient,
    ride: &Id,
    seats: u32,
) -> Result<Booking, ApiError> {
    let data = BookingData {
        seats_booked: seats,
    };

    let request = client
        .request(Method::POST, &["rides", ride.as_str(), "book"])?
        .json(&data);
    client.send(request).await
}

#[derive(Debug, Copy, Clone, Serialize)]
struct BookingData {
    seats_booked: u32,
}
