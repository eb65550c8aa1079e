use crate::{ApiClient, ApiError, BookingWithRide, Id};
use reqwest::Method;
use serde_derive::Deserialize;

/// The logged-in user's bookings, most recent first.
pub async fn my_bookings(
    client: &ApiClient,
) -> Result<Vec<BookingWithRide>, ApiError> {
    let request = client.request(Method::GET, &["bookings"])?;
    client.send(request).await
}

/// Cancel a booking, giving its seats back to the ride.
///
/// Returns the server's confirmation message.
pub async fn cancel_booking(
    client: &ApiClient,
    booking: &Id,
) -> Result<String, ApiError> {
    let request = client
        .request(Method::POST, &["bookings", booking.as_str(), "cancel"])?;

    let ack: Acknowledgement = client.send(request).await?;
    Ok(ack.message)
}

#[derive(Debug, Deserialize)]
struct Acknowledgement {
    message: String,
}
