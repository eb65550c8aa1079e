//! Rides, bookings, and the numbers administrators keep an eye on.

use crate::Id;
use serde_derive::{Deserialize, Serialize};

/// A trip offered by a driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct Ride {
    pub id: Id,
    pub driver_id: Id,
    pub driver_name: String,
    pub driver_phone: String,
    pub start_location: String,
    pub end_location: String,
    /// The departure date, as `YYYY-MM-DD`.
    pub date: String,
    /// The departure time, as `HH:MM`.
    pub time: String,
    pub seats_total: u32,
    pub seats_available: u32,
    pub price_per_seat: f64,
    pub distance_km: f64,
    /// A free-form description of the car.
    pub vehicle: String,
    #[serde(default)]
    pub notes: Option<String>,
    pub status: RideStatus,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RideStatus {
    Active,
    Completed,
    Cancelled,
}

/// The details a driver fills in when offering a ride.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewRide {
    pub start_location: String,
    pub end_location: String,
    pub date: String,
    pub time: String,
    pub seats_total: u32,
    pub price_per_seat: f64,
    pub distance_km: f64,
    pub vehicle: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Filters for finding a ride. Empty fields match everything.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RideSearch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_loc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_loc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    pub min_seats: u32,
}

impl Default for RideSearch {
    fn default() -> Self {
        RideSearch {
            from_loc: None,
            to_loc: None,
            date: None,
            min_seats: 1,
        }
    }
}

/// Seats reserved by a passenger on somebody else's ride.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct Booking {
    pub id: Id,
    pub ride_id: Id,
    pub passenger_id: Id,
    pub passenger_name: String,
    pub passenger_phone: String,
    pub seats_booked: u32,
    pub status: BookingStatus,
    #[serde(default)]
    pub booked_at: Option<String>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
}

/// A [`Booking`] with the [`Ride`] it is for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct BookingWithRide {
    #[serde(flatten)]
    pub booking: Booking,
    pub ride: Ride,
}

/// Platform-wide statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct AdminMetrics {
    pub total_users: u64,
    pub total_drivers: u64,
    pub total_passengers: u64,
    pub total_rides: u64,
    pub active_rides: u64,
    pub total_bookings: u64,
    pub confirmed_bookings: u64,
    pub total_seats_offered: u64,
    pub total_seats_booked: u64,
    pub total_co2_saved_kg: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_search_only_sends_the_seat_count() {
        let got = serde_json::to_value(RideSearch::default()).unwrap();

        assert_eq!(got, serde_json::json!({ "min_seats": 1 }));
    }

    #[test]
    fn parse_a_booking_with_its_ride() {
        let src = r#"{
            "id": "b-1",
            "ride_id": "r-1",
            "passenger_id": "9",
            "passenger_name": "Ravi",
            "passenger_phone": "1234567890",
            "seats_booked": 2,
            "status": "confirmed",
            "booked_at": "2024-11-02T08:15:00Z",
            "ride": {
                "id": "r-1",
                "driver_id": "7",
                "driver_name": "Asha Rao",
                "driver_phone": "9999999999",
                "start_location": "Electronic City",
                "end_location": "PES RR Campus",
                "date": "2024-11-04",
                "time": "08:30",
                "seats_total": 3,
                "seats_available": 1,
                "price_per_seat": 80.0,
                "distance_km": 24.5,
                "vehicle": "White Swift",
                "notes": null,
                "status": "active",
                "created_at": "2024-11-01T10:00:00Z"
            }
        }"#;

        let got: BookingWithRide = serde_json::from_str(src).unwrap();

        assert_eq!(got.booking.seats_booked, 2);
        assert_eq!(got.booking.status, BookingStatus::Confirmed);
        assert_eq!(got.ride.driver_name, "Asha Rao");
        assert_eq!(got.ride.status, RideStatus::Active);
        assert_eq!(got.ride.notes, None);
    }
}
