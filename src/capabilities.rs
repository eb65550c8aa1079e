//! Mapping from account roles to the actions they permit.

use crate::User;
use std::iter::FromIterator;

/// Something a signed-in user may be allowed to do.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Capability {
    SearchRides,
    BookRides,
    ViewBookings,
    PostRides,
    ViewOwnRides,
    /// See who booked seats on a ride you are driving.
    ViewRideBookings,
    ViewMetrics,
}

impl Capability {
    pub const ALL: [Capability; 7] = [
        Capability::SearchRides,
        Capability::BookRides,
        Capability::ViewBookings,
        Capability::PostRides,
        Capability::ViewOwnRides,
        Capability::ViewRideBookings,
        Capability::ViewMetrics,
    ];

    fn bit(self) -> u8 { 1 << self as u8 }
}

const MEMBER: &[Capability] = &[
    Capability::SearchRides,
    Capability::BookRides,
    Capability::ViewBookings,
];
const DRIVER: &[Capability] = &[
    Capability::PostRides,
    Capability::ViewOwnRides,
    Capability::ViewRideBookings,
];
const ADMIN: &[Capability] = &[Capability::ViewMetrics];

/// The set of [`Capability`]s granted to a user.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct Capabilities(u8);

impl Capabilities {
    /// The empty set, used when nobody is logged in.
    pub const NONE: Capabilities = Capabilities(0);

    /// Work out what a user may do from their role flags.
    ///
    /// This is the only place role flags are interpreted.
    pub fn for_user(user: &User) -> Capabilities {
        let mut granted = Capabilities::from_iter(MEMBER.iter().copied());

        if user.is_driver {
            granted.extend(DRIVER.iter().copied());
        }
        if user.is_admin {
            granted.extend(ADMIN.iter().copied());
        }

        granted
    }

    pub fn contains(self, capability: Capability) -> bool {
        self.0 & capability.bit() != 0
    }

    pub fn is_empty(self) -> bool { self.0 == 0 }

    pub fn iter(self) -> impl Iterator<Item = Capability> {
        Capability::ALL
            .iter()
            .copied()
            .filter(move |&c| self.contains(c))
    }
}

impl Extend<Capability> for Capabilities {
    fn extend<I: IntoIterator<Item = Capability>>(&mut self, iter: I) {
        for capability in iter {
            self.0 |= capability.bit();
        }
    }
}

impl FromIterator<Capability> for Capabilities {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        let mut set = Capabilities::NONE;
        set.extend(iter);
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(is_driver: bool, is_admin: bool) -> User {
        User {
            id: "42".into(),
            email: String::from("someone@pes.edu"),
            name: String::from("Some One"),
            phone: String::from("9876543210"),
            is_driver,
            is_admin,
            created_at: None,
        }
    }

    #[test]
    fn passengers_can_search_and_book() {
        let got: Vec<_> = Capabilities::for_user(&user(false, false))
            .iter()
            .collect();

        assert_eq!(
            got,
            vec![
                Capability::SearchRides,
                Capability::BookRides,
                Capability::ViewBookings
            ]
        );
    }

    #[test]
    fn only_drivers_post_rides() {
        let passenger = Capabilities::for_user(&user(false, false));
        let driver = Capabilities::for_user(&user(true, false));

        assert!(!passenger.contains(Capability::PostRides));
        assert!(driver.contains(Capability::PostRides));
        assert!(driver.contains(Capability::ViewRideBookings));
        assert!(driver.contains(Capability::BookRides));
        assert!(!driver.contains(Capability::ViewMetrics));
    }

    #[test]
    fn admin_flag_is_independent_of_driving() {
        let admin = Capabilities::for_user(&user(false, true));

        assert!(admin.contains(Capability::ViewMetrics));
        assert!(!admin.contains(Capability::PostRides));
    }

    #[test]
    fn nobody_has_nothing() {
        assert!(Capabilities::NONE.is_empty());
        assert_eq!(Capabilities::NONE.iter().count(), 0);
    }
}
