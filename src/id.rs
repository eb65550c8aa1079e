use serde_derive::{Deserialize, Serialize};
use std::{
    fmt::{self, Display, Formatter},
    ops::Deref,
    str::FromStr,
};

/// The server-issued identifier of a user, ride, or booking.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Hash,
    Eq,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct Id(String);

impl Id {
    pub fn as_str(&self) -> &str { &self.0 }
}

impl<S: Into<String>> From<S> for Id {
    fn from(other: S) -> Id { Id(other.into()) }
}

impl Deref for Id {
    type Target = str;

    fn deref(&self) -> &str { &self.0 }
}

impl AsRef<str> for Id {
    fn as_ref(&self) -> &str { &self.0 }
}

impl Display for Id {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Id {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Id, Self::Err> { Ok(Id::from(s)) }
}
