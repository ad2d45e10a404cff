//! Output record and sink trait
//!
//! This module defines the record handed downstream for every institution and
//! the trait interface sinks implement to receive it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An institution ready to be sent downstream
///
/// Records carry no identity beyond their fields; the same institution found
/// twice is sent twice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Institution {
    pub name: String,
    pub country: String,
    pub address: String,
    pub website: String,
}

impl Institution {
    pub fn new(
        name: impl Into<String>,
        country: impl Into<String>,
        address: impl Into<String>,
        website: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            country: country.into(),
            address: address.into(),
            website: website.into(),
        }
    }
}

impl fmt::Display for Institution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) - {} - {}",
            self.name, self.country, self.address, self.website
        )
    }
}

/// Receives institutions one at a time
///
/// `send` is fire-and-forget: it must not block the caller and reports nothing
/// back. Delivery failures are the sink's to log.
pub trait InstitutionSink: Send + Sync {
    fn send(&self, institution: Institution);
}
