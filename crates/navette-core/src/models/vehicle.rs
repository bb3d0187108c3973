//! Vehicle model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Vehicle offered for transfers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: i32,
    pub name: String,

    /// Free-form category (berline, van, minibus...)
    pub category: String,

    /// Passenger seats, driver excluded
    pub seats: i32,

    /// Number of large suitcases
    pub luggage: i32,

    pub description: Option<String>,

    /// Public URL of the vehicle photo
    pub photo_url: Option<String>,

    /// Hidden from the public catalogue when false
    pub available: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Vehicle {
    /// Whether the vehicle can take a booking for `passengers` people
    pub fn can_carry(&self, passengers: i32) -> bool {
        self.available && passengers >= 1 && passengers <= self.seats
    }
}

impl Default for Vehicle {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            name: String::new(),
            category: String::new(),
            seats: 4,
            luggage: 2,
            description: None,
            photo_url: None,
            available: true,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_can_carry() {
        let van = Vehicle {
            seats: 7,
            ..Default::default()
        };
        assert!(van.can_carry(1));
        assert!(van.can_carry(7));
        assert!(!van.can_carry(8));
        assert!(!van.can_carry(0));

        let parked = Vehicle {
            available: false,
            ..van
        };
        assert!(!parked.can_carry(2));
    }
}
