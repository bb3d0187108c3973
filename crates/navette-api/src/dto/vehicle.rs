//! Vehicle DTOs

use navette_core::models::Vehicle;
use serde::Deserialize;
use validator::Validate;

fn default_available() -> bool {
    true
}

/// Vehicle create/update request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct VehicleRequest {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,

    #[validate(length(min = 1, max = 50, message = "Category is required"))]
    pub category: String,

    #[validate(range(min = 1, max = 60))]
    pub seats: i32,

    #[serde(default)]
    #[validate(range(min = 0, max = 60))]
    pub luggage: i32,

    pub description: Option<String>,

    /// Photo reference (uploads are handled elsewhere)
    #[validate(length(max = 500))]
    pub photo_url: Option<String>,

    #[serde(default = "default_available")]
    pub available: bool,
}

impl VehicleRequest {
    pub fn into_vehicle(self, id: i32) -> Vehicle {
        Vehicle {
            id,
            name: self.name,
            category: self.category,
            seats: self.seats,
            luggage: self.luggage,
            description: self.description,
            photo_url: self.photo_url,
            available: self.available,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vehicle_request_validation() {
        let req: VehicleRequest =
            serde_json::from_str(r#"{"name": "Van Hiace", "category": "van", "seats": 8}"#).unwrap();
        assert!(req.validate().is_ok());
        assert!(req.clone().into_vehicle(3).available);

        let mut no_seats = req;
        no_seats.seats = 0;
        assert!(no_seats.validate().is_err());
    }
}
