//! Fare pricing and the human-readable trip formats shown to riders.

use std::str::FromStr;

use crate::entities::ride::VehicleClass;
use crate::error::AppError;

/// Per-class pricing: base fare, per kilometre, per minute.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateCard {
    pub base: f64,
    pub per_km: f64,
    pub per_min: f64,
}

impl VehicleClass {
    pub const ALL: [VehicleClass; 3] = [VehicleClass::Car, VehicleClass::Auto, VehicleClass::Moto];

    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleClass::Car => "car",
            VehicleClass::Auto => "auto",
            VehicleClass::Moto => "moto",
        }
    }

    pub fn rate_card(&self) -> RateCard {
        match self {
            VehicleClass::Car => RateCard {
                base: 10.0,
                per_km: 5.0,
                per_min: 1.5,
            },
            VehicleClass::Auto => RateCard {
                base: 10.0,
                per_km: 3.0,
                per_min: 1.0,
            },
            VehicleClass::Moto => RateCard {
                base: 5.0,
                per_km: 2.0,
                per_min: 0.8,
            },
        }
    }
}

impl FromStr for VehicleClass {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "car" => Ok(VehicleClass::Car),
            "auto" => Ok(VehicleClass::Auto),
            "moto" => Ok(VehicleClass::Moto),
            _ => Err(AppError::Validation(
                "Vehicle type must be one of: car, auto, moto".to_string(),
            )),
        }
    }
}

/// Price a trip, rounded to the nearest whole currency unit.
pub fn calculate_fare(distance_km: f64, duration_min: f64, class: VehicleClass) -> i32 {
    let rate = class.rate_card();
    let total = rate.base + distance_km * rate.per_km + duration_min * rate.per_min;
    total.round() as i32
}

/// `"45 mins"`, `"1 hr"`, `"2 hrs 5 mins"`.
pub fn format_duration(minutes: f64) -> String {
    if minutes < 60.0 {
        return format!("{} mins", minutes);
    }

    let total = minutes as i64;
    let hours = total / 60;
    let remaining = total % 60;
    let unit = if hours > 1 { "hrs" } else { "hr" };

    if remaining == 0 {
        format!("{} {}", hours, unit)
    } else {
        format!("{} {} {} mins", hours, unit, remaining)
    }
}

pub fn format_distance(distance_km: f64) -> String {
    format!("{} km", distance_km)
}

/// One decimal place, as shown in fare quotes.
pub fn format_distance_fixed(distance_km: f64) -> String {
    format!("{:.1} km", distance_km)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_car_fare_example() {
        // 10 + 10*5 + 20*1.5
        assert_eq!(calculate_fare(10.0, 20.0, VehicleClass::Car), 90);
    }

    #[test]
    fn test_rate_table() {
        assert_eq!(calculate_fare(0.0, 0.0, VehicleClass::Car), 10);
        assert_eq!(calculate_fare(0.0, 0.0, VehicleClass::Auto), 10);
        assert_eq!(calculate_fare(0.0, 0.0, VehicleClass::Moto), 5);
        assert_eq!(calculate_fare(4.0, 10.0, VehicleClass::Auto), 32);
        // 5 + 3*2 + 7*0.8 = 16.6
        assert_eq!(calculate_fare(3.0, 7.0, VehicleClass::Moto), 17);
    }

    #[test]
    fn test_minimum_trip_fare() {
        // 10 + 0.5 + 7.5
        assert_eq!(calculate_fare(0.1, 5.0, VehicleClass::Car), 18);
    }

    #[test]
    fn test_fare_is_monotonic() {
        for class in VehicleClass::ALL {
            let mut last = calculate_fare(0.0, 0.0, class);
            for step in 1..200 {
                let d = step as f64 * 0.37;
                let fare = calculate_fare(d, 12.0, class);
                assert!(fare >= last, "{:?} decreased at distance {}", class, d);
                last = fare;
            }

            let mut last = calculate_fare(3.0, 0.0, class);
            for step in 1..200 {
                let t = step as f64 * 0.53;
                let fare = calculate_fare(3.0, t, class);
                assert!(fare >= last, "{:?} decreased at duration {}", class, t);
                last = fare;
            }
        }
    }

    #[test]
    fn test_unknown_class_is_validation_error() {
        for name in ["bus", "", "Car", "motorcycle"] {
            assert!(matches!(name.parse::<VehicleClass>(), Err(AppError::Validation(_))));
        }
        for class in VehicleClass::ALL {
            assert_eq!(class.as_str().parse::<VehicleClass>().unwrap(), class);
        }
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0.0), "0 mins");
        assert_eq!(format_duration(45.0), "45 mins");
        assert_eq!(format_duration(60.0), "1 hr");
        assert_eq!(format_duration(61.0), "1 hr 1 mins");
        assert_eq!(format_duration(120.0), "2 hrs");
        assert_eq!(format_duration(125.0), "2 hrs 5 mins");
    }

    #[test]
    fn test_format_distance() {
        assert_eq!(format_distance(3.0), "3 km");
        assert_eq!(format_distance(0.1), "0.1 km");
        assert_eq!(format_distance_fixed(3.0), "3.0 km");
    }
}
