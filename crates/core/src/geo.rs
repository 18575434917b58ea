//! Coordinates and nearest-store lookup.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Invalid coordinate input.
#[derive(Debug, Clone, Copy, Error, PartialEq)]
pub enum GeoError {
    #[error("latitude {0} is outside -90..=90")]
    Latitude(f64),
    #[error("longitude {0} is outside -180..=180")]
    Longitude(f64),
}

/// A WGS84 point as reported by the browser geolocation API.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    /// Create coordinates, rejecting out-of-range or non-finite values.
    ///
    /// # Errors
    ///
    /// Returns `GeoError` if either component is out of range.
    pub fn new(lat: f64, lng: f64) -> Result<Self, GeoError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(GeoError::Latitude(lat));
        }
        if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            return Err(GeoError::Longitude(lng));
        }
        Ok(Self { lat, lng })
    }

    /// Re-check a value that came in through serde.
    ///
    /// # Errors
    ///
    /// Returns `GeoError` if either component is out of range.
    pub fn validated(self) -> Result<Self, GeoError> {
        Self::new(self.lat, self.lng)
    }
}

/// Anything with a position, such as a store (`punto de venta`).
pub trait Located {
    fn coordinates(&self) -> Coordinates;
}

impl Located for Coordinates {
    fn coordinates(&self) -> Coordinates {
        *self
    }
}

/// Great-circle distance in kilometres (haversine).
#[must_use]
pub fn distance_km(a: Coordinates, b: Coordinates) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();
    let lat_a = a.lat.to_radians();
    let lat_b = b.lat.to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}

/// Closest candidate to `origin` and its distance in kilometres.
///
/// Linear scan; on a tie the earlier candidate wins. Returns `None` when
/// there are no candidates.
pub fn nearest<'a, T, I>(origin: Coordinates, candidates: I) -> Option<(&'a T, f64)>
where
    T: Located + 'a,
    I: IntoIterator<Item = &'a T>,
{
    candidates
        .into_iter()
        .map(|candidate| (candidate, distance_km(origin, candidate.coordinates())))
        .fold(None, |best, (candidate, distance)| match best {
            Some((_, best_distance)) if best_distance <= distance => best,
            _ => Some((candidate, distance)),
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const BOGOTA: Coordinates = Coordinates {
        lat: 4.7110,
        lng: -74.0721,
    };
    const MEDELLIN: Coordinates = Coordinates {
        lat: 6.2442,
        lng: -75.5812,
    };
    const CALI: Coordinates = Coordinates {
        lat: 3.4516,
        lng: -76.5320,
    };

    struct Store {
        name: &'static str,
        at: Coordinates,
    }

    impl Located for Store {
        fn coordinates(&self) -> Coordinates {
            self.at
        }
    }

    #[test]
    fn test_distance_same_point_is_zero() {
        assert!(distance_km(BOGOTA, BOGOTA).abs() < 1e-9);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let there = distance_km(BOGOTA, CALI);
        let back = distance_km(CALI, BOGOTA);
        assert!((there - back).abs() < 1e-9);
    }

    #[test]
    fn test_distance_bogota_medellin() {
        let km = distance_km(BOGOTA, MEDELLIN);
        assert!((235.0..250.0).contains(&km), "got {km}");
    }

    #[test]
    fn test_distance_one_degree_of_latitude() {
        let km = distance_km(
            Coordinates { lat: 0.0, lng: 0.0 },
            Coordinates { lat: 1.0, lng: 0.0 },
        );
        assert!((km - 111.19).abs() < 0.01, "got {km}");
    }

    #[test]
    fn test_nearest_picks_closest_store() {
        let stores = [
            Store {
                name: "Medellín",
                at: MEDELLIN,
            },
            Store {
                name: "Cali",
                at: CALI,
            },
        ];

        // Point in Pereira, closer to Medellín than to Cali.
        let pereira = Coordinates::new(4.8133, -75.6961).unwrap();
        let (store, km) = nearest(pereira, &stores).unwrap();
        assert_eq!(store.name, "Medellín");
        assert!(km > 100.0 && km < 200.0, "got {km}");
    }

    #[test]
    fn test_nearest_tie_keeps_first() {
        let stores = [
            Store {
                name: "first",
                at: BOGOTA,
            },
            Store {
                name: "second",
                at: BOGOTA,
            },
        ];
        let (store, _) = nearest(BOGOTA, &stores).unwrap();
        assert_eq!(store.name, "first");
    }

    #[test]
    fn test_nearest_empty() {
        let stores: [Store; 0] = [];
        assert!(nearest(BOGOTA, &stores).is_none());
    }

    #[test]
    fn test_coordinates_range() {
        assert!(Coordinates::new(4.7, -74.1).is_ok());
        assert_eq!(Coordinates::new(91.0, 0.0), Err(GeoError::Latitude(91.0)));
        assert_eq!(
            Coordinates::new(0.0, -181.0),
            Err(GeoError::Longitude(-181.0))
        );
        assert!(Coordinates::new(f64::NAN, 0.0).is_err());
    }
}
