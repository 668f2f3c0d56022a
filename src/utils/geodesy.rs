//! Spherical-Earth geodesy: great-circle distance, forward azimuth and a
//! polar stereographic plane for local interpolation.

use std::f64::consts::FRAC_PI_4;

use crate::models::Coordinate;
use crate::utils::constants::EARTH_RADIUS_M;
use crate::utils::coordinates::normalize_longitude;

/// Great-circle distance in metres using the haversine formula.
pub fn haversine_distance(from: &Coordinate, to: &Coordinate) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let delta_lat = (to.latitude - from.latitude).to_radians();
    let delta_lon = (to.longitude - from.longitude).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.clamp(0.0, 1.0).sqrt().asin();

    EARTH_RADIUS_M * c
}

/// Initial bearing of the great circle from `from` to `to`, degrees in `[0, 360)`.
pub fn initial_bearing(from: &Coordinate, to: &Coordinate) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let delta_lon = (to.longitude - from.longitude).to_radians();

    let y = delta_lon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * delta_lon.cos();

    let bearing = y.atan2(x).to_degrees().rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if bearing >= 360.0 {
        0.0
    } else {
        bearing
    }
}

/// Spherical polar stereographic projection, true scale at the pole.
///
/// The plane is continuous across the antimeridian, so straight lines in it
/// never take the long way round the globe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolarStereographic {
    south: bool,
}

impl PolarStereographic {
    pub fn north() -> Self {
        Self { south: false }
    }

    pub fn south() -> Self {
        Self { south: true }
    }

    /// Pole on the same side of the equator as the midpoint of the pair.
    pub fn for_pair(a: &Coordinate, b: &Coordinate) -> Self {
        if a.latitude + b.latitude < 0.0 {
            Self::south()
        } else {
            Self::north()
        }
    }

    pub fn forward(&self, coordinate: &Coordinate) -> (f64, f64) {
        let latitude = if self.south {
            -coordinate.latitude
        } else {
            coordinate.latitude
        };
        let phi = latitude.to_radians();
        let lambda = coordinate.longitude.to_radians();

        let rho = 2.0 * EARTH_RADIUS_M * (FRAC_PI_4 - phi / 2.0).tan();
        (rho * lambda.sin(), -rho * lambda.cos())
    }

    pub fn inverse(&self, x: f64, y: f64) -> Coordinate {
        let rho = x.hypot(y);
        let phi = std::f64::consts::FRAC_PI_2 - 2.0 * (rho / (2.0 * EARTH_RADIUS_M)).atan();
        let lambda = if rho == 0.0 { 0.0 } else { x.atan2(-y) };

        let latitude = phi.to_degrees();
        Coordinate::new(
            if self.south { -latitude } else { latitude },
            normalize_longitude(lambda.to_degrees()),
        )
    }
}

/// Position a fraction `t` (0..=1) of the way from `a` to `b`, interpolated
/// linearly in the polar stereographic plane of the pair.
pub fn interpolate_coordinate(a: &Coordinate, b: &Coordinate, t: f64) -> Coordinate {
    let projection = PolarStereographic::for_pair(a, b);
    let (x1, y1) = projection.forward(a);
    let (x2, y2) = projection.forward(b);

    projection.inverse(x1 + (x2 - x1) * t, y1 + (y2 - y1) * t)
}
