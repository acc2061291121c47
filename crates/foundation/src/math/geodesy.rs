/// Mean Earth radius (meters) used by all spherical formulas.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Geographic position in degrees.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LatLng {
    pub lat_deg: f64,
    pub lng_deg: f64,
}

impl LatLng {
    pub fn new(lat_deg: f64, lng_deg: f64) -> Self {
        Self { lat_deg, lng_deg }
    }

    /// True when both components are finite and inside the WGS84 ranges.
    pub fn is_valid(&self) -> bool {
        self.lat_deg.is_finite()
            && self.lng_deg.is_finite()
            && (-90.0..=90.0).contains(&self.lat_deg)
            && (-180.0..=180.0).contains(&self.lng_deg)
    }
}

/// Great-circle distance in meters.
pub fn haversine_distance(a: LatLng, b: LatLng) -> f64 {
    let lat1 = a.lat_deg.to_radians();
    let lat2 = b.lat_deg.to_radians();
    let d_lat = (b.lat_deg - a.lat_deg).to_radians();
    let d_lng = (b.lng_deg - a.lng_deg).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_M * c
}

/// Point reached by travelling `distance_m` from `origin` on the initial
/// bearing `bearing_rad` (clockwise from north).
///
/// Longitude is normalized to [-180, 180).
pub fn destination_point(origin: LatLng, bearing_rad: f64, distance_m: f64) -> LatLng {
    let delta = distance_m / EARTH_RADIUS_M;
    let lat1 = origin.lat_deg.to_radians();
    let lng1 = origin.lng_deg.to_radians();

    let sin_lat2 = lat1.sin() * delta.cos() + lat1.cos() * delta.sin() * bearing_rad.cos();
    let lat2 = sin_lat2.asin();
    let y = bearing_rad.sin() * delta.sin() * lat1.cos();
    let x = delta.cos() - lat1.sin() * sin_lat2;
    let lng2 = lng1 + y.atan2(x);

    LatLng::new(lat2.to_degrees(), normalize_lng(lng2.to_degrees()))
}

fn normalize_lng(lng_deg: f64) -> f64 {
    (lng_deg + 540.0).rem_euclid(360.0) - 180.0
}

#[cfg(test)]
mod tests {
    use super::{EARTH_RADIUS_M, LatLng, destination_point, haversine_distance};

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn haversine_zero_for_same_point() {
        let p = LatLng::new(47.3769, 8.5417);
        assert_close(haversine_distance(p, p), 0.0, 1e-9);
    }

    #[test]
    fn haversine_one_degree_of_latitude() {
        let a = LatLng::new(0.0, 0.0);
        let b = LatLng::new(1.0, 0.0);
        let expected = EARTH_RADIUS_M * 1f64.to_radians();
        assert_close(haversine_distance(a, b), expected, 1e-6);
    }

    #[test]
    fn haversine_is_symmetric() {
        let a = LatLng::new(51.5, -0.12);
        let b = LatLng::new(48.85, 2.35);
        assert_close(haversine_distance(a, b), haversine_distance(b, a), 1e-9);
    }

    #[test]
    fn destination_due_north() {
        let origin = LatLng::new(10.0, 20.0);
        let d = EARTH_RADIUS_M * 2f64.to_radians();
        let p = destination_point(origin, 0.0, d);
        assert_close(p.lat_deg, 12.0, 1e-9);
        assert_close(p.lng_deg, 20.0, 1e-9);
    }

    #[test]
    fn destination_distance_matches_haversine() {
        let origin = LatLng::new(-33.86, 151.21);
        for i in 0..8 {
            let bearing = i as f64 / 8.0 * std::f64::consts::TAU;
            let p = destination_point(origin, bearing, 750.0);
            assert_close(haversine_distance(origin, p), 750.0, 1e-6);
        }
    }

    #[test]
    fn destination_wraps_antimeridian() {
        let origin = LatLng::new(0.0, 179.9);
        let p = destination_point(origin, std::f64::consts::FRAC_PI_2, 50_000.0);
        assert!(p.lng_deg < -179.0, "lng {} not wrapped", p.lng_deg);
    }

    #[test]
    fn validity_rejects_out_of_range() {
        assert!(LatLng::new(45.0, 90.0).is_valid());
        assert!(!LatLng::new(91.0, 0.0).is_valid());
        assert!(!LatLng::new(0.0, f64::NAN).is_valid());
    }
}
