/// Mean Earth radius in meters, as used by the mobile clients.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle (haversine) distance in meters between two coordinates.
pub fn haversine_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

/// True iff the reported coordinate lies within `radius_m` of the office
/// coordinate, boundary inclusive. Any non-finite input fails closed: an
/// ambiguous location must never pass the fence.
pub fn is_within_radius(
    lat: f64,
    lon: f64,
    office_lat: f64,
    office_lon: f64,
    radius_m: f64,
) -> bool {
    if ![lat, lon, office_lat, office_lon, radius_m]
        .iter()
        .all(|v| v.is_finite())
    {
        return false;
    }

    haversine_m(lat, lon, office_lat, office_lon) <= radius_m
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_point_inside_office_radius() {
        // ~0.4m from the office reference point, radius 100m
        assert!(is_within_radius(
            -6.251427, 107.113802, -6.251426, 107.113798, 100.0
        ));
    }

    #[test]
    fn rejects_point_outside_radius() {
        // ~1.1km north of the office
        assert!(!is_within_radius(
            -6.241426, 107.113798, -6.251426, 107.113798, 100.0
        ));
    }

    #[test]
    fn boundary_is_inclusive() {
        // zero distance, zero radius: d == r must pass
        assert!(is_within_radius(
            -6.251426, 107.113798, -6.251426, 107.113798, 0.0
        ));
    }

    #[test]
    fn nan_coordinates_fail_closed() {
        assert!(!is_within_radius(f64::NAN, 107.0, -6.25, 107.11, 100.0));
        assert!(!is_within_radius(-6.25, f64::NAN, -6.25, 107.11, 100.0));
        assert!(!is_within_radius(-6.25, 107.0, -6.25, 107.11, f64::NAN));
        assert!(!is_within_radius(-6.25, 107.0, f64::INFINITY, 107.11, 100.0));
    }

    #[test]
    fn haversine_known_distance() {
        // one degree of latitude at the equator is ~111.19 km
        let d = haversine_m(0.0, 0.0, 1.0, 0.0);
        assert!((d - 111_195.0).abs() < 100.0, "got {d}");
    }
}
