//! Unit tests for ps-core primitives.

#[cfg(test)]
mod ids {
    use crate::NodeId;

    #[test]
    fn index_roundtrip() {
        let id = NodeId(42);
        assert_eq!(id.index(), 42);
        assert_eq!(NodeId::try_from(42usize).unwrap(), id);
    }

    #[test]
    fn invalid_sentinels_are_max() {
        assert_eq!(NodeId::INVALID.0, u32::MAX);
        assert_eq!(NodeId::default(), NodeId::INVALID);
    }

    #[test]
    fn display() {
        assert_eq!(NodeId(7).to_string(), "NodeId(7)");
    }
}

#[cfg(test)]
mod point {
    use crate::GeoPoint;

    #[test]
    fn zero_distance() {
        let p = GeoPoint::new(40.7128, -74.0060);
        assert!(p.distance_m(p) < 1e-6);
    }

    #[test]
    fn one_degree_latitude() {
        let a = GeoPoint::new(30.0, -88.0);
        let b = GeoPoint::new(31.0, -88.0);
        let d = a.distance_m(b);
        assert!((d - 111_195.0).abs() < 50.0, "got {d}");
    }

    #[test]
    fn mean_of_two_points() {
        let c = GeoPoint::mean([
            GeoPoint::new(40.7128, -74.0060),
            GeoPoint::new(40.7130, -74.0062),
        ])
        .unwrap();
        assert!((c.lat - 40.7129).abs() < 1e-12);
        assert!((c.lon - -74.0061).abs() < 1e-12);
    }

    #[test]
    fn mean_of_nothing_is_none() {
        assert!(GeoPoint::mean(std::iter::empty()).is_none());
    }

    #[test]
    fn validity() {
        assert!(GeoPoint::new(90.0, 180.0).is_valid());
        assert!(!GeoPoint::new(90.5, 0.0).is_valid());
        assert!(!GeoPoint::new(0.0, f64::NAN).is_valid());
    }

    #[test]
    fn coord_order_is_lon_lat() {
        let c = GeoPoint::new(1.5, 2.5).to_coord();
        assert_eq!((c.x, c.y), (2.5, 1.5));
    }
}

#[cfg(test)]
mod crs {
    use geo::Coord;

    use crate::{Crs, GeoPoint, UtmZone};

    #[test]
    fn zone_selection() {
        let z = UtmZone::containing(GeoPoint::new(40.7128, -74.0060)).unwrap();
        assert_eq!(z.number(), 18);
        assert!(z.is_north());
        assert_eq!(z.epsg(), 32618);

        let south = UtmZone::containing(GeoPoint::new(-33.9, 151.2)).unwrap();
        assert_eq!(south.number(), 56);
        assert_eq!(south.epsg(), 32756);

        // The antimeridian stays in zone 60.
        assert_eq!(UtmZone::containing(GeoPoint::new(0.0, 180.0)).unwrap().number(), 60);
    }

    #[test]
    fn zone_number_bounds() {
        assert!(UtmZone::new(0, true).is_err());
        assert!(UtmZone::new(61, true).is_err());
    }

    #[test]
    fn central_meridian_on_equator() {
        let z = UtmZone::new(31, true).unwrap();
        let c = z.project(GeoPoint::new(0.0, 3.0)).unwrap();
        assert!((c.x - 500_000.0).abs() < 1e-4, "easting {}", c.x);
        assert!(c.y.abs() < 1e-4, "northing {}", c.y);
    }

    #[test]
    fn one_degree_along_central_meridian() {
        // Meridian arc from the equator to 1°N is 110 574.389 m; UTM scales it by k0.
        let z = UtmZone::new(31, true).unwrap();
        let c = z.project(GeoPoint::new(1.0, 3.0)).unwrap();
        assert!((c.y - 110_574.389 * 0.9996).abs() < 0.05, "northing {}", c.y);
    }

    #[test]
    fn southern_false_northing() {
        let z = UtmZone::new(31, false).unwrap();
        let c = z.project(GeoPoint::new(-1.0, 3.0)).unwrap();
        assert!((c.y - (10_000_000.0 - 110_574.389 * 0.9996)).abs() < 0.05);
    }

    #[test]
    fn forward_inverse_round_trip() {
        let z = UtmZone::containing(GeoPoint::new(40.7128, -74.0060)).unwrap();
        for p in [
            GeoPoint::new(40.7128, -74.0060),
            GeoPoint::new(40.7130, -74.0062),
            GeoPoint::new(40.0, -77.9),
            GeoPoint::new(41.5, -72.1),
        ] {
            let back = z.unproject(z.project(p).unwrap()).unwrap();
            assert!((back.lat - p.lat).abs() < 1e-8, "{p} -> {back}");
            assert!((back.lon - p.lon).abs() < 1e-8, "{p} -> {back}");
        }
    }

    #[test]
    fn projected_distance_matches_haversine() {
        let a = GeoPoint::new(40.7128, -74.0060);
        let b = GeoPoint::new(40.7220, -73.9950);
        let z = UtmZone::containing(a).unwrap();
        let (pa, pb) = (z.project(a).unwrap(), z.project(b).unwrap());
        let planar = ((pa.x - pb.x).powi(2) + (pa.y - pb.y).powi(2)).sqrt();
        let sphere = a.distance_m(b);
        assert!((planar - sphere).abs() / sphere < 0.005, "{planar} vs {sphere}");
    }

    #[test]
    fn crs_transform_identity_and_utm_to_utm() {
        let c = Coord { x: -74.0060, y: 40.7128 };
        assert_eq!(Crs::Wgs84.transform(Crs::Wgs84, c).unwrap(), c);

        let z18 = Crs::Utm(UtmZone::new(18, true).unwrap());
        let z17 = Crs::Utm(UtmZone::new(17, true).unwrap());
        let in18 = Crs::Wgs84.transform(z18, c).unwrap();
        let in17 = z18.transform(z17, in18).unwrap();
        let back = z17.transform(Crs::Wgs84, in17).unwrap();
        assert!((back.x - c.x).abs() < 1e-8 && (back.y - c.y).abs() < 1e-8);
    }

    #[test]
    fn transformer_matches_single_transform() {
        let utm = Crs::Utm(UtmZone::new(18, true).unwrap());
        let t = Crs::Wgs84.transformer(utm).unwrap();
        assert_eq!((t.from_crs(), t.to_crs()), (Crs::Wgs84, utm));
        for c in [Coord { x: -74.0060, y: 40.7128 }, Coord { x: -73.9, y: 40.8 }] {
            assert_eq!(t.transform(c).unwrap(), Crs::Wgs84.transform(utm, c).unwrap());
        }
    }

    #[test]
    fn proj_definitions() {
        assert_eq!(
            UtmZone::new(18, true).unwrap().proj_definition(),
            "+proj=utm +zone=18 +datum=WGS84 +units=m +no_defs"
        );
        assert!(UtmZone::new(33, false).unwrap().proj_definition().contains(" +south"));
        assert!(Crs::Wgs84.proj_definition().starts_with("+proj=longlat"));
    }

    #[test]
    fn display_and_epsg() {
        assert_eq!(Crs::Wgs84.to_string(), "EPSG:4326");
        assert!(Crs::Wgs84.is_geographic());
        let utm = Crs::Utm(UtmZone::new(18, true).unwrap());
        assert_eq!(utm.to_string(), "EPSG:32618");
        assert!(!utm.is_geographic());
    }

    #[test]
    fn invalid_input_rejected() {
        let z = UtmZone::new(18, true).unwrap();
        assert!(z.project(GeoPoint::new(95.0, -75.0)).is_err());
    }
}
