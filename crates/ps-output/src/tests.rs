//! Unit tests for ps-output.

#[cfg(test)]
mod helpers {
    use geo::{Coord, LineString};
    use ps_core::GeoPoint;
    use ps_ingest::{Pole, SnappedPole};
    use ps_spatial::{EdgeSpec, EdgeTags, RoadNetwork, RoadNetworkBuilder};

    /// Two nodes joined by a two-way street, with speeds and travel times.
    pub fn network() -> RoadNetwork {
        let mut b = RoadNetworkBuilder::new();
        let a = b.add_node(101, Coord { x: -74.0, y: 40.0 }, Some("traffic_signals".into()));
        let c = b.add_node(102, Coord { x: -73.999, y: 40.0 }, None);
        b.set_node_ref(a, "12B".into());
        let tags = EdgeTags {
            way_ids:  vec![5001, 5002],
            highway:  vec!["residential".into()],
            name:     vec!["Oak Street".into()],
            maxspeed: Vec::new(),
            other:    [
                ("lanes".to_owned(), vec!["2".to_owned()]),
                ("bridge".to_owned(), vec!["yes".to_owned(), "viaduct".to_owned()]),
            ]
            .into_iter()
            .collect(),
            oneway:   false,
            reversed: false,
        };
        let geometry = LineString::new(vec![b.node_coord(a), b.node_coord(c)]);
        b.add_road(a, c, EdgeSpec { length_m: 85.0, geometry, tags });
        let mut net = b.build();
        net.edge_speed_kph = Some(vec![30.6, 30.6]);
        net.edge_travel_time_s = Some(vec![10.0, 10.0]);
        net
    }

    pub fn snapped(block: &str, number: &str, node: i64) -> SnappedPole {
        Pole {
            id:          Pole::composite_id(block, number),
            block:       block.into(),
            number:      number.into(),
            location:    GeoPoint::new(40.0001, -73.9999),
            source_file: "poleblock1.csv".into(),
            extra:       Vec::new(),
        }
        .snap(node, 12.5)
    }
}

// ── Rows ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod rows {
    use crate::{EdgeRow, NodeRow, PoleRow};

    use super::helpers::{network, snapped};

    #[test]
    fn node_rows_use_osm_ids() {
        let rows = NodeRow::from_network(&network());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].osmid, 101);
        assert_eq!((rows[0].x, rows[0].y), (-74.0, 40.0));
        assert_eq!(rows[0].street_count, 1);
        assert_eq!(rows[0].highway.as_deref(), Some("traffic_signals"));
        assert_eq!(rows[1].highway, None);
        assert_eq!(rows[0].reference.as_deref(), Some("12B"));
        assert_eq!(rows[1].reference, None);
    }

    #[test]
    fn edge_rows_reference_endpoints() {
        let rows = EdgeRow::from_network(&network());
        assert_eq!(rows.len(), 2);
        assert_eq!((rows[0].u, rows[0].v, rows[0].key), (101, 102, 0));
        assert_eq!((rows[1].u, rows[1].v), (102, 101));
        assert!(rows[1].reversed);
        assert_eq!(rows[0].speed_kph, Some(30.6));
        assert_eq!(rows[0].travel_time, Some(10.0));
    }

    #[test]
    fn pole_row_from_snapped() {
        let row = PoleRow::from(&snapped("12", "3", 102));
        assert_eq!(row.pole_id, "12-3");
        assert_eq!(row.nearest_node_id, 102);
    }
}

// ── Features ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod features {
    use serde_json::{Value, json};

    use crate::{EdgeRow, NodeRow, PoleRow};

    use super::helpers::{network, snapped};

    fn to_json(f: &geojson::Feature) -> Value {
        serde_json::to_value(f).unwrap()
    }

    #[test]
    fn node_feature_layout() {
        let f = to_json(&NodeRow::from_network(&network())[0].to_feature().unwrap());
        assert_eq!(f["geometry"], json!({"type": "Point", "coordinates": [-74.0, 40.0]}));
        let p = &f["properties"];
        assert_eq!(p["osmid"], 101);
        assert_eq!(p["x"], -74.0);
        assert_eq!(p["y"], 40.0);
        assert_eq!(p["street_count"], 1);
        assert_eq!(p["highway"], "traffic_signals");
        assert_eq!(p["lon"], -74.0);
        assert_eq!(p["lat"], 40.0);
        assert_eq!(p["ref"], "12B");

        let other = to_json(&NodeRow::from_network(&network())[1].to_feature().unwrap());
        assert_eq!(other["properties"]["ref"], Value::Null);
    }

    #[test]
    fn edge_feature_layout() {
        let f = to_json(&EdgeRow::from_network(&network())[0].to_feature().unwrap());
        assert_eq!(f["geometry"]["type"], "LineString");
        assert_eq!(f["geometry"]["coordinates"], json!([[-74.0, 40.0], [-73.999, 40.0]]));
        let p = &f["properties"];
        assert_eq!(p["u"], 101);
        assert_eq!(p["v"], 102);
        assert_eq!(p["key"], 0);
        assert_eq!(p["osmid"], json!([5001, 5002]));
        assert_eq!(p["name"], "Oak Street");
        assert_eq!(p["highway"], "residential");
        assert_eq!(p["maxspeed"], Value::Null);
        assert_eq!(p["oneway"], false);
        assert_eq!(p["reversed"], false);
        assert_eq!(p["length"], 85.0);
        assert_eq!(p["speed_kph"], 30.6);
        assert_eq!(p["travel_time"], 10.0);
    }

    #[test]
    fn edge_feature_carries_way_attributes() {
        let f = to_json(&EdgeRow::from_network(&network())[0].to_feature().unwrap());
        let p = f["properties"].as_object().unwrap();
        assert_eq!(p["lanes"], "2");
        assert_eq!(p["bridge"], json!(["yes", "viaduct"]));
        // Absent tags still get a column.
        for key in ["ref", "tunnel", "junction", "access", "service", "width"] {
            assert_eq!(p[key], Value::Null, "{key}");
        }
    }

    #[test]
    fn missing_speeds_are_null() {
        let mut net = network();
        net.edge_speed_kph = None;
        net.edge_travel_time_s = None;
        let f = to_json(&EdgeRow::from_network(&net)[0].to_feature().unwrap());
        assert_eq!(f["properties"]["speed_kph"], Value::Null);
        assert_eq!(f["properties"]["travel_time"], Value::Null);
    }

    #[test]
    fn pole_feature_layout() {
        let f = to_json(&PoleRow::from(&snapped("7", "21", 101)).to_feature().unwrap());
        assert_eq!(f["geometry"], json!({"type": "Point", "coordinates": [-73.9999, 40.0001]}));
        let p = f["properties"].as_object().unwrap();
        assert_eq!(p.len(), 4);
        assert_eq!(p["POLE_ID"], "7-21");
        assert_eq!(p["BLOCK"], "7");
        assert_eq!(p["NUMBER"], "21");
        assert_eq!(p["nearest_node_id"], 101);
    }
}

// ── GeoJSON files ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod files {
    use std::path::Path;

    use serde_json::Value;
    use tempfile::TempDir;

    use crate::writer::OutputWriter;
    use crate::{GeoJsonWriter, OutputError, OutputFiles, export};

    use super::helpers::{network, snapped};

    fn tmp() -> TempDir {
        tempfile::tempdir().expect("create temp dir")
    }

    fn read(path: &Path) -> Value {
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn export_writes_three_collections() {
        let dir = tmp();
        let mut w = GeoJsonWriter::new(dir.path(), OutputFiles::default()).unwrap();
        let poles = vec![snapped("1", "1", 101), snapped("1", "2", 102)];
        export(&mut w, &network(), &poles).unwrap();

        let nodes = read(&dir.path().join("road_network_nodes.geojson"));
        let edges = read(&dir.path().join("road_network_edges.geojson"));
        let poles = read(&dir.path().join("meter_poles_snapped.geojson"));
        assert_eq!(nodes["type"], "FeatureCollection");
        assert_eq!(nodes["features"].as_array().unwrap().len(), 2);
        assert_eq!(edges["features"].as_array().unwrap().len(), 2);
        assert_eq!(poles["features"].as_array().unwrap().len(), 2);
        assert_eq!(poles["features"][1]["properties"]["POLE_ID"], "1-2");
        assert_eq!(w.written().len(), 3);
    }

    #[test]
    fn output_directory_is_created() {
        let dir = tmp();
        let out = dir.path().join("OUTPUT_GEOJSON").join("nested");
        let mut w = GeoJsonWriter::new(&out, OutputFiles::default()).unwrap();
        export(&mut w, &network(), &[]).unwrap();
        assert!(out.join("road_network_edges.geojson").is_file());
        assert_eq!(read(&out.join("meter_poles_snapped.geojson"))["features"], serde_json::json!([]));
    }

    #[test]
    fn custom_file_names() {
        let dir = tmp();
        let files = OutputFiles { nodes: "n.json".into(), edges: "e.json".into(), poles: "p.json".into() };
        let mut w = GeoJsonWriter::new(dir.path(), files).unwrap();
        export(&mut w, &network(), &[]).unwrap();
        for name in ["n.json", "e.json", "p.json"] {
            assert!(dir.path().join(name).is_file());
        }
    }

    #[test]
    fn projected_network_is_rejected() {
        let dir = tmp();
        let utm = network().project_to_utm().unwrap();
        let mut w = GeoJsonWriter::new(dir.path(), OutputFiles::default()).unwrap();
        let err = export(&mut w, &utm, &[]);
        assert!(matches!(err, Err(OutputError::NotGeographic(_))));
        assert!(!dir.path().join("road_network_nodes.geojson").exists());
    }

    #[test]
    fn finish_is_idempotent() {
        let dir = tmp();
        let mut w = GeoJsonWriter::new(dir.path(), OutputFiles::default()).unwrap();
        w.finish().unwrap();
        w.finish().unwrap();
        assert!(w.written().is_empty());
    }
}
