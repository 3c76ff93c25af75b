//! Unit tests for ps-pipeline.
//!
//! The network provider is always a stub; nothing here touches the network.

#[cfg(test)]
mod helpers {
    use std::cell::Cell;
    use std::collections::HashMap;
    use std::path::Path;

    use ps_core::GeoPoint;
    use ps_spatial::{NetworkQuery, NetworkSource, OsmData, OsmNode, OsmWay, SpatialResult};

    use crate::PipelineConfig;

    /// Provider returning canned data and counting calls.
    pub struct StubSource {
        pub data:  OsmData,
        pub calls: Cell<usize>,
    }

    impl StubSource {
        pub fn new(data: OsmData) -> Self {
            Self { data, calls: Cell::new(0) }
        }
    }

    impl NetworkSource for StubSource {
        fn describe(&self) -> String {
            "stub".into()
        }

        fn fetch(&self, _query: &NetworkQuery) -> SpatialResult<OsmData> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.data.clone())
        }
    }

    /// A four-way intersection at (40, -74) with ~100 m arms.
    ///
    /// ```text
    ///          4
    ///          |
    ///     3 -- 1 -- 2
    ///          |
    ///          5
    /// ```
    pub fn crossroads() -> OsmData {
        let node = |lat: f64, lon: f64| OsmNode {
            pos:       GeoPoint::new(lat, lon),
            highway:   None,
            reference: None,
        };
        let nodes: HashMap<i64, OsmNode> = [
            (1, node(40.0, -74.0)),
            (2, node(40.0, -73.999)),
            (3, node(40.0, -74.001)),
            (4, node(40.001, -74.0)),
            (5, node(39.999, -74.0)),
        ]
        .into_iter()
        .collect();
        OsmData {
            nodes,
            ways: vec![
                way(100, &[3, 1, 2], &[("highway", "residential"), ("maxspeed", "25 mph")]),
                way(200, &[5, 1, 4], &[("highway", "residential"), ("name", "Cross Street")]),
            ],
        }
    }

    pub fn way(id: i64, refs: &[i64], tags: &[(&str, &str)]) -> OsmWay {
        OsmWay {
            id,
            refs: refs.to_vec(),
            tags: tags.iter().map(|&(k, v)| (k.to_owned(), v.to_owned())).collect(),
        }
    }

    pub fn write(dir: &Path, name: &str, body: &str) {
        std::fs::write(dir.join(name), body).expect("write fixture");
    }

    /// Two pole files: one pole near node 2, one near node 4, one bad row.
    pub fn write_poles(dir: &Path) {
        write(dir, "poleblock1.csv", "BLOCK ,NUMBER,POLE_LOC\n12,1,\"40.0001, -73.9991\"\n12,2,n/a\n");
        write(dir, "poleblock2.csv", "BLOCK,NUMBER,POLE_LOC\n13,7,\"40.0009, -74.0001\"\n");
    }

    pub fn config(input: &Path, output: &Path) -> PipelineConfig {
        let mut c = PipelineConfig::default();
        c.input.dir = input.to_path_buf();
        c.output.dir = output.to_path_buf();
        c
    }
}

// ── Configuration ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod config {
    use std::path::PathBuf;

    use ps_spatial::{DEFAULT_OVERPASS_URL, NetworkType};

    use crate::{PipelineConfig, PipelineError};

    #[test]
    fn defaults_match_standard_run() {
        let c = PipelineConfig::default();
        assert_eq!(c.input.dir, PathBuf::from("."));
        assert_eq!(c.expected_files().len(), 11);
        assert_eq!(c.expected_files()[10], "poleblock11.csv");
        assert_eq!(c.network.radius_m, 2_000.0);
        assert_eq!(c.network.network_type, NetworkType::Drive);
        assert_eq!(c.network.overpass_url, DEFAULT_OVERPASS_URL);
        assert_eq!(c.output.dir, PathBuf::from("OUTPUT_GEOJSON"));
        assert_eq!(c.output.edges_file, "road_network_edges.geojson");
        assert!(c.validate().is_ok());
    }

    #[test]
    fn empty_document_is_default() {
        assert_eq!(PipelineConfig::from_toml_str("").unwrap(), PipelineConfig::default());
    }

    #[test]
    fn partial_document_keeps_other_defaults() {
        let c = PipelineConfig::from_toml_str(
            r#"
            [input]
            dir = "data"

            [network]
            radius_m = 500.0
            network_type = "drive_service"

            [network.speeds]
            fallback_kph = 20.0
            highway_kph = { residential = 30.0 }
            "#,
        )
        .unwrap();
        assert_eq!(c.input.dir, PathBuf::from("data"));
        assert_eq!(c.input.file_count, 11);
        assert_eq!(c.network.radius_m, 500.0);
        assert_eq!(c.network.network_type, NetworkType::DriveService);
        assert_eq!(c.network.timeout_secs, 180);
        assert_eq!(c.network.speeds.fallback_kph, Some(20.0));
        assert_eq!(c.network.speeds.highway_kph.get("residential"), Some(&30.0));
        assert_eq!(c.network.speeds.highway_kph.len(), 1);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = PipelineConfig::from_toml_str("[network]\nradius = 10.0\n");
        assert!(matches!(err, Err(PipelineError::Config(_))));
    }

    #[test]
    fn invalid_values_are_rejected() {
        for doc in [
            "[network]\nradius_m = 0.0\n",
            "[network]\nradius_m = -5.0\n",
            "[network]\ntimeout_secs = 0\n",
            "[input]\nfile_count = 0\n",
            "[network.speeds]\nfallback_kph = 0.0\n",
            "[network.speeds]\nhighway_kph = { primary = -1.0 }\n",
        ] {
            let err = PipelineConfig::from_toml_str(doc);
            assert!(matches!(err, Err(PipelineError::Config(_))), "accepted {doc:?}");
        }
    }

    #[test]
    fn load_missing_file_is_config_error() {
        let err = PipelineConfig::load(std::path::Path::new("/nonexistent/polesnap.toml"));
        assert!(matches!(err, Err(PipelineError::Config(_))));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("polesnap.toml");
        std::fs::write(&path, "[output]\ndir = \"out\"\n").unwrap();
        let c = PipelineConfig::load(&path).unwrap();
        assert_eq!(c.output.dir, PathBuf::from("out"));
    }
}

// ── Stages ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod stages {
    use ps_core::Crs;
    use ps_ingest::IngestError;
    use ps_spatial::{OsmData, SpatialError};
    use tempfile::TempDir;

    use crate::{
        PipelineConfig, PipelineError, fetch_projected_network, load_poles, make_source, snap_poles,
    };

    use super::helpers::{StubSource, config, crossroads, way, write, write_poles};

    fn tmp() -> TempDir {
        tempfile::tempdir().expect("create temp dir")
    }

    #[test]
    fn load_poles_reports_files_and_drops() {
        let dir = tmp();
        write_poles(dir.path());
        let loaded = load_poles(&config(dir.path(), dir.path())).unwrap();
        assert_eq!(loaded.files_loaded, vec!["poleblock1.csv", "poleblock2.csv"]);
        assert_eq!(loaded.files_skipped.len(), 9);
        assert_eq!(loaded.rows_read, 3);
        assert_eq!(loaded.rows_dropped, 1);
        assert_eq!(loaded.poles.len(), 2);
        assert_eq!(loaded.poles[0].id, "12-1");
        assert!((loaded.center.lat - 40.0005).abs() < 1e-9);
        assert!((loaded.center.lon - -73.9996).abs() < 1e-9);
    }

    #[test]
    fn no_valid_rows() {
        let dir = tmp();
        write(dir.path(), "poleblock1.csv", "BLOCK,NUMBER,POLE_LOC\n1,1,unknown\n");
        let err = load_poles(&config(dir.path(), dir.path()));
        assert!(matches!(err, Err(PipelineError::NoValidPoles { total: 1, dropped: 1 })));
    }

    #[test]
    fn network_is_projected_with_speeds() {
        let stub = StubSource::new(crossroads());
        let c = PipelineConfig::default();
        let center = ps_core::GeoPoint::new(40.0, -74.0);
        let net = fetch_projected_network(&c, &stub, center).unwrap();

        assert_eq!(stub.calls.get(), 1);
        assert!(matches!(net.crs, Crs::Utm(z) if z.number() == 18 && z.is_north()));
        assert_eq!(net.node_count(), 5);
        assert_eq!(net.edge_count(), 8);

        // Every edge inherits the residential class mean of 25 mph.
        let speeds = net.edge_speed_kph.as_ref().unwrap();
        assert!(speeds.iter().all(|&s| (s - 25.0 * 1.609_344).abs() < 1e-9));
        let times = net.edge_travel_time_s.as_ref().unwrap();
        assert!(times.iter().all(|&t| t > 0.0));
    }

    #[test]
    fn default_speeds_average_class_means_for_unknown_class() {
        let mut data = crossroads();
        data.ways = vec![
            way(100, &[3, 1], &[("highway", "residential"), ("maxspeed", "30")]),
            way(101, &[5, 1], &[("highway", "residential"), ("maxspeed", "30")]),
            way(102, &[1, 2], &[("highway", "secondary"), ("maxspeed", "60")]),
            way(103, &[1, 4], &[("highway", "tertiary")]),
        ];
        let stub = StubSource::new(data);
        let center = ps_core::GeoPoint::new(40.0, -74.0);
        let net = fetch_projected_network(&PipelineConfig::default(), &stub, center).unwrap();

        let speeds = net.edge_speed_kph.as_ref().unwrap();
        let tertiary: Vec<f64> = net
            .edge_tags
            .iter()
            .zip(speeds)
            .filter(|(t, _)| t.primary_highway() == Some("tertiary"))
            .map(|(_, &s)| s)
            .collect();
        // Four residential edges at 30 and two secondary at 60: the class
        // means average to 45, not the per-edge 40.
        assert_eq!(tertiary, vec![45.0, 45.0]);
    }

    #[test]
    fn empty_provider_response_is_network_error() {
        let stub = StubSource::new(OsmData::default());
        let center = ps_core::GeoPoint::new(40.0, -74.0);
        let err = fetch_projected_network(&PipelineConfig::default(), &stub, center);
        assert!(matches!(err, Err(PipelineError::Network(SpatialError::EmptyNetwork(_)))));
    }

    #[test]
    fn poles_snap_to_nearest_node() {
        let dir = tmp();
        write_poles(dir.path());
        let c = config(dir.path(), dir.path());
        let loaded = load_poles(&c).unwrap();
        let stub = StubSource::new(crossroads());
        let net = fetch_projected_network(&c, &stub, loaded.center).unwrap();

        let snapped = snap_poles(&net, loaded.poles).unwrap();
        let ids: Vec<i64> = snapped.iter().map(|s| s.nearest_node_id).collect();
        assert_eq!(ids, vec![2, 4]);
        // 0.0001° north and 0.0001° east of node 2: about 14 m.
        assert!((10.0..20.0).contains(&snapped[0].snap_distance_m));
    }

    #[test]
    fn missing_input_never_fetches() {
        let dir = tmp();
        let stub = StubSource::new(crossroads());
        let c = config(dir.path(), &dir.path().join("out"));
        let err = crate::run(&c, &stub);
        assert!(matches!(err, Err(PipelineError::Ingest(IngestError::NoFilesLoaded { .. }))));
        assert_eq!(stub.calls.get(), 0);
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn default_source_is_overpass() {
        let source = make_source(&PipelineConfig::default()).unwrap();
        assert!(source.describe().contains("Overpass"));
    }

    #[cfg(not(feature = "osm"))]
    #[test]
    fn pbf_source_requires_feature() {
        let mut c = PipelineConfig::default();
        c.network.pbf_path = Some("region.osm.pbf".into());
        assert!(matches!(make_source(&c), Err(PipelineError::Config(_))));
    }
}

// ── End to end ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod end_to_end {
    use serde_json::Value;

    use crate::run;

    use super::helpers::{StubSource, config, crossroads, write_poles};

    fn read(path: &std::path::Path) -> Value {
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn full_run_writes_geojson() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let out_dir = output.path().join("OUTPUT_GEOJSON");
        write_poles(input.path());

        let stub = StubSource::new(crossroads());
        let summary = run(&config(input.path(), &out_dir), &stub).unwrap();

        assert_eq!(summary.files_loaded, 2);
        assert_eq!(summary.files_skipped.len(), 9);
        assert_eq!(summary.rows_read, 3);
        assert_eq!(summary.rows_dropped, 1);
        assert_eq!(summary.poles_snapped, 2);
        assert_eq!((summary.nodes, summary.edges), (5, 8));
        assert_eq!(summary.outputs.len(), 3);

        let nodes = read(&out_dir.join("road_network_nodes.geojson"));
        let features = nodes["features"].as_array().unwrap();
        assert_eq!(features.len(), 5);
        let centre = features
            .iter()
            .find(|f| f["properties"]["osmid"] == 1)
            .unwrap();
        assert_eq!(centre["properties"]["street_count"], 4);
        // Back in WGS84 after the UTM round trip.
        let x = centre["properties"]["x"].as_f64().unwrap();
        let y = centre["properties"]["y"].as_f64().unwrap();
        assert!((x - -74.0).abs() < 1e-8 && (y - 40.0).abs() < 1e-8);

        let edges = read(&out_dir.join("road_network_edges.geojson"));
        let edge_features = edges["features"].as_array().unwrap();
        assert_eq!(edge_features.len(), 8);
        assert!(edge_features.iter().all(|f| f["properties"]["travel_time"].is_f64()));
        assert!(edge_features.iter().any(|f| f["properties"]["name"] == "Cross Street"));

        let poles = read(&out_dir.join("meter_poles_snapped.geojson"));
        let props: Vec<&Value> = poles["features"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| &f["properties"])
            .collect();
        assert_eq!(props[0]["POLE_ID"], "12-1");
        assert_eq!(props[0]["nearest_node_id"], 2);
        assert_eq!(props[1]["POLE_ID"], "13-7");
        assert_eq!(props[1]["nearest_node_id"], 4);
    }
}
