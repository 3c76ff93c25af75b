//! Overpass API provider.
//!
//! # Query
//!
//! ```text
//! [out:json][timeout:180];
//! (way["highway"]…filter…(south,west,north,east);>;);
//! out;
//! ```
//!
//! `>;` recurses from the ways to their nodes, so one response carries
//! everything graph construction needs.
//!
//! # Timeouts
//!
//! The configured timeout is sent to the server as `[timeout:N]`.  The HTTP
//! client waits [`CLIENT_TIMEOUT_MARGIN`] longer, so a server-side timeout
//! arrives as a `remark` ([`SpatialError::Fetch`]); only a hung connection
//! fails with [`SpatialError::Http`].

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use log::{debug, info};
use reqwest::blocking::Client;
use serde::Deserialize;

use ps_core::GeoPoint;

use crate::source::{NetworkQuery, NetworkSource, OsmData, OsmNode, OsmWay};
use crate::{SpatialError, SpatialResult};

/// Public Overpass endpoint used when none is configured.
pub const DEFAULT_OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";

/// Extra time the HTTP client allows beyond the server-side timeout.
pub const CLIENT_TIMEOUT_MARGIN: Duration = Duration::from_secs(15);

// ── Source ────────────────────────────────────────────────────────────────────

/// Blocking Overpass client.
pub struct OverpassSource {
    client:  Client,
    url:     String,
    timeout: Duration,
}

impl OverpassSource {
    /// `timeout` is the server-side query limit.
    pub fn new(url: impl Into<String>, timeout: Duration) -> SpatialResult<Self> {
        let client = Client::builder()
            .timeout(Self::client_timeout_for(timeout))
            .user_agent(concat!("polesnap/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, url: url.into(), timeout })
    }

    fn client_timeout_for(timeout: Duration) -> Duration {
        timeout + CLIENT_TIMEOUT_MARGIN
    }

    /// How long the HTTP client waits for a response.
    pub fn client_timeout(&self) -> Duration {
        Self::client_timeout_for(self.timeout)
    }

    /// The `[timeout:N]` sent with each query.
    pub fn server_timeout(&self) -> Duration {
        self.timeout
    }
}

impl NetworkSource for OverpassSource {
    fn describe(&self) -> String {
        format!("Overpass API at {}", self.url)
    }

    fn fetch(&self, query: &NetworkQuery) -> SpatialResult<OsmData> {
        let ql = build_query(query, self.timeout.as_secs());
        debug!("overpass query: {ql}");
        info!(
            "downloading {:?} network within {} m of {}",
            query.network_type, query.radius_m, query.center
        );

        let body = self
            .client
            .post(self.url.as_str())
            .form(&[("data", ql.as_str())])
            .send()?
            .error_for_status()?
            .text()?;
        debug!("overpass response: {} bytes", body.len());

        parse_response(&body)
    }
}

// ── Query & response ──────────────────────────────────────────────────────────

/// Render the Overpass QL for `query`.
pub fn build_query(query: &NetworkQuery, timeout_secs: u64) -> String {
    let b = query.bbox();
    format!(
        "[out:json][timeout:{timeout_secs}];(way{filter}({s:.7},{w:.7},{n:.7},{e:.7});>;);out;",
        filter = query.network_type.overpass_filter(),
        s = b.south,
        w = b.west,
        n = b.north,
        e = b.east,
    )
}

#[derive(Deserialize)]
struct Response {
    #[serde(default)]
    elements: Vec<Element>,
    remark:   Option<String>,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum Element {
    Node {
        id:  i64,
        lat: f64,
        lon: f64,
        #[serde(default)]
        tags: BTreeMap<String, String>,
    },
    Way {
        id: i64,
        #[serde(default)]
        nodes: Vec<i64>,
        #[serde(default)]
        tags: BTreeMap<String, String>,
    },
    #[serde(other)]
    Other,
}

/// Decode an Overpass JSON body into [`OsmData`].
///
/// A `remark` reporting a runtime error (server-side timeout, out of
/// memory) is turned into [`SpatialError::Fetch`] even though the HTTP
/// status was 200.
pub fn parse_response(body: &str) -> SpatialResult<OsmData> {
    let response: Response = serde_json::from_str(body)?;
    if let Some(remark) = response.remark.filter(|r| r.contains("error")) {
        return Err(SpatialError::Fetch(remark));
    }

    let mut nodes = HashMap::new();
    let mut ways = Vec::new();
    for element in response.elements {
        match element {
            Element::Node { id, lat, lon, mut tags } => {
                let node = OsmNode {
                    pos:       GeoPoint::new(lat, lon),
                    highway:   tags.remove("highway"),
                    reference: tags.remove("ref"),
                };
                nodes.insert(id, node);
            }
            Element::Way { id, nodes: refs, tags } => ways.push(OsmWay { id, refs, tags }),
            Element::Other => {}
        }
    }
    Ok(OsmData { nodes, ways })
}
