//! Flattened export records.
//!
//! Rows are built from a WGS84 [`RoadNetwork`] and the snapped poles; all
//! node references are OSM ids, never dense `NodeId`s.

use std::collections::BTreeMap;

use geo::LineString;

use ps_core::GeoPoint;
use ps_ingest::SnappedPole;
use ps_spatial::RoadNetwork;

/// One road-network node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRow {
    pub osmid:        i64,
    /// Longitude.
    pub x:            f64,
    /// Latitude.
    pub y:            f64,
    pub street_count: u32,
    pub highway:      Option<String>,
    /// OSM `ref` tag.
    pub reference:    Option<String>,
}

/// One directed road-network edge.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeRow {
    /// OSM id of the source node.
    pub u:           i64,
    /// OSM id of the target node.
    pub v:           i64,
    pub key:         u32,
    /// Way ids the edge was merged from.
    pub osmid:       Vec<i64>,
    pub name:        Vec<String>,
    pub highway:     Vec<String>,
    pub oneway:      bool,
    pub reversed:    bool,
    /// Metres.
    pub length:      f64,
    pub maxspeed:    Vec<String>,
    /// Remaining way tags by key (`lanes`, `bridge`, …).
    pub other:       BTreeMap<String, Vec<String>>,
    pub speed_kph:   Option<f64>,
    /// Seconds.
    pub travel_time: Option<f64>,
    pub geometry:    LineString<f64>,
}

/// One snapped pole.
#[derive(Debug, Clone, PartialEq)]
pub struct PoleRow {
    pub pole_id:         String,
    pub block:           String,
    pub number:          String,
    pub nearest_node_id: i64,
    pub location:        GeoPoint,
}

impl NodeRow {
    pub fn from_network(net: &RoadNetwork) -> Vec<NodeRow> {
        (0..net.node_count())
            .map(|i| NodeRow {
                osmid:        net.node_osm_id[i],
                x:            net.node_coord[i].x,
                y:            net.node_coord[i].y,
                street_count: net.node_street_count[i],
                highway:      net.node_highway[i].clone(),
                reference:    net.node_ref[i].clone(),
            })
            .collect()
    }
}

impl EdgeRow {
    pub fn from_network(net: &RoadNetwork) -> Vec<EdgeRow> {
        (0..net.edge_count())
            .map(|e| {
                let tags = &net.edge_tags[e];
                EdgeRow {
                    u:           net.node_osm_id[net.edge_from[e].index()],
                    v:           net.node_osm_id[net.edge_to[e].index()],
                    key:         net.edge_key[e],
                    osmid:       tags.way_ids.clone(),
                    name:        tags.name.clone(),
                    highway:     tags.highway.clone(),
                    oneway:      tags.oneway,
                    reversed:    tags.reversed,
                    length:      net.edge_length_m[e],
                    maxspeed:    tags.maxspeed.clone(),
                    other:       tags.other.clone(),
                    speed_kph:   net.edge_speed_kph.as_ref().map(|s| s[e]),
                    travel_time: net.edge_travel_time_s.as_ref().map(|t| t[e]),
                    geometry:    net.edge_geometry[e].clone(),
                }
            })
            .collect()
    }
}

impl From<&SnappedPole> for PoleRow {
    fn from(s: &SnappedPole) -> Self {
        PoleRow {
            pole_id:         s.pole.id.clone(),
            block:           s.pole.block.clone(),
            number:          s.pole.number.clone(),
            nearest_node_id: s.nearest_node_id,
            location:        s.pole.location,
        }
    }
}
