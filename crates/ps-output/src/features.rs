//! Row → GeoJSON feature conversion.
//!
//! Property names follow the usual OSM graph export layout so the files
//! load directly into GIS tools that expect it.  Multi-valued tags are a
//! plain value when there is one, an array when there are several, and
//! `null` when absent.

use geo::Point;
use geojson::{Feature, FeatureCollection, Geometry};
use serde_json::{Value as JsonValue, json};

use ps_spatial::WAY_ATTRIBUTE_TAGS;

use crate::{EdgeRow, NodeRow, OutputError, OutputResult, PoleRow};

fn one_or_many<T: Clone + Into<JsonValue>>(values: &[T]) -> JsonValue {
    match values {
        [] => JsonValue::Null,
        [one] => one.clone().into(),
        many => JsonValue::Array(many.iter().cloned().map(Into::into).collect()),
    }
}

fn feature(value: JsonValue) -> OutputResult<Feature> {
    serde_json::from_value::<Feature>(value).map_err(|e| OutputError::GeoJson(e.to_string()))
}

impl NodeRow {
    pub fn to_feature(&self) -> OutputResult<Feature> {
        let point = Point::new(self.x, self.y);
        feature(json!({
            "type": "Feature",
            "geometry": Geometry::new((&point).into()),
            "properties": {
                "osmid": self.osmid,
                "y": self.y,
                "x": self.x,
                "lat": self.y,
                "lon": self.x,
                "street_count": self.street_count,
                "highway": self.highway,
                "ref": self.reference,
            }
        }))
    }
}

impl EdgeRow {
    pub fn to_feature(&self) -> OutputResult<Feature> {
        let mut properties = json!({
            "u": self.u,
            "v": self.v,
            "key": self.key,
            "osmid": one_or_many(&self.osmid),
            "name": one_or_many(&self.name),
            "highway": one_or_many(&self.highway),
            "oneway": self.oneway,
            "reversed": self.reversed,
            "length": self.length,
            "maxspeed": one_or_many(&self.maxspeed),
            "speed_kph": self.speed_kph,
            "travel_time": self.travel_time,
        });
        if let Some(map) = properties.as_object_mut() {
            for &key in WAY_ATTRIBUTE_TAGS {
                let values = self.other.get(key).map(Vec::as_slice).unwrap_or_default();
                map.insert(key.to_owned(), one_or_many(values));
            }
        }
        feature(json!({
            "type": "Feature",
            "geometry": Geometry::new((&self.geometry).into()),
            "properties": properties,
        }))
    }
}

impl PoleRow {
    pub fn to_feature(&self) -> OutputResult<Feature> {
        let point = Point::from(self.location);
        feature(json!({
            "type": "Feature",
            "geometry": Geometry::new((&point).into()),
            "properties": {
                "POLE_ID": self.pole_id,
                "BLOCK": self.block,
                "NUMBER": self.number,
                "nearest_node_id": self.nearest_node_id,
            }
        }))
    }
}

/// Wrap features in a collection without a bbox.
pub fn collection(features: Vec<Feature>) -> FeatureCollection {
    FeatureCollection { features, bbox: None, foreign_members: None }
}
