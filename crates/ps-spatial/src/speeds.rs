//! Edge speed imputation and travel times.
//!
//! Every edge ends up with a `speed_kph` chosen by the first rule that
//! applies:
//!
//! | Rule | Source                                                       |
//! |------|--------------------------------------------------------------|
//! | 1    | the edge's own cleaned `maxspeed`                            |
//! | 2    | [`SpeedSettings::highway_kph`] for the class                 |
//! | 3    | mean cleaned `maxspeed` of edges with the same highway class |
//! | 4    | [`SpeedSettings::fallback_kph`]                              |
//! | 5    | mean of the per-class speeds from rules 2 and 3              |
//!
//! With the default (empty) settings only rules 1, 3 and 5 apply, so every
//! imputed speed comes from `maxspeed` data observed in the network.

use std::collections::HashMap;

use log::debug;
use serde::Deserialize;

use crate::{RoadNetwork, SpatialError, SpatialResult};

const MPH_TO_KPH: f64 = 1.609_344;
const KNOTS_TO_KPH: f64 = 1.852;

/// Caller-supplied speeds for edges without their own `maxspeed`.
///
/// Both are empty by default.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SpeedSettings {
    /// km/h per `highway` value; overrides the observed class mean.
    pub highway_kph:  HashMap<String, f64>,
    /// km/h for classes with neither a table entry nor observed speeds.
    pub fallback_kph: Option<f64>,
}

/// Parse an OSM `maxspeed` value into km/h.
///
/// Accepts `"50"`, `"50 km/h"`, `"30 mph"`, `"10 knots"`, and `;`-separated
/// lists (averaged).  Non-numeric values such as `"signals"` or
/// `"RU:urban"` return `None`, as does a list with any such entry.
pub fn clean_maxspeed(value: &str) -> Option<f64> {
    let speeds = value
        .split(';')
        .map(clean_single)
        .collect::<Option<Vec<f64>>>()?;
    mean(&speeds)
}

fn clean_single(value: &str) -> Option<f64> {
    let v = value.trim().to_ascii_lowercase();
    let (number, factor) = [
        ("km/h", 1.0),
        ("kmh", 1.0),
        ("kph", 1.0),
        ("mph", MPH_TO_KPH),
        ("knots", KNOTS_TO_KPH),
    ]
    .iter()
    .find_map(|&(unit, f)| v.strip_suffix(unit).map(|n| (n.trim_end(), f)))
    .unwrap_or((v.as_str(), 1.0));

    if number.is_empty() || !number.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    let kph = number.replace(',', ".").parse::<f64>().ok()? * factor;
    (kph.is_finite() && kph > 0.0).then_some(kph)
}

fn mean(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
}

/// Fill `net.edge_speed_kph` for every edge.
///
/// # Errors
///
/// [`SpatialError::NoSpeeds`] if some edge matches none of the rules, which
/// only happens when no edge has a usable `maxspeed` and the settings have
/// neither a table entry nor a fallback for its class.
pub fn add_edge_speeds(net: &mut RoadNetwork, settings: &SpeedSettings) -> SpatialResult<()> {
    let observed: Vec<Option<f64>> = net
        .edge_tags
        .iter()
        .map(|t| {
            let speeds = t
                .maxspeed
                .iter()
                .map(|m| clean_maxspeed(m))
                .collect::<Option<Vec<f64>>>()?;
            mean(&speeds)
        })
        .collect();

    let mut observed_by_class: HashMap<&str, Vec<f64>> = HashMap::new();
    for (tags, speed) in net.edge_tags.iter().zip(&observed) {
        if let Some(kph) = *speed {
            let class = tags.primary_highway().unwrap_or("");
            observed_by_class.entry(class).or_default().push(kph);
        }
    }

    // Table entries win over observed means; classes present in neither
    // stay unresolved until the fallback.
    let mut class_kph: HashMap<&str, f64> = settings
        .highway_kph
        .iter()
        .map(|(class, &kph)| (class.as_str(), kph))
        .collect();
    for (&class, speeds) in &observed_by_class {
        if let Some(kph) = mean(speeds) {
            class_kph.entry(class).or_insert(kph);
        }
    }
    let class_values: Vec<f64> = class_kph.values().copied().collect();
    let last_resort = settings.fallback_kph.or_else(|| mean(&class_values));

    let mut speeds = Vec::with_capacity(observed.len());
    for (tags, speed) in net.edge_tags.iter().zip(&observed) {
        let class = tags.primary_highway().unwrap_or("");
        let kph = speed
            .or_else(|| class_kph.get(class).copied())
            .or(last_resort)
            .ok_or_else(|| SpatialError::NoSpeeds(class.to_owned()))?;
        speeds.push(kph);
    }

    debug!(
        "edge speeds: {} of {} from maxspeed, {} classes resolved",
        observed.iter().flatten().count(),
        speeds.len(),
        class_kph.len()
    );
    net.edge_speed_kph = Some(speeds);
    Ok(())
}

/// Fill `net.edge_travel_time_s` from lengths and speeds.
///
/// # Errors
///
/// [`SpatialError::SpeedsMissing`] if [`add_edge_speeds`] has not run.
pub fn add_edge_travel_times(net: &mut RoadNetwork) -> SpatialResult<()> {
    let speeds = net.edge_speed_kph.as_ref().ok_or(SpatialError::SpeedsMissing)?;
    let times = net
        .edge_length_m
        .iter()
        .zip(speeds)
        .map(|(&len, &kph)| len / (kph * 1000.0 / 3600.0))
        .collect();
    net.edge_travel_time_s = Some(times);
    Ok(())
}
