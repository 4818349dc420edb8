use std::result;

use enum_iterator::Sequence;
use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{remap::ButtonMap, store::Store, transform::ResponseCurve};

/// Store key the whole configuration persists under.
pub const CONFIG_KEY: &str = "config";

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type Result<T> = result::Result<T, Error>;

/// Every tunable of the pipeline. Serialized as JSON both for the store
/// and for file interchange; every level fills missing fields from its
/// defaults, so a partial or older document merges over them cleanly.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RootConfig {
    pub sticks: StickPair,
    pub triggers: TriggerPair,
    pub vibration: VibrationConfig,
    pub button_mapping: ButtonMap,
}

impl RootConfig {
    /// Loads from the store, falling back to defaults when the key is
    /// absent or its contents no longer parse.
    pub fn load(store: &impl Store) -> Self {
        match store.get(CONFIG_KEY) {
            Some(json) => match Self::from_json(&json) {
                Ok(config) => config,
                Err(e) => {
                    warn!("Failed to parse stored configuration, using defaults: {}", e);
                    Self::default()
                }
            },
            None => Self::default(),
        }
    }

    /// Parses an interchange document, merging it over defaults and
    /// clamping every numeric leaf to its documented range.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut config: Self = serde_json::from_str(json)?;
        config.sanitize();
        Ok(config)
    }

    #[must_use]
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).expect("configuration serialization cannot fail")
    }

    pub fn sanitize(&mut self) {
        self.sticks.left.sanitize();
        self.sticks.right.sanitize();
        self.triggers.lt.sanitize();
        self.triggers.rt.sanitize();
        self.vibration.sanitize();
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Sequence)]
pub enum StickSide {
    Left,
    Right,
}

impl StickSide {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Sequence)]
pub enum TriggerSide {
    Left,
    Right,
}

impl TriggerSide {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Left => "lt",
            Self::Right => "rt",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StickPair {
    pub left: StickConfig,
    pub right: StickConfig,
}

impl StickPair {
    #[must_use]
    pub const fn side(&self, side: StickSide) -> &StickConfig {
        match side {
            StickSide::Left => &self.left,
            StickSide::Right => &self.right,
        }
    }

    pub fn side_mut(&mut self, side: StickSide) -> &mut StickConfig {
        match side {
            StickSide::Left => &mut self.left,
            StickSide::Right => &mut self.right,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerPair {
    pub lt: TriggerConfig,
    pub rt: TriggerConfig,
}

impl TriggerPair {
    #[must_use]
    pub const fn side(&self, side: TriggerSide) -> &TriggerConfig {
        match side {
            TriggerSide::Left => &self.lt,
            TriggerSide::Right => &self.rt,
        }
    }

    pub fn side_mut(&mut self, side: TriggerSide) -> &mut TriggerConfig {
        match side {
            TriggerSide::Left => &mut self.lt,
            TriggerSide::Right => &mut self.rt,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StickConfig {
    pub deadzone: f32,
    pub sensitivity: f32,
    pub curve: ResponseCurve,
    pub drift_x: f32,
    pub drift_y: f32,
}

impl StickConfig {
    pub fn set_deadzone(&mut self, pct: f32) {
        self.deadzone = clamped(pct, 0.0, 100.0);
    }

    pub fn set_sensitivity(&mut self, pct: f32) {
        self.sensitivity = clamped(pct, 0.0, 200.0);
    }

    pub fn set_drift(&mut self, x: f32, y: f32) {
        self.drift_x = clamped(x, -1.0, 1.0);
        self.drift_y = clamped(y, -1.0, 1.0);
    }

    fn sanitize(&mut self) {
        self.set_deadzone(self.deadzone);
        self.set_sensitivity(self.sensitivity);
        self.set_drift(self.drift_x, self.drift_y);
    }
}

impl Default for StickConfig {
    fn default() -> Self {
        Self {
            deadzone: 10.0,
            sensitivity: 100.0,
            curve: ResponseCurve::Linear,
            drift_x: 0.0,
            drift_y: 0.0,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    pub deadzone: f32,
    pub sensitivity: f32,
}

impl TriggerConfig {
    pub fn set_deadzone(&mut self, pct: f32) {
        self.deadzone = clamped(pct, 0.0, 100.0);
    }

    pub fn set_sensitivity(&mut self, pct: f32) {
        self.sensitivity = clamped(pct, 0.0, 200.0);
    }

    fn sanitize(&mut self) {
        self.set_deadzone(self.deadzone);
        self.set_sensitivity(self.sensitivity);
    }
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            deadzone: 5.0,
            sensitivity: 100.0,
        }
    }
}

/// Default intensities for the manual rumble test. Never applied on its
/// own; the test command reads it when no explicit levels are given.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VibrationConfig {
    pub left: f32,
    pub right: f32,
}

impl VibrationConfig {
    pub fn set_levels(&mut self, left: f32, right: f32) {
        self.left = clamped(left, 0.0, 100.0);
        self.right = clamped(right, 0.0, 100.0);
    }

    fn sanitize(&mut self) {
        self.set_levels(self.left, self.right);
    }
}

impl Default for VibrationConfig {
    fn default() -> Self {
        Self {
            left: 50.0,
            right: 50.0,
        }
    }
}

fn clamped(value: f32, low: f32, high: f32) -> f32 {
    if value.is_nan() {
        low
    } else {
        value.clamp(low, high)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        store::{MemoryStore, Store},
        transform::ResponseCurve,
    };

    use super::{RootConfig, CONFIG_KEY};

    #[test]
    fn defaults_match_documented_values() {
        let config = RootConfig::default();

        assert_eq!(config.sticks.left.deadzone, 10.0);
        assert_eq!(config.sticks.right.sensitivity, 100.0);
        assert_eq!(config.sticks.left.curve, ResponseCurve::Linear);
        assert_eq!(config.sticks.right.drift_x, 0.0);
        assert_eq!(config.triggers.lt.deadzone, 5.0);
        assert_eq!(config.triggers.rt.sensitivity, 100.0);
        assert_eq!(config.vibration.left, 50.0);
        assert_eq!(config.vibration.right, 50.0);
        assert!(config.button_mapping.is_identity());
    }

    #[test]
    fn missing_leaves_fall_back_to_defaults() {
        let config = RootConfig::from_json(r#"{"sticks":{"left":{"deadzone":25}}}"#).unwrap();

        assert_eq!(config.sticks.left.deadzone, 25.0);
        assert_eq!(config.sticks.left.sensitivity, 100.0);
        assert_eq!(config.sticks.left.curve, ResponseCurve::Linear);
        assert_eq!(config.sticks.right, RootConfig::default().sticks.right);
        assert_eq!(config.triggers, RootConfig::default().triggers);
        assert!(config.button_mapping.is_identity());
    }

    #[test]
    fn extra_fields_are_tolerated() {
        let config = RootConfig::from_json(
            r#"{"theme":"dark","sticks":{"left":{"deadzone":15,"color":"red"}}}"#,
        )
        .unwrap();

        assert_eq!(config.sticks.left.deadzone, 15.0);
    }

    #[test]
    fn interchange_round_trips() {
        let mut config = RootConfig::default();
        config.sticks.left.set_deadzone(25.0);
        config.sticks.right.curve = ResponseCurve::Relaxed;
        config.triggers.rt.set_sensitivity(150.0);
        config.button_mapping.set(0, 2);
        config.button_mapping.set(5, 1);

        let parsed = RootConfig::from_json(&config.to_json_pretty()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn mapping_serializes_with_camel_case_key() {
        let mut config = RootConfig::default();
        config.button_mapping.set(0, 2);

        let json = config.to_json_pretty();
        assert!(json.contains("\"buttonMapping\""), "missing key in {json}");
        assert!(json.contains("\"driftX\""), "missing key in {json}");
    }

    #[test]
    fn invalid_documents_are_rejected() {
        assert!(RootConfig::from_json("definitely not json").is_err());
        assert!(RootConfig::from_json(r#"{"sticks": 42}"#).is_err());
        assert!(RootConfig::from_json(r#"{"sticks":{"left":{"curve":"bendy"}}}"#).is_err());
    }

    #[test]
    fn out_of_range_leaves_are_clamped_on_parse() {
        let config = RootConfig::from_json(
            r#"{
                "sticks": {"left": {"deadzone": 250, "sensitivity": -5, "driftX": 3}},
                "triggers": {"lt": {"deadzone": -1}},
                "vibration": {"left": 400}
            }"#,
        )
        .unwrap();

        assert_eq!(config.sticks.left.deadzone, 100.0);
        assert_eq!(config.sticks.left.sensitivity, 0.0);
        assert_eq!(config.sticks.left.drift_x, 1.0);
        assert_eq!(config.triggers.lt.deadzone, 0.0);
        assert_eq!(config.vibration.left, 100.0);
    }

    #[test]
    fn setters_clamp_to_bounds() {
        let mut config = RootConfig::default();

        config.sticks.left.set_deadzone(-3.0);
        assert_eq!(config.sticks.left.deadzone, 0.0);

        config.sticks.left.set_sensitivity(1000.0);
        assert_eq!(config.sticks.left.sensitivity, 200.0);

        config.sticks.left.set_drift(2.0, f32::NAN);
        assert_eq!(config.sticks.left.drift_x, 1.0);
        assert_eq!(config.sticks.left.drift_y, -1.0);

        config.vibration.set_levels(150.0, -20.0);
        assert_eq!((config.vibration.left, config.vibration.right), (100.0, 0.0));
    }

    #[test]
    fn load_recovers_from_missing_or_garbage_state() {
        let store = MemoryStore::new();
        assert_eq!(RootConfig::load(&store), RootConfig::default());

        store.set(CONFIG_KEY, "{ corrupted").unwrap();
        assert_eq!(RootConfig::load(&store), RootConfig::default());

        let mut config = RootConfig::default();
        config.sticks.left.set_deadzone(30.0);
        store.set(CONFIG_KEY, &config.to_json_pretty()).unwrap();
        assert_eq!(RootConfig::load(&store), config);
    }

    #[test]
    fn curves_serialize_lowercase() {
        let mut config = RootConfig::default();
        config.sticks.left.curve = ResponseCurve::Aggressive;

        assert!(config.to_json_pretty().contains("\"aggressive\""));

        let parsed =
            RootConfig::from_json(r#"{"sticks":{"right":{"curve":"relaxed"}}}"#).unwrap();
        assert_eq!(parsed.sticks.right.curve, ResponseCurve::Relaxed);
    }
}
