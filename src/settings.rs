//! Game tuning
//!
//! Everything that shapes how strokes, balls and the cup behave. Defaults come
//! from `consts`; a JSON file can override any subset of them.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::sim::{CurveMaterial, WorldConfig};

/// How raw pointer samples become stroke geometry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrokeSettings {
    /// Minimum distance between accepted samples
    pub min_spacing: f32,
    /// Simplification tolerance applied on release
    pub epsilon: f32,
    /// Radius of the provisional edges drawn while the pointer is down
    pub edge_thickness: f32,
    pub edge_friction: f32,
    pub edge_elasticity: f32,
    /// Radius of the ball created from a single-point stroke
    pub dot_radius: f32,
}

impl Default for StrokeSettings {
    fn default() -> Self {
        Self {
            min_spacing: STROKE_MIN_SPACING,
            epsilon: STROKE_EPSILON,
            edge_thickness: PROVISIONAL_EDGE_THICKNESS,
            edge_friction: DEFAULT_FRICTION,
            edge_elasticity: CURVE_ELASTICITY,
            dot_radius: DOT_RADIUS,
        }
    }
}

/// Ball physical properties
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BallSettings {
    pub radius: f32,
    /// Mass is this factor times radius squared
    pub mass_per_area: f32,
    pub friction: f32,
    pub elasticity: f32,
}

impl Default for BallSettings {
    fn default() -> Self {
        Self {
            radius: BALL_RADIUS,
            mass_per_area: BALL_MASS_PER_AREA,
            friction: DEFAULT_FRICTION,
            elasticity: BALL_ELASTICITY,
        }
    }
}

impl BallSettings {
    /// Mass of a ball of the given radius
    pub fn mass_for(&self, radius: f32) -> f32 {
        self.mass_per_area * radius * radius
    }
}

/// Cup outline
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CupSettings {
    /// Half width at the bottom
    pub base_radius: f32,
    /// Half width at the opening
    pub rim_radius: f32,
    pub height: f32,
    /// Distance from the bottom of the arena to the cup base
    pub floor_offset: f32,
    /// Horizontal margin kept clear when placing the cup
    pub margin: f32,
}

impl Default for CupSettings {
    fn default() -> Self {
        Self {
            base_radius: CUP_BASE_RADIUS,
            rim_radius: CUP_RIM_RADIUS,
            height: CUP_HEIGHT,
            floor_offset: CUP_FLOOR_OFFSET,
            margin: CUP_MARGIN,
        }
    }
}

/// Play field and ground
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaSettings {
    pub width: f32,
    pub height: f32,
    /// Distance from the bottom of the arena to the ground line
    pub ground_offset: f32,
    pub ground_thickness: f32,
    pub ground_friction: f32,
    pub ground_elasticity: f32,
    /// Horizontal margin kept clear when dropping balls
    pub spawn_margin: f32,
}

impl Default for ArenaSettings {
    fn default() -> Self {
        Self {
            width: ARENA_WIDTH,
            height: ARENA_HEIGHT,
            ground_offset: GROUND_OFFSET,
            ground_thickness: GROUND_THICKNESS,
            ground_friction: DEFAULT_FRICTION,
            ground_elasticity: GROUND_ELASTICITY,
            spawn_margin: BALL_SPAWN_MARGIN,
        }
    }
}

/// Complete game tuning
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub stroke: StrokeSettings,
    pub curve: CurveMaterial,
    pub ball: BallSettings,
    pub cup: CupSettings,
    pub arena: ArenaSettings,
    pub physics: WorldConfig,
}

/// Failure reading or writing a settings file
#[derive(Debug)]
pub enum SettingsError {
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::Io(e) => write!(f, "settings I/O error: {e}"),
            SettingsError::Json(e) => write!(f, "invalid settings JSON: {e}"),
        }
    }
}

impl std::error::Error for SettingsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SettingsError::Io(e) => Some(e),
            SettingsError::Json(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for SettingsError {
    fn from(e: std::io::Error) -> Self {
        SettingsError::Io(e)
    }
}

impl From<serde_json::Error> for SettingsError {
    fn from(e: serde_json::Error) -> Self {
        SettingsError::Json(e)
    }
}

impl Settings {
    /// Parse settings from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read settings from a JSON file
    pub fn try_load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Read settings from a JSON file, falling back to defaults
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::try_load(path) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                log::warn!("Using default settings ({}): {e}", path.display());
                Self::default()
            }
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_consts() {
        let s = Settings::default();
        assert_eq!(s.stroke.min_spacing, 10.0);
        assert_eq!(s.stroke.epsilon, 4.0);
        assert_eq!(s.curve.linear_density, 0.1);
        assert_eq!(s.curve.segment_radius, 3.0);
        assert_eq!(s.ball.radius, 12.0);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let s = Settings::from_json(r#"{ "stroke": { "epsilon": 2.5 }, "ball": { "radius": 8 } }"#)
            .unwrap();
        assert_eq!(s.stroke.epsilon, 2.5);
        assert_eq!(s.stroke.min_spacing, STROKE_MIN_SPACING);
        assert_eq!(s.ball.radius, 8.0);
        assert_eq!(s.cup, CupSettings::default());
    }

    #[test]
    fn test_json_roundtrip() {
        let mut s = Settings::default();
        s.cup.height = 100.0;
        s.physics.substeps = 2;
        let back = Settings::from_json(&s.to_json().unwrap()).unwrap();
        assert_eq!(back, s);
    }

    #[test]
    fn test_invalid_json_is_error() {
        assert!(matches!(Settings::from_json("{ nope"), Err(SettingsError::Json(_))));
    }

    #[test]
    fn test_missing_file_falls_back() {
        let s = Settings::load("/definitely/not/here/settings.json");
        assert_eq!(s, Settings::default());
        assert!(matches!(
            Settings::try_load("/definitely/not/here/settings.json"),
            Err(SettingsError::Io(_))
        ));
    }

    #[test]
    fn test_save_then_load() {
        let path = std::env::temp_dir().join(format!("draw-and-collect-{}.json", std::process::id()));
        let mut s = Settings::default();
        s.stroke.min_spacing = 6.0;
        s.arena.width = 1024.0;
        s.save(&path).unwrap();
        let loaded = Settings::try_load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded, s);
    }

    #[test]
    fn test_ball_mass() {
        let ball = BallSettings::default();
        assert!((ball.mass_for(5.0) - 1.5).abs() < 1e-6);
    }
}
