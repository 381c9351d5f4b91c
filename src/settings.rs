//! Presentation settings and preferences
//!
//! Nothing in here changes gameplay: particles draw from their own RNG stream,
//! so turning them off or shrinking the pool leaves the simulation identical.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Particle pool capacity for this preset
    pub fn max_particles(&self) -> usize {
        match self {
            QualityPreset::Low => 100,
            QualityPreset::Medium => 200,
            QualityPreset::High => 400,
        }
    }
}

/// Presentation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Graphics quality preset
    pub quality: QualityPreset,
    /// Particle effects (explosions, sparks, trails)
    pub particles: bool,
    /// Let the particle pool allocate past its capacity instead of dropping effects
    pub particle_overflow: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,
            particles: true,
            particle_overflow: true,
        }
    }
}

impl Settings {
    /// Create settings from a quality preset
    pub fn from_preset(preset: QualityPreset) -> Self {
        Self {
            quality: preset,
            ..Self::default()
        }
    }

    /// Effective particle pool capacity
    pub fn max_particles(&self) -> usize {
        if !self.particles {
            0
        } else {
            self.quality.max_particles()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, SimError> {
        serde_json::from_str(json).map_err(|source| SimError::Config {
            origin: "<inline>".to_string(),
            source,
        })
    }

    /// Load settings from a JSON file, falling back to defaults if it is missing
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let path = path.as_ref();
        if !path.exists() {
            log::info!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let json = std::fs::read_to_string(path).map_err(|source| SimError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = serde_json::from_str(&json).map_err(|source| SimError::Config {
            origin: path.display().to_string(),
            source,
        })?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Save settings as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SimError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).map_err(|source| SimError::Config {
            origin: path.display().to_string(),
            source,
        })?;
        std::fs::write(path, json).map_err(|source| SimError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Settings saved");
        Ok(())
    }
}
