use std::fs;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::VisionError;
use crate::fov::{Fov, FovKind, DEFAULT_RADIUS};
use crate::los::{Los, LosKind};
use crate::radius::Radius;
use crate::ripple::Looseness;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FovAlgorithm {
    #[default]
    Shadow,
    Ripple,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FovConfig {
    pub algorithm: FovAlgorithm,
    /// Only read by the ripple algorithm.
    pub looseness: Looseness,
    pub radius: f64,
    pub metric: Radius,
}

impl Default for FovConfig {
    fn default() -> Self {
        Self {
            algorithm: FovAlgorithm::default(),
            looseness: Looseness::default(),
            radius: DEFAULT_RADIUS,
            metric: Radius::default(),
        }
    }
}

impl FovConfig {
    pub fn kind(&self) -> FovKind {
        match self.algorithm {
            FovAlgorithm::Shadow => FovKind::Shadow,
            FovAlgorithm::Ripple => FovKind::Ripple { looseness: self.looseness },
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LosConfig {
    pub algorithm: LosKind,
    pub metric: Radius,
}

/// Engine settings, read from TOML:
///
/// ```toml
/// [fov]
/// algorithm = "ripple"
/// looseness = "loose"
/// radius = 12.0
/// metric = "diamond"
///
/// [los]
/// algorithm = "thick"
/// metric = "square"
/// ```
///
/// Both sections and all their keys are optional.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    pub fov: FovConfig,
    pub los: LosConfig,
}

impl VisionConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, VisionError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, VisionError> {
        let path = path.as_ref();
        debug!("loading vision config from {}", path.display());
        Self::from_toml_str(&fs::read_to_string(path)?)
    }

    pub fn build_fov(&self) -> Fov {
        let kind = self.fov.kind();
        debug!("fov engine: {:?}, radius {}, {:?}", kind, self.fov.radius, self.fov.metric);
        Fov::new(kind).with_radius(self.fov.radius).with_metric(self.fov.metric)
    }

    pub fn build_los(&self) -> Los {
        debug!("los engine: {:?}, {:?}", self.los.algorithm, self.los.metric);
        Los::new(self.los.algorithm).with_metric(self.los.metric)
    }
}

//////////////////////////////////////////////////////////////////////////////
