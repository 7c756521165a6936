mod base;
mod config;
mod error;
mod fov;
mod line;
mod los;
mod merge;
mod radius;
mod ripple;
mod shadowcast;

pub use base::{resistance_from_chars, LightMap, Matrix, Point, ResistanceMap};
pub use base::{DOWN, DOWN_LEFT, DOWN_RIGHT, LEFT, OUTWARDS, RIGHT, UP, UP_LEFT, UP_RIGHT};
pub use config::{FovAlgorithm, FovConfig, LosConfig, VisionConfig};
pub use error::VisionError;
pub use fov::{Cone, Fov, FovKind, DEFAULT_RADIUS};
pub use line::{bresenham, dda, dda_with, ortho, ray, thick, thick_paths, Line};
pub use line::{DDA_CENTER, THICK_OFFSETS};
pub use los::{Los, LosKind};
pub use merge::{add_all, add_into, mix_visible, VISIBLE_THRESHOLD};
pub use radius::Radius;
pub use ripple::{ripple, Looseness};
pub use shadowcast::shadowcast;
