use std::f64::consts::TAU;
use std::str::FromStr;

use log::trace;

use crate::base::{LightMap, Matrix, Point, ResistanceMap};
use crate::error::{check_map, VisionError};
use crate::radius::{round, Radius};
use crate::ripple::{ripple, Looseness};
use crate::shadowcast::shadowcast;

//////////////////////////////////////////////////////////////////////////////

// Cone

/// An angular wedge, `span` wide and centered on `angle`. Angles are in
/// radians, measured from +x toward +y (down the grid).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cone {
    angle: f64,
    span: f64,
}

impl Cone {
    /// Builds a cone from degrees. Any angle is accepted and wrapped into
    /// [0, 360).
    pub fn new(angle: f64, span: f64) -> Self {
        Self { angle: angle.rem_euclid(360.0).to_radians(), span: span.to_radians() }
    }

    pub fn angle(&self) -> f64 { self.angle }

    pub fn span(&self) -> f64 { self.span }

    /// True if the direction of `offset` is more than half the span away from
    /// the cone's center, going whichever way around the circle is shorter.
    pub fn excludes(&self, offset: Point) -> bool {
        let theta = (offset.1 as f64).atan2(offset.0 as f64);
        let diff = (self.angle - theta).rem_euclid(TAU);
        diff.min(TAU - diff) > self.span / 2.0
    }
}

//////////////////////////////////////////////////////////////////////////////

// Fov

/// Which field-of-view algorithm an [`Fov`] runs.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum FovKind {
    /// Recursive shadowcasting. Sharp shadows with linear falloff.
    #[default]
    Shadow,
    /// Flood diffusion that lets light bend around corners.
    Ripple { looseness: Looseness },
}

impl FromStr for FovKind {
    type Err = VisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.to_ascii_lowercase().replace('-', "_");
        if s == "shadow" { return Ok(FovKind::Shadow); }
        if s == "ripple" { return Ok(FovKind::Ripple { looseness: Looseness::Normal }); }
        let Some(rest) = s.strip_prefix("ripple_") else {
            return Err(VisionError::UnknownAlgorithm(s));
        };
        let looseness = rest.parse().map_err(|_| VisionError::UnknownAlgorithm(s.clone()))?;
        Ok(FovKind::Ripple { looseness })
    }
}

/// Radius used by [`Fov::cast`] unless one is set with [`Fov::with_radius`].
pub const DEFAULT_RADIUS: f64 = 8.0;

/// A field-of-view engine. It owns the light map it writes into, and the
/// indirect-light flags ripple needs, so repeated calls on same-sized maps
/// do not reallocate. Each call starts from a dark map.
///
/// The radius and metric it carries are used by [`Fov::cast`]; the other
/// entry points take them per call.
#[derive(Clone, Debug)]
pub struct Fov {
    kind: FovKind,
    radius: f64,
    metric: Radius,
    light: LightMap,
    indirect: Matrix<bool>,
}

impl Default for Fov {
    fn default() -> Self { Self::new(FovKind::default()) }
}

impl Fov {
    pub fn new(kind: FovKind) -> Self {
        Self {
            kind,
            radius: DEFAULT_RADIUS,
            metric: Radius::default(),
            light: LightMap::default(),
            indirect: Matrix::default(),
        }
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_metric(mut self, metric: Radius) -> Self {
        self.metric = metric;
        self
    }

    pub fn kind(&self) -> FovKind { self.kind }

    pub fn radius(&self) -> f64 { self.radius }

    pub fn metric(&self) -> Radius { self.metric }

    /// The result of the most recent call.
    pub fn light(&self) -> &LightMap { &self.light }

    pub fn into_light(self) -> LightMap { self.light }

    /// Lights everything visible from `origin` within `radius`. The origin
    /// gets 1.0 and brightness falls to 0 at `radius`. Radii below 1 are
    /// treated as 1. An origin off the map leaves every cell dark.
    pub fn calculate(&mut self, map: &ResistanceMap, origin: Point, radius: f64,
                     metric: Radius) -> Result<&LightMap, VisionError> {
        self.run(map, origin, radius, metric, None)
    }

    /// [`Fov::calculate`] with the engine's own radius and metric.
    pub fn cast(&mut self, map: &ResistanceMap, origin: Point)
                -> Result<&LightMap, VisionError> {
        self.run(map, origin, self.radius, self.metric, None)
    }

    /// Like [`Fov::calculate`], restricted to the cone `span` degrees wide
    /// centered on `angle` degrees. Brightness reaches 0 one step past
    /// `radius`.
    pub fn calculate_cone(&mut self, map: &ResistanceMap, origin: Point, radius: f64,
                          metric: Radius, angle: f64, span: f64)
                          -> Result<&LightMap, VisionError> {
        self.run(map, origin, radius, metric, Some(Cone::new(angle, span)))
    }

    /// Unbounded square shadowcast, marking every cell with any line of sight
    /// to `origin`. Used to gate [`crate::mix_visible`].
    pub fn los_map(&mut self, map: &ResistanceMap, origin: Point)
                   -> Result<&LightMap, VisionError> {
        check_map(map)?;
        let radius = (map.width() + map.height()) as f64;
        trace!("los map from {:?}, radius {}", origin, radius);
        if !self.reset(map, origin) { return Ok(&self.light); }
        shadowcast(map, &mut self.light, origin, radius, Radius::Square, None);
        Ok(&self.light)
    }

    /// Casts a single ray from `origin` at `angle` degrees. Brightness drops
    /// by `1 / distance` per step and accumulates where the ray crosses
    /// itself. On hitting a wall the ray restarts from it, reflecting off
    /// whichever axis has a wall beside the hit.
    pub fn bouncing_line(&mut self, map: &ResistanceMap, origin: Point, distance: f64,
                         angle: f64) -> Result<&LightMap, VisionError> {
        check_map(map)?;
        trace!("bouncing line from {:?}, distance {}, angle {}", origin, distance, angle);
        if !self.reset(map, origin) { return Ok(&self.light); }
        let radius = distance.max(1.0);
        let decay = 1.0 / radius;
        let angle = angle.rem_euclid(360.0).to_radians();
        let (mut sin, mut cos) = angle.sin_cos();

        let mut brightness = 1.0;
        let mut start = origin;
        let mut step = 1;
        while step as f64 <= radius {
            let point = start + Point(round(cos * step as f64), round(sin * step as f64));
            if !map.contains(point) { break; }
            brightness -= decay;
            if brightness <= 0.0 { break; }

            let lit = self.light.get(point) + brightness;
            self.light.set(point, lit.min(1.0));

            if map.get(point) >= 1.0 && brightness > decay {
                start = point;
                step = 1;
                let beside_x = map.get(Point(point.0 + round(-cos), point.1));
                let beside_y = map.get(Point(point.0, point.1 + round(-sin)));
                if beside_x >= 1.0 { sin = -sin; }
                if beside_y >= 1.0 { cos = -cos; }
            } else {
                step += 1;
            }
        }
        Ok(&self.light)
    }

    fn run(&mut self, map: &ResistanceMap, origin: Point, radius: f64, metric: Radius,
           cone: Option<Cone>) -> Result<&LightMap, VisionError> {
        check_map(map)?;
        trace!("{:?} fov from {:?}, radius {}, {:?}, {:?}", self.kind, origin, radius, metric, cone);
        if !self.reset(map, origin) { return Ok(&self.light); }
        match self.kind {
            FovKind::Shadow => {
                shadowcast(map, &mut self.light, origin, radius, metric, cone);
            }
            FovKind::Ripple { looseness } => {
                self.indirect.reset(map.size, false);
                ripple(map, &mut self.light, &mut self.indirect, origin, radius, metric,
                       looseness, cone);
            }
        }
        Ok(&self.light)
    }

    // Clears the light map to the map's size and seeds the origin. Returns
    // false if the origin is off the map, leaving it dark.
    fn reset(&mut self, map: &ResistanceMap, origin: Point) -> bool {
        self.light.reset(map.size, 0.0);
        if !map.contains(origin) { return false; }
        self.light.set(origin, 1.0);
        true
    }
}

//////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::resistance_from_chars;

    #[test]
    fn test_calculate_resets_between_calls() {
        let map = Matrix::new(Point(9, 9), 0.0);
        let mut fov = Fov::new(FovKind::Shadow);
        fov.calculate(&map, Point(0, 0), 3.0, Radius::Circle).unwrap();
        assert!(fov.light().get(Point(1, 1)) > 0.0);
        let light = fov.calculate(&map, Point(8, 8), 3.0, Radius::Circle).unwrap();
        assert_eq!(light.get(Point(1, 1)), 0.0);
        assert_eq!(light.get(Point(0, 0)), 0.0);
        assert_eq!(light.get(Point(8, 8)), 1.0);
    }

    #[test]
    fn test_cast_uses_own_settings() {
        let map = Matrix::new(Point(7, 7), 0.0);
        let mut fov = Fov::default();
        let light = fov.cast(&map, Point(3, 3)).unwrap();
        assert!((light.get(Point(3, 5)) - 0.75).abs() < 1e-9);

        let mut fov = Fov::new(FovKind::Shadow).with_radius(3.0).with_metric(Radius::Diamond);
        assert_eq!((fov.radius(), fov.metric()), (3.0, Radius::Diamond));
        let light = fov.cast(&map, Point(3, 3)).unwrap();
        assert!((light.get(Point(3, 5)) - (1.0 - 2.0 / 3.0)).abs() < 1e-9);
        assert_eq!(light.get(Point(5, 5)), 0.0);
        assert!(light.get(Point(4, 4)) > 0.0);
    }

    #[test]
    fn test_calculate_resizes() {
        let mut fov = Fov::new(FovKind::Ripple { looseness: Looseness::Tight });
        fov.calculate(&Matrix::new(Point(4, 4), 0.0), Point(1, 1), 2.0, Radius::Square).unwrap();
        let light = fov.calculate(&Matrix::new(Point(6, 3), 0.0), Point(5, 2), 2.0,
                                  Radius::Square).unwrap();
        assert_eq!(light.size, Point(6, 3));
        assert_eq!(light.get(Point(5, 2)), 1.0);
        assert!(light.get(Point(4, 1)) > 0.0);
    }

    #[test]
    fn test_empty_map_is_an_error() {
        let mut fov = Fov::default();
        let map = Matrix::new(Point(0, 4), 0.0);
        let result = fov.calculate(&map, Point(0, 0), 3.0, Radius::Circle);
        assert!(matches!(result, Err(VisionError::EmptyMap { width: 0, height: 4 })));
    }

    #[test]
    fn test_origin_off_map_is_dark() {
        let map = Matrix::new(Point(5, 5), 0.0);
        for kind in [FovKind::Shadow, FovKind::Ripple { looseness: Looseness::Normal }] {
            let mut fov = Fov::new(kind);
            let light = fov.calculate(&map, Point(7, 2), 10.0, Radius::Circle).unwrap();
            assert!(light.data.iter().all(|&x| x == 0.0));
        }
    }

    #[test]
    fn test_small_radius_is_coerced() {
        let map = Matrix::new(Point(5, 5), 0.0);
        let mut fov = Fov::new(FovKind::Shadow);
        let light = fov.calculate(&map, Point(2, 2), 0.0, Radius::Square).unwrap();
        assert!(light.data.iter().all(|x| x.is_finite()));
        assert_eq!(light.get(Point(2, 2)), 1.0);
        assert_eq!(light.get(Point(3, 3)), 0.0);
        assert_eq!(light.get(Point(4, 4)), 0.0);
    }

    #[test]
    fn test_calculate_cone() {
        let map = Matrix::new(Point(9, 9), 0.0);
        let mut fov = Fov::new(FovKind::Shadow);
        let light = fov.calculate_cone(&map, Point(4, 4), 4.0, Radius::Circle, 180.0, 90.0)
            .unwrap();
        assert!((light.get(Point(0, 4)) - 0.2).abs() < 1e-9);
        assert_eq!(light.get(Point(8, 4)), 0.0);
        // -180 wraps to the same direction.
        let light = fov.calculate_cone(&map, Point(4, 4), 4.0, Radius::Circle, -180.0, 90.0)
            .unwrap();
        assert!(light.get(Point(1, 4)) > 0.0);
    }

    #[test]
    fn test_los_map_is_unbounded() {
        let map = resistance_from_chars(&[
            "..............................",
            "..............................",
            "#############.................",
        ]);
        let mut fov = Fov::new(FovKind::Ripple { looseness: Looseness::Tight });
        let light = fov.los_map(&map, Point(0, 0)).unwrap();
        assert!(light.get(Point(29, 1)) > 0.0);
        assert!(light.get(Point(29, 0)) > 0.0);
        assert!(light.get(Point(5, 2)) > 0.0);
        assert_eq!(fov.kind(), FovKind::Ripple { looseness: Looseness::Tight });
    }

    #[test]
    fn test_bouncing_line_straight() {
        let map = Matrix::new(Point(8, 3), 0.0);
        let mut fov = Fov::default();
        let light = fov.bouncing_line(&map, Point(0, 1), 5.0, 0.0).unwrap();
        let row: Vec<_> = (0..8).map(|x| light.get(Point(x, 1))).collect();
        let expected = [1.0, 0.8, 0.6, 0.4, 0.2, 0.0, 0.0, 0.0];
        for (a, b) in row.iter().zip(expected) {
            assert!((a - b).abs() < 1e-9, "{:?}", row);
        }
        assert_eq!(light.data.iter().filter(|&&x| x > 1e-9).count(), 5);
    }

    #[test]
    fn test_bouncing_line_reflects() {
        let map = resistance_from_chars(&[
            "##########",
            "..........",
            "..........",
            "..........",
            "##########",
        ]);
        let mut fov = Fov::default();
        let light = fov.bouncing_line(&map, Point(1, 2), 12.0, 45.0).unwrap();
        assert!(light.get(Point(3, 4)) > 0.0);
        assert!(light.get(Point(5, 2)) > 0.0);
        assert!(light.get(Point(7, 0)) > 0.0);
        assert!(light.get(Point(8, 1)) > 0.0);
        assert_eq!(light.get(Point(9, 4)), 0.0);
    }

    #[test]
    fn test_parse_kind() {
        assert_eq!("shadow".parse::<FovKind>().unwrap(), FovKind::Shadow);
        assert_eq!("ripple".parse::<FovKind>().unwrap(),
                   FovKind::Ripple { looseness: Looseness::Normal });
        assert_eq!("ripple-very-loose".parse::<FovKind>().unwrap(),
                   FovKind::Ripple { looseness: Looseness::VeryLoose });
        assert!("ripple_sloppy".parse::<FovKind>().is_err());
        assert!("raycast".parse::<FovKind>().is_err());
    }

    #[test]
    fn test_cone_excludes() {
        let cone = Cone::new(-90.0, 90.0);
        assert!((cone.angle() - 1.5 * std::f64::consts::PI).abs() < 1e-9);
        assert!(!cone.excludes(Point(0, -3)));
        assert!(!cone.excludes(Point(1, -2)));
        assert!(cone.excludes(Point(2, -1)));
        assert!(cone.excludes(Point(0, 3)));
    }
}
