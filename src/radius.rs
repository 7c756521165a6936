use std::collections::HashSet;
use std::f64::consts::TAU;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::base::Point;
use crate::error::VisionError;

//////////////////////////////////////////////////////////////////////////////

// Radius

/// The distance metric that decides the shape of "uniform spread".
///
/// The 3D variants measure identically to their 2D counterparts when dz is 0:
/// `Square` ~ `Cube` (Chebyshev), `Diamond` ~ `Octahedron` (Manhattan) and
/// `Circle` ~ `Sphere` (Euclidean).
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Radius {
    Square,
    Diamond,
    #[default]
    Circle,
    Cube,
    Octahedron,
    Sphere,
}

const TOLERANCE: f64 = 0.001;

// Cap on the angle subdivisions used to sample a circular perimeter.
const MAX_PERIMETER_SAMPLES: i32 = 256;

fn clamp(n: i32, min: i32, max: i32) -> i32 {
    std::cmp::min(std::cmp::max(min, n), max - 1)
}

// Rounds halves up, so -0.5 becomes 0 and 1.5 becomes 2.
pub(crate) fn round(x: f64) -> i32 {
    (x + 0.5).floor() as i32
}

fn contains(bounds: Point, p: Point) -> bool {
    0 <= p.0 && p.0 < bounds.0 && 0 <= p.1 && p.1 < bounds.1
}

impl Radius {
    pub fn distance(&self, dx: f64, dy: f64) -> f64 {
        self.distance_3d(dx, dy, 0.0)
    }

    pub fn distance_3d(&self, dx: f64, dy: f64, dz: f64) -> f64 {
        let (dx, dy, dz) = (dx.abs(), dy.abs(), dz.abs());
        match self {
            Radius::Square | Radius::Cube => dx.max(dy).max(dz),
            Radius::Diamond | Radius::Octahedron => dx + dy + dz,
            Radius::Circle | Radius::Sphere => (dx * dx + dy * dy + dz * dz).sqrt(),
        }
    }

    pub fn between(&self, a: Point, b: Point) -> f64 {
        self.distance((a.0 - b.0) as f64, (a.1 - b.1) as f64)
    }

    /// True iff the distance from `start` to `end` lies in [min, max], with a
    /// small tolerance on both ends.
    pub fn in_range(&self, start: Point, end: Point, min: i32, max: i32) -> bool {
        let distance = self.between(start, end);
        distance >= min as f64 - TOLERANCE && distance <= max as f64 + TOLERANCE
    }

    /// Compares two metrics as if both were restricted to the plane.
    pub fn equals_2d(&self, other: Radius) -> bool {
        self.flatten() == other.flatten()
    }

    fn flatten(&self) -> Radius {
        match self {
            Radius::Square | Radius::Cube => Radius::Square,
            Radius::Diamond | Radius::Octahedron => Radius::Diamond,
            Radius::Circle | Radius::Sphere => Radius::Circle,
        }
    }

    pub fn volume_2d(&self, radius: f64) -> f64 {
        match self.flatten() {
            Radius::Square => (radius * 2.0 + 1.0) * (radius * 2.0 + 1.0),
            Radius::Diamond => radius * (radius + 1.0) * 2.0 + 1.0,
            _ => std::f64::consts::PI * radius * radius + 1.0,
        }
    }

    pub fn volume_3d(&self, radius: f64) -> f64 {
        match self.flatten() {
            Radius::Square => (radius * 2.0 + 1.0).powi(3),
            Radius::Diamond => {
                let layer = |r: f64| r * (r + 1.0) * 2.0 + 1.0;
                let mut total = layer(radius);
                let mut i = radius - 1.0;
                while i >= 0.0 {
                    total += layer(i) * 2.0;
                    i -= 1.0;
                }
                total
            }
            _ => std::f64::consts::PI * radius * radius * radius * 4.0 / 3.0 + 1.0,
        }
    }

    /// Integer distance estimate with orthogonal steps costing 2. Diagonal
    /// steps cost 3 under the round metrics, 2 under Square and 4 under Diamond.
    pub fn rough_distance(&self, delta: Point) -> i32 {
        let Point(x, y) = delta.abs();
        match self.flatten() {
            Radius::Circle => {
                let (lo, hi) = (std::cmp::min(x, y), std::cmp::max(x, y));
                3 * lo + 2 * (hi - lo)
            }
            Radius::Diamond => 2 * (x + y),
            _ => 2 * std::cmp::max(x, y),
        }
    }

    /// Every cell within `radius` of `center`. Cells outside `bounds` are
    /// dropped unless `surpass_edges` is set. A radius below 1 yields just
    /// the center.
    pub fn points_inside(
        &self, center: Point, radius: i32, surpass_edges: bool, bounds: Point) -> Vec<Point> {
        let mut result = vec![];
        let keep = |p: Point| surpass_edges || contains(bounds, p);
        if !keep(center) { return result; }
        if radius < 1 {
            result.push(center);
            return result;
        }
        let Point(cx, cy) = center;

        match self.flatten() {
            Radius::Square | Radius::Diamond => {
                for x in (cx - radius)..=(cx + radius) {
                    for y in (cy - radius)..=(cy + radius) {
                        let point = Point(x, y);
                        if self.between(center, point) > radius as f64 { continue; }
                        if keep(point) { result.push(point); }
                    }
                }
            }
            _ => {
                // Columns are pulled a quarter cell toward the center so that
                // small circles come out round instead of spiky.
                let r = radius as f64;
                for dx in -radius..=radius {
                    let shifted = dx as f64 - 0.25 * dx.signum() as f64;
                    let x = cx + round(shifted);
                    let high = (r * r - shifted * shifted).sqrt();
                    if keep(Point(x, cy)) { result.push(Point(x, cy)); }
                    let mut dy = high;
                    while dy >= 0.75 {
                        let offset = round(dy - 0.25);
                        for point in [Point(x, cy + offset), Point(x, cy - offset)] {
                            if keep(point) { result.push(point); }
                        }
                        dy -= 1.0;
                    }
                }
            }
        }
        result
    }

    /// The boundary cells at `radius` from `center`, without duplicates.
    /// Unless `surpass_edges` is set, rim cells are clamped into `bounds`.
    /// The round metrics sample the rim at doubling angular resolution until
    /// a pass finds no new cell.
    pub fn perimeter(
        &self, center: Point, radius: i32, surpass_edges: bool, bounds: Point) -> Vec<Point> {
        let mut rim = Rim::default();
        if !surpass_edges && !contains(bounds, center) { return rim.points; }
        if radius < 1 {
            rim.add(center);
            return rim.points;
        }
        let fit = |p: Point| {
            if surpass_edges { return p; }
            Point(clamp(p.0, 0, bounds.0), clamp(p.1, 0, bounds.1))
        };
        let Point(cx, cy) = center;

        match self.flatten() {
            Radius::Square => {
                for i in -radius..=radius {
                    rim.add(fit(Point(cx + i, cy - radius)));
                    rim.add(fit(Point(cx + i, cy + radius)));
                    rim.add(fit(Point(cx - radius, cy + i)));
                    rim.add(fit(Point(cx + radius, cy + i)));
                }
            }
            Radius::Diamond => {
                for i in -radius..=radius {
                    let j = radius - i.abs();
                    rim.add(fit(Point(cx + i, cy - j)));
                    rim.add(fit(Point(cx + i, cy + j)));
                }
            }
            _ => {
                let r = radius as f64 + 0.25;
                let mut denom = 1;
                while denom <= MAX_PERIMETER_SAMPLES {
                    let mut found = false;
                    for i in (1..=denom).step_by(2) {
                        let theta = i as f64 * (TAU / denom as f64);
                        let x = (theta.cos() * r) as i32 + cx;
                        let y = (theta.sin() * r) as i32 + cy;
                        found |= rim.add(fit(Point(x, y)));
                    }
                    if !found { break; }
                    denom *= 2;
                }
            }
        }
        rim.points
    }

    /// Projects the ray from `center` through `middle` out to `radius` and
    /// returns where it ends. Unless `surpass_edges` is set the ray stops at
    /// the edge of `bounds`.
    pub fn extend(&self, center: Point, middle: Point, radius: i32,
                  surpass_edges: bool, bounds: Point) -> Point {
        if !surpass_edges && (!contains(bounds, center) || !contains(bounds, middle)) {
            return center;
        }
        if radius < 1 { return center; }
        let theta = ((middle.1 - center.1) as f64).atan2((middle.0 - center.0) as f64);
        let (cos, sin) = (theta.cos(), theta.sin());
        let along = |k: f64| Point(round(cos * k) + center.0, round(sin * k) + center.1);

        if self.flatten() == Radius::Circle {
            let mut k = radius;
            let mut end = along(k as f64);
            while !surpass_edges && !contains(bounds, end) && k > 0 {
                k -= 1;
                end = along(k as f64);
            }
            return end;
        }

        let mut end = middle;
        let mut step = 0;
        while self.between(center, end) < radius as f64 {
            step += 1;
            end = along(step as f64);
            if surpass_edges { continue; }
            end = Point(clamp(end.0, 0, bounds.0), clamp(end.1, 0, bounds.1));
            if end.0 == 0 || end.0 == bounds.0 - 1 || end.1 == 0 || end.1 == bounds.1 - 1 {
                return end;
            }
        }
        end
    }

    /// Thickens `points` into a brush stroke: every in-bounds cell within
    /// `distance` of some input point, in first-seen order.
    pub fn expand(&self, distance: i32, bounds: Point,
                  points: impl IntoIterator<Item = Point>) -> Vec<Point> {
        let around = self.points_inside(Point::default(), distance, true, bounds);
        let mut rim = Rim::default();
        for point in points {
            for &offset in &around {
                let p = point + offset;
                if contains(bounds, p) { rim.add(p); }
            }
        }
        rim.points
    }
}

impl FromStr for Radius {
    type Err = VisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "square" => Ok(Radius::Square),
            "diamond" => Ok(Radius::Diamond),
            "circle" => Ok(Radius::Circle),
            "cube" => Ok(Radius::Cube),
            "octahedron" => Ok(Radius::Octahedron),
            "sphere" => Ok(Radius::Sphere),
            _ => Err(VisionError::UnknownAlgorithm(s.to_owned())),
        }
    }
}

// Insertion-ordered set of points.
#[derive(Default)]
struct Rim {
    points: Vec<Point>,
    seen: HashSet<Point>,
}

impl Rim {
    fn add(&mut self, point: Point) -> bool {
        let added = self.seen.insert(point);
        if added { self.points.push(point); }
        added
    }
}

//////////////////////////////////////////////////////////////////////////////
