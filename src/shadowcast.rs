use crate::base::{LightMap, Point, ResistanceMap};
use crate::fov::Cone;
use crate::radius::Radius;

//////////////////////////////////////////////////////////////////////////////

// Octants

// Maps a canonical (col, row) offset, where row < 0 and row <= col <= 0, to
// a grid offset. Each of the eight covers one wedge of the plane.
#[derive(Clone, Copy, Debug)]
struct Octant(i32, i32, i32, i32);

impl Octant {
    fn apply(&self, col: i32, row: i32) -> Point {
        let Octant(xx, xy, yx, yy) = *self;
        Point(col * xx + row * xy, col * yx + row * yy)
    }
}

const OCTANTS: [Octant; 8] = [
    Octant(0, 1, 1, 0),
    Octant(1, 0, 0, 1),
    Octant(0, 1, -1, 0),
    Octant(1, 0, 0, -1),
    Octant(0, -1, -1, 0),
    Octant(-1, 0, 0, -1),
    Octant(0, -1, 1, 0),
    Octant(-1, 0, 0, 1),
];

//////////////////////////////////////////////////////////////////////////////

// Shadowcast

struct Scan<'a> {
    map: &'a ResistanceMap,
    light: &'a mut LightMap,
    origin: Point,
    radius: f64,
    decay: f64,
    metric: Radius,
    cone: Option<Cone>,
}

impl<'a> Scan<'a> {
    // Scans rows outward from `row` within the slope window [end, start].
    // A wall splits the window: the part before it is handed to a recursive
    // scan one row further out, and this scan resumes past the wall.
    fn cast(&mut self, octant: Octant, row: i32, mut start: f64, end: f64) {
        if start < end { return; }

        let Point(width, height) = self.map.size;
        let mut blocked = false;
        let mut next_start = 0.0;
        let mut distance = row;

        while !blocked && distance as f64 <= self.radius && distance < width + height {
            let row = -distance;
            for col in -distance..=0 {
                let offset = octant.apply(col, row);
                let point = self.origin + offset;
                let left = (col as f64 - 0.5) / (row as f64 + 0.5);
                let right = (col as f64 + 0.5) / (row as f64 - 0.5);

                if !self.map.contains(point) || start < right { continue; }
                if end > left { break; }
                if let Some(cone) = &self.cone {
                    if cone.excludes(offset) { continue; }
                }

                let delta = self.metric.distance(col as f64, row as f64);
                if delta <= self.radius {
                    self.light.set(point, 1.0 - self.decay * delta);
                }

                let wall = self.map.get(point) >= 1.0;
                if blocked {
                    if wall {
                        next_start = right;
                    } else {
                        blocked = false;
                        start = next_start;
                    }
                } else if wall && (distance as f64) < self.radius {
                    blocked = true;
                    self.cast(octant, distance + 1, start, left);
                    next_start = right;
                }
            }
            distance += 1;
        }
    }
}

/// Recursive shadowcasting from `origin` into `light`, which the caller has
/// already cleared and seeded. Brightness falls off linearly with `metric`
/// distance and reaches zero at `radius`, or one step past it for a cone.
///
/// Rows stop at `width + height`, so an unbounded radius still terminates.
pub fn shadowcast(map: &ResistanceMap, light: &mut LightMap, origin: Point,
                  radius: f64, metric: Radius, cone: Option<Cone>) {
    let radius = radius.max(1.0);
    let decay = if cone.is_some() { 1.0 / (radius + 1.0) } else { 1.0 / radius };
    let mut scan = Scan { map, light, origin, radius, decay, metric, cone };
    for octant in OCTANTS {
        scan.cast(octant, 1, 1.0, 0.0);
    }
}

//////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::{resistance_from_chars, Matrix};

    fn run(map: &ResistanceMap, origin: Point, radius: f64,
           metric: Radius, cone: Option<Cone>) -> LightMap {
        let mut light = Matrix::new(map.size, 0.0);
        light.set(origin, 1.0);
        shadowcast(map, &mut light, origin, radius, metric, cone);
        light
    }

    #[test]
    fn test_open_room_falloff() {
        let map = Matrix::new(Point(5, 5), 0.0);
        let light = run(&map, Point(2, 2), 10.0, Radius::Circle, None);
        assert_eq!(light.get(Point(2, 2)), 1.0);
        assert!((light.get(Point(0, 0)) - (1.0 - 8f64.sqrt() / 10.0)).abs() < 1e-9);
        assert!((light.get(Point(4, 2)) - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_open_field_matches_metric() {
        let size = Point(21, 21);
        let origin = Point(10, 10);
        let map = Matrix::new(size, 0.0);
        for metric in [Radius::Circle, Radius::Square, Radius::Diamond] {
            let light = run(&map, origin, 6.0, metric, None);
            for y in 0..size.1 {
                for x in 0..size.0 {
                    let point = Point(x, y);
                    let d = metric.between(origin, point);
                    let expected = if d <= 6.0 { 1.0 - d / 6.0 } else { 0.0 };
                    assert!((light.get(point) - expected).abs() < 1e-9,
                            "{:?} {:?}: {} vs {}", metric, point, light.get(point), expected);
                }
            }
        }
    }

    #[test]
    fn test_wall_casts_shadow() {
        let map = resistance_from_chars(&[
            ".....",
            ".....",
            "...#.",
            ".....",
            ".....",
        ]);
        let light = run(&map, Point(2, 2), 10.0, Radius::Circle, None);
        assert!(light.get(Point(3, 2)) > 0.0);
        assert_eq!(light.get(Point(4, 2)), 0.0);
        assert!(light.get(Point(3, 1)) > 0.0);
        assert!(light.get(Point(3, 3)) > 0.0);
        assert!(light.get(Point(1, 2)) > 0.0);
    }

    #[test]
    fn test_corridor_walls_block() {
        let map = resistance_from_chars(&[
            "#######",
            "#.....#",
            "#######",
            "#.....#",
            "#######",
        ]);
        let light = run(&map, Point(1, 1), 20.0, Radius::Square, None);
        assert!(light.get(Point(5, 1)) > 0.0);
        assert!(light.get(Point(6, 2)) > 0.0);
        for x in 1..6 {
            assert_eq!(light.get(Point(x, 3)), 0.0);
        }
    }

    #[test]
    fn test_unbounded_radius_terminates() {
        let map = Matrix::new(Point(8, 3), 0.0);
        let light = run(&map, Point(0, 0), f64::MAX, Radius::Square, None);
        assert!(light.data.iter().all(|&x| x > 0.99));
    }

    #[test]
    fn test_cone_restricts_angle() {
        let map = Matrix::new(Point(11, 11), 0.0);
        let origin = Point(5, 5);
        // Angle 0 points toward +x.
        let light = run(&map, origin, 5.0, Radius::Circle, Some(Cone::new(0.0, 90.0)));
        assert!((light.get(Point(9, 5)) - (1.0 - 4.0 / 6.0)).abs() < 1e-9);
        assert!(light.get(Point(8, 7)) > 0.0);
        assert_eq!(light.get(Point(1, 5)), 0.0);
        assert_eq!(light.get(Point(5, 9)), 0.0);
        assert_eq!(light.get(Point(5, 1)), 0.0);
        assert_eq!(light.get(origin), 1.0);
    }

    #[test]
    fn test_cone_wraps_around_zero() {
        let map = Matrix::new(Point(11, 11), 0.0);
        let origin = Point(5, 5);
        let light = run(&map, origin, 5.0, Radius::Circle, Some(Cone::new(350.0, 60.0)));
        assert!(light.get(Point(9, 5)) > 0.0);
        assert!(light.get(Point(9, 4)) > 0.0);
        assert!(light.get(Point(9, 6)) > 0.0);
        assert_eq!(light.get(Point(1, 5)), 0.0);
    }
}
