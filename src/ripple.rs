use std::collections::VecDeque;
use std::str::FromStr;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::base::{LightMap, Matrix, Point, ResistanceMap, OUTWARDS};
use crate::error::VisionError;
use crate::fov::Cone;
use crate::radius::Radius;

//////////////////////////////////////////////////////////////////////////////

// Looseness

/// How many of a cell's neighbors, nearest to the origin first, may feed it
/// light. Looser ripples bend further around corners.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Looseness {
    Tight,
    #[default]
    Normal,
    Loose,
    VeryLoose,
}

impl Looseness {
    pub fn neighbors(&self) -> usize {
        match self {
            Looseness::Tight => 1,
            Looseness::Normal => 2,
            Looseness::Loose => 3,
            Looseness::VeryLoose => 6,
        }
    }

    pub fn from_neighbors(neighbors: usize) -> Result<Self, VisionError> {
        match neighbors {
            1 => Ok(Looseness::Tight),
            2 => Ok(Looseness::Normal),
            3 => Ok(Looseness::Loose),
            6 => Ok(Looseness::VeryLoose),
            x => Err(VisionError::InvalidLooseness(x)),
        }
    }
}

impl FromStr for Looseness {
    type Err = VisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "tight" => Ok(Looseness::Tight),
            "normal" => Ok(Looseness::Normal),
            "loose" => Ok(Looseness::Loose),
            "very_loose" => Ok(Looseness::VeryLoose),
            _ => Err(VisionError::UnknownAlgorithm(s.to_owned())),
        }
    }
}

//////////////////////////////////////////////////////////////////////////////

// Ripple

struct Spread<'a> {
    map: &'a ResistanceMap,
    light: &'a mut LightMap,
    indirect: &'a mut Matrix<bool>,
    origin: Point,
    decay: f64,
    metric: Radius,
    neighbors: usize,
}

impl<'a> Spread<'a> {
    // The brightest light `point` can receive from its nearest lit neighbors.
    // Marks `point` indirect if it is a wall or if every neighbor feeding it
    // is itself indirect.
    fn incoming(&mut self, point: Point) -> f64 {
        if point == self.origin { return 1.0; }

        let mut buffer = [Point::default(); 8];
        let mut count = 0;
        for step in OUTWARDS {
            let source = point + step;
            if !self.map.contains(source) { continue; }
            buffer[count] = source;
            count += 1;
        }
        let (metric, origin) = (self.metric, self.origin);
        let sources = &mut buffer[..count];
        sources.sort_by(|&a, &b| metric.between(origin, a).total_cmp(&metric.between(origin, b)));

        let (mut best, mut lit, mut indirect) = (0.0_f64, 0, 0);
        for &source in sources.iter().take(self.neighbors) {
            let brightness = self.light.get(source);
            if brightness <= 0.0 { continue; }
            lit += 1;
            if self.indirect.get(source) { indirect += 1; }
            let distance = self.metric.between(point, source);
            best = best.max(brightness - distance * self.decay - self.map.get(source));
        }
        if self.map.get(point) >= 1.0 || indirect >= lit {
            self.indirect.set(point, true);
        }
        best
    }
}

/// Flood-diffuses light from `origin` into `light`. Both `light` and
/// `indirect` must match the map's size; the caller clears them and seeds
/// the origin.
///
/// Only Diamond spreads without gaps in a single pass. The other metrics can
/// leave holes, which fill in when called again with a larger radius.
#[allow(clippy::too_many_arguments)]
pub fn ripple(map: &ResistanceMap, light: &mut LightMap, indirect: &mut Matrix<bool>,
              origin: Point, radius: f64, metric: Radius, looseness: Looseness,
              cone: Option<Cone>) {
    let limit = 4 * map.data.len();
    ripple_with_limit(map, light, indirect, origin, radius, metric, looseness, cone, limit);
}

// Stops after `limit` cells have been dequeued.
#[allow(clippy::too_many_arguments)]
fn ripple_with_limit(map: &ResistanceMap, light: &mut LightMap, indirect: &mut Matrix<bool>,
                     origin: Point, radius: f64, metric: Radius, looseness: Looseness,
                     cone: Option<Cone>, limit: usize) {
    let radius = radius.max(1.0);
    let decay = if cone.is_some() { 1.0 / (radius + 1.0) } else { 1.0 / radius };
    let neighbors = looseness.neighbors();
    let mut spread = Spread { map, light, indirect, origin, decay, metric, neighbors };

    let mut processed = 0;
    let mut queue = VecDeque::from([origin]);

    while let Some(point) = queue.pop_front() {
        if processed >= limit {
            warn!("ripple from {:?} stopped after {} cells", origin, processed);
            break;
        }
        processed += 1;

        if spread.light.get(point) <= 0.0 || spread.indirect.get(point) { continue; }

        for step in OUTWARDS {
            let next = point + step;
            if !map.contains(next) { continue; }
            // The extra 1 keeps the rim, where brightness reaches 0, in play.
            if metric.between(origin, next) >= radius + 1.0 { continue; }
            if let Some(cone) = &cone {
                if cone.excludes(next - origin) { continue; }
            }

            let incoming = spread.incoming(next);
            if spread.light.get(next) < incoming {
                spread.light.set(next, incoming);
                if map.get(next) < 1.0 { queue.push_back(next); }
            }
        }
    }
}

//////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::resistance_from_chars;

    const ALL: [Looseness; 4] =
        [Looseness::Tight, Looseness::Normal, Looseness::Loose, Looseness::VeryLoose];

    fn run(map: &ResistanceMap, origin: Point, radius: f64, metric: Radius,
           looseness: Looseness, cone: Option<Cone>) -> LightMap {
        let mut light = Matrix::new(map.size, 0.0);
        let mut indirect = Matrix::new(map.size, false);
        light.set(origin, 1.0);
        ripple(map, &mut light, &mut indirect, origin, radius, metric, looseness, cone);
        light
    }

    fn lit(light: &LightMap) -> usize {
        light.data.iter().filter(|&&x| x > 1e-9).count()
    }

    fn room() -> ResistanceMap {
        resistance_from_chars(&[
            "#########",
            "#.......#",
            "#.......#",
            "#####.###",
            "#.......#",
            "#.......#",
            "#########",
        ])
    }

    #[test]
    fn test_tight_diamond_is_gap_free() {
        let map = Matrix::new(Point(7, 7), 0.0);
        let origin = Point(3, 3);
        for looseness in ALL {
            let light = run(&map, origin, 3.0, Radius::Diamond, looseness, None);
            for y in 0..7 {
                for x in 0..7 {
                    let point = Point(x, y);
                    let d = Radius::Diamond.between(origin, point);
                    let value = light.get(point);
                    if d < 3.0 {
                        assert!((value - (1.0 - d / 3.0)).abs() < 1e-9, "{:?}", point);
                    } else if d == 3.0 {
                        assert!(value < 1e-9, "{:?}", point);
                    } else {
                        assert_eq!(value, 0.0, "{:?}", point);
                    }
                }
            }
        }
    }

    #[test]
    fn test_open_field_has_no_gaps_near_origin() {
        let map = Matrix::new(Point(15, 15), 0.0);
        let origin = Point(7, 7);
        for metric in [Radius::Circle, Radius::Square] {
            for looseness in ALL {
                let light = run(&map, origin, 5.0, metric, looseness, None);
                for (i, &value) in light.data.iter().enumerate() {
                    let point = Point(i as i32 % 15, i as i32 / 15);
                    let d = metric.between(origin, point);
                    if d <= 4.0 { assert!(value > 0.0, "{:?} {:?}", metric, point); }
                    if d >= 6.0 { assert_eq!(value, 0.0); }
                }
            }
        }
    }

    #[test]
    fn test_looser_bends_further() {
        let map = room();
        let counts: Vec<_> = ALL.iter().map(|&looseness| {
            lit(&run(&map, Point(2, 1), 20.0, Radius::Circle, looseness, None))
        }).collect();
        assert!(counts.windows(2).all(|x| x[0] <= x[1]), "{:?}", counts);

        let normal = run(&map, Point(2, 1), 20.0, Radius::Circle, Looseness::Normal, None);
        assert!(normal.get(Point(5, 4)) > 0.0);
        assert_eq!(normal.get(Point(1, 5)), 0.0);

        let very_loose = run(&map, Point(2, 1), 20.0, Radius::Circle, Looseness::VeryLoose, None);
        assert!(very_loose.get(Point(1, 5)) > 0.0);
    }

    #[test]
    fn test_walls_are_lit_but_do_not_spread() {
        let map = resistance_from_chars(&[
            "..#..",
            "..#..",
            "..#..",
        ]);
        let light = run(&map, Point(0, 0), 5.0, Radius::Square, Looseness::VeryLoose, None);
        for y in 0..3 {
            assert!(light.get(Point(2, y)) > 0.0);
            assert_eq!(light.get(Point(3, y)), 0.0);
            assert_eq!(light.get(Point(4, y)), 0.0);
        }
    }

    #[test]
    fn test_cone_limits_spread() {
        let map = Matrix::new(Point(11, 11), 0.0);
        let origin = Point(5, 5);
        let cone = Cone::new(90.0, 60.0);
        let light = run(&map, origin, 4.0, Radius::Circle, Looseness::Normal, Some(cone));
        assert!(light.get(Point(5, 7)) > 0.0);
        assert!(light.get(Point(5, 9)) > 0.0);
        assert_eq!(light.get(Point(5, 3)), 0.0);
        assert_eq!(light.get(Point(8, 5)), 0.0);
        assert_eq!(light.get(Point(2, 5)), 0.0);
    }

    #[test]
    fn test_processed_cell_limit() {
        let map = Matrix::new(Point(9, 9), 0.0);
        let origin = Point(4, 4);
        let mut light = Matrix::new(map.size, 0.0);
        let mut indirect = Matrix::new(map.size, false);
        light.set(origin, 1.0);
        ripple_with_limit(&map, &mut light, &mut indirect, origin, 4.0, Radius::Diamond,
                          Looseness::Normal, None, 1);

        // Only the origin was expanded, lighting its eight neighbors.
        assert_eq!(lit(&light), 9);
        assert!(light.data.iter().all(|&x| (0.0..=1.0).contains(&x)));
        assert!((light.get(Point(4, 5)) - 0.75).abs() < 1e-9);
        assert!((light.get(Point(5, 5)) - 0.5).abs() < 1e-9);
        assert_eq!(light.get(Point(4, 6)), 0.0);

        let full = run(&map, origin, 4.0, Radius::Diamond, Looseness::Normal, None);
        assert!(full.get(Point(4, 6)) > 0.0);
    }

    #[test]
    fn test_looseness_parsing() {
        assert_eq!(Looseness::from_neighbors(6).unwrap(), Looseness::VeryLoose);
        assert!(matches!(Looseness::from_neighbors(4), Err(VisionError::InvalidLooseness(4))));
        assert_eq!("very-loose".parse::<Looseness>().unwrap(), Looseness::VeryLoose);
        assert_eq!("Tight".parse::<Looseness>().unwrap(), Looseness::Tight);
        for looseness in ALL {
            assert_eq!(Looseness::from_neighbors(looseness.neighbors()).unwrap(), looseness);
        }
    }
}
