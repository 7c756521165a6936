use std::collections::HashSet;
use std::str::FromStr;

use log::trace;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::base::{Point, ResistanceMap};
use crate::error::{check_map, VisionError};
use crate::line::{self, Line, THICK_OFFSETS};
use crate::radius::Radius;

//////////////////////////////////////////////////////////////////////////////

// LosKind

/// Which line an [`Los`] engine walks from start to target.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LosKind {
    #[default]
    Bresenham,
    Dda,
    Ortho,
    /// Stops at the first wall. Partial resistance is ignored.
    Ray,
    /// Four quarter-offset DDA lines; reachable if any one arrives.
    Thick,
    /// Reachable if some open cell near the line sees both ends.
    Midpoint,
}

impl FromStr for LosKind {
    type Err = VisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("midpoint") { return Ok(LosKind::Midpoint); }
        let line = s.parse::<Line>()?;
        Ok(match line {
            Line::Bresenham => LosKind::Bresenham,
            Line::Dda => LosKind::Dda,
            Line::Ortho => LosKind::Ortho,
            Line::Ray => LosKind::Ray,
            Line::Thick => LosKind::Thick,
        })
    }
}

//////////////////////////////////////////////////////////////////////////////

// Force

// Sight starts with force 1. Each cell after the start drains its
// resistance, and force must stay above the fraction of the distance
// covered so far. The target drains too, so an opaque target is never seen.
#[derive(Clone, Copy)]
struct Force<'a> {
    map: &'a ResistanceMap,
    start: Point,
    target: Point,
    metric: Radius,
    decay: f64,
}

enum Step {
    Arrived,
    Blocked,
    Continue(f64),
}

impl<'a> Force<'a> {
    fn new(map: &'a ResistanceMap, start: Point, target: Point, metric: Radius,
           extra: f64) -> Self {
        let decay = 1.0 / (metric.between(start, target) + extra);
        Self { map, start, target, metric, decay }
    }

    fn step(&self, force: f64, point: Point) -> Step {
        let force = if point == self.start { force } else { force - self.map.get(point) };
        if point == self.target {
            return if force > 0.0 { Step::Arrived } else { Step::Blocked };
        }
        if force - self.metric.between(self.start, point) * self.decay <= 0.0 {
            return Step::Blocked;
        }
        Step::Continue(force)
    }
}

// Insertion-ordered set of the cells a multi-line walk passed through.
#[derive(Default)]
struct Visited {
    seen: HashSet<Point>,
    cells: Vec<Point>,
}

impl Visited {
    fn insert(&mut self, point: Point) {
        if self.seen.insert(point) { self.cells.push(point); }
    }
}

// Walks several paths in lockstep, one cell per path per step. Returns
// whether any path arrived, plus every cell some path passed. If `stop` is
// set, returns as soon as a path arrives.
fn walk_all(force: Force, paths: &[Vec<Point>], stop: bool) -> (bool, Vec<Point>) {
    let length = paths.iter().map(|x| x.len()).max().unwrap_or(0);
    let mut forces = vec![Some(1.0); paths.len()];
    let mut visited = Visited::default();
    let mut found = false;

    for i in 0..length {
        for (path, remaining) in paths.iter().zip(forces.iter_mut()) {
            let (Some(&point), Some(current)) = (path.get(i), *remaining) else { continue; };
            match force.step(current, point) {
                Step::Arrived => {
                    found = true;
                    visited.insert(point);
                    if stop { return (true, visited.cells); }
                    *remaining = None;
                }
                Step::Blocked => *remaining = None,
                Step::Continue(next) => {
                    *remaining = Some(next);
                    visited.insert(point);
                }
            }
        }
    }
    (found, visited.cells)
}

//////////////////////////////////////////////////////////////////////////////

// Los

/// A line-of-sight engine. Each query records the cells it traced, available
/// from [`Los::last_path`] until the next query.
#[derive(Clone, Debug, Default)]
pub struct Los {
    kind: LosKind,
    metric: Radius,
    last_path: Vec<Point>,
}

impl Los {
    pub fn new(kind: LosKind) -> Self {
        Self { kind, metric: Radius::default(), last_path: vec![] }
    }

    pub fn with_metric(mut self, metric: Radius) -> Self {
        self.metric = metric;
        self
    }

    pub fn kind(&self) -> LosKind { self.kind }

    pub fn metric(&self) -> Radius { self.metric }

    pub fn last_path(&self) -> &[Point] { &self.last_path }

    /// True if `target` can be seen from `start`, using the engine's metric.
    pub fn is_reachable(&mut self, map: &ResistanceMap, start: Point, target: Point)
                        -> Result<bool, VisionError> {
        self.is_reachable_with(map, start, target, self.metric)
    }

    /// True if `target` can be seen from `start`, measuring the falloff of
    /// sight with `metric`. A point always sees itself. Otherwise an endpoint
    /// off the map is unreachable.
    pub fn is_reachable_with(&mut self, map: &ResistanceMap, start: Point, target: Point,
                             metric: Radius) -> Result<bool, VisionError> {
        check_map(map)?;
        trace!("{:?} los {:?} -> {:?}", self.kind, start, target);
        Ok(self.reach(map, start, target, metric))
    }

    /// Brush-stroke reachability. Traces four quarter-offset DDA lines from
    /// every offset within `spread` of the start (by `metric`) to the same
    /// offset from the target, skipping offsets that leave the map at either
    /// end. True if any line arrives at the target itself; the last path is
    /// every cell the lines passed through.
    pub fn spread_reachable(&mut self, map: &ResistanceMap, start: Point, target: Point,
                            metric: Radius, spread: i32) -> Result<bool, VisionError> {
        check_map(map)?;
        trace!("brush los {:?} -> {:?}, spread {}", start, target, spread);
        self.last_path.clear();
        if start == target {
            self.last_path.push(start);
            return Ok(true);
        }
        if !map.contains(start) || !map.contains(target) { return Ok(false); }

        let spread = spread.max(0);
        let mut paths = vec![];
        for dy in -spread..=spread {
            for dx in -spread..=spread {
                let offset = Point(dx, dy);
                let (from, to) = (start + offset, target + offset);
                if !metric.in_range(start, from, 0, spread) { continue; }
                if !map.contains(from) || !map.contains(to) { continue; }
                paths.extend(THICK_OFFSETS.map(|(mx, my)| line::dda_with(from, to, mx, my)));
            }
        }

        let force = Force::new(map, start, target, metric, 2.0 * spread as f64);
        let (found, visited) = walk_all(force, &paths, false);
        self.last_path = visited;
        Ok(found)
    }

    fn reach(&mut self, map: &ResistanceMap, start: Point, target: Point,
             metric: Radius) -> bool {
        self.last_path.clear();
        if start == target {
            self.last_path.push(start);
            return true;
        }
        if !map.contains(start) || !map.contains(target) { return false; }

        let force = Force::new(map, start, target, metric, 0.0);
        match self.kind {
            LosKind::Bresenham => self.single(force, line::bresenham(start, target)),
            LosKind::Dda => self.single(force, line::dda(start, target)),
            LosKind::Ortho => self.single(force, line::ortho(start, target)),
            LosKind::Ray => self.ray(map, start, target),
            LosKind::Thick => {
                let (found, visited) = walk_all(force, &line::thick_paths(start, target), true);
                self.last_path = visited;
                found
            }
            LosKind::Midpoint => self.midpoint(map, start, target, metric),
        }
    }

    // The last path ends at the cell that stopped sight, if any.
    fn single(&mut self, force: Force, path: Vec<Point>) -> bool {
        let mut current = 1.0;
        for point in path {
            self.last_path.push(point);
            match force.step(current, point) {
                Step::Arrived => return true,
                Step::Blocked => return false,
                Step::Continue(next) => current = next,
            }
        }
        false
    }

    fn ray(&mut self, map: &ResistanceMap, start: Point, target: Point) -> bool {
        for point in line::ray(start, target) {
            self.last_path.push(point);
            if point != start && map.get(point) >= 1.0 { return false; }
            if point == target { return true; }
        }
        false
    }

    // Candidate pivots are evaluated in parallel; the first success in line
    // order wins, so the result does not depend on scheduling.
    fn midpoint(&mut self, map: &ResistanceMap, start: Point, target: Point,
                metric: Radius) -> bool {
        let limit = metric.between(start, target);
        let pivots = line::thick(start, target);
        let found = pivots.par_iter().find_map_first(|&pivot| {
            if map.get(pivot) >= 1.0 || metric.between(start, pivot) > limit { return None; }
            let mut first = Los::new(LosKind::Bresenham);
            let mut second = Los::new(LosKind::Bresenham);
            if !first.reach(map, start, pivot, metric) { return None; }
            if !second.reach(map, pivot, target, metric) { return None; }
            let mut path = first.last_path;
            path.extend(second.last_path.into_iter().skip(1));
            Some(path)
        });
        match found {
            Some(path) => {
                self.last_path = path;
                true
            }
            None => {
                self.last_path = line::bresenham(start, target);
                false
            }
        }
    }
}

//////////////////////////////////////////////////////////////////////////////
