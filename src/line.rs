use std::collections::HashSet;
use std::str::FromStr;

use crate::base::Point;
use crate::error::VisionError;

//////////////////////////////////////////////////////////////////////////////

// Line

/// A line rasterizer. Every variant traces from `from` to `to` inclusive of
/// both ends; they differ in which cells they pick in between.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Line {
    #[default]
    Bresenham,
    Dda,
    Ortho,
    Ray,
    Thick,
}

impl Line {
    pub fn trace(&self, from: Point, to: Point) -> Vec<Point> {
        match self {
            Line::Bresenham => bresenham(from, to),
            Line::Dda => dda(from, to),
            Line::Ortho => ortho(from, to),
            Line::Ray => ray(from, to),
            Line::Thick => thick(from, to),
        }
    }
}

impl FromStr for Line {
    type Err = VisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bresenham" => Ok(Line::Bresenham),
            "dda" => Ok(Line::Dda),
            "ortho" | "orthogonal" => Ok(Line::Ortho),
            "ray" => Ok(Line::Ray),
            "thick" => Ok(Line::Thick),
            _ => Err(VisionError::UnknownAlgorithm(s.to_owned())),
        }
    }
}

//////////////////////////////////////////////////////////////////////////////

// Rasterizers

/// Integer-error Bresenham line. Consecutive cells touch at least diagonally.
pub fn bresenham(from: Point, to: Point) -> Vec<Point> {
    let Point(dx, dy) = (to - from).abs();
    let (dx, dy) = (dx, -dy);
    let sx = if from.0 < to.0 { 1 } else { -1 };
    let sy = if from.1 < to.1 { 1 } else { -1 };

    let mut result = Vec::with_capacity((dx - dy + 1) as usize);
    let mut point = from;
    let mut error = dx + dy;
    loop {
        result.push(point);
        if point == to { return result; }
        let e2 = 2 * error;
        if e2 >= dy {
            error += dy;
            point.0 += sx;
        }
        if e2 <= dx {
            error += dx;
            point.1 += sy;
        }
    }
}

/// Sub-cell offset that samples each minor-axis step at the cell center.
pub const DDA_CENTER: i32 = 0x7fff;

/// Fixed-point DDA line with the minor axis sampled through the centers of
/// cells.
pub fn dda(from: Point, to: Point) -> Vec<Point> {
    dda_with(from, to, DDA_CENTER, DDA_CENTER)
}

/// Fixed-point DDA line. The minor coordinate is tracked in 16.16 fixed
/// point; `modifier_x` and `modifier_y` are sub-cell offsets (0..0x10000)
/// added before truncating, which shifts the line within its cells.
pub fn dda_with(from: Point, to: Point, modifier_x: i32, modifier_y: i32) -> Vec<Point> {
    let delta = to - from;
    let Point(nx, ny) = delta.abs();
    let Point(sx, sy) = delta.signum();
    if nx == 0 && ny == 0 { return vec![from]; }

    let (major, minor, modifier) =
        if nx >= ny { (nx, ny, modifier_y) } else { (ny, nx, modifier_x) };
    let step = ((minor as i64) << 16) / major as i64;

    let mut fraction = 0_i64;
    let mut result = Vec::with_capacity(major as usize + 1);
    for i in 0..=major {
        let shift = ((fraction + modifier as i64) >> 16) as i32;
        let point = if nx >= ny {
            Point(from.0 + i * sx, from.1 + shift * sy)
        } else {
            Point(from.0 + shift * sx, from.1 + i * sy)
        };
        result.push(point);
        fraction += step;
    }
    result
}

/// Line that only takes orthogonal steps, so consecutive cells always share
/// an edge. Traces |dx| + |dy| + 1 cells.
pub fn ortho(from: Point, to: Point) -> Vec<Point> {
    let delta = to - from;
    let Point(nx, ny) = delta.abs();
    let Point(sx, sy) = delta.signum();

    let mut result = Vec::with_capacity((nx + ny + 1) as usize);
    let mut point = from;
    let (mut ix, mut iy) = (0_i64, 0_i64);
    let (nx, ny) = (nx as i64, ny as i64);
    result.push(point);
    while ix < nx || iy < ny {
        // Step along x while its next half-cell crossing comes first.
        if (1 + 2 * ix) * ny < (1 + 2 * iy) * nx {
            point.0 += sx;
            ix += 1;
        } else {
            point.1 += sy;
            iy += 1;
        }
        result.push(point);
    }
    result
}

/// Integer ray walk. Each step moves along x, along y, or diagonally,
/// whichever keeps the accumulated error on each axis in balance.
pub fn ray(from: Point, to: Point) -> Vec<Point> {
    let delta = to - from;
    let Point(nx, ny) = delta.abs();
    let Point(sx, sy) = delta.signum();

    let mut result = Vec::with_capacity((nx + ny + 1) as usize);
    let mut point = from;
    let (mut tx, mut ty) = (ny, nx);
    result.push(point);
    while point != to && result.len() <= (nx + ny) as usize {
        if ty - tx > ny {
            tx += ny;
            point.0 += sx;
        } else if tx - ty > nx {
            ty += nx;
            point.1 += sy;
        } else {
            tx += ny;
            ty += nx;
            point = point + Point(sx, sy);
        }
        result.push(point);
    }
    result
}

/// Modifier pairs for the four quarter-offset sub-paths of a thick line.
pub const THICK_OFFSETS: [(i32, i32); 4] =
    [(0x3fff, 0x3fff), (0x3fff, 0xbfff), (0xbfff, 0x3fff), (0xbfff, 0xbfff)];

/// The four DDA sub-paths of a thick line, each shifted a quarter cell
/// toward a different corner.
pub fn thick_paths(from: Point, to: Point) -> [Vec<Point>; 4] {
    THICK_OFFSETS.map(|(mx, my)| dda_with(from, to, mx, my))
}

/// Union of the four thick sub-paths, ordered by step then by sub-path.
pub fn thick(from: Point, to: Point) -> Vec<Point> {
    let paths = thick_paths(from, to);
    let length = paths.iter().map(|x| x.len()).max().unwrap_or(0);
    let mut seen = HashSet::new();
    let mut result = vec![];
    for i in 0..length {
        for path in &paths {
            let Some(&point) = path.get(i) else { continue; };
            if seen.insert(point) { result.push(point); }
        }
    }
    result
}

//////////////////////////////////////////////////////////////////////////////
