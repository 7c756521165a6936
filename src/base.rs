use std::ops::{Add, Sub};

//////////////////////////////////////////////////////////////////////////////

// Point

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct Point(pub i32, pub i32);

impl Point {
    pub fn abs(&self) -> Point {
        Point(self.0.abs(), self.1.abs())
    }

    pub fn signum(&self) -> Point {
        Point(self.0.signum(), self.1.signum())
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, other: Point) -> Point {
        Point(self.0 + other.0, self.1 + other.1)
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, other: Point) -> Point {
        Point(self.0 - other.0, self.1 - other.1)
    }
}

//////////////////////////////////////////////////////////////////////////////

// Directions

pub const UP: Point = Point(0, -1);
pub const DOWN: Point = Point(0, 1);
pub const LEFT: Point = Point(-1, 0);
pub const RIGHT: Point = Point(1, 0);
pub const UP_LEFT: Point = Point(-1, -1);
pub const UP_RIGHT: Point = Point(1, -1);
pub const DOWN_LEFT: Point = Point(-1, 1);
pub const DOWN_RIGHT: Point = Point(1, 1);

// Orthogonals first, then diagonals. Ripple relies on this order to break
// distance ties between neighbors.
pub const OUTWARDS: [Point; 8] =
    [UP, DOWN, LEFT, RIGHT, UP_LEFT, UP_RIGHT, DOWN_LEFT, DOWN_RIGHT];

//////////////////////////////////////////////////////////////////////////////

// Matrix

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Matrix<T> {
    pub data: Vec<T>,
    pub size: Point,
    pub default: T,
}

/// Per-cell opacity: 0.0 is fully transparent, 1.0 or more blocks entirely.
pub type ResistanceMap = Matrix<f64>;

/// Per-cell brightness in [0, 1].
pub type LightMap = Matrix<f64>;

// SAFETY: Non-none index() results are always valid indices into data.
impl<T: Clone> Matrix<T> {
    pub fn new(size: Point, value: T) -> Self {
        assert!(0 <= size.0);
        assert!(0 <= size.1);
        let mut data = Vec::new();
        data.resize((size.0 * size.1) as usize, value.clone());
        Self { data, size, default: value }
    }

    pub fn from_fn(size: Point, default: T, mut f: impl FnMut(Point) -> T) -> Self {
        let mut result = Self::new(size, default);
        for y in 0..size.1 {
            for x in 0..size.0 {
                let point = Point(x, y);
                result.set(point, f(point));
            }
        }
        result
    }

    pub fn width(&self) -> i32 { self.size.0 }

    pub fn height(&self) -> i32 { self.size.1 }

    pub fn is_empty(&self) -> bool {
        self.size.0 == 0 || self.size.1 == 0
    }

    pub fn get(&self, point: Point) -> T {
        let Some(x) = self.index(point) else { return self.default.clone(); };
        unsafe { self.data.get_unchecked(x).clone() }
    }

    pub fn set(&mut self, point: Point, value: T) {
        let Some(x) = self.index(point) else { return; };
        unsafe { *self.data.get_unchecked_mut(x) = value; }
    }

    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }

    /// Refills every cell with `value`, reallocating only if `size` changed.
    pub fn reset(&mut self, size: Point, value: T) {
        if self.size == size {
            self.fill(value);
        } else {
            *self = Self::new(size, value);
        }
    }

    #[inline(always)]
    pub fn contains(&self, point: Point) -> bool {
        let Point(px, py) = point;
        let Point(sx, sy) = self.size;
        0 <= px && px < sx && 0 <= py && py < sy
    }

    #[inline(always)]
    pub fn index(&self, point: Point) -> Option<usize> {
        if !self.contains(point) { return None; }
        Some((point.0 + point.1 * self.size.0) as usize)
    }
}

/// Builds a resistance map from rows of text where `#` is a wall and every
/// other character is open floor. Short rows are padded with floor.
pub fn resistance_from_chars<S: AsRef<str>>(rows: &[S]) -> ResistanceMap {
    let height = rows.len() as i32;
    let width = rows.iter().map(|x| x.as_ref().chars().count()).max().unwrap_or(0) as i32;
    let mut result = Matrix::new(Point(width, height), 0.0);
    for (y, row) in rows.iter().enumerate() {
        for (x, c) in row.as_ref().chars().enumerate() {
            if c == '#' { result.set(Point(x as i32, y as i32), 1.0); }
        }
    }
    result
}

//////////////////////////////////////////////////////////////////////////////
