use crate::base::{LightMap, Point};

/// Light below this in an LOS map counts as unseen.
pub const VISIBLE_THRESHOLD: f64 = 0.0001;

fn overlap(a: &LightMap, b: &LightMap) -> Point {
    Point(a.width().min(b.width()), a.height().min(b.height()))
}

/// Adds `addend` into `basis` cell by cell, clamping each sum to 1.0. Only
/// the region both maps cover is touched.
pub fn add_into(basis: &mut LightMap, addend: &LightMap) {
    let Point(width, height) = overlap(basis, addend);
    for y in 0..height {
        for x in 0..width {
            let point = Point(x, y);
            let sum = basis.get(point) + addend.get(point);
            basis.set(point, sum.min(1.0));
        }
    }
}

/// Sums any number of light maps into a new map the size of the first,
/// clamped to 1.0. No maps gives an empty map.
pub fn add_all<'a>(maps: impl IntoIterator<Item = &'a LightMap>) -> LightMap {
    let mut maps = maps.into_iter();
    let Some(first) = maps.next() else { return LightMap::default(); };
    let mut result = LightMap::new(first.size, 0.0);
    add_into(&mut result, first);
    for map in maps { add_into(&mut result, map); }
    result
}

/// Sums light maps like [`add_all`], but only into cells that `los` can see.
/// `los` is typically an unbounded LOS map from the viewer, so light from
/// sources the viewer cannot see directly still shows where it lands in
/// view. An empty `los` gates nothing.
pub fn mix_visible<'a>(los: &LightMap, maps: impl IntoIterator<Item = &'a LightMap>)
                       -> LightMap {
    if los.is_empty() { return add_all(maps); }
    let mut result = LightMap::new(los.size, 0.0);
    for map in maps {
        let Point(width, height) = overlap(&result, map);
        for y in 0..height {
            for x in 0..width {
                let point = Point(x, y);
                if los.get(point) <= VISIBLE_THRESHOLD { continue; }
                let sum = result.get(point) + map.get(point);
                result.set(point, sum.min(1.0));
            }
        }
    }
    result
}

//////////////////////////////////////////////////////////////////////////////
