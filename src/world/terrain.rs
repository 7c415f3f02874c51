//! Spatial resource model: per-cell soup, pollution, elevation and flood.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::mapgen::InitialMap;

/// A grid location in world coordinates.
///
/// World coordinates are offset by the map origin, so `x`/`y` are not
/// directly usable as array indices; [`Terrain`] performs the translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Loc {
    /// X coordinate (column).
    pub x: i32,
    /// Y coordinate (row).
    pub y: i32,
}

impl Loc {
    /// Create a new location.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Chebyshev distance to another location.
    ///
    /// Adjacency, sensor ranges and pickup/shoot ranges all use this
    /// metric: diagonal steps count the same as orthogonal ones.
    #[must_use]
    pub fn distance(self, other: Self) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }

    /// Check whether another location lies within `radius` cells.
    #[must_use]
    pub fn is_within(self, other: Self, radius: i32) -> bool {
        self.distance(other) <= radius
    }
}

impl fmt::Display for Loc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Per-cell resource and terrain state over a fixed rectangular grid.
///
/// Grid bounds are immutable for the match lifetime. All reads accept
/// off-grid locations and answer with a zero/false sentinel; mutation of
/// an off-grid cell is a silent no-op, mirroring the read sentinels.
#[derive(Debug, Clone)]
pub struct Terrain {
    width: i32,
    height: i32,
    origin: Loc,
    water_level: i32,
    soup: Vec<u32>,
    pollution: Vec<u32>,
    dirt: Vec<i32>,
    flood: Vec<bool>,
}

impl Terrain {
    /// Build terrain from validated initial map data.
    #[must_use]
    pub fn from_map(map: &InitialMap) -> Self {
        Self {
            width: map.width,
            height: map.height,
            origin: map.origin,
            water_level: map.water_level,
            soup: map.soup.clone(),
            pollution: map.pollution.clone(),
            dirt: map.dirt.clone(),
            flood: map.flood.clone(),
        }
    }

    /// Grid width in cells.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.width
    }

    /// Grid height in cells.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.height
    }

    /// World coordinate of the south-west corner cell.
    #[must_use]
    pub const fn origin(&self) -> Loc {
        self.origin
    }

    /// The fixed water level flood state derives from.
    #[must_use]
    pub const fn water_level(&self) -> i32 {
        self.water_level
    }

    /// Check whether a location is on the grid.
    #[must_use]
    pub const fn on_grid(&self, loc: Loc) -> bool {
        loc.x >= self.origin.x
            && loc.y >= self.origin.y
            && loc.x < self.origin.x + self.width
            && loc.y < self.origin.y + self.height
    }

    #[allow(clippy::cast_sign_loss)]
    fn index(&self, loc: Loc) -> Option<usize> {
        if self.on_grid(loc) {
            let col = loc.x - self.origin.x;
            let row = loc.y - self.origin.y;
            Some((row * self.width + col) as usize)
        } else {
            None
        }
    }

    /// Soup at a location; 0 off the grid.
    #[must_use]
    pub fn soup(&self, loc: Loc) -> u32 {
        self.index(loc).map_or(0, |idx| self.soup[idx])
    }

    /// Pollution at a location; 0 off the grid.
    #[must_use]
    pub fn pollution(&self, loc: Loc) -> u32 {
        self.index(loc).map_or(0, |idx| self.pollution[idx])
    }

    /// Elevation at a location; 0 off the grid.
    #[must_use]
    pub fn elevation(&self, loc: Loc) -> i32 {
        self.index(loc).map_or(0, |idx| self.dirt[idx])
    }

    /// Flood state at a location; `false` off the grid.
    #[must_use]
    pub fn flooded(&self, loc: Loc) -> bool {
        self.index(loc).is_some_and(|idx| self.flood[idx])
    }

    /// Absolute elevation difference between two locations.
    ///
    /// Gates ground movement: a step is legal only when the gap is small.
    #[must_use]
    pub fn elevation_gap(&self, a: Loc, b: Loc) -> i32 {
        (self.elevation(a) - self.elevation(b)).abs()
    }

    /// Remove up to `amount` soup from a cell, flooring at zero.
    pub fn remove_soup(&mut self, loc: Loc, amount: u32) {
        if let Some(idx) = self.index(loc) {
            self.soup[idx] = self.soup[idx].saturating_sub(amount);
        }
    }

    /// Adjust pollution by a signed delta, flooring at zero.
    ///
    /// Returns the delta actually applied, which differs from the request
    /// when the floor clamps it. The caller reports the applied delta to
    /// the replay writer.
    #[allow(clippy::cast_possible_wrap)]
    pub fn adjust_pollution(&mut self, loc: Loc, delta: i32) -> i32 {
        let Some(idx) = self.index(loc) else {
            return 0;
        };
        let old = self.pollution[idx];
        let new = old.saturating_add_signed(delta);
        self.pollution[idx] = new;
        new as i32 - old as i32
    }

    /// Accumulate elevation at a cell (signed, unbounded).
    ///
    /// The cell's flood flag is re-derived from the new elevation against
    /// the fixed water level.
    pub fn add_dirt(&mut self, loc: Loc, delta: i32) {
        if let Some(idx) = self.index(loc) {
            self.dirt[idx] += delta;
            self.flood[idx] = self.dirt[idx] < self.water_level;
        }
    }

    /// All on-grid locations within `radius` cells of `center`.
    ///
    /// Iteration order is row-major and therefore deterministic.
    #[must_use]
    pub fn locations_within(&self, center: Loc, radius: i32) -> Vec<Loc> {
        if radius < 0 {
            return Vec::new();
        }
        let min_x = (center.x - radius).max(self.origin.x);
        let min_y = (center.y - radius).max(self.origin.y);
        let max_x = (center.x + radius).min(self.origin.x + self.width - 1);
        let max_y = (center.y + radius).min(self.origin.y + self.height - 1);

        let mut out = Vec::new();
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                out.push(Loc::new(x, y));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapgen::MapBuilder;

    fn flat_terrain() -> Terrain {
        let map = MapBuilder::new("flat", 8, 8, 7).build().unwrap();
        Terrain::from_map(&map)
    }

    #[test]
    fn test_off_grid_sentinels() {
        let terrain = flat_terrain();
        let off = Loc::new(-1, 3);
        assert_eq!(terrain.soup(off), 0);
        assert_eq!(terrain.pollution(off), 0);
        assert_eq!(terrain.elevation(off), 0);
        assert!(!terrain.flooded(off));
        assert!(!terrain.on_grid(off));
        assert!(terrain.on_grid(Loc::new(0, 0)));
        assert!(terrain.on_grid(Loc::new(7, 7)));
        assert!(!terrain.on_grid(Loc::new(8, 0)));
    }

    #[test]
    fn test_soup_floors_at_zero() {
        let mut builder = MapBuilder::new("soupy", 4, 4, 1);
        builder.set_soup(2, 2, 1);
        let mut terrain = Terrain::from_map(&builder.build().unwrap());

        let loc = Loc::new(2, 2);
        terrain.remove_soup(loc, 1);
        assert_eq!(terrain.soup(loc), 0);
        terrain.remove_soup(loc, 5);
        assert_eq!(terrain.soup(loc), 0);
    }

    #[test]
    fn test_pollution_clamp_reports_applied_delta() {
        let mut terrain = flat_terrain();
        let loc = Loc::new(1, 1);

        assert_eq!(terrain.adjust_pollution(loc, 10), 10);
        assert_eq!(terrain.pollution(loc), 10);

        // Requesting -25 from 10 only applies -10.
        assert_eq!(terrain.adjust_pollution(loc, -25), -10);
        assert_eq!(terrain.pollution(loc), 0);

        // Off the grid nothing is applied.
        assert_eq!(terrain.adjust_pollution(Loc::new(-3, 0), 5), 0);
    }

    #[test]
    fn test_dirt_recomputes_flood() {
        let mut builder = MapBuilder::new("wet", 4, 4, 1);
        builder.set_water_level(0);
        let mut terrain = Terrain::from_map(&builder.build().unwrap());

        let loc = Loc::new(0, 0);
        assert!(!terrain.flooded(loc));
        terrain.add_dirt(loc, -2);
        assert_eq!(terrain.elevation(loc), -2);
        assert!(terrain.flooded(loc));
        terrain.add_dirt(loc, 3);
        assert!(!terrain.flooded(loc));
    }

    #[test]
    fn test_elevation_gap() {
        let mut terrain = flat_terrain();
        terrain.add_dirt(Loc::new(0, 0), 5);
        terrain.add_dirt(Loc::new(0, 1), -1);
        assert_eq!(terrain.elevation_gap(Loc::new(0, 0), Loc::new(0, 1)), 6);
    }

    #[test]
    fn test_locations_within_clips_to_grid() {
        let terrain = flat_terrain();
        let locs = terrain.locations_within(Loc::new(0, 0), 1);
        assert_eq!(locs.len(), 4);
        assert!(locs.contains(&Loc::new(1, 1)));

        let locs = terrain.locations_within(Loc::new(4, 4), 1);
        assert_eq!(locs.len(), 9);

        assert!(terrain.locations_within(Loc::new(4, 4), -1).is_empty());
    }

    #[test]
    fn test_chebyshev_distance() {
        let a = Loc::new(3, 3);
        assert_eq!(a.distance(Loc::new(4, 4)), 1);
        assert_eq!(a.distance(Loc::new(3, 3)), 0);
        assert_eq!(a.distance(Loc::new(0, 5)), 3);
        assert!(a.is_within(Loc::new(4, 2), 1));
        assert!(!a.is_within(Loc::new(5, 3), 1));
    }
}
