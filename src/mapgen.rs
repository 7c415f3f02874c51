//! Initial map construction, validation, generation and file I/O.

// Map generation uses intentional casts for coordinate/RNG operations
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss
)]

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::world::{Loc, Team, UnitKind};

/// Default number of rounds before the time-limit tie-break.
pub const DEFAULT_ROUND_LIMIT: u32 = 500;

/// Default starting soup balance per player team.
pub const DEFAULT_STARTING_SOUP: u32 = 200;

/// An initial unit placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    /// Owning team.
    pub team: Team,
    /// Unit kind to spawn.
    pub kind: UnitKind,
    /// Spawn cell. No two placements may share a cell.
    pub loc: Loc,
}

/// Complete initial state for a match.
///
/// Arrays are row-major, sized `width * height`, addressed relative to
/// `origin`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitialMap {
    /// Human-readable map name.
    pub name: String,
    /// Grid width in cells.
    pub width: i32,
    /// Grid height in cells.
    pub height: i32,
    /// World coordinate of the south-west corner cell.
    pub origin: Loc,
    /// Seed recorded for reproducibility.
    pub seed: u64,
    /// Round limit for the time-limit tie-break.
    pub round_limit: u32,
    /// Fixed water level that flood state derives from.
    pub water_level: i32,
    /// Starting soup balance per player team.
    pub starting_soup: u32,
    /// Initial soup per cell.
    pub soup: Vec<u32>,
    /// Initial pollution per cell.
    pub pollution: Vec<u32>,
    /// Initial elevation per cell.
    pub dirt: Vec<i32>,
    /// Initial flood state per cell.
    pub flood: Vec<bool>,
    /// Initial unit placements.
    pub placements: Vec<Placement>,
}

impl InitialMap {
    /// Check structural validity: positive dimensions, correctly sized
    /// arrays, a positive round limit, and on-grid, non-overlapping
    /// placements.
    ///
    /// # Errors
    ///
    /// Returns a [`MapError`] describing the first violation found.
    pub fn validate(&self) -> Result<(), MapError> {
        if self.width <= 0 || self.height <= 0 {
            return Err(MapError::new(format!(
                "map dimensions must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        let cells = (self.width as usize) * (self.height as usize);
        if self.soup.len() != cells
            || self.pollution.len() != cells
            || self.dirt.len() != cells
            || self.flood.len() != cells
        {
            return Err(MapError::new(format!(
                "terrain arrays must hold exactly {cells} cells"
            )));
        }
        if self.round_limit == 0 {
            return Err(MapError::new("round limit must be positive".to_string()));
        }
        for (i, placement) in self.placements.iter().enumerate() {
            let loc = placement.loc;
            let on_grid = loc.x >= self.origin.x
                && loc.y >= self.origin.y
                && loc.x < self.origin.x + self.width
                && loc.y < self.origin.y + self.height;
            if !on_grid {
                return Err(MapError::new(format!(
                    "placement {i} at {loc} is off the grid"
                )));
            }
            if self.placements[..i].iter().any(|other| other.loc == loc) {
                return Err(MapError::new(format!(
                    "placements share the cell {loc}"
                )));
            }
        }
        Ok(())
    }

    /// Save the map as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns a [`MapError`] if serialization or file I/O fails.
    pub fn save(&self, path: &Path) -> Result<(), MapError> {
        let text = serde_json::to_string_pretty(self)
            .map_err(|e| MapError::new(format!("failed to encode map: {e}")))?;
        fs::write(path, text).map_err(|e| MapError::new(format!("failed to write map: {e}")))
    }

    /// Load and validate a map from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns a [`MapError`] if reading, decoding, or validation fails.
    pub fn load(path: &Path) -> Result<Self, MapError> {
        let text =
            fs::read_to_string(path).map_err(|e| MapError::new(format!("failed to read map: {e}")))?;
        let map: Self = serde_json::from_str(&text)
            .map_err(|e| MapError::new(format!("failed to decode map: {e}")))?;
        map.validate()?;
        Ok(map)
    }
}

/// Error raised while building, loading or validating a map.
#[derive(Debug, Clone)]
pub struct MapError {
    /// Description of the problem.
    pub reason: String,
}

impl MapError {
    /// Create a new map error.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for MapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "map error: {}", self.reason)
    }
}

impl std::error::Error for MapError {}

/// Incremental map builder with symmetry helpers.
///
/// Builder coordinates are grid-local (origin at `(0, 0)`); out-of-range
/// setters return `false` and change nothing.
#[derive(Debug, Clone)]
pub struct MapBuilder {
    name: String,
    width: i32,
    height: i32,
    seed: u64,
    round_limit: u32,
    water_level: i32,
    starting_soup: u32,
    soup: Vec<u32>,
    pollution: Vec<u32>,
    dirt: Vec<i32>,
    flood: Vec<bool>,
    placements: Vec<Placement>,
}

impl MapBuilder {
    /// Start a builder for a flat, dry, empty map.
    #[must_use]
    pub fn new(name: &str, width: i32, height: i32, seed: u64) -> Self {
        let cells = (width.max(0) as usize) * (height.max(0) as usize);
        Self {
            name: name.to_string(),
            width,
            height,
            seed,
            round_limit: DEFAULT_ROUND_LIMIT,
            water_level: 0,
            starting_soup: DEFAULT_STARTING_SOUP,
            soup: vec![0; cells],
            pollution: vec![0; cells],
            dirt: vec![1; cells],
            flood: vec![false; cells],
            placements: Vec::new(),
        }
    }

    /// Set the round limit.
    pub fn set_round_limit(&mut self, round_limit: u32) {
        self.round_limit = round_limit;
    }

    /// Set the fixed water level.
    pub fn set_water_level(&mut self, water_level: i32) {
        self.water_level = water_level;
    }

    /// Set the starting soup balance for both player teams.
    pub fn set_starting_soup(&mut self, starting_soup: u32) {
        self.starting_soup = starting_soup;
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x >= 0 && y >= 0 && x < self.width && y < self.height {
            Some((y * self.width + x) as usize)
        } else {
            None
        }
    }

    /// Set soup at a cell. Returns `false` out of range.
    pub fn set_soup(&mut self, x: i32, y: i32, value: u32) -> bool {
        self.index(x, y).is_some_and(|idx| {
            self.soup[idx] = value;
            true
        })
    }

    /// Set pollution at a cell. Returns `false` out of range.
    pub fn set_pollution(&mut self, x: i32, y: i32, value: u32) -> bool {
        self.index(x, y).is_some_and(|idx| {
            self.pollution[idx] = value;
            true
        })
    }

    /// Set elevation at a cell. Returns `false` out of range.
    pub fn set_dirt(&mut self, x: i32, y: i32, value: i32) -> bool {
        self.index(x, y).is_some_and(|idx| {
            self.dirt[idx] = value;
            true
        })
    }

    /// Set flood state at a cell. Returns `false` out of range.
    pub fn set_flood(&mut self, x: i32, y: i32, value: bool) -> bool {
        self.index(x, y).is_some_and(|idx| {
            self.flood[idx] = value;
            true
        })
    }

    /// Place an initial unit.
    ///
    /// # Errors
    ///
    /// Fails if the cell is off the grid or already holds a placement.
    pub fn place(&mut self, team: Team, kind: UnitKind, x: i32, y: i32) -> Result<(), MapError> {
        if self.index(x, y).is_none() {
            return Err(MapError::new(format!("placement ({x}, {y}) is off the grid")));
        }
        let loc = Loc::new(x, y);
        if self.placements.iter().any(|p| p.loc == loc) {
            return Err(MapError::new(format!(
                "cannot place two units on the cell {loc}"
            )));
        }
        self.placements.push(Placement { team, kind, loc });
        Ok(())
    }

    /// X coordinate mirrored across the vertical centerline.
    #[must_use]
    pub const fn mirror_x(&self, x: i32) -> i32 {
        self.width - 1 - x
    }

    /// Place a Team A depot and its Team B mirror.
    ///
    /// # Errors
    ///
    /// Fails if either cell is off the grid or already placed on.
    pub fn place_symmetric_depots(&mut self, x: i32, y: i32) -> Result<(), MapError> {
        self.place(Team::A, UnitKind::Depot, x, y)?;
        self.place(Team::B, UnitKind::Depot, self.mirror_x(x), y)
    }

    /// Set soup at a cell and its mirror.
    pub fn set_symmetric_soup(&mut self, x: i32, y: i32, value: u32) -> bool {
        let mirrored = self.mirror_x(x);
        self.set_soup(x, y, value) && self.set_soup(mirrored, y, value)
    }

    /// Set elevation at a cell and its mirror.
    pub fn set_symmetric_dirt(&mut self, x: i32, y: i32, value: i32) -> bool {
        let mirrored = self.mirror_x(x);
        self.set_dirt(x, y, value) && self.set_dirt(mirrored, y, value)
    }

    /// Finish the map.
    ///
    /// # Errors
    ///
    /// Returns a [`MapError`] if the assembled map fails validation.
    pub fn build(&self) -> Result<InitialMap, MapError> {
        let map = InitialMap {
            name: self.name.clone(),
            width: self.width,
            height: self.height,
            origin: Loc::new(0, 0),
            seed: self.seed,
            round_limit: self.round_limit,
            water_level: self.water_level,
            starting_soup: self.starting_soup,
            soup: self.soup.clone(),
            pollution: self.pollution.clone(),
            dirt: self.dirt.clone(),
            flood: self.flood.clone(),
            placements: self.placements.clone(),
        };
        map.validate()?;
        Ok(map)
    }
}

/// Deterministic PRNG using xorshift64.
#[derive(Debug, Clone, Copy)]
struct Rng {
    state: u64,
}

impl Rng {
    const fn new(seed: u64) -> Self {
        // Xorshift must not start at zero.
        let state = if seed == 0 { 0x9E37_79B9_7F4A_7C15 } else { seed };
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    fn next_range(&mut self, max: u32) -> u32 {
        if max == 0 {
            return 0;
        }
        (self.next_u64() % u64::from(max)) as u32
    }

    fn chance(&mut self, percent: u32) -> bool {
        self.next_range(100) < percent
    }
}

/// Generate a symmetric demo map.
///
/// Terrain is rolling dirt with scattered soup pockets and a few shallow
/// pools; each team starts with one depot near its edge. The same seed
/// always yields the same map.
///
/// # Errors
///
/// Returns a [`MapError`] if the dimensions are too small to place both
/// depots (minimum 8x8).
pub fn generate_map(seed: u64, width: i32, height: i32) -> Result<InitialMap, MapError> {
    if width < 8 || height < 8 {
        return Err(MapError::new(format!(
            "generated maps must be at least 8x8, got {width}x{height}"
        )));
    }

    let mut rng = Rng::new(seed);
    let mut builder = MapBuilder::new(&format!("generated-{seed}"), width, height, seed);

    // Rolling elevation over the left half, mirrored to the right.
    for y in 0..height {
        for x in 0..(width + 1) / 2 {
            let elevation = 1 + rng.next_range(4) as i32;
            builder.set_symmetric_dirt(x, y, elevation);
        }
    }

    // Soup pockets on ~6% of cells.
    for y in 0..height {
        for x in 0..(width + 1) / 2 {
            if rng.chance(6) {
                let amount = 100 + rng.next_range(300);
                builder.set_symmetric_soup(x, y, amount);
            }
        }
    }

    // A few shallow pools below the water level.
    let pools = 2 + rng.next_range(3) as i32;
    for _ in 0..pools {
        let px = 1 + rng.next_range((width / 2 - 2).max(1) as u32) as i32;
        let py = 1 + rng.next_range((height - 2) as u32) as i32;
        builder.set_symmetric_dirt(px, py, -3);
        builder.set_flood(px, py, true);
        builder.set_flood(builder.mirror_x(px), py, true);
    }

    // Depots face each other across the centerline.
    let depot_y = height / 2;
    builder.set_symmetric_dirt(2, depot_y, 1);
    builder.set_flood(2, depot_y, false);
    builder.set_flood(builder.mirror_x(2), depot_y, false);
    builder.place_symmetric_depots(2, depot_y)?;

    // A pair of neutral grazers.
    let gx = width / 2 - 1;
    let gy = 1 + rng.next_range((height - 2) as u32) as i32;
    if builder.place(Team::Neutral, UnitKind::Grazer, gx, gy).is_ok() {
        let mirrored = builder.mirror_x(gx);
        let _ = builder.place(Team::Neutral, UnitKind::Grazer, mirrored, gy);
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults_validate() {
        let map = MapBuilder::new("empty", 10, 6, 3).build().unwrap();
        assert_eq!(map.width, 10);
        assert_eq!(map.height, 6);
        assert_eq!(map.round_limit, DEFAULT_ROUND_LIMIT);
        assert_eq!(map.soup.len(), 60);
        map.validate().unwrap();
    }

    #[test]
    fn test_duplicate_placement_rejected() {
        let mut builder = MapBuilder::new("dup", 8, 8, 1);
        builder.place(Team::A, UnitKind::Depot, 3, 3).unwrap();
        assert!(builder.place(Team::B, UnitKind::Depot, 3, 3).is_err());
    }

    #[test]
    fn test_off_grid_placement_rejected() {
        let mut builder = MapBuilder::new("off", 8, 8, 1);
        assert!(builder.place(Team::A, UnitKind::Depot, 8, 0).is_err());
        assert!(builder.place(Team::A, UnitKind::Depot, 0, -1).is_err());
    }

    #[test]
    fn test_setters_report_range() {
        let mut builder = MapBuilder::new("range", 4, 4, 1);
        assert!(builder.set_soup(3, 3, 10));
        assert!(!builder.set_soup(4, 0, 10));
        assert!(builder.set_dirt(0, 0, -5));
        assert!(!builder.set_flood(0, 4, true));
    }

    #[test]
    fn test_symmetric_helpers_mirror() {
        let mut builder = MapBuilder::new("sym", 10, 4, 1);
        builder.set_symmetric_soup(1, 2, 50);
        builder.place_symmetric_depots(1, 1).unwrap();
        let map = builder.build().unwrap();

        let idx = |x: i32, y: i32| (y * 10 + x) as usize;
        assert_eq!(map.soup[idx(1, 2)], 50);
        assert_eq!(map.soup[idx(8, 2)], 50);
        assert_eq!(map.placements.len(), 2);
        assert_eq!(map.placements[0].team, Team::A);
        assert_eq!(map.placements[1].team, Team::B);
        assert_eq!(map.placements[1].loc, Loc::new(8, 1));
    }

    #[test]
    fn test_generate_map_is_deterministic() {
        let a = generate_map(42, 16, 16).unwrap();
        let b = generate_map(42, 16, 16).unwrap();
        assert_eq!(a.soup, b.soup);
        assert_eq!(a.dirt, b.dirt);
        assert_eq!(a.placements, b.placements);

        let c = generate_map(43, 16, 16).unwrap();
        assert!(a.soup != c.soup || a.dirt != c.dirt);
    }

    #[test]
    fn test_generate_map_places_both_depots() {
        let map = generate_map(7, 12, 12).unwrap();
        let depots: Vec<_> = map
            .placements
            .iter()
            .filter(|p| p.kind == UnitKind::Depot)
            .collect();
        assert_eq!(depots.len(), 2);
        assert_eq!(depots[0].team, Team::A);
        assert_eq!(depots[1].team, Team::B);
        map.validate().unwrap();
    }

    #[test]
    fn test_generate_map_too_small() {
        assert!(generate_map(1, 4, 4).is_err());
    }

    #[test]
    fn test_validation_catches_bad_arrays() {
        let mut map = MapBuilder::new("bad", 4, 4, 1).build().unwrap();
        map.soup.pop();
        assert!(map.validate().is_err());
    }
}
