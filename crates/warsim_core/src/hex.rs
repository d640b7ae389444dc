//! Axial hex grid, terrain and territorial control.
//!
//! The theatre is a parallelogram of axial cells `(q, r)` with
//! `0 <= q < width` and `0 <= r < height`. Cells carry terrain, an optional
//! river crossing, the controlling faction and an objective value in
//! victory points.

use serde::{Deserialize, Serialize};

use crate::factions::FactionId;
use crate::math::Fixed;

/// Axial hex coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HexCoord {
    /// Column axis.
    pub q: i32,
    /// Row axis.
    pub r: i32,
}

/// The six axial neighbour offsets, clockwise from east.
const DIRECTIONS: [(i32, i32); 6] = [(1, 0), (1, -1), (0, -1), (-1, 0), (-1, 1), (0, 1)];

impl HexCoord {
    /// Create a coordinate.
    #[must_use]
    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    /// Third cube coordinate.
    #[must_use]
    pub const fn s(self) -> i32 {
        -self.q - self.r
    }

    /// Hex distance in cells.
    #[must_use]
    pub fn distance(self, other: Self) -> u32 {
        let dq = (self.q - other.q).unsigned_abs();
        let dr = (self.r - other.r).unsigned_abs();
        let ds = (self.s() - other.s()).unsigned_abs();
        (dq + dr + ds) / 2
    }

    /// The six adjacent cells (not bounds-checked).
    #[must_use]
    pub fn neighbors(self) -> [HexCoord; 6] {
        DIRECTIONS.map(|(dq, dr)| HexCoord::new(self.q + dq, self.r + dr))
    }

    /// Cells on the straight line from `self` to `other`, inclusive of both ends.
    #[must_use]
    pub fn line_to(self, other: Self) -> Vec<HexCoord> {
        let n = self.distance(other);
        if n == 0 {
            return vec![self];
        }

        // Nudge off exact edges so ties round the same way every time.
        let nudge = Fixed::from_num(1) / Fixed::from_num(1_000_000);
        let (aq, ar) = (Fixed::from_num(self.q) + nudge, Fixed::from_num(self.r) + nudge);
        let (bq, br) = (Fixed::from_num(other.q) + nudge, Fixed::from_num(other.r) + nudge);

        (0..=n)
            .map(|i| {
                let t = Fixed::from_num(i) / Fixed::from_num(n);
                cube_round(aq + (bq - aq) * t, ar + (br - ar) * t)
            })
            .collect()
    }
}

impl std::fmt::Display for HexCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.q, self.r)
    }
}

/// Round fractional axial coordinates to the nearest cell.
fn cube_round(q: Fixed, r: Fixed) -> HexCoord {
    let s = -q - r;
    let (mut rq, mut rr, rs) = (q.round(), r.round(), s.round());
    let dq = (rq - q).abs();
    let dr = (rr - r).abs();
    let ds = (rs - s).abs();

    if dq > dr && dq > ds {
        rq = -rr - rs;
    } else if dr > ds {
        rr = -rq - rs;
    }

    HexCoord::new(rq.to_num::<i32>(), rr.to_num::<i32>())
}

/// Terrain classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum Terrain {
    /// Open ground.
    #[default]
    Plains,
    /// Rolling hills.
    Hills,
    /// High mountains.
    Mountain,
    /// Woodland.
    Forest,
    /// Built-up area.
    Urban,
    /// Arid open ground.
    Desert,
    /// Wetland.
    Marsh,
}

impl Terrain {
    /// Every terrain class.
    pub const ALL: [Terrain; 7] = [
        Terrain::Plains,
        Terrain::Hills,
        Terrain::Mountain,
        Terrain::Forest,
        Terrain::Urban,
        Terrain::Desert,
        Terrain::Marsh,
    ];
}

/// One map cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HexCell {
    /// Terrain class.
    pub terrain: Terrain,
    /// A river runs through this cell (attacking into it is a crossing).
    pub river: bool,
    /// Controlling faction, if any.
    pub control: Option<FactionId>,
    /// Victory points paid each turn to the controller (0 = not an objective).
    pub objective_vp: u32,
}

impl Default for HexCell {
    fn default() -> Self {
        Self {
            terrain: Terrain::Plains,
            river: false,
            control: None,
            objective_vp: 0,
        }
    }
}

/// The theatre map.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HexMap {
    width: u32,
    height: u32,
    cells: Vec<HexCell>,
}

impl HexMap {
    /// Create a map filled with one terrain.
    #[must_use]
    pub fn new(width: u32, height: u32, terrain: Terrain) -> Self {
        let cell = HexCell {
            terrain,
            ..HexCell::default()
        };
        Self {
            width,
            height,
            cells: vec![cell; (width * height) as usize],
        }
    }

    /// Map width in cells.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Map height in cells.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Whether `coord` lies on the map.
    #[must_use]
    pub fn contains(&self, coord: HexCoord) -> bool {
        coord.q >= 0
            && coord.r >= 0
            && (coord.q as u32) < self.width
            && (coord.r as u32) < self.height
    }

    fn index(&self, coord: HexCoord) -> Option<usize> {
        self.contains(coord)
            .then(|| coord.r as usize * self.width as usize + coord.q as usize)
    }

    /// Look up a cell.
    #[must_use]
    pub fn cell(&self, coord: HexCoord) -> Option<&HexCell> {
        self.index(coord).and_then(|i| self.cells.get(i))
    }

    /// Look up a cell mutably.
    pub fn cell_mut(&mut self, coord: HexCoord) -> Option<&mut HexCell> {
        self.index(coord).and_then(move |i| self.cells.get_mut(i))
    }

    /// Terrain at `coord`, plains when off-map.
    #[must_use]
    pub fn terrain_at(&self, coord: HexCoord) -> Terrain {
        self.cell(coord).map_or(Terrain::Plains, |c| c.terrain)
    }

    /// Set the controller of a cell. Off-map coordinates are ignored.
    pub fn set_control(&mut self, coord: HexCoord, faction: FactionId) {
        if let Some(cell) = self.cell_mut(coord) {
            cell.control = Some(faction);
        }
    }

    /// All on-map cells within `radius` of `center`, in row-major order.
    #[must_use]
    pub fn cells_within(&self, center: HexCoord, radius: u32) -> Vec<HexCoord> {
        let r = radius as i32;
        let mut out = Vec::new();
        for dr in -r..=r {
            for dq in -r..=r {
                let coord = HexCoord::new(center.q + dq, center.r + dr);
                if center.distance(coord) <= radius && self.contains(coord) {
                    out.push(coord);
                }
            }
        }
        out.sort_unstable_by_key(|c| (c.r, c.q));
        out
    }

    /// Objective cells and their VP value, in row-major order.
    #[must_use]
    pub fn objectives(&self) -> Vec<(HexCoord, &HexCell)> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| c.objective_vp > 0)
            .map(|(i, c)| {
                let q = (i % self.width as usize) as i32;
                let r = (i / self.width as usize) as i32;
                (HexCoord::new(q, r), c)
            })
            .collect()
    }
}
