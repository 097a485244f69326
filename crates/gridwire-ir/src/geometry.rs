//! Grid geometry: cells, offsets, orientations and footprints.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

/// A cell on the integer grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl Position {
    /// Create a position.
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Offset this cell, or `None` if the result leaves the grid.
    #[inline]
    pub fn checked_add(self, offset: Vector) -> Option<Position> {
        Some(Position::new(
            self.x.checked_add(offset.dx)?,
            self.y.checked_add(offset.dy)?,
        ))
    }

    /// Every cell of a footprint of `size` anchored here, or `None` if any
    /// of them leaves the grid.
    pub fn footprint_cells(self, size: Vector) -> Option<Vec<Position>> {
        size.cells().map(|offset| self.checked_add(offset)).collect()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// An offset between cells, also used for footprint sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Vector {
    /// Horizontal extent.
    pub dx: i32,
    /// Vertical extent.
    pub dy: i32,
}

impl Vector {
    /// Create a vector.
    #[inline]
    pub const fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }

    /// The 1×1 footprint of a default primitive.
    pub const UNIT: Vector = Vector::new(1, 1);

    /// Grow this size so that `offset` lies inside it.
    pub fn extend_to_fit(&mut self, offset: Vector) {
        self.dx = self.dx.max(offset.dx.saturating_add(1));
        self.dy = self.dy.max(offset.dy.saturating_add(1));
    }

    /// Iterate every offset covered by a footprint of this size, row-major.
    pub fn cells(self) -> impl Iterator<Item = Vector> {
        let width = self.dx.max(0);
        (0..self.dy.max(0)).flat_map(move |dy| (0..width).map(move |dx| Vector::new(dx, dy)))
    }
}

impl fmt::Display for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.dx, self.dy)
    }
}

impl Add<Vector> for Position {
    type Output = Position;

    fn add(self, rhs: Vector) -> Position {
        Position::new(self.x + rhs.dx, self.y + rhs.dy)
    }
}

impl Sub for Position {
    type Output = Vector;

    fn sub(self, rhs: Position) -> Vector {
        Vector::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// One of the four quarter-turn orientations of a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Orientation {
    /// Unrotated.
    #[default]
    Zero,
    /// 90° clockwise.
    Ninety,
    /// 180°.
    OneEighty,
    /// 270° clockwise.
    TwoSeventy,
}

impl Orientation {
    /// Number of clockwise quarter turns.
    #[inline]
    pub fn quarter_turns(self) -> u8 {
        match self {
            Orientation::Zero => 0,
            Orientation::Ninety => 1,
            Orientation::OneEighty => 2,
            Orientation::TwoSeventy => 3,
        }
    }

    /// Build from a count of clockwise quarter turns (taken modulo 4).
    pub fn from_quarter_turns(turns: i64) -> Self {
        match turns.rem_euclid(4) {
            1 => Orientation::Ninety,
            2 => Orientation::OneEighty,
            3 => Orientation::TwoSeventy,
            _ => Orientation::Zero,
        }
    }

    /// Rotate a footprint size. Odd quarter turns swap the axes.
    #[inline]
    pub fn rotate_size(self, size: Vector) -> Vector {
        if self.quarter_turns() & 1 == 1 {
            Vector::new(size.dy, size.dx)
        } else {
            size
        }
    }

    /// Rotate an offset that lies inside an unrotated footprint of `size`.
    pub fn rotate_offset(self, offset: Vector, size: Vector) -> Vector {
        match self {
            Orientation::Zero => offset,
            Orientation::Ninety => Vector::new(size.dy - offset.dy - 1, offset.dx),
            Orientation::OneEighty => {
                Vector::new(size.dx - offset.dx - 1, size.dy - offset.dy - 1)
            }
            Orientation::TwoSeventy => Vector::new(offset.dy, size.dx - offset.dx - 1),
        }
    }
}

/// Where a component sits before it reaches a live circuit.
///
/// Producers may hand over fractional coordinates; the normalizer snaps them
/// to [`Placement::Exact`]. [`Placement::Undefined`] components are placed by
/// the layout engine.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum Placement {
    /// No position; to be chosen by auto-layout.
    #[default]
    Undefined,
    /// An integer grid cell.
    Exact(Position),
    /// Producer coordinates that are not on the grid yet.
    Fractional {
        /// Raw column.
        x: f64,
        /// Raw row.
        y: f64,
    },
}

impl Placement {
    /// Classify raw producer coordinates.
    ///
    /// Non-finite or out-of-range coordinates mean "undefined".
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_coords(x: f64, y: f64) -> Self {
        let in_range = |v: f64| v.is_finite() && v >= f64::from(i32::MIN) && v <= f64::from(i32::MAX);
        if !in_range(x) || !in_range(y) {
            return Placement::Undefined;
        }
        if x.fract() == 0.0 && y.fract() == 0.0 {
            return Placement::Exact(Position::new(x as i32, y as i32));
        }
        Placement::Fractional { x, y }
    }

    /// The grid cell, if this placement is exact.
    #[inline]
    pub fn exact(self) -> Option<Position> {
        match self {
            Placement::Exact(pos) => Some(pos),
            _ => None,
        }
    }

    /// Check if this placement still needs auto-layout.
    #[inline]
    pub fn is_undefined(self) -> bool {
        matches!(self, Placement::Undefined)
    }
}

impl From<Position> for Placement {
    fn from(pos: Position) -> Self {
        Placement::Exact(pos)
    }
}

/// Running min/max extent of definite positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Bounds {
    extent: Option<(Position, Position)>,
}

impl Bounds {
    /// Empty bounds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Extend to include a single cell.
    pub fn include(&mut self, pos: Position) {
        self.extent = Some(match self.extent {
            None => (pos, pos),
            Some((min, max)) => (
                Position::new(min.x.min(pos.x), min.y.min(pos.y)),
                Position::new(max.x.max(pos.x), max.y.max(pos.y)),
            ),
        });
    }

    /// Extend to include a whole footprint anchored at `pos`.
    pub fn include_footprint(&mut self, pos: Position, size: Vector) {
        self.include(pos);
        self.include(Position::new(
            pos.x.saturating_add(size.dx.max(1) - 1),
            pos.y.saturating_add(size.dy.max(1) - 1),
        ));
    }

    /// Top-left corner, if anything was included.
    pub fn min(&self) -> Option<Position> {
        self.extent.map(|(min, _)| min)
    }

    /// Bottom-right corner, if anything was included.
    pub fn max(&self) -> Option<Position> {
        self.extent.map(|(_, max)| max)
    }

    /// Check if no position was ever included.
    pub fn is_empty(&self) -> bool {
        self.extent.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placement_classification() {
        assert_eq!(
            Placement::from_coords(3.0, -2.0),
            Placement::Exact(Position::new(3, -2))
        );
        assert!(matches!(
            Placement::from_coords(1.5, 2.0),
            Placement::Fractional { .. }
        ));
        assert!(Placement::from_coords(f64::NAN, 0.0).is_undefined());
        assert!(Placement::from_coords(f64::from(f32::MAX), 0.0).is_undefined());
    }

    #[test]
    fn test_rotate_size_swaps_on_odd_turns() {
        let size = Vector::new(2, 3);
        assert_eq!(Orientation::Zero.rotate_size(size), size);
        assert_eq!(Orientation::Ninety.rotate_size(size), Vector::new(3, 2));
        assert_eq!(Orientation::OneEighty.rotate_size(size), size);
        assert_eq!(Orientation::TwoSeventy.rotate_size(size), Vector::new(3, 2));
    }

    #[test]
    fn test_rotate_offset_stays_inside_footprint() {
        let size = Vector::new(2, 3);
        for orientation in [
            Orientation::Zero,
            Orientation::Ninety,
            Orientation::OneEighty,
            Orientation::TwoSeventy,
        ] {
            let rotated = orientation.rotate_size(size);
            for cell in size.cells() {
                let r = orientation.rotate_offset(cell, size);
                assert!(r.dx >= 0 && r.dx < rotated.dx, "{orientation:?} {cell:?}");
                assert!(r.dy >= 0 && r.dy < rotated.dy, "{orientation:?} {cell:?}");
            }
        }
    }

    #[test]
    fn test_footprint_cells() {
        let cells: Vec<_> = Vector::new(2, 2).cells().collect();
        assert_eq!(
            cells,
            vec![
                Vector::new(0, 0),
                Vector::new(1, 0),
                Vector::new(0, 1),
                Vector::new(1, 1)
            ]
        );
        assert_eq!(Vector::new(0, 4).cells().count(), 0);
    }

    #[test]
    fn test_bounds() {
        let mut bounds = Bounds::new();
        assert!(bounds.is_empty());
        bounds.include(Position::new(4, 1));
        bounds.include_footprint(Position::new(-1, 2), Vector::new(2, 3));
        assert_eq!(bounds.min(), Some(Position::new(-1, 1)));
        assert_eq!(bounds.max(), Some(Position::new(4, 4)));
    }

    #[test]
    fn test_footprint_cells_at_grid_edge() {
        let edge = Position::new(0, i32::MAX);
        assert_eq!(edge.checked_add(Vector::new(0, 1)), None);
        assert_eq!(edge.footprint_cells(Vector::UNIT), Some(vec![edge]));
        assert_eq!(edge.footprint_cells(Vector::new(1, 2)), None);

        let mut bounds = Bounds::new();
        bounds.include_footprint(edge, Vector::new(1, 2));
        assert_eq!(bounds.max(), Some(edge));
    }

    #[test]
    fn test_extend_to_fit() {
        let mut size = Vector::UNIT;
        size.extend_to_fit(Vector::new(1, 0));
        assert_eq!(size, Vector::new(2, 1));
    }
}
