#![forbid(unsafe_code)]

//! Cell rectangles for pointer hit testing.

/// Region of the surface, in 0-indexed cells with the origin at top-left.
///
/// A mounted lookup registers one of these as its bounds. Presses that land
/// outside close the dropdown. Edges saturate at `u16::MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl Rect {
    #[inline]
    pub const fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build from half-open edges. Inverted edges give an empty rect.
    #[inline]
    const fn from_edges(left: u16, top: u16, right: u16, bottom: u16) -> Self {
        Self::new(
            left,
            top,
            right.saturating_sub(left),
            bottom.saturating_sub(top),
        )
    }

    /// One past the last column.
    #[inline]
    pub const fn right(&self) -> u16 {
        self.x.saturating_add(self.width)
    }

    /// One past the last row.
    #[inline]
    pub const fn bottom(&self) -> u16 {
        self.y.saturating_add(self.height)
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Whether cell `(x, y)` lies inside. An empty rect contains nothing.
    #[inline]
    pub const fn contains(&self, x: u16, y: u16) -> bool {
        self.x <= x && x < self.right() && self.y <= y && y < self.bottom()
    }

    /// Bounding box of two regions, typically the input line and its
    /// dropdown panel. An empty side contributes nothing.
    pub fn union(&self, other: &Rect) -> Rect {
        match (self.is_empty(), other.is_empty()) {
            (true, _) => *other,
            (_, true) => *self,
            _ => Self::from_edges(
                self.x.min(other.x),
                self.y.min(other.y),
                self.right().max(other.right()),
                self.bottom().max(other.bottom()),
            ),
        }
    }
}
