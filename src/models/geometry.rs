//! Pointer positions and popup placement.

/// A cell (or pixel) coordinate.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub x: u16,
    pub y: u16,
}

impl Position {
    pub fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }
}

/// Visible area of the screen that contains the pointer.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl Bounds {
    pub fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self { x, y, width, height }
    }

    fn right(&self) -> u16 {
        self.x.saturating_add(self.width)
    }

    fn bottom(&self) -> u16 {
        self.y.saturating_add(self.height)
    }

    /// Top-left corner for a `width` x `height` box anchored at `pointer`,
    /// shifted so the box stays inside these bounds.
    ///
    /// A box larger than the bounds is pinned to the top-left edge.
    pub fn place(&self, pointer: Position, width: u16, height: u16) -> Position {
        let max_x = self.right().saturating_sub(width).max(self.x);
        let max_y = self.bottom().saturating_sub(height).max(self.y);
        Position {
            x: pointer.x.clamp(self.x, max_x),
            y: pointer.y.clamp(self.y, max_y),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_place_inside_bounds_keeps_pointer() {
        let bounds = Bounds::new(0, 0, 80, 24);
        assert_eq!(bounds.place(Position::new(10, 5), 20, 8), Position::new(10, 5));
    }

    #[test]
    fn test_place_clamps_to_right_and_bottom_edges() {
        let bounds = Bounds::new(0, 0, 80, 24);
        assert_eq!(bounds.place(Position::new(75, 22), 20, 8), Position::new(60, 16));
    }

    #[test]
    fn test_place_clamps_to_offset_origin() {
        let bounds = Bounds::new(10, 4, 40, 10);
        assert_eq!(bounds.place(Position::new(0, 0), 5, 5), Position::new(10, 4));
    }

    #[test]
    fn test_oversized_box_is_pinned_to_origin() {
        let bounds = Bounds::new(0, 0, 10, 5);
        assert_eq!(bounds.place(Position::new(8, 3), 30, 12), Position::new(0, 0));
    }
}
