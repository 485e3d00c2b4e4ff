// SPDX-FileCopyrightText: 2025 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

/// An integer axis-aligned 2D rectangle, in pixels, with the origin at the
/// top-left corner.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rectangle {
    /// The horizontal coordinate of the top-left corner of the rectangle.
    pub x: i32,
    /// The vertical coordinate of the top-left corner of the rectangle.
    pub y: i32,
    /// The width of the rectangle.
    pub width: i32,
    /// The height of the rectangle.
    pub height: i32,
}

impl Rectangle {
    /// Creates a new [`Rectangle`] from a given top-left corner and
    /// dimensions.
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Rectangle {
        Rectangle {
            x,
            y,
            width,
            height,
        }
    }

    #[allow(missing_docs)]
    pub const fn left(&self) -> i32 {
        self.x
    }

    #[allow(missing_docs)]
    pub const fn right(&self) -> i32 {
        self.x + self.width
    }

    #[allow(missing_docs)]
    pub const fn top(&self) -> i32 {
        self.y
    }

    #[allow(missing_docs)]
    pub const fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// Returns true if the rectangle has no area.
    pub const fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Returns true if `other` is completely inside this rectangle.
    pub const fn contains_rectangle(&self, other: &Rectangle) -> bool {
        self.left() <= other.left()
            && other.right() <= self.right()
            && self.top() <= other.top()
            && other.bottom() <= self.bottom()
    }
}

/// The area of the back buffer that is rendered into, along with the depth
/// range the depth buffer values are mapped to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// The horizontal coordinate of the top-left corner.
    pub x: i32,
    /// The vertical coordinate of the top-left corner.
    pub y: i32,
    #[allow(missing_docs)]
    pub width: i32,
    #[allow(missing_docs)]
    pub height: i32,
    /// The depth value the near plane maps to.
    pub min_depth: f32,
    /// The depth value the far plane maps to.
    pub max_depth: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Viewport::new(0, 0, 0, 0)
    }
}

impl Viewport {
    /// Creates a [`Viewport`] with the full `0..1` depth range.
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Viewport {
        Viewport {
            x,
            y,
            width,
            height,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }

    /// Creates a [`Viewport`] covering `bounds`, with the full `0..1` depth
    /// range.
    pub const fn from_bounds(bounds: Rectangle) -> Viewport {
        Viewport::new(bounds.x, bounds.y, bounds.width, bounds.height)
    }

    /// The area of the viewport.
    pub const fn bounds(&self) -> Rectangle {
        Rectangle::new(self.x, self.y, self.width, self.height)
    }

    /// Width divided by height, or 0 for a viewport without height.
    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0 {
            0.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Rectangle, Viewport};

    #[test]
    fn rectangle_containment() {
        let outer = Rectangle::new(0, 0, 100, 50);
        assert!(outer.contains_rectangle(&Rectangle::new(10, 10, 90, 40)));
        assert!(outer.contains_rectangle(&outer));
        assert!(!outer.contains_rectangle(&Rectangle::new(10, 10, 91, 40)));
        assert!(Rectangle::new(5, 5, 0, 10).is_empty());
    }

    #[test]
    fn viewport_bounds_round_trip() {
        let bounds = Rectangle::new(1, 2, 3, 4);
        let viewport = Viewport::from_bounds(bounds);
        assert_eq!(bounds, viewport.bounds());
        assert_eq!((0.0, 1.0), (viewport.min_depth, viewport.max_depth));
        assert_eq!(0.0, Viewport::default().aspect_ratio());
    }
}
