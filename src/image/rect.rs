use std::fmt;

use embedded_graphics::prelude::*;

/// An axis-aligned rectangle.
///
/// This rectangle type uses (signed) integer coordinates and is meant to be used with the
/// [`crate::image`] module. Detections, eye search windows and face crops are all expressed as
/// [`Rect`]s in the coordinate system of the image they refer to.
///
/// Rectangles are allowed to have zero height and/or width. A missing detection is represented by
/// `None`, never by a rectangle with special coordinates.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub(crate) rect: embedded_graphics::primitives::Rectangle,
}

impl Rect {
    /// Creates a rectangle extending downwards and right from a point.
    #[inline]
    pub fn from_top_left(top_left_x: i32, top_left_y: i32, width: u32, height: u32) -> Self {
        Self {
            rect: embedded_graphics::primitives::Rectangle {
                top_left: Point {
                    x: top_left_x,
                    y: top_left_y,
                },
                size: Size { width, height },
            },
        }
    }

    /// Returns the X coordinate of the left side of the rectangle.
    #[inline]
    pub fn x(&self) -> i32 {
        self.rect.top_left.x
    }

    /// Returns the Y coordinate of the top side of the rectangle.
    #[inline]
    pub fn y(&self) -> i32 {
        self.rect.top_left.y
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.rect.size.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.rect.size.height
    }

    #[inline]
    pub fn area(&self) -> u64 {
        u64::from(self.width()) * u64::from(self.height())
    }

    /// Returns whether this rectangle covers no pixels.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Returns the integer center of the rectangle (rounding towards the top left).
    pub fn center(&self) -> (i32, i32) {
        (
            self.x() + (self.width() / 2) as i32,
            self.y() + (self.height() / 2) as i32,
        )
    }

    #[must_use]
    pub fn move_by(&self, x: i32, y: i32) -> Rect {
        Rect::from_top_left(self.x() + x, self.y() + y, self.width(), self.height())
    }

    /// Multiplies position and size of this rectangle by `factor`, rounding each component.
    ///
    /// This maps a rectangle found in a downscaled copy of an image back to the original.
    #[must_use]
    pub fn scale(&self, factor: f32) -> Rect {
        Rect::from_top_left(
            (self.x() as f32 * factor).round() as i32,
            (self.y() as f32 * factor).round() as i32,
            (self.width() as f32 * factor).round() as u32,
            (self.height() as f32 * factor).round() as u32,
        )
    }

    /// Moves (and if necessary shrinks) this rectangle so that it lies entirely inside an image of
    /// size `width x height` positioned at the origin.
    #[must_use]
    pub fn fit_inside(&self, width: u32, height: u32) -> Rect {
        let w = self.width().min(width);
        let h = self.height().min(height);
        let x = self.x().clamp(0, (width - w) as i32);
        let y = self.y().clamp(0, (height - h) as i32);
        Rect::from_top_left(x, y, w, h)
    }

    /// Returns whether `self` contains `other`.
    pub fn contains_rect(&self, other: &Rect) -> bool {
        self.x() <= other.x()
            && self.y() <= other.y()
            && i64::from(self.x()) + i64::from(self.width())
                >= i64::from(other.x()) + i64::from(other.width())
            && i64::from(self.y()) + i64::from(self.height())
                >= i64::from(other.y()) + i64::from(other.height())
    }
}

impl fmt::Debug for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let x = self.rect.top_left.x;
        let y = self.rect.top_left.y;
        let w = self.rect.size.width;
        let h = self.rect.size.height;
        let bx = i64::from(x) + i64::from(w);
        let by = i64::from(y) + i64::from(h);
        write!(f, "Rect @ ({x},{y})-({bx},{by})/{w}x{h}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_rect() {
        let outer = Rect::from_top_left(-8, -8, 16, 16);
        assert!(outer.contains_rect(&outer));
        assert!(outer.contains_rect(&Rect::from_top_left(-7, -7, 15, 15)));
        assert!(!outer.contains_rect(&Rect::from_top_left(-7, -8, 16, 16)));
        assert!(!outer.contains_rect(&Rect::from_top_left(-8, -8, 17, 16)));
        assert!(!outer.contains_rect(&Rect::from_top_left(-9, -8, 10, 10)));
    }

    #[test]
    fn test_scale_rounds_components() {
        let rect = Rect::from_top_left(3, 5, 7, 9);
        assert_eq!(rect.scale(2.0), Rect::from_top_left(6, 10, 14, 18));
        assert_eq!(rect.scale(0.5), Rect::from_top_left(2, 3, 4, 5));
    }

    #[test]
    fn test_fit_inside() {
        // Already inside.
        let rect = Rect::from_top_left(2, 2, 4, 4);
        assert_eq!(rect.fit_inside(10, 10), rect);

        // Hanging off the top left.
        assert_eq!(
            Rect::from_top_left(-3, -1, 4, 4).fit_inside(10, 10),
            Rect::from_top_left(0, 0, 4, 4),
        );

        // Hanging off the bottom right gets shifted back in.
        assert_eq!(
            Rect::from_top_left(8, 9, 4, 4).fit_inside(10, 10),
            Rect::from_top_left(6, 6, 4, 4),
        );

        // Larger than the image.
        assert_eq!(
            Rect::from_top_left(-5, 3, 20, 4).fit_inside(10, 10),
            Rect::from_top_left(0, 3, 10, 4),
        );
    }

    #[test]
    fn test_center() {
        assert_eq!(Rect::from_top_left(10, 20, 11, 11).center(), (15, 25));
        assert_eq!(Rect::from_top_left(0, 0, 0, 0).center(), (0, 0));
    }
}
