//! Grayscale image handling.
//!
//! This module provides:
//!
//! - The [`Image`] type, an owned 8-bit single-channel image.
//! - [`ImageView`], a borrowed rectangular view into an underlying [`Image`].
//! - The [`AsImageView`] trait to abstract over images and views.
//! - [`Rect`], an integer-valued rectangle representing part of an image.
//! - Histogram equalization and a few freestanding `draw_*` functions to visualize diagnostics.
//!
//! Color data only exists at the edge of the library: [`Image::from_dynamic`] and friends convert
//! camera frames to grayscale, and everything downstream operates on single-channel data.

mod draw;
mod histogram;
mod rect;

#[cfg(test)]
mod tests;

use std::{fmt, path::Path};

use image::{
    imageops, DynamicImage, GenericImageView, GrayImage, ImageBuffer, Luma, RgbImage, RgbaImage,
};

pub use draw::*;
pub use histogram::*;
pub use rect::*;

/// Neutral gray used for background and out-of-bounds regions of canonical faces.
pub const MID_GRAY: u8 = 128;

/// An 8-bit grayscale image.
#[derive(Clone, PartialEq, Eq)]
pub struct Image {
    pub(crate) buf: GrayImage,
}

impl Image {
    /// Loads an image from the filesystem and converts it to grayscale.
    ///
    /// The format is guessed from the file extension (`png`, `jpg`/`jpeg` or `gif`).
    pub fn load<A: AsRef<Path>>(path: A) -> crate::Result<Self> {
        Self::load_impl(path.as_ref())
    }

    fn load_impl(path: &Path) -> crate::Result<Self> {
        let image = image::open(path)?;
        log::trace!(
            "loaded {} ({}x{})",
            path.display(),
            image.width(),
            image.height()
        );
        Ok(Self::from_dynamic(&image))
    }

    /// Saves an image to the file system.
    ///
    /// The output format is determined by the file extension.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> crate::Result<()> {
        Ok(self.buf.save(path)?)
    }

    /// Creates a black image of a specified size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            buf: ImageBuffer::new(width, height),
        }
    }

    /// Creates an image of a specified size with every pixel set to `value`.
    pub fn filled(width: u32, height: u32, value: u8) -> Self {
        Self {
            buf: ImageBuffer::from_pixel(width, height, Luma([value])),
        }
    }

    /// Creates an image by invoking `f` with the coordinates of every pixel.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> u8) -> Self {
        Self {
            buf: ImageBuffer::from_fn(width, height, |x, y| Luma([f(x, y)])),
        }
    }

    /// Creates an image from row-major pixel data.
    ///
    /// Returns `None` if `data` does not contain exactly `width * height` bytes.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        if data.len() != width as usize * height as usize {
            return None;
        }
        ImageBuffer::from_raw(width, height, data).map(|buf| Self { buf })
    }

    /// Converts a decoded image of any color type to grayscale.
    pub fn from_dynamic(image: &DynamicImage) -> Self {
        Self {
            buf: image.to_luma8(),
        }
    }

    /// Converts an RGB camera frame to grayscale.
    pub fn from_rgb8(image: &RgbImage) -> Self {
        Self {
            buf: imageops::grayscale(image),
        }
    }

    /// Converts an RGBA camera frame to grayscale, ignoring alpha.
    pub fn from_rgba8(image: &RgbaImage) -> Self {
        Self {
            buf: imageops::grayscale(image),
        }
    }

    /// Returns the width of this image, in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.buf.width()
    }

    /// Returns the height of this image, in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.buf.height()
    }

    /// Returns the total number of pixels in this image.
    #[inline]
    pub fn num_pixels(&self) -> usize {
        self.width() as usize * self.height() as usize
    }

    /// Returns whether this image contains no pixels at all.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Returns a [`Rect`] covering this image.
    ///
    /// The rectangle will be positioned at `(0, 0)` and have the width and height of the image.
    #[inline]
    pub fn rect(&self) -> Rect {
        Rect::from_top_left(0, 0, self.width(), self.height())
    }

    /// Gets the intensity at the given pixel coordinates.
    ///
    /// # Panics
    ///
    /// This will panic if `(x, y)` is outside the bounds of this image.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.buf[(x, y)].0[0]
    }

    /// Sets the intensity at the given pixel coordinates.
    ///
    /// # Panics
    ///
    /// This will panic if `(x, y)` is outside the bounds of this image.
    #[inline]
    pub fn set(&mut self, x: u32, y: u32, value: u8) {
        self.buf[(x, y)] = Luma([value]);
    }

    /// Creates an immutable view into an area of this image, specified by `rect`.
    ///
    /// If `rect` lies partially outside of `self`, the pixels that are outside of `self` will read
    /// as 0. The returned view always has the size of `rect`.
    pub fn view(&self, rect: Rect) -> ImageView<'_> {
        ImageView { image: self, rect }
    }

    /// Returns a horizontally mirrored copy of this image.
    pub fn flip_horizontal(&self) -> Image {
        Image {
            buf: imageops::flip_horizontal(&self.buf),
        }
    }

    /// Resamples this image to a new size using bilinear filtering.
    ///
    /// The aspect ratio is not preserved.
    pub fn resize(&self, width: u32, height: u32) -> Image {
        if self.width() == width && self.height() == height {
            return self.clone();
        }
        Image {
            buf: imageops::resize(&self.buf, width, height, imageops::FilterType::Triangle),
        }
    }

    /// Returns the row-major pixel data.
    #[inline]
    pub fn data(&self) -> &[u8] {
        self.buf.as_raw()
    }

    #[inline]
    pub(crate) fn data_mut(&mut self) -> &mut [u8] {
        &mut self.buf
    }
}

impl fmt::Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{} Image", self.width(), self.height())
    }
}

/// An immutable view of a rectangular section of an [`Image`].
#[derive(Clone, Copy)]
pub struct ImageView<'a> {
    image: &'a Image,
    /// Rectangle in the root image's coordinates.
    rect: Rect,
}

impl<'a> ImageView<'a> {
    /// Returns the width of this view, in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.rect.width()
    }

    /// Returns the height of this view, in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.rect.height()
    }

    /// Returns a [`Rect`] of the size of this view.
    ///
    /// The rectangle will be positioned at `(0, 0)` and have the width and height of the view.
    #[inline]
    pub fn rect(&self) -> Rect {
        Rect::from_top_left(0, 0, self.width(), self.height())
    }

    /// Returns the area of the underlying image covered by this view.
    #[inline]
    pub fn image_rect(&self) -> Rect {
        self.rect
    }

    /// Gets the intensity at the given view coordinates.
    ///
    /// Pixels that lie outside of the underlying image read as 0.
    pub fn get(&self, x: u32, y: u32) -> u8 {
        debug_assert!(x < self.width() && y < self.height());
        let ix = i64::from(self.rect.x()) + i64::from(x);
        let iy = i64::from(self.rect.y()) + i64::from(y);
        if ix < 0
            || iy < 0
            || ix >= i64::from(self.image.width())
            || iy >= i64::from(self.image.height())
        {
            return 0;
        }
        self.image.get(ix as u32, iy as u32)
    }

    /// Creates an immutable subview into an area of this view, specified by `rect`.
    pub fn view(&self, rect: Rect) -> ImageView<'a> {
        ImageView {
            image: self.image,
            rect: rect.move_by(self.rect.x(), self.rect.y()),
        }
    }

    /// Copies the contents of this view into a new [`Image`].
    pub fn to_image(&self) -> Image {
        if self.image.rect().contains_rect(&self.rect) {
            let buf = imageops::crop_imm(
                &self.image.buf,
                self.rect.x() as u32,
                self.rect.y() as u32,
                self.width(),
                self.height(),
            )
            .to_image();
            return Image { buf };
        }
        Image::from_fn(self.width(), self.height(), |x, y| self.get(x, y))
    }
}

impl fmt::Debug for ImageView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{} ImageView", self.width(), self.height())
    }
}

/// Trait for types that can be treated as read-only views of image data.
///
/// This allows abstracting over [`Image`] and [`ImageView`] and should be used by any code that
/// takes immutable image data as input.
pub trait AsImageView {
    /// Returns an [`ImageView`] covering `self`.
    fn as_view(&self) -> ImageView<'_>;
}

impl AsImageView for Image {
    fn as_view(&self) -> ImageView<'_> {
        self.view(self.rect())
    }
}

impl<'a> AsImageView for ImageView<'a> {
    fn as_view(&self) -> ImageView<'_> {
        *self
    }
}

impl<'a, V: AsImageView> AsImageView for &'a V {
    fn as_view(&self) -> ImageView<'_> {
        (*self).as_view()
    }
}
