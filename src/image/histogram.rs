use super::{AsImageView, Image};

/// Histogram-equalizes `image` in place, standardizing its brightness and contrast.
///
/// The darkest occupied intensity maps to 0 and the cumulative distribution of the remaining
/// intensities is stretched over `0..=255`. An image consisting of a single intensity is left
/// unchanged.
pub fn equalize_histogram(image: &mut Image) {
    let total = image.num_pixels() as u64;
    if total == 0 {
        return;
    }

    let mut hist = [0u64; 256];
    for &pix in image.data() {
        hist[usize::from(pix)] += 1;
    }

    let lut = equalization_lut(&hist, total);
    for pix in image.data_mut() {
        *pix = lut[usize::from(*pix)];
    }
}

/// Returns a histogram-equalized copy of `image`.
pub fn equalized<V: AsImageView>(image: &V) -> Image {
    let mut out = image.as_view().to_image();
    equalize_histogram(&mut out);
    out
}

fn equalization_lut(hist: &[u64; 256], total: u64) -> [u8; 256] {
    let mut lut = [0u8; 256];
    let first = match hist.iter().position(|&count| count != 0) {
        Some(first) => first,
        None => return lut,
    };

    if hist[first] == total {
        for (i, out) in lut.iter_mut().enumerate() {
            *out = i as u8;
        }
        return lut;
    }

    let scale = 255.0 / (total - hist[first]) as f32;
    let mut sum = 0;
    for (count, out) in hist.iter().zip(lut.iter_mut()).skip(first + 1) {
        sum += count;
        *out = (sum as f32 * scale).round().clamp(0.0, 255.0) as u8;
    }
    lut
}
