use super::*;

fn mkimage<const W: usize, const H: usize>(data: [[u8; W]; H]) -> Image {
    let mut image = Image::new(W as u32, H as u32);
    for (y, row) in data.iter().enumerate() {
        for (x, value) in row.iter().enumerate() {
            image.set(x as u32, y as u32, *value);
        }
    }
    image
}

#[test]
fn view() {
    let image = mkimage([[10, 20], [30, 40]]);

    let view = image.view(Rect::from_top_left(1, 0, 1, 1));
    assert_eq!(view.width(), 1);
    assert_eq!(view.height(), 1);
    assert_eq!(view.get(0, 0), 20);

    // Views keep their size; pixels outside of the image read as 0.
    let view = image.view(Rect::from_top_left(1, 1, 2, 2));
    assert_eq!(view.width(), 2);
    assert_eq!(view.height(), 2);
    assert_eq!(view.get(0, 0), 40);
    assert_eq!(view.get(1, 1), 0);
    assert_eq!(
        view.to_image(),
        mkimage([[40, 0], [0, 0]]),
    );
}

#[test]
fn subview() {
    let image = Image::from_fn(10, 10, |x, y| (y * 10 + x) as u8);
    let view = image.view(Rect::from_top_left(2, 3, 5, 5));
    let sub = view.view(Rect::from_top_left(1, 1, 2, 2));
    assert_eq!(sub.image_rect(), Rect::from_top_left(3, 4, 2, 2));
    assert_eq!(sub.to_image(), mkimage([[43, 44], [53, 54]]));
}

#[test]
fn flip() {
    let image = mkimage([[1, 2, 3]]);
    assert_eq!(image.flip_horizontal(), mkimage([[3, 2, 1]]));
}

#[test]
fn from_raw_checks_length() {
    assert!(Image::from_raw(2, 2, vec![0; 3]).is_none());
    assert!(Image::from_raw(2, 2, vec![0; 5]).is_none());
    let image = Image::from_raw(2, 2, vec![1, 2, 3, 4]).unwrap();
    assert_eq!(image.get(1, 1), 4);
    assert_eq!(image.data(), &[1, 2, 3, 4]);
}

#[test]
fn color_conversion() {
    let rgba = image::RgbaImage::from_pixel(3, 2, image::Rgba([200, 200, 200, 255]));
    let gray = Image::from_rgba8(&rgba);
    assert_eq!(gray.width(), 3);
    assert_eq!(gray.height(), 2);
    assert_eq!(gray.get(2, 1), 200);

    let rgb = image::RgbImage::from_pixel(1, 1, image::Rgb([0, 0, 0]));
    assert_eq!(Image::from_rgb8(&rgb).get(0, 0), 0);
}

#[test]
fn resize_keeps_uniform_images() {
    let image = Image::filled(40, 20, 90);
    let small = image.resize(10, 5);
    assert_eq!(small, Image::filled(10, 5, 90));
}
