use image::{DynamicImage, GenericImageView, RgbaImage, imageops};
use std::io::Cursor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// EXIF orientations 3, 6 and 8 are pure clockwise rotations.
    pub fn from_orientation(orientation: u32) -> Option<Self> {
        match orientation {
            3 => Some(Rotation::Deg180),
            6 => Some(Rotation::Deg90),
            8 => Some(Rotation::Deg270),
            _ => None,
        }
    }

    pub fn degrees(self) -> f64 {
        match self {
            Rotation::Deg90 => 90.0,
            Rotation::Deg180 => 180.0,
            Rotation::Deg270 => 270.0,
        }
    }
}

/// EXIF orientation tag of the primary image, or 0 when it cannot be read.
pub fn read_orientation(bytes: &[u8]) -> u32 {
    let exif = match exif::Reader::new().read_from_container(&mut Cursor::new(bytes)) {
        Ok(exif) => exif,
        Err(e) => {
            tracing::debug!("No EXIF data: {}", e);
            return 0;
        }
    };

    exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)
        .and_then(|field| field.value.get_uint(0))
        .unwrap_or(0)
}

/// Canvas that fully contains a `width` x `height` image rotated by `degrees`.
pub fn rotated_bounds(width: u32, height: u32, degrees: f64) -> (u32, u32) {
    let radians = (degrees % 360.0).to_radians();
    let (sin, cos) = radians.sin_cos();
    let (w, h) = (f64::from(width), f64::from(height));

    let new_width = (w * cos - h * sin).abs().max((w * cos + h * sin).abs());
    let new_height = (w * sin - h * cos).abs().max((w * sin + h * cos).abs());

    (new_width.round() as u32, new_height.round() as u32)
}

pub fn rotate(img: &DynamicImage, rotation: Rotation) -> DynamicImage {
    let rotated = match rotation {
        Rotation::Deg90 => img.rotate90(),
        Rotation::Deg180 => img.rotate180(),
        Rotation::Deg270 => img.rotate270(),
    };

    let (width, height) = rotated_bounds(img.width(), img.height(), rotation.degrees());
    if rotated.dimensions() == (width, height) {
        return rotated;
    }

    let mut canvas = RgbaImage::new(width, height);
    let x = (i64::from(width) - i64::from(rotated.width())) / 2;
    let y = (i64::from(height) - i64::from(rotated.height())) / 2;
    imageops::overlay(&mut canvas, &rotated.to_rgba8(), x, y);
    DynamicImage::ImageRgba8(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_orientation_mapping() {
        assert_eq!(Rotation::from_orientation(3), Some(Rotation::Deg180));
        assert_eq!(Rotation::from_orientation(6), Some(Rotation::Deg90));
        assert_eq!(Rotation::from_orientation(8), Some(Rotation::Deg270));
        assert_eq!(Rotation::from_orientation(0), None);
        assert_eq!(Rotation::from_orientation(1), None);
        assert_eq!(Rotation::from_orientation(2), None);
    }

    #[test]
    fn test_rotated_bounds() {
        assert_eq!(rotated_bounds(40, 10, 90.0), (10, 40));
        assert_eq!(rotated_bounds(40, 10, 180.0), (40, 10));
        assert_eq!(rotated_bounds(40, 10, 270.0), (10, 40));
    }

    #[test]
    fn test_rotate_quarter_turn_moves_pixels() {
        let mut buffer = image::RgbImage::new(3, 2);
        buffer.put_pixel(0, 0, Rgb([255, 0, 0]));
        let img = DynamicImage::ImageRgb8(buffer);

        let rotated = rotate(&img, Rotation::Deg90);
        assert_eq!(rotated.dimensions(), (2, 3));
        // top-left ends up top-right after a clockwise quarter turn
        assert_eq!(rotated.to_rgb8().get_pixel(1, 0), &Rgb([255, 0, 0]));

        let flipped = rotate(&img, Rotation::Deg180);
        assert_eq!(flipped.dimensions(), (3, 2));
        assert_eq!(flipped.to_rgb8().get_pixel(2, 1), &Rgb([255, 0, 0]));
    }

    #[test]
    fn test_missing_exif_reads_as_zero() {
        assert_eq!(read_orientation(b"definitely not an image"), 0);
        assert_eq!(read_orientation(&[]), 0);
    }
}
