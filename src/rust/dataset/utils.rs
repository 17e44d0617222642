use std::path::Path;

use image::{DynamicImage, GrayAlphaImage, GrayImage, RgbImage, RgbaImage};
use ndarray::Array3;

use super::error::DatasetError;

/// Decodes an image file into a `height x width x channels` pixel array.
///
/// 8-bit gray, gray+alpha, RGB and RGBA images keep their channel count;
/// anything else is converted to 8-bit RGB.
pub(crate) fn read_image(path: &Path) -> Result<Array3<u8>, DatasetError> {
    let image = image::open(path).map_err(|source| DatasetError::Image {
        path: path.to_path_buf(),
        source,
    })?;
    image_to_array(image)
}

pub(crate) fn image_to_array(image: DynamicImage) -> Result<Array3<u8>, DatasetError> {
    let (width, height) = (image.width() as usize, image.height() as usize);
    let (channels, raw) = match image {
        DynamicImage::ImageLuma8(buf) => (1, buf.into_raw()),
        DynamicImage::ImageLumaA8(buf) => (2, buf.into_raw()),
        DynamicImage::ImageRgb8(buf) => (3, buf.into_raw()),
        DynamicImage::ImageRgba8(buf) => (4, buf.into_raw()),
        other => (3, other.to_rgb8().into_raw()),
    };
    Ok(Array3::from_shape_vec((height, width, channels), raw)?)
}

pub(crate) fn array_to_image(pixels: &Array3<u8>) -> Result<DynamicImage, DatasetError> {
    let (height, width, channels) = pixels.dim();
    let raw: Vec<u8> = pixels.iter().copied().collect();
    let (width, height) = (width as u32, height as u32);

    let image = match channels {
        1 => GrayImage::from_raw(width, height, raw).map(DynamicImage::ImageLuma8),
        2 => GrayAlphaImage::from_raw(width, height, raw).map(DynamicImage::ImageLumaA8),
        3 => RgbImage::from_raw(width, height, raw).map(DynamicImage::ImageRgb8),
        4 => RgbaImage::from_raw(width, height, raw).map(DynamicImage::ImageRgba8),
        _ => None,
    };
    image.ok_or(DatasetError::PixelLayout((height as usize, width as usize, channels)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb};

    #[test]
    fn test_gray_image_shape() {
        let gray = GrayImage::from_fn(4, 3, |x, y| Luma([(x + 10 * y) as u8]));
        let pixels = image_to_array(DynamicImage::ImageLuma8(gray)).unwrap();
        assert_eq!(pixels.dim(), (3, 4, 1));
        assert_eq!(pixels[[2, 1, 0]], 21);
    }

    #[test]
    fn test_rgb_array_to_image() {
        let mut pixels = Array3::<u8>::zeros((2, 5, 3));
        pixels[[1, 4, 2]] = 200;
        let image = array_to_image(&pixels).unwrap();
        let rgb = image.as_rgb8().unwrap();
        assert_eq!(rgb.dimensions(), (5, 2));
        assert_eq!(*rgb.get_pixel(4, 1), Rgb([0, 0, 200]));
    }

    #[test]
    fn test_sixteen_bit_converted_to_rgb() {
        let wide = image::ImageBuffer::<Luma<u16>, Vec<u16>>::new(2, 2);
        let pixels = image_to_array(DynamicImage::ImageLuma16(wide)).unwrap();
        assert_eq!(pixels.dim(), (2, 2, 3));
    }

    #[test]
    fn test_unsupported_channel_count() {
        let pixels = Array3::<u8>::zeros((2, 2, 5));
        assert!(matches!(array_to_image(&pixels), Err(DatasetError::PixelLayout((2, 2, 5)))));
    }
}
