//! Image file decode and encode.
//!
//! Format support is entirely delegated to the `image` crate; this module
//! only negotiates between its buffer types and [`TypedImage`].

use std::path::Path;

use image::DynamicImage;

use crate::error::{Error, Result};
use crate::image::{Format, TypedImage, U16, U8};

/// Decodes an image file into a tightly packed host image.
///
/// Grayscale, RGB and RGBA files map directly at 8 and 16 bits per
/// component; everything else is widened to 8-bit RGBA.
pub fn decode<P: AsRef<Path>>(path: P) -> Result<TypedImage> {
    let decoded = image::open(path)?;
    let typed = match decoded {
        DynamicImage::ImageLuma8(buffer) => {
            let (w, h) = (buffer.width(), buffer.height());
            TypedImage::from_data(w, h, w as usize, Format::U8(U8::R), buffer.into_raw())?
        }
        DynamicImage::ImageRgb8(buffer) => {
            let (w, h) = (buffer.width(), buffer.height());
            TypedImage::from_data(w, h, w as usize * 3, Format::U8(U8::Rgb), buffer.into_raw())?
        }
        DynamicImage::ImageRgba8(buffer) => {
            let (w, h) = (buffer.width(), buffer.height());
            TypedImage::from_data(w, h, w as usize * 4, Format::U8(U8::Rgba), buffer.into_raw())?
        }
        DynamicImage::ImageLuma16(buffer) => {
            let (w, h) = (buffer.width(), buffer.height());
            let data = bytes_u16(buffer.into_raw());
            TypedImage::from_data(w, h, w as usize * 2, Format::U16(U16::R), data)?
        }
        DynamicImage::ImageRgb16(buffer) => {
            let (w, h) = (buffer.width(), buffer.height());
            let data = bytes_u16(buffer.into_raw());
            TypedImage::from_data(w, h, w as usize * 6, Format::U16(U16::Rgb), data)?
        }
        DynamicImage::ImageRgba16(buffer) => {
            let (w, h) = (buffer.width(), buffer.height());
            let data = bytes_u16(buffer.into_raw());
            TypedImage::from_data(w, h, w as usize * 8, Format::U16(U16::Rgba), data)?
        }
        other => {
            let buffer = other.to_rgba8();
            let (w, h) = (buffer.width(), buffer.height());
            TypedImage::from_data(w, h, w as usize * 4, Format::U8(U8::Rgba), buffer.into_raw())?
        }
    };
    Ok(typed)
}

/// Encodes a host image to disk; the file format follows the path extension.
///
/// Swizzled and floating point layouts have no file representation here and
/// are rejected with `UnsupportedOperation`.
pub fn encode<P: AsRef<Path>>(image: &TypedImage, path: P) -> Result<()> {
    if !image.is_packed() {
        return Err(Error::UnsupportedLayout("image rows carry padding".into()));
    }
    let (w, h) = (image.width(), image.height());
    match image.format() {
        Format::U8(U8::R) => buffer_u8::<image::Luma<u8>>(w, h, image.data())?.save(path)?,
        Format::U8(U8::Rgb) => buffer_u8::<image::Rgb<u8>>(w, h, image.data())?.save(path)?,
        Format::U8(U8::Rgba) => buffer_u8::<image::Rgba<u8>>(w, h, image.data())?.save(path)?,
        Format::U16(U16::R) => buffer_u16::<image::Luma<u16>>(w, h, image.data())?.save(path)?,
        Format::U16(U16::Rgb) => buffer_u16::<image::Rgb<u16>>(w, h, image.data())?.save(path)?,
        Format::U16(U16::Rgba) => buffer_u16::<image::Rgba<u16>>(w, h, image.data())?.save(path)?,
        format => {
            return Err(Error::UnsupportedOperation(format!(
                "no file encoding for {:?}",
                format,
            )));
        }
    }
    Ok(())
}

fn buffer_u8<P>(w: u32, h: u32, data: &[u8]) -> Result<image::ImageBuffer<P, Vec<u8>>>
    where P: image::Pixel<Subpixel = u8>
{
    image::ImageBuffer::from_raw(w, h, data.to_vec()).ok_or_else(|| {
        Error::InvalidArgument("pixel data shorter than the image extents".into())
    })
}

fn bytes_u16(raw: Vec<u16>) -> Vec<u8> {
    raw.into_iter().flat_map(u16::to_ne_bytes).collect()
}

fn buffer_u16<P>(w: u32, h: u32, data: &[u8]) -> Result<image::ImageBuffer<P, Vec<u16>>>
    where P: image::Pixel<Subpixel = u16>
{
    let widened = data
        .chunks_exact(2)
        .map(|pair| u16::from_ne_bytes([pair[0], pair[1]]))
        .collect();
    image::ImageBuffer::from_raw(w, h, widened).ok_or_else(|| {
        Error::InvalidArgument("pixel data shorter than the image extents".into())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn scratch_path(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join("glcore-codec-tests");
        fs::create_dir_all(&dir).unwrap();
        dir.join(name)
    }

    #[test]
    fn rgb_round_trip() {
        let mut source = TypedImage::new(4, 3, Format::U8(U8::Rgb));
        for (i, byte) in source.data_mut().iter_mut().enumerate() {
            *byte = (i * 7 % 256) as u8;
        }
        let path = scratch_path("rgb_round_trip.png");
        encode(&source, &path).unwrap();
        let decoded = decode(&path).unwrap();
        assert_eq!(decoded.width(), 4);
        assert_eq!(decoded.height(), 3);
        assert_eq!(decoded.format(), Format::U8(U8::Rgb));
        assert_eq!(decoded.data(), source.data());
    }

    #[test]
    fn grayscale_round_trip() {
        let data = (0u8..16).collect::<Vec<_>>();
        let source = TypedImage::from_data(4, 4, 4, Format::U8(U8::R), data).unwrap();
        let path = scratch_path("gray_round_trip.png");
        encode(&source, &path).unwrap();
        let decoded = decode(&path).unwrap();
        assert_eq!(decoded.format(), Format::U8(U8::R));
        assert_eq!(decoded.data(), source.data());
    }

    #[test]
    fn sixteen_bit_round_trip_keeps_precision() {
        let mut source = TypedImage::new(3, 2, Format::U16(U16::Rgb));
        for (i, pair) in source.data_mut().chunks_exact_mut(2).enumerate() {
            pair.copy_from_slice(&((i as u16) << 9 | 0x1ff).to_ne_bytes());
        }
        let path = scratch_path("rgb16_round_trip.png");
        encode(&source, &path).unwrap();
        let decoded = decode(&path).unwrap();
        assert_eq!(decoded.format(), Format::U16(U16::Rgb));
        assert_eq!(decoded.data(), source.data());
    }

    #[test]
    fn swizzled_layouts_are_rejected() {
        let source = TypedImage::new(2, 2, Format::U8(U8::Bgra));
        let result = encode(&source, scratch_path("never-written.png"));
        assert!(matches!(result, Err(Error::UnsupportedOperation(_))));
    }

    #[test]
    fn missing_file_surfaces_codec_error() {
        let result = decode(scratch_path("does-not-exist.png"));
        assert!(result.is_err());
    }
}
