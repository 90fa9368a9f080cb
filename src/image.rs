//! CPU-visible pixel containers and transfer formats.

use crate::error::{Error, Result};
use crate::gl;

/// Transfer format of pixel data in host memory.
///
/// Pairs a channel layout with a component datatype, matching the
/// `format`/`type` argument pair of the raw transfer calls.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Format {
    /// 8-bit unsigned integer components.
    U8(U8),

    /// 16-bit unsigned integer components.
    U16(U16),

    /// 32-bit floating point components.
    F32(F32),
}

impl Format {
    /// Returns the equivalent `(type, format)` pair of GL enumeration
    /// constants.
    pub(crate) fn as_gl_enums(&self) -> (u32, u32) {
        match *self {
            Format::U8(U8::R) => (gl::UNSIGNED_BYTE, gl::RED),
            Format::U8(U8::Rg) => (gl::UNSIGNED_BYTE, gl::RG),
            Format::U8(U8::Rgb) => (gl::UNSIGNED_BYTE, gl::RGB),
            Format::U8(U8::Bgr) => (gl::UNSIGNED_BYTE, gl::BGR),
            Format::U8(U8::Rgba) => (gl::UNSIGNED_BYTE, gl::RGBA),
            Format::U8(U8::Bgra) => (gl::UNSIGNED_BYTE, gl::BGRA),

            Format::U16(U16::R) => (gl::UNSIGNED_SHORT, gl::RED),
            Format::U16(U16::Rg) => (gl::UNSIGNED_SHORT, gl::RG),
            Format::U16(U16::Rgb) => (gl::UNSIGNED_SHORT, gl::RGB),
            Format::U16(U16::Bgr) => (gl::UNSIGNED_SHORT, gl::BGR),
            Format::U16(U16::Rgba) => (gl::UNSIGNED_SHORT, gl::RGBA),
            Format::U16(U16::Bgra) => (gl::UNSIGNED_SHORT, gl::BGRA),

            Format::F32(F32::R) => (gl::FLOAT, gl::RED),
            Format::F32(F32::Rg) => (gl::FLOAT, gl::RG),
            Format::F32(F32::Rgb) => (gl::FLOAT, gl::RGB),
            Format::F32(F32::Bgr) => (gl::FLOAT, gl::BGR),
            Format::F32(F32::Rgba) => (gl::FLOAT, gl::RGBA),
            Format::F32(F32::Bgra) => (gl::FLOAT, gl::BGRA),
        }
    }

    /// Returns the number of channels per pixel.
    pub fn channels(&self) -> usize {
        match *self {
            Format::U8(layout) => layout.channels(),
            Format::U16(layout) => layout.channels(),
            Format::F32(layout) => layout.channels(),
        }
    }

    /// Returns the size of a single component in bytes.
    pub fn component_size(&self) -> usize {
        match *self {
            Format::U8(_) => 1,
            Format::U16(_) => 2,
            Format::F32(_) => 4,
        }
    }

    /// Returns the size of a whole pixel in bytes.
    pub fn bytes_per_pixel(&self) -> usize {
        self.channels() * self.component_size()
    }

    /// Returns the storage layout that holds this transfer format without
    /// precision loss. Swizzled layouts store in channel order.
    pub fn default_storage(&self) -> InternalFormat {
        match *self {
            Format::U8(U8::R) => InternalFormat::R8,
            Format::U8(U8::Rg) => InternalFormat::Rg8,
            Format::U8(U8::Rgb) | Format::U8(U8::Bgr) => InternalFormat::Rgb8,
            Format::U8(U8::Rgba) | Format::U8(U8::Bgra) => InternalFormat::Rgba8,

            Format::U16(U16::R) => InternalFormat::R16,
            Format::U16(U16::Rg) => InternalFormat::Rg16,
            Format::U16(U16::Rgb) | Format::U16(U16::Bgr) => InternalFormat::Rgb16,
            Format::U16(U16::Rgba) | Format::U16(U16::Bgra) => InternalFormat::Rgba16,

            Format::F32(F32::R) => InternalFormat::R32f,
            Format::F32(F32::Rg) => InternalFormat::Rg32f,
            Format::F32(F32::Rgb) | Format::F32(F32::Bgr) => InternalFormat::Rgb32f,
            Format::F32(F32::Rgba) | Format::F32(F32::Bgra) => InternalFormat::Rgba32f,
        }
    }
}

impl From<U8> for Format {
    fn from(layout: U8) -> Self {
        Format::U8(layout)
    }
}

impl From<U16> for Format {
    fn from(layout: U16) -> Self {
        Format::U16(layout)
    }
}

impl From<F32> for Format {
    fn from(layout: F32) -> Self {
        Format::F32(layout)
    }
}

macro_rules! impl_channel_layout {
    ($ident:ident) => {
        /// Channel layout for one component datatype.
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        pub enum $ident {
            /// `[R; R; R; R; R, ...]`
            R,

            /// `[R, G; R, G; R, ...]`
            Rg,

            /// `[R, G, B; R, G, ...]`
            Rgb,

            /// `[B, G, R; B, G, ...]`
            Bgr,

            /// `[R, G, B, A; R, ...]`
            Rgba,

            /// `[B, G, R, A; R, ...]`
            Bgra,
        }

        impl $ident {
            /// Returns the number of channels per pixel.
            pub fn channels(self) -> usize {
                match self {
                    $ident::R => 1,
                    $ident::Rg => 2,
                    $ident::Rgb | $ident::Bgr => 3,
                    $ident::Rgba | $ident::Bgra => 4,
                }
            }
        }
    };
}

impl_channel_layout!(U8);
impl_channel_layout!(U16);
impl_channel_layout!(F32);

/// GPU-side storage layout of a texture or renderbuffer.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum InternalFormat {
    /// Corresponds to `GL_R8`.
    R8,

    /// Corresponds to `GL_RG8`.
    Rg8,

    /// Corresponds to `GL_RGB8`.
    Rgb8,

    /// Corresponds to `GL_RGBA8`.
    Rgba8,

    /// Corresponds to `GL_R16`.
    R16,

    /// Corresponds to `GL_RG16`.
    Rg16,

    /// Corresponds to `GL_RGB16`.
    Rgb16,

    /// Corresponds to `GL_RGBA16`.
    Rgba16,

    /// Corresponds to `GL_R32F`.
    R32f,

    /// Corresponds to `GL_RG32F`.
    Rg32f,

    /// Corresponds to `GL_RGB32F`.
    Rgb32f,

    /// Corresponds to `GL_RGBA32F`.
    Rgba32f,

    /// Corresponds to `GL_DEPTH_COMPONENT24`.
    Depth24,

    /// Corresponds to `GL_DEPTH_COMPONENT32F`.
    Depth32f,
}

impl InternalFormat {
    pub(crate) fn as_gl_enum(self) -> u32 {
        match self {
            InternalFormat::R8 => gl::R8,
            InternalFormat::Rg8 => gl::RG8,
            InternalFormat::Rgb8 => gl::RGB8,
            InternalFormat::Rgba8 => gl::RGBA8,
            InternalFormat::R16 => gl::R16,
            InternalFormat::Rg16 => gl::RG16,
            InternalFormat::Rgb16 => gl::RGB16,
            InternalFormat::Rgba16 => gl::RGBA16,
            InternalFormat::R32f => gl::R32F,
            InternalFormat::Rg32f => gl::RG32F,
            InternalFormat::Rgb32f => gl::RGB32F,
            InternalFormat::Rgba32f => gl::RGBA32F,
            InternalFormat::Depth24 => gl::DEPTH_COMPONENT24,
            InternalFormat::Depth32f => gl::DEPTH_COMPONENT32F,
        }
    }

    /// Returns the lossless host transfer format, or `None` for storage
    /// layouts without a host-side representation (depth).
    pub fn host_format(self) -> Option<Format> {
        match self {
            InternalFormat::R8 => Some(Format::U8(U8::R)),
            InternalFormat::Rg8 => Some(Format::U8(U8::Rg)),
            InternalFormat::Rgb8 => Some(Format::U8(U8::Rgb)),
            InternalFormat::Rgba8 => Some(Format::U8(U8::Rgba)),
            InternalFormat::R16 => Some(Format::U16(U16::R)),
            InternalFormat::Rg16 => Some(Format::U16(U16::Rg)),
            InternalFormat::Rgb16 => Some(Format::U16(U16::Rgb)),
            InternalFormat::Rgba16 => Some(Format::U16(U16::Rgba)),
            InternalFormat::R32f => Some(Format::F32(F32::R)),
            InternalFormat::Rg32f => Some(Format::F32(F32::Rg)),
            InternalFormat::Rgb32f => Some(Format::F32(F32::Rgb)),
            InternalFormat::Rgba32f => Some(Format::F32(F32::Rgba)),
            InternalFormat::Depth24 | InternalFormat::Depth32f => None,
        }
    }
}

/// Owned row-major pixel buffer with an explicit row pitch.
///
/// The pitch may exceed `width * bytes_per_pixel` to carry row alignment
/// padding; transfer paths only accept the packed case and callers repack
/// explicitly otherwise.
#[derive(Clone, Debug)]
pub struct TypedImage {
    width: u32,
    height: u32,
    pitch: usize,
    format: Format,
    data: Vec<u8>,
}

impl TypedImage {
    /// Allocates a zeroed, tightly packed image.
    pub fn new(width: u32, height: u32, format: Format) -> Self {
        let pitch = width as usize * format.bytes_per_pixel();
        Self {
            width,
            height,
            pitch,
            format,
            data: vec![0; pitch * height as usize],
        }
    }

    /// Wraps existing pixel data.
    ///
    /// The pitch must cover a full row and the data must cover
    /// `pitch * height` bytes.
    pub fn from_data(
        width: u32,
        height: u32,
        pitch: usize,
        format: Format,
        data: Vec<u8>,
    ) -> Result<Self> {
        if pitch < width as usize * format.bytes_per_pixel() {
            return Err(Error::InvalidArgument(format!(
                "pitch {} shorter than a row of {} pixels",
                pitch, width,
            )));
        }
        if data.len() < pitch * height as usize {
            return Err(Error::InvalidArgument(format!(
                "{} bytes of data for pitch {} x {} rows",
                data.len(),
                pitch,
                height,
            )));
        }
        Ok(Self { width, height, pitch, format, data })
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the row stride in bytes.
    pub fn pitch(&self) -> usize {
        self.pitch
    }

    /// Returns the pixel format.
    pub fn format(&self) -> Format {
        self.format
    }

    /// Returns the backing bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the backing bytes mutably.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Returns one row of pixels, excluding pitch padding, or `None` when
    /// `y` is off the bottom of the image.
    pub fn row(&self, y: u32) -> Option<&[u8]> {
        if y >= self.height {
            return None;
        }
        let start = y as usize * self.pitch;
        let used = self.width as usize * self.format.bytes_per_pixel();
        Some(&self.data[start..start + used])
    }

    /// Returns whether rows carry no padding.
    pub fn is_packed(&self) -> bool {
        self.pitch == self.width as usize * self.format.bytes_per_pixel()
    }

    /// Returns a tightly packed copy with row order reversed.
    pub fn flipped(&self) -> TypedImage {
        let mut out = TypedImage::new(self.width, self.height, self.format);
        let used = self.width as usize * self.format.bytes_per_pixel();
        for y in 0..self.height {
            let src = (self.height - 1 - y) as usize * self.pitch;
            let dst = y as usize * used;
            out.data[dst..dst + used].copy_from_slice(&self.data[src..src + used]);
        }
        out
    }
}

/// Borrowed view of host memory with explicit shape and strides.
///
/// Mirrors the metadata of foreign array representations so the packing
/// decision stays independent of where the bytes came from.
#[derive(Clone, Copy, Debug)]
pub struct BufferView<'a> {
    data: &'a [u8],
    shape: &'a [usize],
    strides: &'a [usize],
    itemsize: usize,
}

impl<'a> BufferView<'a> {
    /// Constructor.
    ///
    /// Every dimension needs a stride, and the furthest byte the strides
    /// address must be backed by `data`.
    pub fn new(
        data: &'a [u8],
        shape: &'a [usize],
        strides: &'a [usize],
        itemsize: usize,
    ) -> Result<Self> {
        if shape.len() != strides.len() {
            return Err(Error::InvalidArgument(format!(
                "{} extents against {} strides",
                shape.len(),
                strides.len(),
            )));
        }
        if !shape.contains(&0) {
            let span = shape
                .iter()
                .zip(strides)
                .try_fold(itemsize, |span, (&extent, &stride)| {
                    (extent - 1).checked_mul(stride)?.checked_add(span)
                });
            match span {
                Some(span) if span <= data.len() => {}
                _ => {
                    return Err(Error::InvalidArgument(format!(
                        "strides address more than the {} backed bytes",
                        data.len(),
                    )));
                }
            }
        }
        Ok(Self { data, shape, strides, itemsize })
    }

    /// Returns the viewed bytes.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Returns the extent of each dimension, outermost first.
    pub fn shape(&self) -> &[usize] {
        self.shape
    }

    /// Returns the byte stride of each dimension.
    pub fn strides(&self) -> &[usize] {
        self.strides
    }

    /// Returns the size of a single element in bytes.
    pub fn itemsize(&self) -> usize {
        self.itemsize
    }

    /// Returns the number of bytes the view covers once packed.
    pub fn len_bytes(&self) -> usize {
        self.shape.iter().product::<usize>() * self.itemsize
    }

    /// Returns whether the view is tightly packed.
    pub fn is_packed(&self) -> bool {
        is_packed(self.shape, self.strides, self.itemsize)
    }

    /// Gathers the view into a tightly packed staging copy.
    ///
    /// The explicit escape hatch for strided input: transfer paths reject
    /// non-packed views rather than copying behind the caller's back.
    pub fn packed(&self) -> Vec<u8> {
        if self.shape.iter().any(|&extent| extent == 0) {
            return Vec::new();
        }
        let mut out = Vec::with_capacity(self.len_bytes());
        let mut index = vec![0usize; self.shape.len()];
        'gather: loop {
            let offset: usize = index
                .iter()
                .zip(self.strides)
                .map(|(i, s)| i * s)
                .sum();
            out.extend_from_slice(&self.data[offset..offset + self.itemsize]);
            for dim in (0..self.shape.len()).rev() {
                index[dim] += 1;
                if index[dim] < self.shape[dim] {
                    continue 'gather;
                }
                index[dim] = 0;
            }
            break;
        }
        out
    }
}

/// Returns whether memory described by `shape`/`strides`/`itemsize` is
/// tightly packed.
///
/// Scanning from the innermost dimension outwards, each stride must equal
/// the itemsize times the product of all faster-varying extents.
pub fn is_packed(shape: &[usize], strides: &[usize], itemsize: usize) -> bool {
    if shape.len() != strides.len() {
        return false;
    }
    let mut next_expected_stride = itemsize;
    for i in (0..shape.len()).rev() {
        if strides[i] != next_expected_stride {
            return false;
        }
        next_expected_stride *= shape[i];
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packed_2d() {
        assert!(is_packed(&[4, 4], &[16, 4], 4));
    }

    #[test]
    fn row_padding_is_not_packed() {
        assert!(!is_packed(&[4, 4], &[20, 4], 4));
    }

    #[test]
    fn element_padding_is_not_packed() {
        assert!(!is_packed(&[4, 4], &[32, 8], 4));
    }

    #[test]
    fn packed_3d_interleaved() {
        // 4x4 RGB bytes: strides (12, 3, 1), itemsize 1.
        assert!(is_packed(&[4, 4, 3], &[12, 3, 1], 1));
    }

    #[test]
    fn scalar_view_is_packed() {
        assert!(is_packed(&[], &[], 4));
    }

    #[test]
    fn view_gathers_padded_rows() {
        // Two rows of two u8 elements with 1 byte of row padding.
        let data = [1u8, 2, 0xff, 3, 4, 0xff];
        let view = BufferView::new(&data, &[2, 2], &[3, 1], 1).unwrap();
        assert!(!view.is_packed());
        assert_eq!(view.packed(), vec![1, 2, 3, 4]);
        assert_eq!(view.len_bytes(), 4);
    }

    #[test]
    fn view_rejects_missing_strides() {
        let data = [0u8; 4];
        let result = BufferView::new(&data, &[2, 2], &[2], 1);
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn view_rejects_strides_past_backing() {
        let data = [0u8; 4];
        let result = BufferView::new(&data, &[2, 2], &[4, 1], 1);
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn view_stride_overflow_is_rejected() {
        let data = [0u8; 4];
        let result = BufferView::new(&data, &[2, 2], &[usize::MAX, 1], 1);
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn mismatched_metadata_is_not_packed() {
        assert!(!is_packed(&[2, 2], &[2], 1));
    }

    #[test]
    fn format_sizes() {
        assert_eq!(Format::U8(U8::Rgba).bytes_per_pixel(), 4);
        assert_eq!(Format::U8(U8::R).bytes_per_pixel(), 1);
        assert_eq!(Format::U16(U16::Rg).bytes_per_pixel(), 4);
        assert_eq!(Format::F32(F32::Rgb).bytes_per_pixel(), 12);
    }

    #[test]
    fn typed_image_pitch() {
        let image = TypedImage::new(7, 3, Format::U8(U8::Rgb));
        assert_eq!(image.pitch(), 21);
        assert!(image.is_packed());
        assert_eq!(image.data().len(), 63);
    }

    #[test]
    fn row_off_the_bottom_is_none() {
        let image = TypedImage::new(2, 3, Format::U8(U8::R));
        assert!(image.row(2).is_some());
        assert!(image.row(3).is_none());
    }

    #[test]
    fn typed_image_rejects_short_pitch() {
        let result = TypedImage::from_data(8, 2, 8, Format::U8(U8::Rgba), vec![0; 64]);
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn typed_image_flip_reverses_rows() {
        let data = vec![
            1, 2, //
            3, 4, //
            5, 6,
        ];
        let image = TypedImage::from_data(2, 3, 2, Format::U8(U8::R), data).unwrap();
        let flipped = image.flipped();
        assert_eq!(flipped.data(), &[5, 6, 3, 4, 1, 2]);
    }

    #[test]
    fn depth_formats_have_no_host_format() {
        assert!(InternalFormat::Depth24.host_format().is_none());
        assert_eq!(
            InternalFormat::Rgba8.host_format(),
            Some(Format::U8(U8::Rgba)),
        );
    }
}
