//! GPU-visible 2D pixel container.

use std::{fmt, path, ptr};

use crate::codec;
use crate::error::{Error, Result};
use crate::gl::{self, Backend};
use crate::image::{BufferView, Format, InternalFormat, TypedImage};
use crate::Resource;

/// OpenGL texture ID type.
pub(crate) type Id = u32;

/// Rectangular region of the render surface, in pixels.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Viewport {
    /// Left edge.
    pub x: i32,

    /// Bottom edge.
    pub y: i32,

    /// Width.
    pub w: u32,

    /// Height.
    pub h: u32,
}

impl Viewport {
    /// Constructor.
    pub fn new(x: i32, y: i32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
}

/// A 2D texture object.
///
/// `id == 0` represents "no texture": the default-constructed state and the
/// state after [`delete`](Texture::delete). Reinitialisation reallocates the
/// GPU storage; prior contents are not preserved.
pub struct Texture {
    /// The OpenGL texture ID, 0 when invalid.
    id: Id,

    width: u32,
    height: u32,
    internal_format: InternalFormat,
    backend: Backend,
}

impl Texture {
    /// Constructs an invalid texture holding no GPU storage.
    pub fn new(backend: &Backend) -> Self {
        Self {
            id: 0,
            width: 0,
            height: 0,
            internal_format: InternalFormat::Rgba8,
            backend: backend.clone(),
        }
    }

    /// Constructs a texture initialised from a host image.
    pub fn from_image(
        backend: &Backend,
        image: &TypedImage,
        sampling_linear: bool,
    ) -> Result<Self> {
        let mut texture = Self::new(backend);
        texture.load(image, sampling_linear)?;
        Ok(texture)
    }

    /// Constructs a texture initialised from an image file.
    pub fn from_file<P>(backend: &Backend, path: P, sampling_linear: bool) -> Result<Self>
        where P: AsRef<path::Path>
    {
        let mut texture = Self::new(backend);
        texture.load_from_file(path, sampling_linear)?;
        Ok(texture)
    }

    /// Returns the OpenGL texture ID.
    pub(crate) fn id(&self) -> Id {
        self.id
    }

    /// Returns the backend handle.
    pub(crate) fn backend(&self) -> &Backend {
        &self.backend
    }

    /// Returns the width of the texture in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the height of the texture in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the GPU storage layout.
    pub fn internal_format(&self) -> InternalFormat {
        self.internal_format
    }

    /// Allocates new GPU storage with the given dimensions and layout,
    /// discarding any prior contents.
    ///
    /// When `data` is given it becomes the initial contents, interpreted
    /// through `format` as the source layout; it must be tightly packed and
    /// cover `width * height` pixels.
    pub fn reinitialise(
        &mut self,
        width: u32,
        height: u32,
        internal_format: InternalFormat,
        sampling_linear: bool,
        border: i32,
        format: Format,
        data: Option<&[u8]>,
    ) -> Result<()> {
        if let Some(data) = data {
            let expected = width as usize * height as usize * format.bytes_per_pixel();
            if data.len() != expected {
                return Err(Error::InvalidArgument(format!(
                    "{} bytes of initial data for a {}x{} texture ({} expected)",
                    data.len(),
                    width,
                    height,
                    expected,
                )));
            }
        }
        if self.id == 0 {
            self.id = self.backend.gen_texture();
            if self.id == 0 {
                return Err(Error::Resource("failed to generate a texture name".into()));
            }
        }
        let (ty, fmt) = format.as_gl_enums();
        self.backend.bind_texture(gl::TEXTURE_2D, self.id);
        self.backend.pixel_store_i(gl::UNPACK_ALIGNMENT, 1);
        self.backend.tex_image_2d(
            gl::TEXTURE_2D,
            internal_format.as_gl_enum(),
            width,
            height,
            border,
            fmt,
            ty,
            data.map_or(ptr::null(), |d| d.as_ptr() as *const _),
        );
        let filter = if sampling_linear { gl::LINEAR } else { gl::NEAREST };
        self.backend.tex_parameteri(gl::TEXTURE_2D, gl::TEXTURE_MIN_FILTER, filter);
        self.backend.tex_parameteri(gl::TEXTURE_2D, gl::TEXTURE_MAG_FILTER, filter);
        self.backend.tex_parameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_S, gl::CLAMP_TO_EDGE);
        self.backend.tex_parameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_T, gl::CLAMP_TO_EDGE);
        self.backend.bind_texture(gl::TEXTURE_2D, 0);
        self.width = width;
        self.height = height;
        self.internal_format = internal_format;
        Ok(())
    }

    /// Releases the GPU storage and falls back to representing "no texture".
    ///
    /// Idempotent.
    pub fn delete(&mut self) {
        if self.id != 0 {
            self.backend.delete_texture(self.id);
            self.id = 0;
            self.width = 0;
            self.height = 0;
        }
    }

    /// Replaces the entire texture contents.
    ///
    /// `data` must be tightly packed and cover `width * height` pixels of
    /// `format`.
    pub fn upload(&self, data: &[u8], format: Format) -> Result<()> {
        self.require_valid()?;
        let expected = self.width as usize * self.height as usize * format.bytes_per_pixel();
        if data.len() != expected {
            return Err(Error::InvalidArgument(format!(
                "{} bytes of data for a {}x{} texture ({} expected)",
                data.len(),
                self.width,
                self.height,
                expected,
            )));
        }
        self.transfer(data, 0, 0, self.width, self.height, format);
        Ok(())
    }

    /// Overwrites a sub-rectangle of the texture.
    ///
    /// `data` holds packed `data_w * data_h` pixels of `format`.
    pub fn upload_sub(
        &self,
        data: &[u8],
        x_offset: u32,
        y_offset: u32,
        data_w: u32,
        data_h: u32,
        format: Format,
    ) -> Result<()> {
        self.require_valid()?;
        check_sub_rect(self.width, self.height, x_offset, y_offset, data_w, data_h)?;
        let expected = data_w as usize * data_h as usize * format.bytes_per_pixel();
        if data.len() != expected {
            return Err(Error::InvalidArgument(format!(
                "{} bytes of data for a {}x{} sub-rectangle ({} expected)",
                data.len(),
                data_w,
                data_h,
                expected,
            )));
        }
        self.transfer(data, x_offset, y_offset, data_w, data_h, format);
        Ok(())
    }

    /// Replaces the texture contents from a strided host view.
    ///
    /// Only tightly packed views take the raw transfer path; strided views
    /// are rejected and must be staged through [`BufferView::packed`] by the
    /// caller first.
    pub fn upload_view(&self, view: &BufferView, format: Format) -> Result<()> {
        if !view.is_packed() {
            return Err(Error::UnsupportedLayout(
                "strided view; stage through BufferView::packed first".into(),
            ));
        }
        self.upload(&view.data()[..view.len_bytes()], format)
    }

    /// Reads the texture contents back into caller-provided memory.
    ///
    /// `data` must cover `width * height` pixels of `format`.
    pub fn download(&self, data: &mut [u8], format: Format) -> Result<()> {
        self.require_valid()?;
        let expected = self.width as usize * self.height as usize * format.bytes_per_pixel();
        if data.len() != expected {
            return Err(Error::InvalidArgument(format!(
                "{} bytes of space for a {}x{} texture ({} expected)",
                data.len(),
                self.width,
                self.height,
                expected,
            )));
        }
        let (ty, fmt) = format.as_gl_enums();
        self.backend.bind_texture(gl::TEXTURE_2D, self.id);
        self.backend.pixel_store_i(gl::PACK_ALIGNMENT, 1);
        self.backend.get_tex_image(gl::TEXTURE_2D, fmt, ty, data.as_mut_ptr() as *mut _);
        self.backend.bind_texture(gl::TEXTURE_2D, 0);
        Ok(())
    }

    /// Reads the texture contents back into a host image.
    ///
    /// The image must already describe matching dimensions and be tightly
    /// packed.
    pub fn download_image(&self, image: &mut TypedImage) -> Result<()> {
        self.require_valid()?;
        if image.width() != self.width || image.height() != self.height {
            return Err(Error::InvalidArgument(format!(
                "{}x{} image for a {}x{} texture",
                image.width(),
                image.height(),
                self.width,
                self.height,
            )));
        }
        if !image.is_packed() {
            return Err(Error::UnsupportedLayout("image rows carry padding".into()));
        }
        let format = image.format();
        self.download(image.data_mut(), format)
    }

    /// Reinitialises the texture from a host image.
    pub fn load(&mut self, image: &TypedImage, sampling_linear: bool) -> Result<()> {
        if !image.is_packed() {
            return Err(Error::UnsupportedLayout("image rows carry padding".into()));
        }
        self.reinitialise(
            image.width(),
            image.height(),
            image.format().default_storage(),
            sampling_linear,
            0,
            image.format(),
            Some(image.data()),
        )
    }

    /// Reinitialises the texture from an image file via the codec.
    pub fn load_from_file<P>(&mut self, path: P, sampling_linear: bool) -> Result<()>
        where P: AsRef<path::Path>
    {
        let image = codec::decode(path)?;
        self.load(&image, sampling_linear)
    }

    /// Downloads the texture and writes it to disk via the codec.
    ///
    /// `top_line_first` flips the row order; texture rows start at the
    /// bottom-left while image files start at the top.
    pub fn save<P>(&self, path: P, top_line_first: bool) -> Result<()>
        where P: AsRef<path::Path>
    {
        self.require_valid()?;
        let format = self.internal_format.host_format().ok_or_else(|| {
            Error::UnsupportedOperation(format!(
                "no host transfer format for {:?} storage",
                self.internal_format,
            ))
        })?;
        let mut image = TypedImage::new(self.width, self.height, format);
        self.download(image.data_mut(), format)?;
        if top_line_first {
            codec::encode(&image.flipped(), path)
        } else {
            codec::encode(&image, path)
        }
    }

    /// Switches minification and magnification to linear filtering.
    pub fn set_linear(&self) {
        self.set_filter(gl::LINEAR);
    }

    /// Switches minification and magnification to nearest-neighbour
    /// filtering.
    pub fn set_nearest_neighbour(&self) {
        self.set_filter(gl::NEAREST);
    }

    /// Draws the texture over the current viewport.
    pub fn render_to_viewport(&self) -> Result<()> {
        self.draw_quad(false, false)
    }

    /// Draws the texture over the current viewport, reversing row order
    /// when `flip` is set.
    pub fn render_to_viewport_flip(&self, flip: bool) -> Result<()> {
        self.draw_quad(false, flip)
    }

    /// Draws the texture over the current viewport, reversing row order.
    pub fn render_to_viewport_flip_y(&self) -> Result<()> {
        self.draw_quad(false, true)
    }

    /// Draws the texture over the current viewport, mirrored both ways.
    pub fn render_to_viewport_flip_x_flip_y(&self) -> Result<()> {
        self.draw_quad(true, true)
    }

    /// Draws the texture over the given viewport rectangle.
    pub fn render_to_rect(&self, viewport: Viewport, flip_x: bool, flip_y: bool) -> Result<()> {
        self.backend.viewport(viewport.x, viewport.y, viewport.w, viewport.h);
        self.draw_quad(flip_x, flip_y)
    }

    fn require_valid(&self) -> Result<()> {
        if self.id == 0 {
            Err(Error::InvalidArgument("texture is invalid".into()))
        } else {
            Ok(())
        }
    }

    fn transfer(&self, data: &[u8], x: u32, y: u32, w: u32, h: u32, format: Format) {
        let (ty, fmt) = format.as_gl_enums();
        self.backend.bind_texture(gl::TEXTURE_2D, self.id);
        self.backend.pixel_store_i(gl::UNPACK_ALIGNMENT, 1);
        self.backend.tex_sub_image_2d(
            gl::TEXTURE_2D,
            x,
            y,
            w,
            h,
            fmt,
            ty,
            data.as_ptr() as *const _,
        );
        self.backend.bind_texture(gl::TEXTURE_2D, 0);
    }

    fn set_filter(&self, filter: u32) {
        self.backend.bind_texture(gl::TEXTURE_2D, self.id);
        self.backend.tex_parameteri(gl::TEXTURE_2D, gl::TEXTURE_MIN_FILTER, filter);
        self.backend.tex_parameteri(gl::TEXTURE_2D, gl::TEXTURE_MAG_FILTER, filter);
        self.backend.bind_texture(gl::TEXTURE_2D, 0);
    }

    fn draw_quad(&self, flip_x: bool, flip_y: bool) -> Result<()> {
        self.require_valid()?;
        let vertices: [f32; 8] = [
            -1.0, -1.0, //
            1.0, -1.0, //
            1.0, 1.0, //
            -1.0, 1.0,
        ];
        let (u0, u1) = if flip_x { (1.0, 0.0) } else { (0.0, 1.0) };
        let (v0, v1) = if flip_y { (1.0, 0.0) } else { (0.0, 1.0) };
        let coords: [f32; 8] = [
            u0, v0, //
            u1, v0, //
            u1, v1, //
            u0, v1,
        ];
        self.backend.enable(gl::TEXTURE_2D);
        self.backend.bind_texture(gl::TEXTURE_2D, self.id);
        self.backend.enable_client_state(gl::VERTEX_ARRAY);
        self.backend.vertex_pointer(2, vertices.as_ptr());
        self.backend.enable_client_state(gl::TEXTURE_COORD_ARRAY);
        self.backend.tex_coord_pointer(2, coords.as_ptr());
        self.backend.draw_arrays(gl::TRIANGLE_FAN, 0, 4);
        self.backend.disable_client_state(gl::TEXTURE_COORD_ARRAY);
        self.backend.disable_client_state(gl::VERTEX_ARRAY);
        self.backend.bind_texture(gl::TEXTURE_2D, 0);
        self.backend.disable(gl::TEXTURE_2D);
        Ok(())
    }
}

impl Resource for Texture {
    fn is_valid(&self) -> bool {
        self.id != 0
    }

    /// Makes this the active 2D texture.
    fn bind(&self) {
        self.backend.bind_texture(gl::TEXTURE_2D, self.id);
    }

    /// Restores texture binding 0. Does not restore a previously bound
    /// texture; nesting callers balance their own binds.
    fn unbind(&self) {
        self.backend.bind_texture(gl::TEXTURE_2D, 0);
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        self.delete();
    }
}

impl fmt::Debug for Texture {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        #[derive(Debug)]
        struct Texture {
            id: Id,
            width: u32,
            height: u32,
            internal_format: InternalFormat,
        }

        Texture {
            id: self.id,
            width: self.width,
            height: self.height,
            internal_format: self.internal_format,
        }.fmt(f)
    }
}

/// Validates a sub-rectangle against the texture extents.
fn check_sub_rect(
    width: u32,
    height: u32,
    x_offset: u32,
    y_offset: u32,
    data_w: u32,
    data_h: u32,
) -> Result<()> {
    if x_offset as u64 + data_w as u64 > width as u64
        || y_offset as u64 + data_h as u64 > height as u64
    {
        Err(Error::OutOfBounds(format!(
            "{}x{} rectangle at ({}, {}) exceeds {}x{} texture",
            data_w, data_h, x_offset, y_offset, width, height,
        )))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gl::Api;
    use crate::image::U8;
    use std::ptr;

    fn offline_backend() -> Backend {
        let _ = env_logger::builder().is_test(true).try_init();
        Backend::load(Api::OpenGl, |_| ptr::null())
    }

    #[test]
    fn fresh_texture_is_invalid() {
        let texture = Texture::new(&offline_backend());
        assert!(!texture.is_valid());
        assert_eq!(texture.width(), 0);
        assert_eq!(texture.height(), 0);
    }

    #[test]
    fn delete_is_idempotent() {
        let mut texture = Texture::new(&offline_backend());
        texture.delete();
        assert!(!texture.is_valid());
        texture.delete();
        assert!(!texture.is_valid());
    }

    #[test]
    fn upload_requires_valid_texture() {
        let texture = Texture::new(&offline_backend());
        let data = [0u8; 4];
        let result = texture.upload(&data, Format::U8(U8::Rgba));
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn download_requires_valid_texture() {
        let texture = Texture::new(&offline_backend());
        let mut data = [0u8; 4];
        let result = texture.download(&mut data, Format::U8(U8::Rgba));
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn save_requires_valid_texture() {
        let texture = Texture::new(&offline_backend());
        let result = texture.save("never-written.png", true);
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn render_requires_valid_texture() {
        let texture = Texture::new(&offline_backend());
        assert!(matches!(
            texture.render_to_viewport(),
            Err(Error::InvalidArgument(_)),
        ));
    }

    #[test]
    fn sub_rect_within_bounds() {
        assert!(check_sub_rect(256, 256, 0, 0, 256, 256).is_ok());
        assert!(check_sub_rect(256, 256, 128, 192, 128, 64).is_ok());
    }

    #[test]
    fn sub_rect_past_right_edge() {
        let result = check_sub_rect(256, 256, 129, 0, 128, 64);
        assert!(matches!(result, Err(Error::OutOfBounds(_))));
    }

    #[test]
    fn sub_rect_past_top_edge() {
        let result = check_sub_rect(256, 256, 0, 200, 16, 57);
        assert!(matches!(result, Err(Error::OutOfBounds(_))));
    }

    #[test]
    fn sub_rect_offset_overflow() {
        assert!(check_sub_rect(16, 16, u32::MAX, 0, 2, 2).is_err());
    }
}
