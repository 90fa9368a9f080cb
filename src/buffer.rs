//! GPU buffer management.

use std::fmt;

use crate::error::{Error, Result};
use crate::gl::{self, Api, Backend};
use crate::image::BufferView;
use crate::Resource;

/// OpenGL buffer ID type.
pub(crate) type Id = u32;

/// Determines the binding point and what the buffer may be used for.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Kind {
    /// Corresponds to `GL_ARRAY_BUFFER`.
    Array,

    /// Corresponds to `GL_ELEMENT_ARRAY_BUFFER`.
    ElementArray,

    /// Corresponds to `GL_PIXEL_PACK_BUFFER`.
    PixelPack,

    /// Corresponds to `GL_PIXEL_UNPACK_BUFFER`.
    PixelUnpack,

    /// Corresponds to `GL_SHADER_STORAGE_BUFFER`.
    ShaderStorage,
}

impl Kind {
    /// Returns the equivalent OpenGL target enumeration constant.
    pub(crate) fn as_gl_enum(self) -> u32 {
        match self {
            Kind::Array => gl::ARRAY_BUFFER,
            Kind::ElementArray => gl::ELEMENT_ARRAY_BUFFER,
            Kind::PixelPack => gl::PIXEL_PACK_BUFFER,
            Kind::PixelUnpack => gl::PIXEL_UNPACK_BUFFER,
            Kind::ShaderStorage => gl::SHADER_STORAGE_BUFFER,
        }
    }

    /// Returns whether the buffer kind exists on the given API flavour.
    ///
    /// Pixel transfer and shader storage buffers are desktop-only.
    pub fn available_on(self, api: Api) -> bool {
        match self {
            Kind::Array | Kind::ElementArray => true,
            Kind::PixelPack | Kind::PixelUnpack | Kind::ShaderStorage => api == Api::OpenGl,
        }
    }
}

/// A buffer data usage hint.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Usage {
    /// Corresponds to `GL_STATIC_DRAW`.
    StaticDraw,

    /// Corresponds to `GL_STATIC_READ`.
    StaticRead,

    /// Corresponds to `GL_STATIC_COPY`.
    StaticCopy,

    /// Corresponds to `GL_DYNAMIC_DRAW`.
    DynamicDraw,

    /// Corresponds to `GL_DYNAMIC_READ`.
    DynamicRead,

    /// Corresponds to `GL_DYNAMIC_COPY`.
    DynamicCopy,

    /// Corresponds to `GL_STREAM_DRAW`.
    StreamDraw,

    /// Corresponds to `GL_STREAM_READ`.
    StreamRead,

    /// Corresponds to `GL_STREAM_COPY`.
    StreamCopy,
}

impl Usage {
    /// Returns the equivalent OpenGL usage enumeration constant.
    pub(crate) fn as_gl_enum(self) -> u32 {
        match self {
            Usage::StaticDraw => gl::STATIC_DRAW,
            Usage::StaticRead => gl::STATIC_READ,
            Usage::StaticCopy => gl::STATIC_COPY,
            Usage::DynamicDraw => gl::DYNAMIC_DRAW,
            Usage::DynamicRead => gl::DYNAMIC_READ,
            Usage::DynamicCopy => gl::DYNAMIC_COPY,
            Usage::StreamDraw => gl::STREAM_DRAW,
            Usage::StreamRead => gl::STREAM_READ,
            Usage::StreamCopy => gl::STREAM_COPY,
        }
    }
}

/// A contiguous region of GPU memory.
///
/// Starts undefined (no storage, no binding point); `reinitialise` allocates
/// storage and fixes the kind. `size_bytes` always reflects the last
/// successful reinitialisation.
pub struct Buffer {
    /// The OpenGL buffer ID, 0 when undefined.
    id: Id,

    /// The binding point, `None` until allocated.
    kind: Option<Kind>,

    /// The number of bytes held by the buffer.
    size_bytes: usize,

    /// Data usage hint of the last allocation.
    usage: Usage,

    backend: Backend,
}

impl Buffer {
    /// Constructs an undefined buffer holding no GPU storage.
    pub fn new(backend: &Backend) -> Self {
        Self {
            id: 0,
            kind: None,
            size_bytes: 0,
            usage: Usage::StaticDraw,
            backend: backend.clone(),
        }
    }

    /// Returns the binding point, `None` while undefined.
    pub fn kind(&self) -> Option<Kind> {
        self.kind
    }

    /// Returns the number of bytes this buffer contains.
    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }

    /// Returns the buffer data usage hint.
    pub fn usage(&self) -> Usage {
        self.usage
    }

    /// Allocates `size_bytes` of uninitialized storage for the given binding
    /// point, discarding any prior contents.
    ///
    /// Rejected with `UnsupportedOperation` when `kind` does not exist on
    /// the active API flavour; no GPU state is touched in that case.
    pub fn reinitialise(&mut self, kind: Kind, size_bytes: usize, usage: Usage) -> Result<()> {
        if !kind.available_on(self.backend.api()) {
            return Err(Error::UnsupportedOperation(format!(
                "{:?} buffers are unavailable on {:?}",
                kind,
                self.backend.api(),
            )));
        }
        if self.id == 0 {
            self.id = self.backend.gen_buffer();
            if self.id == 0 {
                return Err(Error::Resource("failed to generate a buffer name".into()));
            }
        }
        let target = kind.as_gl_enum();
        self.backend.bind_buffer(target, self.id);
        self.backend.buffer_data(target, size_bytes, std::ptr::null(), usage.as_gl_enum());
        self.backend.bind_buffer(target, 0);
        self.kind = Some(kind);
        self.size_bytes = size_bytes;
        self.usage = usage;
        Ok(())
    }

    /// Copies host bytes into `[offset, offset + data.len())` of the
    /// allocated range.
    pub fn upload(&self, data: &[u8], offset: usize) -> Result<()> {
        let kind = self.require_allocated()?;
        check_range(self.size_bytes, offset, data.len())?;
        let target = kind.as_gl_enum();
        self.backend.bind_buffer(target, self.id);
        self.backend.buffer_sub_data(target, offset, data.len(), data.as_ptr() as *const _);
        self.backend.bind_buffer(target, 0);
        Ok(())
    }

    /// Copies a strided host view into the allocated range.
    ///
    /// Only tightly packed views take the raw transfer path; strided views
    /// are rejected and must be staged through [`BufferView::packed`] by the
    /// caller first.
    pub fn upload_view(&self, view: &BufferView, offset: usize) -> Result<()> {
        if !view.is_packed() {
            return Err(Error::UnsupportedLayout(
                "strided view; stage through BufferView::packed first".into(),
            ));
        }
        self.upload(&view.data()[..view.len_bytes()], offset)
    }

    /// Reads `[offset, offset + data.len())` of the allocated range back to
    /// host memory.
    ///
    /// Unavailable on OpenGL ES.
    pub fn download(&self, data: &mut [u8], offset: usize) -> Result<()> {
        if self.backend.api() == Api::OpenGlEs {
            return Err(Error::UnsupportedOperation(
                "buffer readback is unavailable on OpenGL ES".into(),
            ));
        }
        let kind = self.require_allocated()?;
        check_range(self.size_bytes, offset, data.len())?;
        let target = kind.as_gl_enum();
        self.backend.bind_buffer(target, self.id);
        self.backend.get_buffer_sub_data(target, offset, data.len(), data.as_mut_ptr() as *mut _);
        self.backend.bind_buffer(target, 0);
        Ok(())
    }

    /// Releases the GPU storage and falls back to the undefined state.
    ///
    /// Idempotent.
    pub fn delete(&mut self) {
        if self.id != 0 {
            self.backend.delete_buffer(self.id);
            self.id = 0;
            self.kind = None;
            self.size_bytes = 0;
        }
    }

    fn require_allocated(&self) -> Result<Kind> {
        match self.kind {
            Some(kind) if self.id != 0 => Ok(kind),
            _ => Err(Error::InvalidArgument("buffer is undefined".into())),
        }
    }
}

impl Resource for Buffer {
    fn is_valid(&self) -> bool {
        self.id != 0
    }

    /// Makes this the active buffer for its binding point. No-op while
    /// undefined.
    fn bind(&self) {
        if let Some(kind) = self.kind {
            self.backend.bind_buffer(kind.as_gl_enum(), self.id);
        }
    }

    /// Restores binding 0 for the buffer's binding point.
    fn unbind(&self) {
        if let Some(kind) = self.kind {
            self.backend.bind_buffer(kind.as_gl_enum(), 0);
        }
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        self.delete();
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        #[derive(Debug)]
        struct Buffer {
            id: Id,
            kind: Option<Kind>,
            size_bytes: usize,
            usage: Usage,
        }

        Buffer {
            id: self.id,
            kind: self.kind,
            size_bytes: self.size_bytes,
            usage: self.usage,
        }.fmt(f)
    }
}

/// Validates a transfer range against the allocated size.
fn check_range(size_bytes: usize, offset: usize, len: usize) -> Result<()> {
    let end = offset.checked_add(len);
    match end {
        Some(end) if end <= size_bytes => Ok(()),
        _ => Err(Error::OutOfBounds(format!(
            "range [{}, {}+{}) exceeds {} allocated bytes",
            offset, offset, len, size_bytes,
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ptr;

    fn offline_backend(api: Api) -> Backend {
        Backend::load(api, |_| ptr::null())
    }

    #[test]
    fn fresh_buffer_is_undefined() {
        let buffer = Buffer::new(&offline_backend(Api::OpenGl));
        assert!(!buffer.is_valid());
        assert_eq!(buffer.kind(), None);
        assert_eq!(buffer.size_bytes(), 0);
    }

    #[test]
    fn upload_requires_allocation() {
        let buffer = Buffer::new(&offline_backend(Api::OpenGl));
        let result = buffer.upload(&[0u8; 4], 0);
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn delete_is_idempotent() {
        let mut buffer = Buffer::new(&offline_backend(Api::OpenGl));
        buffer.delete();
        buffer.delete();
        assert!(!buffer.is_valid());
    }

    #[test]
    fn pixel_buffers_rejected_on_es() {
        let mut buffer = Buffer::new(&offline_backend(Api::OpenGlEs));
        for kind in [Kind::PixelPack, Kind::PixelUnpack, Kind::ShaderStorage] {
            let result = buffer.reinitialise(kind, 64, Usage::DynamicDraw);
            assert!(matches!(result, Err(Error::UnsupportedOperation(_))));
        }
        assert!(!buffer.is_valid());
    }

    #[test]
    fn readback_rejected_on_es() {
        let buffer = Buffer::new(&offline_backend(Api::OpenGlEs));
        let mut out = [0u8; 4];
        let result = buffer.download(&mut out, 0);
        assert!(matches!(result, Err(Error::UnsupportedOperation(_))));
    }

    #[test]
    fn vertex_kinds_exist_everywhere() {
        for api in [Api::OpenGl, Api::OpenGlEs] {
            assert!(Kind::Array.available_on(api));
            assert!(Kind::ElementArray.available_on(api));
        }
    }

    #[test]
    fn range_within_allocation() {
        assert!(check_range(64, 0, 64).is_ok());
        assert!(check_range(64, 32, 32).is_ok());
        assert!(check_range(64, 64, 0).is_ok());
    }

    #[test]
    fn range_past_allocation() {
        assert!(matches!(check_range(64, 32, 33), Err(Error::OutOfBounds(_))));
        assert!(matches!(check_range(64, 65, 0), Err(Error::OutOfBounds(_))));
    }

    #[test]
    fn range_offset_overflow() {
        assert!(check_range(64, usize::MAX, 2).is_err());
    }
}
