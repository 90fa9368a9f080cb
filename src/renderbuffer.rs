//! GPU-visible pixel container optimized as a render target.

use std::fmt;

use crate::error::{Error, Result};
use crate::gl::Backend;
use crate::image::InternalFormat;

pub(crate) type Id = u32;

/// A renderbuffer object, typically the depth attachment of a framebuffer.
///
/// Write-only on the GPU side: there is no bind or transfer surface beyond
/// attachment to a [`Framebuffer`](crate::Framebuffer).
pub struct Renderbuffer {
    /// The OpenGL renderbuffer ID, 0 when invalid.
    id: Id,

    width: u32,
    height: u32,
    internal_format: InternalFormat,
    backend: Backend,
}

impl Renderbuffer {
    /// Constructs an invalid renderbuffer holding no GPU storage.
    pub fn new(backend: &Backend) -> Self {
        Self {
            id: 0,
            width: 0,
            height: 0,
            internal_format: InternalFormat::Depth24,
            backend: backend.clone(),
        }
    }

    /// Constructs a 24-bit depth renderbuffer, the usual framebuffer depth
    /// attachment.
    pub fn with_depth24(backend: &Backend, width: u32, height: u32) -> Result<Self> {
        let mut renderbuffer = Self::new(backend);
        renderbuffer.reinitialise(width, height, InternalFormat::Depth24)?;
        Ok(renderbuffer)
    }

    /// Returns the OpenGL renderbuffer ID.
    pub(crate) fn id(&self) -> Id {
        self.id
    }

    /// Returns the width of the renderbuffer in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the height of the renderbuffer in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the GPU storage layout.
    pub fn internal_format(&self) -> InternalFormat {
        self.internal_format
    }

    /// Returns whether the renderbuffer owns live GPU storage.
    pub fn is_valid(&self) -> bool {
        self.id != 0
    }

    /// Allocates new backing storage, discarding any prior contents.
    pub fn reinitialise(
        &mut self,
        width: u32,
        height: u32,
        internal_format: InternalFormat,
    ) -> Result<()> {
        if self.id == 0 {
            self.id = self.backend.gen_renderbuffer();
            if self.id == 0 {
                return Err(Error::Resource(
                    "failed to generate a renderbuffer name".into(),
                ));
            }
        }
        self.backend.bind_renderbuffer(self.id);
        self.backend.renderbuffer_storage(internal_format.as_gl_enum(), width, height);
        self.backend.bind_renderbuffer(0);
        self.width = width;
        self.height = height;
        self.internal_format = internal_format;
        Ok(())
    }

    /// Releases the GPU storage and falls back to the invalid state.
    ///
    /// Idempotent.
    pub fn delete(&mut self) {
        if self.id != 0 {
            self.backend.delete_renderbuffer(self.id);
            self.id = 0;
            self.width = 0;
            self.height = 0;
        }
    }
}

impl Drop for Renderbuffer {
    fn drop(&mut self) {
        self.delete();
    }
}

impl fmt::Debug for Renderbuffer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        #[derive(Debug)]
        struct Renderbuffer {
            id: Id,
            width: u32,
            height: u32,
            internal_format: InternalFormat,
        }

        Renderbuffer {
            id: self.id,
            width: self.width,
            height: self.height,
            internal_format: self.internal_format,
        }.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gl::Api;
    use std::ptr;

    fn offline_backend() -> Backend {
        Backend::load(Api::OpenGl, |_| ptr::null())
    }

    #[test]
    fn fresh_renderbuffer_is_invalid() {
        let renderbuffer = Renderbuffer::new(&offline_backend());
        assert!(!renderbuffer.is_valid());
    }

    #[test]
    fn delete_is_idempotent() {
        let mut renderbuffer = Renderbuffer::new(&offline_backend());
        renderbuffer.delete();
        renderbuffer.delete();
        assert!(!renderbuffer.is_valid());
    }
}
