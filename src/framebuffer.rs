//! Off-screen render target composition.

use std::fmt;

use crate::error::{Error, Result};
use crate::gl::{self, Backend};
use crate::renderbuffer::Renderbuffer;
use crate::texture::Texture;
use crate::Resource;

pub(crate) type Id = u32;

/// A framebuffer object composing a color texture and a depth renderbuffer
/// into an off-screen render target.
///
/// The framebuffer borrows its attachments: they must stay alive (and should
/// stay valid) for as long as it is used, which the lifetime enforces. It
/// owns only the framebuffer object itself. There is no resize operation;
/// reinitialise the attachments and build a new framebuffer over them.
pub struct Framebuffer<'a> {
    /// The OpenGL framebuffer ID.
    id: Id,

    texture: &'a Texture,
    renderbuffer: &'a Renderbuffer,
    backend: Backend,
}

impl<'a> Framebuffer<'a> {
    /// Creates a framebuffer with `texture` attached as color target 0 and
    /// `renderbuffer` as the depth attachment.
    ///
    /// Both attachments must hold live GPU storage.
    pub fn new(texture: &'a Texture, renderbuffer: &'a Renderbuffer) -> Result<Self> {
        if !texture.is_valid() {
            return Err(Error::InvalidArgument(
                "color attachment texture is invalid".into(),
            ));
        }
        if !renderbuffer.is_valid() {
            return Err(Error::InvalidArgument(
                "depth attachment renderbuffer is invalid".into(),
            ));
        }
        let backend = texture.backend().clone();
        let id = backend.gen_framebuffer();
        if id == 0 {
            return Err(Error::Resource("failed to generate a framebuffer name".into()));
        }
        backend.bind_framebuffer(id);
        backend.framebuffer_texture2d(0, texture.id());
        backend.framebuffer_depth_renderbuffer(renderbuffer.id());
        backend.draw_buffers(&[gl::COLOR_ATTACHMENT0]);
        let status = backend.check_framebuffer_status();
        backend.bind_framebuffer(0);
        if status != gl::FRAMEBUFFER_COMPLETE {
            backend.delete_framebuffer(id);
            return Err(Error::Resource(format!(
                "framebuffer incomplete: 0x{:x}",
                status,
            )));
        }
        Ok(Self { id, texture, renderbuffer, backend })
    }

    /// Returns the color attachment.
    pub fn texture(&self) -> &Texture {
        self.texture
    }

    /// Returns the depth attachment.
    pub fn renderbuffer(&self) -> &Renderbuffer {
        self.renderbuffer
    }
}

impl<'a> Resource for Framebuffer<'a> {
    fn is_valid(&self) -> bool {
        self.id != 0
    }

    /// Makes this the active render target; subsequent draws land in the
    /// color texture.
    fn bind(&self) {
        self.backend.bind_framebuffer(self.id);
    }

    /// Restores the default (window) render target.
    fn unbind(&self) {
        self.backend.bind_framebuffer(0);
    }
}

impl<'a> Drop for Framebuffer<'a> {
    fn drop(&mut self) {
        self.backend.delete_framebuffer(self.id);
    }
}

impl<'a> fmt::Debug for Framebuffer<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        #[derive(Debug)]
        struct Framebuffer {
            id: Id,
        }

        Framebuffer { id: self.id }.fmt(f)
    }
}
