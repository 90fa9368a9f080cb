//! OpenGL resource lifecycle management.
//!
//! Wraps raw texture, renderbuffer, framebuffer and buffer object handles
//! with safe create/reinitialise/delete semantics, host/GPU data transfer
//! with format and layout negotiation, and binding-based state management.
//!
//! The caller owns context creation: load a [`Backend`] with the proc
//! address query of a current context, then construct resources against it.
//! Every call must stay on the thread holding that context current; resource
//! handles are deliberately `!Send`. Binding state is the context's implicit
//! global state and no bind stack is kept, so nested bind/unbind sequences
//! must be balanced by the caller.

#[macro_use]
extern crate log;

pub mod buffer;
pub mod codec;
pub mod error;
pub mod framebuffer;
pub mod gl;
pub mod image;
pub mod renderbuffer;
pub mod texture;

use std::os;

/// Common lifecycle surface of bindable GPU objects.
pub trait Resource {
    /// Returns whether the object owns live GPU storage.
    fn is_valid(&self) -> bool;

    /// Makes the object current for its binding target.
    fn bind(&self);

    /// Restores binding 0 for the object's target. No previously bound
    /// object is restored.
    fn unbind(&self);
}

/// Initialize the library against a current rendering context, yielding the
/// backend that resources are constructed from.
pub fn init<F>(api: Api, query_proc_address: F) -> Backend
    where F: FnMut(&str) -> *const os::raw::c_void
{
    Backend::load(api, query_proc_address)
}

#[doc(inline)]
pub use crate::buffer::Buffer;

#[doc(inline)]
pub use crate::error::{Error, Result};

#[doc(inline)]
pub use crate::framebuffer::Framebuffer;

#[doc(inline)]
pub use crate::gl::{Api, Backend};

#[doc(inline)]
pub use crate::image::{BufferView, TypedImage};

#[doc(inline)]
pub use crate::renderbuffer::Renderbuffer;

#[doc(inline)]
pub use crate::texture::Texture;

#[doc(inline)]
pub use crate::texture::Viewport;
