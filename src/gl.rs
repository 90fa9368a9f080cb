//! Thin wrapper over the raw OpenGL function pointers.

use std::{os, rc};

// Import OpenGL bindings.
include!(concat!(env!("OUT_DIR"), "/gl.rs"));

/// Flavour of the active rendering API.
///
/// Pixel pack/unpack and shader storage buffers are unavailable on the
/// embedded flavour.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Api {
    /// Desktop OpenGL.
    OpenGl,

    /// OpenGL ES.
    OpenGlEs,
}

#[derive(Clone)]
pub struct Backend {
    gl: rc::Rc<Gl>,
    api: Api,
}

impl Backend {
    /// Constructor.
    ///
    /// The caller owns context creation and supplies the proc address query
    /// for that context. Every subsequent call must be made on the thread
    /// holding the context current.
    pub fn load<F>(api: Api, mut func: F) -> Self
        where F: FnMut(&str) -> *const os::raw::c_void
    {
        let gl = rc::Rc::new(Gl::load_with(|sym| func(sym) as *const _));
        Backend { gl, api }
    }

    /// Returns the API flavour the backend was loaded for.
    pub fn api(&self) -> Api {
        self.api
    }

    // Error checking

    /// Corresponds to `glGetError` plus an error check.
    pub fn check_error(&self) {
        let error = unsafe { self.gl.GetError() };
        if error != 0 {
            error!(target: "gl", "0x{:x}", error);
        }
    }

    // Pipeline state operations

    /// Corresponds to `glEnable`.
    pub fn enable(&self, state: u32) {
        trace!(target: "gl", "glEnable{:?}", (state,));
        unsafe {
            self.gl.Enable(state);
        }
        self.check_error();
    }

    /// Corresponds to `glDisable`.
    pub fn disable(&self, state: u32) {
        trace!(target: "gl", "glDisable{:?}", (state,));
        unsafe {
            self.gl.Disable(state);
        }
        self.check_error();
    }

    /// Corresponds to `glViewport`.
    pub fn viewport(&self, x: i32, y: i32, w: u32, h: u32) {
        trace!(target: "gl", "glViewport{:?}", (x, y, w, h));
        unsafe {
            self.gl.Viewport(x, y, w as _, h as _);
        }
        self.check_error();
    }

    /// Corresponds to `glPixelStorei`.
    pub fn pixel_store_i(&self, param: u32, value: i32) {
        trace!(target: "gl", "glPixelStorei{:?}", (param, value));
        unsafe {
            self.gl.PixelStorei(param, value);
        }
        self.check_error();
    }

    // Texture operations

    /// Corresponds to `glGenTextures(1)`.
    pub fn gen_texture(&self) -> u32 {
        let mut id = 0;
        unsafe {
            trace!(target: "gl", "glGenTextures(1) ");
            self.gl.GenTextures(1, &mut id as *mut _);
            trace!(target: "gl", " => {}", id);
        }
        self.check_error();
        id
    }

    /// Corresponds to `glDeleteTextures(1)`.
    pub fn delete_texture(&self, id: u32) {
        trace!(target: "gl", "glDeleteTextures{:?}", (1, id));
        unsafe {
            self.gl.DeleteTextures(1, &id as *const _);
        }
        self.check_error();
    }

    /// Corresponds to `glBindTexture`.
    pub fn bind_texture(&self, ty: u32, id: u32) {
        unsafe {
            trace!(target: "gl", "glBindTexture{:?}", (ty, id));
            self.gl.BindTexture(ty, id);
        }
        self.check_error();
    }

    /// Corresponds to `glTexParameteri`.
    pub fn tex_parameteri(&self, ty: u32, param: u32, value: u32) {
        unsafe {
            trace!(target: "gl", "glTexParameteri{:?}", (ty, param, value));
            self.gl.TexParameteri(ty, param, value as i32);
        }
        self.check_error();
    }

    /// Corresponds to `glTexImage2D`.
    pub fn tex_image_2d(
        &self,
        target: u32,
        internal_format: u32,
        width: u32,
        height: u32,
        border: i32,
        format: u32,
        ty: u32,
        data: *const os::raw::c_void,
    ) {
        unsafe {
            trace!(target: "gl",
                "glTexImage2D{:?}",
                (
                    target,
                    0,
                    internal_format,
                    width,
                    height,
                    border,
                    format,
                    ty,
                    data,
                ),
            );
            self.gl.TexImage2D(
                target,
                0,
                internal_format as _,
                width as _,
                height as _,
                border,
                format,
                ty,
                data,
            );
        }
        self.check_error();
    }

    /// Corresponds to `glTexSubImage2D`.
    pub fn tex_sub_image_2d(
        &self,
        target: u32,
        x_offset: u32,
        y_offset: u32,
        width: u32,
        height: u32,
        format: u32,
        ty: u32,
        data: *const os::raw::c_void,
    ) {
        unsafe {
            trace!(target: "gl",
                "glTexSubImage2D{:?}",
                (
                    target,
                    0,
                    x_offset,
                    y_offset,
                    width,
                    height,
                    format,
                    ty,
                    data,
                ),
            );
            self.gl.TexSubImage2D(
                target,
                0,
                x_offset as _,
                y_offset as _,
                width as _,
                height as _,
                format,
                ty,
                data,
            );
        }
        self.check_error();
    }

    /// Corresponds to `glGetTexImage`.
    pub fn get_tex_image(
        &self,
        target: u32,
        format: u32,
        ty: u32,
        ptr: *mut os::raw::c_void,
    ) {
        trace!(
            target: "gl",
            "glGetTexImage{:?}",
            (
                target,
                0,
                format,
                ty,
                ptr,
            ),
        );
        unsafe {
            self.gl.GetTexImage(
                target,
                0,
                format,
                ty,
                ptr,
            );
        }
        self.check_error();
    }

    // Renderbuffer operations

    /// Corresponds to `glGenRenderbuffers(1)`.
    pub fn gen_renderbuffer(&self) -> u32 {
        trace!(target: "gl", "glGenRenderbuffers(1)");
        let mut id = 0;
        unsafe {
            self.gl.GenRenderbuffers(1, &mut id as *mut _);
        }
        self.check_error();
        id
    }

    /// Corresponds to `glDeleteRenderbuffers(1)`.
    pub fn delete_renderbuffer(&self, id: u32) {
        trace!(target: "gl", "glDeleteRenderbuffers{:?}", (1, id));
        unsafe {
            self.gl.DeleteRenderbuffers(1, &id as *const _);
        }
        self.check_error();
    }

    /// Corresponds to `glBindRenderbuffer`.
    pub fn bind_renderbuffer(&self, id: u32) {
        trace!(target: "gl", "glBindRenderbuffer{:?} ", (RENDERBUFFER, id));
        unsafe {
            self.gl.BindRenderbuffer(RENDERBUFFER, id);
        }
        self.check_error();
    }

    /// Corresponds to `glRenderbufferStorage`.
    pub fn renderbuffer_storage(&self, format: u32, width: u32, height: u32) {
        trace!(
            target: "gl",
            "glRenderbufferStorage{:?} ",
            (RENDERBUFFER, format, width, height),
        );
        unsafe {
            self.gl.RenderbufferStorage(RENDERBUFFER, format, width as _, height as _);
        }
        self.check_error();
    }

    // Framebuffer operations

    /// Corresponds to `glGenFramebuffers(1)`.
    pub fn gen_framebuffer(&self) -> u32 {
        trace!(target: "gl", "glGenFramebuffers(1)");
        let mut id = 0;
        unsafe {
            self.gl.GenFramebuffers(1, &mut id as *mut _);
        }
        self.check_error();
        id
    }

    /// Corresponds to `glDeleteFramebuffers(1)`.
    pub fn delete_framebuffer(&self, id: u32) {
        trace!(target: "gl", "glDeleteFramebuffers{:?}", (1, id));
        unsafe {
            self.gl.DeleteFramebuffers(1, &id as *const _);
        }
        self.check_error();
    }

    /// Corresponds to `glBindFramebuffer`.
    pub fn bind_framebuffer(&self, id: u32) {
        trace!(target: "gl", "glBindFramebuffer{:?} ", (FRAMEBUFFER, id));
        unsafe {
            self.gl.BindFramebuffer(FRAMEBUFFER, id);
        }
        self.check_error();
    }

    /// Corresponds to `glFramebufferTexture2D`.
    pub fn framebuffer_texture2d(&self, attachment: u32, texture: u32) {
        trace!(
            target: "gl",
            "glFramebufferTexture2D{:?}",
            (
                FRAMEBUFFER,
                COLOR_ATTACHMENT0 + attachment,
                TEXTURE_2D,
                texture,
                0,
            ),
        );
        unsafe {
            self.gl.FramebufferTexture2D(
                FRAMEBUFFER,
                COLOR_ATTACHMENT0 + attachment,
                TEXTURE_2D,
                texture,
                0,
            );
        }
        self.check_error();
    }

    /// Corresponds to `glFramebufferRenderbuffer` with a depth attachment.
    pub fn framebuffer_depth_renderbuffer(&self, renderbuffer: u32) {
        trace!(
            target: "gl",
            "glFramebufferRenderbuffer{:?}",
            (
                FRAMEBUFFER,
                DEPTH_ATTACHMENT,
                RENDERBUFFER,
                renderbuffer,
            ),
        );
        unsafe {
            self.gl.FramebufferRenderbuffer(
                FRAMEBUFFER,
                DEPTH_ATTACHMENT,
                RENDERBUFFER,
                renderbuffer,
            );
        }
        self.check_error();
    }

    /// Corresponds to `glDrawBuffers`.
    pub fn draw_buffers(&self, buffers: &[u32]) {
        trace!(target: "gl", "glDrawBuffers{:?}", (buffers.len(), buffers));
        unsafe {
            self.gl.DrawBuffers(buffers.len() as _, buffers.as_ptr() as _);
        }
        self.check_error();
    }

    /// Corresponds to `glCheckFramebufferStatus`.
    pub fn check_framebuffer_status(&self) -> u32 {
        let status;
        unsafe {
            trace!(target: "gl", "glCheckFramebufferStatus{:?} ", (FRAMEBUFFER,));
            status = self.gl.CheckFramebufferStatus(FRAMEBUFFER);
            trace!(target: "gl", " => 0x{:x}", status);
        }
        self.check_error();
        status
    }

    // Buffer operations

    /// Corresponds to `glGenBuffers(1)`.
    pub fn gen_buffer(&self) -> u32 {
        let mut id: u32 = 0;
        unsafe {
            trace!(target: "gl", "glGenBuffers(1) ");
            self.gl.GenBuffers(1, &mut id as *mut _)
        };
        trace!(target: "gl", " => {}", id);
        self.check_error();
        id
    }

    /// Corresponds to `glDeleteBuffers(1)`.
    pub fn delete_buffer(&self, id: u32) {
        trace!(target: "gl", "glDeleteBuffers{:?}", (1, id));
        unsafe {
            self.gl.DeleteBuffers(1, &id as *const _);
        }
        self.check_error();
    }

    /// Corresponds to `glBindBuffer`.
    pub fn bind_buffer(&self, ty: u32, id: u32) {
        unsafe {
            trace!(target: "gl", "glBindBuffer{:?}", (ty, id));
            self.gl.BindBuffer(ty, id);
        }
        self.check_error();
    }

    /// Corresponds to `glBufferData`.
    pub fn buffer_data(&self, ty: u32, len: usize, ptr: *const os::raw::c_void, usage: u32) {
        unsafe {
            trace!(target: "gl", "glBufferData{:?}", (ty, len, ptr, usage));
            self.gl.BufferData(ty, len as _, ptr, usage);
        }
        self.check_error();
    }

    /// Corresponds to `glBufferSubData`.
    pub fn buffer_sub_data(&self, ty: u32, off: usize, len: usize, ptr: *const os::raw::c_void) {
        unsafe {
            trace!(target: "gl", "glBufferSubData{:?}", (ty, off, len, ptr));
            self.gl.BufferSubData(ty, off as _, len as _, ptr);
        }
        self.check_error();
    }

    /// Corresponds to `glGetBufferSubData`.
    pub fn get_buffer_sub_data(&self, ty: u32, off: usize, len: usize, ptr: *mut os::raw::c_void) {
        unsafe {
            trace!(target: "gl", "glGetBufferSubData{:?}", (ty, off, len, ptr));
            self.gl.GetBufferSubData(ty, off as _, len as _, ptr);
        }
        self.check_error();
    }

    // Legacy draw operations used by the viewport quad path.

    /// Corresponds to `glEnableClientState`.
    pub fn enable_client_state(&self, array: u32) {
        trace!(target: "gl", "glEnableClientState{:?}", (array,));
        unsafe {
            self.gl.EnableClientState(array);
        }
        self.check_error();
    }

    /// Corresponds to `glDisableClientState`.
    pub fn disable_client_state(&self, array: u32) {
        trace!(target: "gl", "glDisableClientState{:?}", (array,));
        unsafe {
            self.gl.DisableClientState(array);
        }
        self.check_error();
    }

    /// Corresponds to `glVertexPointer` over a client-memory `f32` array.
    pub fn vertex_pointer(&self, size: i32, vertices: *const f32) {
        trace!(target: "gl", "glVertexPointer{:?}", (size, FLOAT, 0, vertices));
        unsafe {
            self.gl.VertexPointer(size, FLOAT, 0, vertices as *const _);
        }
        self.check_error();
    }

    /// Corresponds to `glTexCoordPointer` over a client-memory `f32` array.
    pub fn tex_coord_pointer(&self, size: i32, coords: *const f32) {
        trace!(target: "gl", "glTexCoordPointer{:?}", (size, FLOAT, 0, coords));
        unsafe {
            self.gl.TexCoordPointer(size, FLOAT, 0, coords as *const _);
        }
        self.check_error();
    }

    /// Corresponds to `glDrawArrays`.
    pub fn draw_arrays(&self, mode: u32, offset: usize, count: usize) {
        unsafe {
            trace!(target: "gl", "glDrawArrays{:?}", (mode, offset, count));
            self.gl.DrawArrays(mode, offset as _, count as _);
        }
        self.check_error();
    }
}
