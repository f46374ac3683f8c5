use js_sys::Float32Array;
use web_sys::{
    HtmlVideoElement, WebGl2RenderingContext as GL, WebGlBuffer, WebGlFramebuffer, WebGlProgram,
    WebGlShader, WebGlTexture, WebGlUniformLocation, WebGlVertexArrayObject,
};

use crate::blend::BlendParameters;
use crate::geometry::GeometryState;
use crate::pipeline::{Backend, RenderTarget};
use crate::shaders;
use crate::{Error, Result};

fn compile(gl: &GL, kind: u32, source: &str) -> Result<WebGlShader> {
    let shader = gl
        .create_shader(kind)
        .ok_or_else(|| Error::Gpu("unable to create shader".into()))?;
    gl.shader_source(&shader, source);
    gl.compile_shader(&shader);

    let ok = gl
        .get_shader_parameter(&shader, GL::COMPILE_STATUS)
        .as_bool()
        .unwrap_or(false);
    if ok {
        Ok(shader)
    } else {
        let info = gl.get_shader_info_log(&shader).unwrap_or_default();
        gl.delete_shader(Some(&shader));
        Err(Error::Gpu(format!("shader compile failed: {info}")))
    }
}

/// Compile and link a vertex/fragment pair.
pub fn link(gl: &GL, vertex: &str, fragment: &str) -> Result<WebGlProgram> {
    let vs = compile(gl, GL::VERTEX_SHADER, vertex)?;
    let fs = compile(gl, GL::FRAGMENT_SHADER, fragment)?;
    let program = gl
        .create_program()
        .ok_or_else(|| Error::Gpu("unable to create program".into()))?;
    gl.attach_shader(&program, &vs);
    gl.attach_shader(&program, &fs);
    gl.link_program(&program);
    // Shaders are owned by the program from here on.
    gl.delete_shader(Some(&vs));
    gl.delete_shader(Some(&fs));

    let ok = gl
        .get_program_parameter(&program, GL::LINK_STATUS)
        .as_bool()
        .unwrap_or(false);
    if ok {
        Ok(program)
    } else {
        let info = gl.get_program_info_log(&program).unwrap_or_default();
        gl.delete_program(Some(&program));
        Err(Error::Gpu(format!("program link failed: {info}")))
    }
}

fn new_texture(gl: &GL) -> Result<WebGlTexture> {
    let texture = gl
        .create_texture()
        .ok_or_else(|| Error::Gpu("unable to create texture".into()))?;
    gl.bind_texture(GL::TEXTURE_2D, Some(&texture));
    gl.tex_parameteri(GL::TEXTURE_2D, GL::TEXTURE_MIN_FILTER, GL::LINEAR as i32);
    gl.tex_parameteri(GL::TEXTURE_2D, GL::TEXTURE_MAG_FILTER, GL::LINEAR as i32);
    gl.tex_parameteri(GL::TEXTURE_2D, GL::TEXTURE_WRAP_S, GL::CLAMP_TO_EDGE as i32);
    gl.tex_parameteri(GL::TEXTURE_2D, GL::TEXTURE_WRAP_T, GL::CLAMP_TO_EDGE as i32);
    Ok(texture)
}

/// Texture plus the framebuffer that renders into it.
pub struct GlTarget {
    gl: GL,
    texture: WebGlTexture,
    framebuffer: WebGlFramebuffer,
    width: u32,
    height: u32,
}

impl GlTarget {
    fn new(gl: &GL, width: u32, height: u32) -> Result<Self> {
        let texture = new_texture(gl)?;
        let framebuffer = gl
            .create_framebuffer()
            .ok_or_else(|| Error::Gpu("unable to create framebuffer".into()))?;
        let mut target = GlTarget {
            gl: gl.clone(),
            texture,
            framebuffer,
            width: 0,
            height: 0,
        };
        target.resize(width, height)?;
        Ok(target)
    }

    fn bind(&self) {
        self.gl
            .bind_framebuffer(GL::FRAMEBUFFER, Some(&self.framebuffer));
        self.gl.viewport(0, 0, self.width as i32, self.height as i32);
    }
}

impl RenderTarget for GlTarget {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        let gl = &self.gl;
        gl.bind_texture(GL::TEXTURE_2D, Some(&self.texture));
        gl.tex_image_2d_with_i32_and_i32_and_i32_and_format_and_type_and_opt_u8_array(
            GL::TEXTURE_2D,
            0,
            GL::RGBA8 as i32,
            width.max(1) as i32,
            height.max(1) as i32,
            0,
            GL::RGBA,
            GL::UNSIGNED_BYTE,
            None,
        )?;
        self.width = width.max(1);
        self.height = height.max(1);

        gl.bind_framebuffer(GL::FRAMEBUFFER, Some(&self.framebuffer));
        gl.framebuffer_texture_2d(
            GL::FRAMEBUFFER,
            GL::COLOR_ATTACHMENT0,
            GL::TEXTURE_2D,
            Some(&self.texture),
            0,
        );
        let status = gl.check_framebuffer_status(GL::FRAMEBUFFER);
        gl.bind_framebuffer(GL::FRAMEBUFFER, None);
        if status != GL::FRAMEBUFFER_COMPLETE {
            return Err(Error::Gpu(format!("framebuffer incomplete: 0x{status:x}")));
        }
        self.clear()
    }

    fn clear(&mut self) -> Result<()> {
        self.bind();
        self.gl.clear_color(0.0, 0.0, 0.0, 0.0);
        self.gl.clear(GL::COLOR_BUFFER_BIT);
        self.gl.bind_framebuffer(GL::FRAMEBUFFER, None);
        Ok(())
    }
}

impl Drop for GlTarget {
    fn drop(&mut self) {
        self.gl.delete_framebuffer(Some(&self.framebuffer));
        self.gl.delete_texture(Some(&self.texture));
    }
}

struct BlendProgram {
    program: WebGlProgram,
    transform: Option<WebGlUniformLocation>,
    current: Option<WebGlUniformLocation>,
    accum: Option<WebGlUniformLocation>,
    decay: Option<WebGlUniformLocation>,
    contrast: Option<WebGlUniformLocation>,
    brightness: Option<WebGlUniformLocation>,
}

struct PresentProgram {
    program: WebGlProgram,
    transform: Option<WebGlUniformLocation>,
    image: Option<WebGlUniformLocation>,
}

/// WebGL2 implementation of the blend and present passes.
pub struct GlBackend {
    gl: GL,
    blend: BlendProgram,
    present: PresentProgram,
    vao: WebGlVertexArrayObject,
    quad: WebGlBuffer,
    video_texture: WebGlTexture,
    viewport: (u32, u32),
}

impl GlBackend {
    pub fn new(gl: GL) -> Result<Self> {
        let program = link(&gl, shaders::QUAD_VERTEX, shaders::BLEND_FRAGMENT)?;
        let blend = BlendProgram {
            transform: gl.get_uniform_location(&program, shaders::U_TRANSFORM),
            current: gl.get_uniform_location(&program, shaders::U_CURRENT),
            accum: gl.get_uniform_location(&program, shaders::U_ACCUM),
            decay: gl.get_uniform_location(&program, shaders::U_DECAY),
            contrast: gl.get_uniform_location(&program, shaders::U_CONTRAST),
            brightness: gl.get_uniform_location(&program, shaders::U_BRIGHTNESS),
            program,
        };

        let program = link(&gl, shaders::QUAD_VERTEX, shaders::PRESENT_FRAGMENT)?;
        let present = PresentProgram {
            transform: gl.get_uniform_location(&program, shaders::U_TRANSFORM),
            image: gl.get_uniform_location(&program, shaders::U_IMAGE),
            program,
        };

        let vao = gl
            .create_vertex_array()
            .ok_or_else(|| Error::Gpu("unable to create vertex array".into()))?;
        let quad = gl
            .create_buffer()
            .ok_or_else(|| Error::Gpu("unable to create buffer".into()))?;
        gl.bind_vertex_array(Some(&vao));
        gl.bind_buffer(GL::ARRAY_BUFFER, Some(&quad));
        let corners = Float32Array::from(&shaders::QUAD_CORNERS[..]);
        gl.buffer_data_with_array_buffer_view(GL::ARRAY_BUFFER, &corners, GL::STATIC_DRAW);
        gl.enable_vertex_attrib_array(0);
        gl.vertex_attrib_pointer_with_i32(0, 2, GL::FLOAT, false, 0, 0);
        gl.bind_vertex_array(None);

        let video_texture = new_texture(&gl)?;

        Ok(GlBackend {
            gl,
            blend,
            present,
            vao,
            quad,
            video_texture,
            viewport: (1, 1),
        })
    }

    /// Upload the element's current frame; bottom row first to match GL uv.
    fn upload(&self, video: &HtmlVideoElement) -> Result<()> {
        let gl = &self.gl;
        gl.active_texture(GL::TEXTURE0);
        gl.bind_texture(GL::TEXTURE_2D, Some(&self.video_texture));
        gl.pixel_storei(GL::UNPACK_FLIP_Y_WEBGL, 1);
        let uploaded = gl.tex_image_2d_with_u32_and_u32_and_html_video_element(
            GL::TEXTURE_2D,
            0,
            GL::RGBA as i32,
            GL::RGBA,
            GL::UNSIGNED_BYTE,
            video,
        );
        gl.pixel_storei(GL::UNPACK_FLIP_Y_WEBGL, 0);
        uploaded.map_err(|e| Error::Gpu(format!("video upload: {}", crate::error::describe_js(&e))))
    }

    fn draw_quad(&self) {
        self.gl.bind_vertex_array(Some(&self.vao));
        self.gl.draw_arrays(GL::TRIANGLE_STRIP, 0, 4);
        self.gl.bind_vertex_array(None);
    }

    fn bind_screen(&self) {
        self.gl.bind_framebuffer(GL::FRAMEBUFFER, None);
        self.gl
            .viewport(0, 0, self.viewport.0 as i32, self.viewport.1 as i32);
        self.gl.clear_color(0.0, 0.0, 0.0, 1.0);
        self.gl.clear(GL::COLOR_BUFFER_BIT);
    }
}

impl Backend for GlBackend {
    type Target = GlTarget;
    type Frame = HtmlVideoElement;

    fn create_target(&mut self, width: u32, height: u32) -> Result<GlTarget> {
        GlTarget::new(&self.gl, width, height)
    }

    fn resize_viewport(&mut self, width: u32, height: u32) {
        self.viewport = (width.max(1), height.max(1));
    }

    fn blend(
        &mut self,
        frame: &HtmlVideoElement,
        front: &GlTarget,
        back: &mut GlTarget,
        params: &BlendParameters,
    ) -> Result<()> {
        self.upload(frame)?;

        let gl = &self.gl;
        back.bind();
        gl.use_program(Some(&self.blend.program));

        gl.active_texture(GL::TEXTURE1);
        gl.bind_texture(GL::TEXTURE_2D, Some(&front.texture));

        let p = &self.blend;
        gl.uniform_matrix2fv_with_f32_array(p.transform.as_ref(), false, &shaders::IDENTITY);
        gl.uniform1i(p.current.as_ref(), 0);
        gl.uniform1i(p.accum.as_ref(), 1);
        gl.uniform1f(p.decay.as_ref(), params.decay);
        gl.uniform1f(p.contrast.as_ref(), params.contrast);
        gl.uniform1f(p.brightness.as_ref(), params.brightness);

        self.draw_quad();

        // Unbind so `front` is never sampled while it is the next draw target.
        gl.bind_texture(GL::TEXTURE_2D, None);
        Ok(())
    }

    fn present(&mut self, target: &GlTarget, geometry: &GeometryState) -> Result<()> {
        self.bind_screen();

        let gl = &self.gl;
        gl.use_program(Some(&self.present.program));
        gl.active_texture(GL::TEXTURE0);
        gl.bind_texture(GL::TEXTURE_2D, Some(&target.texture));
        gl.uniform_matrix2fv_with_f32_array(
            self.present.transform.as_ref(),
            false,
            &geometry.transform(),
        );
        gl.uniform1i(self.present.image.as_ref(), 0);

        self.draw_quad();
        gl.bind_texture(GL::TEXTURE_2D, None);
        Ok(())
    }

    fn present_blank(&mut self) -> Result<()> {
        self.bind_screen();
        Ok(())
    }
}

impl Drop for GlBackend {
    fn drop(&mut self) {
        let gl = &self.gl;
        gl.delete_program(Some(&self.blend.program));
        gl.delete_program(Some(&self.present.program));
        gl.delete_vertex_array(Some(&self.vao));
        gl.delete_buffer(Some(&self.quad));
        gl.delete_texture(Some(&self.video_texture));
    }
}
