#![cfg(target_arch = "wasm32")]

use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;
use web_sys::{HtmlCanvasElement, WebGl2RenderingContext as GL, WebGlProgram};

use trail_viewer::shaders;

wasm_bindgen_test_configure!(run_in_browser);

fn webgl2() -> GL {
    let document = web_sys::window().unwrap().document().unwrap();
    let canvas: HtmlCanvasElement = document
        .create_element("canvas")
        .unwrap()
        .dyn_into()
        .unwrap();
    canvas.set_width(64);
    canvas.set_height(64);
    document.body().unwrap().append_child(&canvas).unwrap();
    canvas
        .get_context("webgl2")
        .unwrap()
        .expect("WebGL2 not available")
        .dyn_into()
        .unwrap()
}

fn build(gl: &GL, fragment: &str) -> WebGlProgram {
    let program = gl.create_program().unwrap();
    for (kind, source) in [
        (GL::VERTEX_SHADER, shaders::QUAD_VERTEX),
        (GL::FRAGMENT_SHADER, fragment),
    ] {
        let shader = gl.create_shader(kind).unwrap();
        gl.shader_source(&shader, source);
        gl.compile_shader(&shader);
        let ok = gl
            .get_shader_parameter(&shader, GL::COMPILE_STATUS)
            .as_bool()
            .unwrap_or(false);
        assert!(ok, "{}", gl.get_shader_info_log(&shader).unwrap_or_default());
        gl.attach_shader(&program, &shader);
    }
    gl.link_program(&program);
    let linked = gl
        .get_program_parameter(&program, GL::LINK_STATUS)
        .as_bool()
        .unwrap_or(false);
    assert!(linked, "{}", gl.get_program_info_log(&program).unwrap_or_default());
    program
}

#[wasm_bindgen_test]
fn canvas_exists() {
    let gl = webgl2();
    let canvas: HtmlCanvasElement = gl.canvas().unwrap().dyn_into().unwrap();
    assert_eq!((canvas.width(), canvas.height()), (64, 64));
    assert!(canvas.is_connected());
}

#[wasm_bindgen_test]
fn blend_program_exposes_its_uniforms() {
    let gl = webgl2();
    let program = build(&gl, shaders::BLEND_FRAGMENT);
    for name in [
        shaders::U_TRANSFORM,
        shaders::U_CURRENT,
        shaders::U_ACCUM,
        shaders::U_DECAY,
        shaders::U_CONTRAST,
        shaders::U_BRIGHTNESS,
    ] {
        assert!(gl.get_uniform_location(&program, name).is_some(), "{name} missing");
    }
}

#[wasm_bindgen_test]
fn present_program_links() {
    let gl = webgl2();
    let program = build(&gl, shaders::PRESENT_FRAGMENT);
    assert!(gl.get_uniform_location(&program, shaders::U_IMAGE).is_some());
    assert!(gl.get_uniform_location(&program, shaders::U_TRANSFORM).is_some());
}
