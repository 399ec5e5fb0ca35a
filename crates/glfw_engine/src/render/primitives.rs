//! Built-in triangle geometry and shaders

use crate::render::shader::ShaderSource;
use crate::render::vertex_layout::VertexAttribute;

/// Input location of the position attribute in [`TRIANGLE_VERTEX_SHADER`]
pub const POSITION_LOCATION: u32 = 0;

/// Passes positions straight through to clip space
pub const TRIANGLE_VERTEX_SHADER: &str = r"#version 330 core

layout (location = 0) in vec3 pos;

void main()
{
    gl_Position = vec4(pos.x, pos.y, pos.z, 1.0);
}
";

/// Writes a constant colour, see [`TRIANGLE_COLOUR`]
pub const TRIANGLE_FRAGMENT_SHADER: &str = r"#version 330 core

out vec4 colour;

void main()
{
    colour = vec4(0.2, 0.9, 0.9, 1.0);
}
";

/// Colour written by [`TRIANGLE_FRAGMENT_SHADER`]
pub const TRIANGLE_COLOUR: [f32; 4] = [0.2, 0.9, 0.9, 1.0];

/// Three clip-space positions (x, y, z), counter-clockwise
#[rustfmt::skip]
pub const TRIANGLE_VERTICES: [f32; 9] = [
    -1.0, -1.0, 0.0,
     1.0, -1.0, 0.0,
     0.0,  1.0, 0.0,
];

/// Centroid of [`TRIANGLE_VERTICES`] in normalized device coordinates
pub const TRIANGLE_CENTROID: (f32, f32) = (0.0, -1.0 / 3.0);

/// Vertex and fragment sources for the triangle program
pub fn triangle_sources() -> [ShaderSource; 2] {
    [
        ShaderSource::vertex(TRIANGLE_VERTEX_SHADER),
        ShaderSource::fragment(TRIANGLE_FRAGMENT_SHADER),
    ]
}

/// Layout of [`TRIANGLE_VERTICES`]: packed vec3 positions
pub const fn triangle_layout() -> VertexAttribute {
    VertexAttribute::float(POSITION_LOCATION, 3)
}

/// Pixel coordinates of a point given in normalized device coordinates
pub fn ndc_to_pixel(ndc: (f32, f32), framebuffer: (i32, i32)) -> (i32, i32) {
    let (width, height) = framebuffer;
    let x = (ndc.0 + 1.0) * 0.5 * width as f32;
    let y = (ndc.1 + 1.0) * 0.5 * height as f32;
    (x.round() as i32, y.round() as i32)
}
