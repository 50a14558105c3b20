//! Vertex data for the lessons. Positions only, three floats per vertex.

use gl::types::GLsizei;
use gl_thin::api::GraphicsApi;
use gl_thin::gl_fancy::{GPUState, VertexBufferBundle};
use gl_thin::gl_helper::GLErrorWrapper;
use lesson_shaders::POSITION_LOCATION;

pub const COMPONENTS_PER_VERTEX: GLsizei = 3;

#[rustfmt::skip]
pub const TRIANGLE: [f32; 9] = [
    -0.5, -0.5, 0.0,
    0.5, -0.5, 0.0,
    0.0, 0.5, 0.0,
];

/// Same triangle as [TRIANGLE] with the bottom vertices swapped.
#[rustfmt::skip]
pub const UNIFORM_TRIANGLE: [f32; 9] = [
    0.5, -0.5, 0.0,
    -0.5, -0.5, 0.0,
    0.0, 0.5, 0.0,
];

/// top right, bottom right, bottom left, top left
#[rustfmt::skip]
pub const QUAD: [f32; 12] = [
    0.5, 0.5, 0.0,
    0.5, -0.5, 0.0,
    -0.5, -0.5, 0.0,
    -0.5, 0.5, 0.0,
];

pub const QUAD_INDICES: [u32; 6] = [0, 1, 3, 1, 2, 3];

/// Upload tightly packed positions and rig them to attribute 0.
pub fn upload_positions<G: GraphicsApi>(
    api: &G,
    gpu_state: &mut GPUState,
    positions: &[f32],
    indices: Option<&[u32]>,
) -> Result<VertexBufferBundle<G, f32, u32>, GLErrorWrapper> {
    VertexBufferBundle::new(
        api,
        gpu_state,
        positions,
        indices,
        COMPONENTS_PER_VERTEX,
        &[(POSITION_LOCATION, COMPONENTS_PER_VERTEX, 0)],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use gl_thin::api::AttributeBinding;
    use gl_thin::recording::{Call, RecordingApi};

    fn vertex(data: &[f32], i: u32) -> (f32, f32) {
        let i = i as usize * 3;
        (data[i], data[i + 1])
    }

    fn signed_area(data: &[f32], [a, b, c]: [u32; 3]) -> f32 {
        let (ax, ay) = vertex(data, a);
        let (bx, by) = vertex(data, b);
        let (cx, cy) = vertex(data, c);
        ((bx - ax) * (cy - ay) - (cx - ax) * (by - ay)) / 2.0
    }

    #[test]
    fn quad_indices_tile_the_quad_once() {
        let areas: Vec<f32> = QUAD_INDICES
            .chunks_exact(3)
            .map(|t| signed_area(&QUAD, [t[0], t[1], t[2]]))
            .collect();
        // two half-unit triangles covering the unit square
        assert_eq!(areas.len(), 2);
        for area in &areas {
            assert!((area.abs() - 0.5).abs() < 1e-6);
        }
        // vertices 0 and 2 sit on opposite sides of the shared 1-3 diagonal
        let side0 = signed_area(&QUAD, [1, 3, 0]);
        let side2 = signed_area(&QUAD, [1, 3, 2]);
        assert!(side0 * side2 < 0.0);
    }

    #[test]
    fn positions_land_on_location_zero() {
        let api = RecordingApi::new();
        let mut gpu_state = GPUState::new();
        let bundle = upload_positions(&api, &mut gpu_state, &TRIANGLE, None).unwrap();
        assert_eq!(bundle.vertex_count(), 3);
        assert_eq!(bundle.index_count(), 0);

        let expected = AttributeBinding::new::<f32>(0, 3, 3, 0);
        assert!(api.calls().contains(&Call::VertexAttribPointer(expected)));
        assert!(api.calls().contains(&Call::EnableVertexAttribArray(0)));
        assert_eq!(api.bound_vertex_array(), 0);
    }
}
