//! Test support library
//! Provides various helper functions & utilities for tests.
#![allow(dead_code)]

use meshbuilder::{
    LayerHandle, LayerKind, MeshBuilder, MeshBuilderConfig, VertexLookup,
    errors::Result,
    float_types::Real,
};
use nalgebra::{Point3, Vector2};

/// Install a logger once so `RUST_LOG=debug cargo test` shows builder diagnostics.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Quick helper to compare floating-point results with an acceptable tolerance.
pub fn approx_eq(a: Real, b: Real, eps: Real) -> bool {
    (a - b).abs() < eps
}

/// A corner of a test polygon: original vertex, position and UV.
#[derive(Debug, Clone, Copy)]
pub struct Corner {
    pub org_vertex: usize,
    pub pos: [Real; 3],
    pub uv: [Real; 2],
}

pub const fn corner(org_vertex: usize, pos: [Real; 3], uv: [Real; 2]) -> Corner {
    Corner { org_vertex, pos, uv }
}

/// Position derived from the original vertex number, so equal vertices get equal positions.
pub fn corner_at(org_vertex: usize, uv: [Real; 2]) -> Corner {
    corner(org_vertex, [org_vertex as Real, 0.0, 0.0], uv)
}

/// A builder with a position and a UV layer.
pub struct LayeredBuilder {
    pub builder: MeshBuilder,
    pub positions: LayerHandle<Point3<Real>>,
    pub uvs: LayerHandle<Vector2<Real>>,
}

impl LayeredBuilder {
    pub fn new(num_org_verts: usize, config: MeshBuilderConfig) -> Self {
        let mut builder = MeshBuilder::with_config(num_org_verts, config);
        let positions = builder
            .add_layer::<Point3<Real>>("position", LayerKind::Position)
            .expect("no polygons yet");
        let uvs = builder
            .add_layer::<Vector2<Real>>("uv", LayerKind::Uv)
            .expect("no polygons yet");
        Self {
            builder,
            positions,
            uvs,
        }
    }

    /// Submit one polygon, returning the submesh it landed in and its vertex lookups.
    pub fn polygon(
        &mut self,
        material: usize,
        corners: &[Corner],
    ) -> Result<(usize, Vec<VertexLookup>)> {
        self.builder.begin_polygon(material)?;
        let mut lookups = Vec::with_capacity(corners.len());
        for c in corners {
            self.builder
                .set_current_vertex_value(self.positions, Point3::new(c.pos[0], c.pos[1], c.pos[2]))?;
            self.builder
                .set_current_vertex_value(self.uvs, Vector2::new(c.uv[0], c.uv[1]))?;
            lookups.push(self.builder.add_polygon_vertex(c.org_vertex)?);
        }
        let sub_mesh = self.builder.end_polygon()?;
        Ok((sub_mesh, lookups))
    }
}

/// Corners of a `width` x `height` grid of quads, split into two triangles each.
/// Vertex `(x, y)` is original vertex `y * (width + 1) + x`. The column in the middle is a UV
/// seam: quads right of it see a different U there than quads left of it.
pub fn grid_triangles(width: usize, height: usize) -> Vec<[Corner; 3]> {
    let mid = width / 2;
    let vertex = |quad_x: usize, x: usize, y: usize| {
        let org_vertex = y * (width + 1) + x;
        let u = if x == mid && quad_x >= mid {
            10.0
        } else {
            x as Real / width as Real
        };
        corner(
            org_vertex,
            [x as Real, y as Real, 0.0],
            [u, y as Real / height as Real],
        )
    };

    let mut triangles = Vec::new();
    for y in 0..height {
        for x in 0..width {
            let a = vertex(x, x, y);
            let b = vertex(x, x + 1, y);
            let c = vertex(x, x + 1, y + 1);
            let d = vertex(x, x, y + 1);
            triangles.push([a, b, c]);
            triangles.push([a, c, d]);
        }
    }
    triangles
}
