//! Builder errors

/// Everything that can go wrong while feeding polygons into a [`MeshBuilder`](crate::MeshBuilder)
/// or reading its results back.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MeshBuilderError {
    /// An original vertex number is not below the vertex count the builder was created with
    #[error("(VertexOutOfRange) original vertex {org_vertex} is out of range (num_org_verts = {num_org_verts})")]
    VertexOutOfRange { org_vertex: usize, num_org_verts: usize },
    /// `begin_polygon` was called while another polygon is still open
    #[error("(PolygonAlreadyOpen) begin_polygon called before end_polygon of the previous polygon")]
    PolygonAlreadyOpen,
    /// A polygon vertex or `end_polygon` was issued without `begin_polygon`
    #[error("(NoOpenPolygon) no polygon is open")]
    NoOpenPolygon,
    /// A polygon was closed with fewer than three vertices
    #[error("(DegeneratePolygon) a polygon needs at least 3 vertices, got {num_vertices}")]
    DegeneratePolygon { num_vertices: usize },
    /// Layers and skinning can only be changed before the first polygon is submitted
    #[error("(SubmissionStarted) layers and skinning info must be set before submitting polygons")]
    SubmissionStarted,
    /// A layer has no staged value for the vertex being added
    #[error("(MissingLayerValue) layer '{layer}' has no current vertex value")]
    MissingLayerValue { layer: String },
    /// A layer handle was used with a value type different from the layer's
    #[error("(LayerTypeMismatch) layer {layer} does not store the requested attribute type")]
    LayerTypeMismatch { layer: usize },
    /// A layer handle does not belong to this builder
    #[error("(InvalidLayer) layer {layer} does not exist")]
    InvalidLayer { layer: usize },
    /// A submesh index is out of range
    #[error("(InvalidSubMesh) submesh {sub_mesh} does not exist")]
    InvalidSubMesh { sub_mesh: usize },
    /// The skinning info covers a different number of original vertices than the builder
    #[error("(SkinningVertexCountMismatch) skinning info has {actual} vertices, expected {expected}")]
    SkinningVertexCountMismatch { expected: usize, actual: usize },
    /// A single polygon needs more vertices or joints than a whole submesh may hold
    #[error(
        "(PolygonExceedsLimits) polygon with {num_vertices} vertices and {num_joints} joints cannot fit a submesh (max {max_vertices} vertices, {max_bones} bones)"
    )]
    PolygonExceedsLimits {
        num_vertices: usize,
        num_joints: usize,
        max_vertices: usize,
        max_bones: usize,
    },
    /// The vertex order of a submesh was queried before `generate_sub_mesh_vertex_orders`
    #[error("(VertexOrderNotGenerated) vertex order of submesh {sub_mesh} has not been generated")]
    VertexOrderNotGenerated { sub_mesh: usize },
    /// A local vertex index is not below the vertex count of its submesh
    #[error("(LocalVertexOutOfRange) submesh {sub_mesh} has no vertex {vertex} (num_vertices = {num_vertices})")]
    LocalVertexOutOfRange {
        sub_mesh: usize,
        vertex: usize,
        num_vertices: usize,
    },
    /// An influence index is out of range for a vertex
    #[error("(InfluenceOutOfRange) vertex {org_vertex} has no influence {influence}")]
    InfluenceOutOfRange { org_vertex: usize, influence: usize },
}

pub type Result<T> = std::result::Result<T, MeshBuilderError>;
