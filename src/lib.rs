//! Vertex **deduplication** and **submesh partitioning** for meshes on their way to the GPU.
//!
//! A source mesh is fed polygon by polygon into a [`MeshBuilder`]. Every polygon corner
//! carries one value per attribute layer (position, normal, UV, color, ...). Corners that
//! share an original vertex and agree on every layer collapse into one vertex; corners
//! that disagree (UV seams, hard edges) become separate *duplicates*. Polygons are then
//! packed into [`SubMesh`]es that share a material and stay below a vertex budget and,
//! for skinned meshes, a bone palette budget.
//!
//! # Features
//! #### Default
//! - **f32**: use f32 as Real
//!
//! #### Optional
//! - **f64**: use f64 as Real, this conflicts with f32
//! - **parallel**: use rayon to generate submesh vertex orders in parallel

#![forbid(unsafe_code)]
#![deny(unused)]
#![warn(clippy::missing_const_for_fn, clippy::approx_constant, clippy::all)]

pub mod builder;
pub mod config;
pub mod errors;
pub mod float_types;
pub mod layer;
pub mod skinning;
pub mod sub_mesh;
pub mod vertex_lookup;

#[cfg(any(all(feature = "f64", feature = "f32"), not(any(feature = "f64", feature = "f32"))))]
compile_error!("Either 'f64' or 'f32' feature must be specified, but not both");

pub use builder::{MeshBuilder, SubMeshVertexRecord};
pub use config::MeshBuilderConfig;
pub use errors::MeshBuilderError;
pub use layer::{AttributeLayer, LayerHandle, LayerKind, VertexAttribute};
pub use skinning::{Influence, SkinningInfo};
pub use sub_mesh::SubMesh;
pub use vertex_lookup::VertexLookup;
