//! Per-vertex attribute streams (positions, normals, UVs, colors, ...) and their duplicates.

use crate::errors::{MeshBuilderError, Result};
use crate::float_types::{Real, is_close, tolerance};
use nalgebra::{Point, SVector};
use std::any::Any;
use std::fmt::Debug;
use std::marker::PhantomData;

/// A value that can be stored in an [`AttributeLayer`].
///
/// Integral types compare exactly, floating point based types compare with
/// [`tolerance`](crate::float_types::tolerance).
pub trait VertexAttribute: Clone + Debug + Send + Sync + 'static {
    fn is_close(&self, other: &Self, tolerance: Real) -> bool;
}

macro_rules! exact_attribute {
    ($($t:ty),*) => {
        $(
            impl VertexAttribute for $t {
                #[inline]
                fn is_close(&self, other: &Self, _tolerance: Real) -> bool {
                    self == other
                }
            }
        )*
    };
}

exact_attribute!(u8, u16, u32, u64, i8, i16, i32, i64, usize, bool);

#[cfg(feature = "f32")]
impl VertexAttribute for f32 {
    #[inline]
    fn is_close(&self, other: &Self, tolerance: Real) -> bool {
        is_close(*self, *other, tolerance)
    }
}

#[cfg(feature = "f32")]
impl VertexAttribute for f64 {
    #[inline]
    fn is_close(&self, other: &Self, tolerance: Real) -> bool {
        // compared at crate precision
        is_close(*self as Real, *other as Real, tolerance)
    }
}

#[cfg(feature = "f64")]
impl VertexAttribute for f32 {
    #[inline]
    fn is_close(&self, other: &Self, tolerance: Real) -> bool {
        is_close(Real::from(*self), Real::from(*other), tolerance)
    }
}

#[cfg(feature = "f64")]
impl VertexAttribute for f64 {
    #[inline]
    fn is_close(&self, other: &Self, tolerance: Real) -> bool {
        is_close(*self, *other, tolerance)
    }
}

impl<const D: usize> VertexAttribute for SVector<Real, D> {
    #[inline]
    fn is_close(&self, other: &Self, tolerance: Real) -> bool {
        self.iter()
            .zip(other.iter())
            .all(|(a, b)| is_close(*a, *b, tolerance))
    }
}

impl<const D: usize> VertexAttribute for Point<Real, D> {
    #[inline]
    fn is_close(&self, other: &Self, tolerance: Real) -> bool {
        VertexAttribute::is_close(&self.coords, &other.coords, tolerance)
    }
}

impl<const N: usize> VertexAttribute for [Real; N] {
    #[inline]
    fn is_close(&self, other: &Self, tolerance: Real) -> bool {
        self.iter()
            .zip(other.iter())
            .all(|(a, b)| is_close(*a, *b, tolerance))
    }
}

/// What a layer holds. Only used for diagnostics, deduplication treats all layers alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LayerKind {
    Position,
    Normal,
    Tangent,
    Bitangent,
    Uv,
    Color,
    #[default]
    Custom,
}

/// One attribute stream. For every original vertex it keeps one value per duplicate.
#[derive(Debug, Clone)]
pub struct AttributeLayer<T: VertexAttribute> {
    name: String,
    kind: LayerKind,
    vertices: Vec<Vec<T>>,
    current: Option<T>,
}

impl<T: VertexAttribute> AttributeLayer<T> {
    pub fn new(num_org_verts: usize, name: impl Into<String>, kind: LayerKind) -> Self {
        Self {
            name: name.into(),
            kind,
            vertices: vec![Vec::new(); num_org_verts],
            current: None,
        }
    }

    /// Stage the value the next [`add_vertex`](VertexAttributeLayer::add_vertex) or
    /// equality check works with.
    pub fn set_current_vertex_value(&mut self, value: T) {
        self.current = Some(value);
    }

    pub const fn current_vertex_value(&self) -> Option<&T> {
        self.current.as_ref()
    }

    /// The value stored for a given duplicate of an original vertex.
    pub fn vertex_value(&self, org_vertex: usize, dupe: usize) -> Option<&T> {
        self.vertices.get(org_vertex)?.get(dupe)
    }

    pub fn num_org_verts(&self) -> usize {
        self.vertices.len()
    }
}

/// Type-erased view of an [`AttributeLayer`], so layers of different value types can
/// live in one list inside the builder.
pub trait VertexAttributeLayer: Any + Send + Sync + Debug {
    fn name(&self) -> &str;

    fn kind(&self) -> LayerKind;

    /// Append the staged value as a new duplicate of `org_vertex`.
    fn add_vertex(&mut self, org_vertex: usize) -> Result<()>;

    /// Does the staged value match duplicate `dupe` of `org_vertex`?
    fn check_if_is_vertex_equal(&self, org_vertex: usize, dupe: usize) -> bool;

    /// Number of duplicates stored for `org_vertex`, 0 when none.
    fn num_duplicates(&self, org_vertex: usize) -> usize;

    fn has_current_value(&self) -> bool;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: VertexAttribute> VertexAttributeLayer for AttributeLayer<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> LayerKind {
        self.kind
    }

    fn add_vertex(&mut self, org_vertex: usize) -> Result<()> {
        let num_org_verts = self.vertices.len();
        let Some(value) = self.current.clone() else {
            return Err(MeshBuilderError::MissingLayerValue {
                layer: self.name.clone(),
            });
        };
        let duplicates = self
            .vertices
            .get_mut(org_vertex)
            .ok_or(MeshBuilderError::VertexOutOfRange {
                org_vertex,
                num_org_verts,
            })?;
        duplicates.push(value);
        Ok(())
    }

    fn check_if_is_vertex_equal(&self, org_vertex: usize, dupe: usize) -> bool {
        match (&self.current, self.vertex_value(org_vertex, dupe)) {
            (Some(current), Some(stored)) => current.is_close(stored, tolerance()),
            _ => false,
        }
    }

    fn num_duplicates(&self, org_vertex: usize) -> usize {
        self.vertices.get(org_vertex).map_or(0, Vec::len)
    }

    fn has_current_value(&self) -> bool {
        self.current.is_some()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Typed handle to a layer registered with [`MeshBuilder::add_layer`](crate::MeshBuilder::add_layer).
#[derive(Debug)]
pub struct LayerHandle<T> {
    index: usize,
    _phantom: PhantomData<fn() -> T>,
}

impl<T> LayerHandle<T> {
    pub(crate) const fn new(index: usize) -> Self {
        Self {
            index,
            _phantom: PhantomData,
        }
    }

    pub const fn index(&self) -> usize {
        self.index
    }
}

impl<T> Clone for LayerHandle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for LayerHandle<T> {}

impl<T> PartialEq for LayerHandle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T> Eq for LayerHandle<T> {}
