// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Vertex attribute streams.

use glam::Vec3;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Identity of a [`VertexData`] buffer. Clones share it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DataId(pub u64);

/// Raw vertex bytes that one or more sources read from.
///
/// Sources built from clones of the same `VertexData` are packed into one GPU
/// buffer. The bytes are immutable.
#[derive(Debug, Clone)]
pub struct VertexData {
    id: DataId,
    bytes: Arc<[u8]>,
}

impl VertexData {
    /// Wraps raw bytes under a new identity.
    pub fn new(bytes: impl Into<Arc<[u8]>>) -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self {
            id: DataId(NEXT.fetch_add(1, Ordering::Relaxed)),
            bytes: bytes.into(),
        }
    }

    /// Copies plain-old-data values (e.g. `[f32; 8]` interleaved vertices).
    pub fn from_pod<T: bytemuck::Pod>(values: &[T]) -> Self {
        Self::new(bytemuck::cast_slice::<T, u8>(values).to_vec())
    }

    /// The identity sources are grouped by.
    pub fn id(&self) -> DataId {
        self.id
    }

    /// The raw bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` if there are no bytes.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// What a vertex attribute stream means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometrySemantic {
    /// Positions.
    Vertex,
    /// Normals.
    Normal,
    /// Vertex colors.
    Color,
    /// Texture coordinates.
    Texcoord,
    /// Tangents.
    Tangent,
    /// Subdivision vertex creases.
    VertexCrease,
    /// Subdivision edge creases.
    EdgeCrease,
    /// Skinning weights.
    BoneWeights,
    /// Skinning joint indices.
    BoneIndices,
}

impl GeometrySemantic {
    /// The vertex attribute location the stream is bound at.
    ///
    /// Semantics without a dedicated location share location 0.
    pub fn shader_location(self) -> u32 {
        match self {
            GeometrySemantic::Vertex => 0,
            GeometrySemantic::Normal => 1,
            GeometrySemantic::Color => 2,
            GeometrySemantic::Texcoord => 3,
            GeometrySemantic::VertexCrease => 4,
            GeometrySemantic::EdgeCrease => 5,
            GeometrySemantic::BoneWeights => 6,
            GeometrySemantic::BoneIndices => 7,
            GeometrySemantic::Tangent => 0,
        }
    }
}

/// How a source's vertices are laid out inside its [`VertexData`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLayout {
    /// Number of vertices.
    pub vertex_count: usize,
    /// If `true`, components are floating point.
    pub float_components: bool,
    /// Components per vertex (e.g. 3 for a position).
    pub components_per_vertex: usize,
    /// Bytes per component (4 for `f32`, 2 for `f16`).
    pub bytes_per_component: usize,
    /// Byte offset of the first vertex's attribute.
    pub offset: usize,
    /// Bytes between consecutive vertices.
    pub stride: usize,
}

impl SourceLayout {
    /// A layout of `components` 32-bit floats per vertex.
    pub fn f32(vertex_count: usize, components: usize, offset: usize, stride: usize) -> Self {
        Self {
            vertex_count,
            float_components: true,
            components_per_vertex: components,
            bytes_per_component: 4,
            offset,
            stride,
        }
    }
}

/// One vertex attribute stream of a geometry.
#[derive(Debug, Clone)]
pub struct GeometrySource {
    data: VertexData,
    semantic: GeometrySemantic,
    layout: SourceLayout,
}

impl GeometrySource {
    /// Creates a source reading `semantic` from `data` with `layout`.
    pub fn new(data: VertexData, semantic: GeometrySemantic, layout: SourceLayout) -> Self {
        Self {
            data,
            semantic,
            layout,
        }
    }

    /// The shared data the source reads from.
    pub fn data(&self) -> &VertexData {
        &self.data
    }

    /// The meaning of the stream.
    pub fn semantic(&self) -> GeometrySemantic {
        self.semantic
    }

    /// The layout of the stream.
    pub fn layout(&self) -> &SourceLayout {
        &self.layout
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.layout.vertex_count
    }

    /// Bytes between consecutive vertices.
    pub fn stride(&self) -> usize {
        self.layout.stride
    }

    /// Byte offset of the first vertex's attribute.
    pub fn offset(&self) -> usize {
        self.layout.offset
    }

    /// Reads the first three components of every vertex as a point.
    ///
    /// Only 32-bit float sources are read; two-component sources yield
    /// `z = 0`. Vertices past the end of the data are skipped.
    pub fn read_points(&self) -> impl Iterator<Item = Vec3> + '_ {
        let layout = self.layout;
        let readable = layout.float_components
            && layout.bytes_per_component == 4
            && layout.components_per_vertex >= 2;
        let count = if readable { layout.vertex_count } else { 0 };
        let bytes = self.data.bytes();
        (0..count).map_while(move |i| {
            let start = layout.offset + i * layout.stride;
            let component = |c: usize| -> Option<f32> {
                let at = start + c * 4;
                bytes
                    .get(at..at + 4)
                    .map(bytemuck::pod_read_unaligned::<f32>)
            };
            let x = component(0)?;
            let y = component(1)?;
            let z = if layout.components_per_vertex >= 3 {
                component(2)?
            } else {
                0.0
            };
            Some(Vec3::new(x, y, z))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_identity() {
        let data = VertexData::new(vec![0u8; 12]);
        let clone = data.clone();
        assert_eq!(data.id(), clone.id());
        assert_ne!(data.id(), VertexData::new(vec![0u8; 12]).id());
    }

    #[test]
    fn semantic_locations() {
        assert_eq!(GeometrySemantic::Vertex.shader_location(), 0);
        assert_eq!(GeometrySemantic::Texcoord.shader_location(), 3);
        assert_eq!(GeometrySemantic::BoneIndices.shader_location(), 7);
        assert_eq!(GeometrySemantic::Tangent.shader_location(), 0);
    }

    #[test]
    fn read_points_from_interleaved_data() {
        // position (3) + texcoord (2)
        let vertices: [[f32; 5]; 2] = [[1.0, 2.0, 3.0, 0.0, 0.0], [4.0, 5.0, 6.0, 1.0, 1.0]];
        let data = VertexData::from_pod(&vertices);
        let source = GeometrySource::new(
            data,
            GeometrySemantic::Vertex,
            SourceLayout::f32(2, 3, 0, 20),
        );
        let points: Vec<Vec3> = source.read_points().collect();
        assert_eq!(points, vec![Vec3::new(1.0, 2.0, 3.0), Vec3::new(4.0, 5.0, 6.0)]);
    }

    #[test]
    fn read_points_stops_at_end_of_data() {
        let data = VertexData::from_pod(&[1.0f32, 2.0, 3.0]);
        let source = GeometrySource::new(
            data,
            GeometrySemantic::Vertex,
            SourceLayout::f32(4, 3, 0, 12),
        );
        assert_eq!(source.read_points().count(), 1);
    }

    #[test]
    fn half_float_sources_yield_no_points() {
        let data = VertexData::new(vec![0u8; 16]);
        let layout = SourceLayout {
            bytes_per_component: 2,
            ..SourceLayout::f32(2, 4, 0, 8)
        };
        let source = GeometrySource::new(data, GeometrySemantic::Vertex, layout);
        assert_eq!(source.read_points().count(), 0);
    }
}
