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

//! Index buffers and their primitive topology.

use crate::renderer::api::pipeline::PrimitiveTopology;
use crate::renderer::api::util::IndexFormat;
use std::sync::Arc;

/// How an element's indices form primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryPrimitiveType {
    /// Independent triangles.
    Triangle,
    /// A strip of connected triangles.
    TriangleStrip,
    /// Independent lines.
    Line,
    /// Points.
    Point,
}

impl GeometryPrimitiveType {
    /// The number of indices `primitive_count` primitives consume.
    pub fn index_count(self, primitive_count: usize) -> usize {
        match self {
            GeometryPrimitiveType::Triangle => primitive_count * 3,
            GeometryPrimitiveType::TriangleStrip => primitive_count + 2,
            GeometryPrimitiveType::Line => primitive_count * 2,
            GeometryPrimitiveType::Point => primitive_count,
        }
    }

    /// The pipeline topology.
    pub fn topology(self) -> PrimitiveTopology {
        match self {
            GeometryPrimitiveType::Triangle => PrimitiveTopology::TriangleList,
            GeometryPrimitiveType::TriangleStrip => PrimitiveTopology::TriangleStrip,
            GeometryPrimitiveType::Line => PrimitiveTopology::LineList,
            GeometryPrimitiveType::Point => PrimitiveTopology::PointList,
        }
    }
}

/// One index buffer of a geometry, drawn with one material.
#[derive(Debug, Clone)]
pub struct GeometryElement {
    data: Arc<[u8]>,
    primitive_type: GeometryPrimitiveType,
    primitive_count: usize,
    bytes_per_index: usize,
}

impl GeometryElement {
    /// Creates an element from raw index bytes.
    pub fn new(
        data: impl Into<Arc<[u8]>>,
        primitive_type: GeometryPrimitiveType,
        primitive_count: usize,
        bytes_per_index: usize,
    ) -> Self {
        Self {
            data: data.into(),
            primitive_type,
            primitive_count,
            bytes_per_index,
        }
    }

    /// Creates an element from 16-bit indices.
    pub fn from_u16(
        indices: &[u16],
        primitive_type: GeometryPrimitiveType,
        primitive_count: usize,
    ) -> Self {
        Self::new(
            bytemuck::cast_slice::<u16, u8>(indices).to_vec(),
            primitive_type,
            primitive_count,
            2,
        )
    }

    /// Creates an element from 32-bit indices.
    pub fn from_u32(
        indices: &[u32],
        primitive_type: GeometryPrimitiveType,
        primitive_count: usize,
    ) -> Self {
        Self::new(
            bytemuck::cast_slice::<u32, u8>(indices).to_vec(),
            primitive_type,
            primitive_count,
            4,
        )
    }

    /// The raw index bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// The primitive type.
    pub fn primitive_type(&self) -> GeometryPrimitiveType {
        self.primitive_type
    }

    /// Number of primitives.
    pub fn primitive_count(&self) -> usize {
        self.primitive_count
    }

    /// Bytes per index (2 or 4).
    pub fn bytes_per_index(&self) -> usize {
        self.bytes_per_index
    }

    /// Number of indices drawn.
    pub fn index_count(&self) -> usize {
        self.primitive_type.index_count(self.primitive_count)
    }

    /// The index buffer format.
    pub fn index_format(&self) -> IndexFormat {
        IndexFormat::from_bytes_per_index(self.bytes_per_index)
    }

    /// Bytes the draw reads: `index_count * bytes_per_index`.
    pub fn index_byte_len(&self) -> usize {
        self.index_count() * self.bytes_per_index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_count_per_primitive_type() {
        assert_eq!(GeometryPrimitiveType::Triangle.index_count(10), 30);
        assert_eq!(GeometryPrimitiveType::TriangleStrip.index_count(10), 12);
        assert_eq!(GeometryPrimitiveType::Line.index_count(10), 20);
        assert_eq!(GeometryPrimitiveType::Point.index_count(10), 10);
    }

    #[test]
    fn element_derives_format_and_byte_length() {
        let element = GeometryElement::from_u16(&[0, 1, 2, 2, 1, 3], GeometryPrimitiveType::Triangle, 2);
        assert_eq!(element.index_count(), 6);
        assert_eq!(element.index_format(), IndexFormat::Uint16);
        assert_eq!(element.index_byte_len(), 12);

        let element = GeometryElement::from_u32(&[0, 1, 2, 3], GeometryPrimitiveType::TriangleStrip, 2);
        assert_eq!(element.index_format(), IndexFormat::Uint32);
        assert_eq!(element.primitive_type().topology(), PrimitiveTopology::TriangleStrip);
    }
}
