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

//! GPU buffers.

use bitflags::bitflags;
use std::borrow::Cow;

/// An opaque handle to a GPU buffer owned by a [`GraphicsDevice`](crate::renderer::traits::GraphicsDevice).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub usize);

bitflags! {
    /// How a buffer may be used. Bit positions match the WebGPU values.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BufferUsage: u32 {
        /// The buffer can be mapped for reading.
        const MAP_READ = 1 << 0;
        /// The buffer can be mapped for writing.
        const MAP_WRITE = 1 << 1;
        /// The buffer can be the source of a copy.
        const COPY_SRC = 1 << 2;
        /// The buffer can be the destination of a copy or a queue write.
        const COPY_DST = 1 << 3;
        /// The buffer can be bound as an index buffer.
        const INDEX = 1 << 4;
        /// The buffer can be bound as a vertex buffer.
        const VERTEX = 1 << 5;
        /// The buffer can be bound as a uniform buffer.
        const UNIFORM = 1 << 6;
        /// The buffer can be bound as a storage buffer.
        const STORAGE = 1 << 7;
        /// The buffer can hold indirect draw arguments.
        const INDIRECT = 1 << 8;
    }
}

/// Describes a buffer to create.
#[derive(Debug, Clone)]
pub struct BufferDescriptor<'a> {
    /// Debug label.
    pub label: Option<Cow<'a, str>>,
    /// Size in bytes.
    pub size: u64,
    /// Allowed usages.
    pub usage: BufferUsage,
    /// If `true`, the buffer starts mapped for writing.
    pub mapped_at_creation: bool,
}
