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

//! Draw-ordering tokens.
//!
//! Sorting the keys of every visible element yields the draw order:
//!
//! 1. explicit rendering order, ascending;
//! 2. opaque before transparent;
//! 3. opaque: by shader, then texture set, then front to back;
//! 4. transparent: back to front, then shader, then texture set;
//! 5. ties broken by node and element index.

use std::cmp::Ordering;

/// The ordering token of one (node, element) pair for one frame.
#[derive(Debug, Clone, Copy)]
pub struct SortKey {
    /// User-assigned order; lower draws first.
    pub rendering_order: i32,
    /// If `true`, the element blends with what is behind it.
    pub transparent: bool,
    /// Identity of the shader program, including the active light set.
    pub shader: u32,
    /// Identity of the bound texture set.
    pub textures: u32,
    /// Distance from the camera to the element's bounds center.
    pub distance_from_camera: f32,
    /// The drawing node.
    pub node: u64,
    /// Index of the element in its geometry.
    pub element_index: u32,
}

impl Ord for SortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        let head = self
            .rendering_order
            .cmp(&other.rendering_order)
            .then(self.transparent.cmp(&other.transparent));
        let body = if self.transparent {
            other
                .distance_from_camera
                .total_cmp(&self.distance_from_camera)
                .then(self.shader.cmp(&other.shader))
                .then(self.textures.cmp(&other.textures))
        } else {
            self.shader
                .cmp(&other.shader)
                .then(self.textures.cmp(&other.textures))
                .then(
                    self.distance_from_camera
                        .total_cmp(&other.distance_from_camera),
                )
        };
        head.then(body)
            .then(self.node.cmp(&other.node))
            .then(self.element_index.cmp(&other.element_index))
    }
}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for SortKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SortKey {}
