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

//! Defines the hierarchy of error types for the rendering subsystem.
//!
//! [`SubstrateError`] covers malformed input detected while building a
//! substrate: these abort construction. [`RenderError`] covers failures while
//! recording a frame, and [`GeometryError`] is what the [`Geometry`](crate::geometry::Geometry)
//! API returns.

use crate::geometry::GeometrySemantic;
use crate::renderer::api::pipeline::RenderPipelineId;
use crate::renderer::api::resource::ShaderModuleId;
use std::fmt;

/// An error related to the creation or compilation of a shader module.
#[derive(Debug)]
pub enum ShaderError {
    /// The shader source failed to compile into a backend-specific module.
    CompilationError {
        /// A descriptive label for the shader, if available.
        label: String,
        /// Detailed error messages from the shader compiler.
        details: String,
    },
    /// The requested shader module could not be found.
    NotFound {
        /// The ID of the shader module that was not found.
        id: ShaderModuleId,
    },
}

impl fmt::Display for ShaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderError::CompilationError { label, details } => {
                write!(f, "Shader compilation failed for '{label}': {details}")
            }
            ShaderError::NotFound { id } => {
                write!(f, "Shader module not found for ID: {id:?}")
            }
        }
    }
}

impl std::error::Error for ShaderError {}

/// An error related to the creation or management of a graphics pipeline.
#[derive(Debug)]
pub enum PipelineError {
    /// Failed to create a pipeline layout.
    LayoutCreationFailed(String),
    /// The graphics backend rejected the pipeline state object.
    CompilationFailed {
        /// A descriptive label for the pipeline, if available.
        label: Option<String>,
        /// Detailed error messages from the backend.
        details: String,
    },
    /// The specified render pipeline ID is not valid.
    InvalidRenderPipeline {
        /// The ID of the invalid render pipeline.
        id: RenderPipelineId,
    },
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::LayoutCreationFailed(msg) => {
                write!(f, "Pipeline layout creation failed: {msg}")
            }
            PipelineError::CompilationFailed { label, details } => {
                write!(
                    f,
                    "Pipeline compilation failed for '{}': {}",
                    label.as_deref().unwrap_or("Unknown"),
                    details
                )
            }
            PipelineError::InvalidRenderPipeline { id } => {
                write!(f, "Invalid render pipeline ID: {id:?}")
            }
        }
    }
}

impl std::error::Error for PipelineError {}

/// An error related to the creation or use of a GPU resource (buffers, textures, etc.).
#[derive(Debug)]
pub enum ResourceError {
    /// A shader-specific error occurred.
    Shader(ShaderError),
    /// A pipeline-specific error occurred.
    Pipeline(PipelineError),
    /// A generic resource could not be found.
    NotFound,
    /// The handle or ID used to reference a resource is invalid.
    InvalidHandle,
    /// An error originating from the specific graphics backend implementation.
    BackendError(String),
    /// An attempt was made to access a resource out of its bounds (e.g., in a buffer).
    OutOfBounds,
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::Shader(err) => write!(f, "Shader resource error: {err}"),
            ResourceError::Pipeline(err) => write!(f, "Pipeline resource error: {err}"),
            ResourceError::NotFound => write!(f, "Resource not found with ID."),
            ResourceError::InvalidHandle => write!(f, "Invalid resource handle or ID."),
            ResourceError::BackendError(msg) => {
                write!(f, "Backend-specific resource error: {msg}")
            }
            ResourceError::OutOfBounds => {
                write!(f, "Resource access out of bounds.")
            }
        }
    }
}

impl std::error::Error for ResourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResourceError::Shader(err) => Some(err),
            ResourceError::Pipeline(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ShaderError> for ResourceError {
    fn from(err: ShaderError) -> Self {
        ResourceError::Shader(err)
    }
}

impl From<PipelineError> for ResourceError {
    fn from(err: PipelineError) -> Self {
        ResourceError::Pipeline(err)
    }
}

/// Malformed geometry or material input found while building a substrate.
///
/// Construction stops at the first such error; no partially built substrate
/// is ever handed out.
#[derive(Debug)]
pub enum SubstrateError {
    /// The geometry has no materials.
    EmptyMaterials,
    /// Two sources sharing one vertex buffer disagree on the stride.
    StrideMismatch {
        /// Index of the vertex buffer group.
        group: usize,
        /// Stride of the group's layout.
        expected: usize,
        /// Stride reported by the offending source.
        found: usize,
        /// Semantic of the offending source.
        semantic: GeometrySemantic,
    },
    /// A source's component width and count map to no vertex format.
    UnsupportedVertexLayout {
        /// Semantic of the offending source.
        semantic: GeometrySemantic,
        /// Bytes per component.
        bytes_per_component: usize,
        /// Components per vertex.
        components_per_vertex: usize,
    },
    /// An element's index data is shorter than its primitive count requires.
    InvalidIndexData {
        /// Index of the element.
        element: usize,
        /// Bytes required by the primitive count.
        expected: usize,
        /// Bytes available.
        found: usize,
    },
    /// The backend failed to create a resource the substrate cannot work without.
    Resource(ResourceError),
}

impl fmt::Display for SubstrateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubstrateError::EmptyMaterials => write!(f, "Geometry has no materials"),
            SubstrateError::StrideMismatch {
                group,
                expected,
                found,
                semantic,
            } => write!(
                f,
                "Vertex buffer group {group} has stride {expected}, but its {semantic:?} source reports {found}"
            ),
            SubstrateError::UnsupportedVertexLayout {
                semantic,
                bytes_per_component,
                components_per_vertex,
            } => write!(
                f,
                "Unsupported vertex layout for {semantic:?}: {components_per_vertex} components of {bytes_per_component} bytes"
            ),
            SubstrateError::InvalidIndexData {
                element,
                expected,
                found,
            } => write!(
                f,
                "Element {element} needs {expected} bytes of index data, found {found}"
            ),
            SubstrateError::Resource(err) => write!(f, "Substrate resource error: {err}"),
        }
    }
}

impl std::error::Error for SubstrateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SubstrateError::Resource(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ResourceError> for SubstrateError {
    fn from(err: ResourceError) -> Self {
        SubstrateError::Resource(err)
    }
}

/// An error while recording draws for a frame.
#[derive(Debug)]
pub enum RenderError {
    /// A critical rendering operation failed.
    RenderingFailed(String),
    /// An error occurred while managing a GPU resource.
    ResourceError(ResourceError),
    /// A substrate needed by the draw could not be built.
    Substrate(SubstrateError),
    /// The graphics device was lost and must be recreated.
    DeviceLost,
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::RenderingFailed(msg) => {
                write!(f, "A critical rendering operation failed: {msg}")
            }
            RenderError::ResourceError(err) => {
                write!(f, "Graphics resource operation failed: {err}")
            }
            RenderError::Substrate(err) => write!(f, "Substrate unavailable: {err}"),
            RenderError::DeviceLost => write!(
                f,
                "The graphics device was lost and needs to be reinitialized."
            ),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::ResourceError(err) => Some(err),
            RenderError::Substrate(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ResourceError> for RenderError {
    fn from(err: ResourceError) -> Self {
        RenderError::ResourceError(err)
    }
}

impl From<SubstrateError> for RenderError {
    fn from(err: SubstrateError) -> Self {
        RenderError::Substrate(err)
    }
}

/// An error returned by the [`Geometry`](crate::geometry::Geometry) API.
#[derive(Debug)]
pub enum GeometryError {
    /// The material list is empty.
    NoMaterials,
    /// An element index past the end of the element list.
    ElementOutOfRange {
        /// The requested index.
        index: usize,
        /// Number of elements.
        count: usize,
    },
    /// The substrate could not be built.
    Substrate(SubstrateError),
    /// Recording the draw failed.
    Render(RenderError),
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeometryError::NoMaterials => write!(f, "Geometry has no materials"),
            GeometryError::ElementOutOfRange { index, count } => {
                write!(f, "Element index {index} out of range for {count} elements")
            }
            GeometryError::Substrate(err) => write!(f, "Geometry substrate error: {err}"),
            GeometryError::Render(err) => write!(f, "Geometry render error: {err}"),
        }
    }
}

impl std::error::Error for GeometryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GeometryError::Substrate(err) => Some(err),
            GeometryError::Render(err) => Some(err),
            _ => None,
        }
    }
}

impl From<SubstrateError> for GeometryError {
    fn from(err: SubstrateError) -> Self {
        GeometryError::Substrate(err)
    }
}

impl From<RenderError> for GeometryError {
    fn from(err: RenderError) -> Self {
        GeometryError::Render(err)
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::*;

    #[test]
    fn resource_error_display_wrapping_shader_error() {
        let shader_err = ShaderError::NotFound {
            id: ShaderModuleId(42),
        };
        let res_err: ResourceError = shader_err.into();
        assert_eq!(
            format!("{res_err}"),
            "Shader resource error: Shader module not found for ID: ShaderModuleId(42)"
        );
        assert!(res_err.source().is_some());
    }

    #[test]
    fn stride_mismatch_display() {
        let err = SubstrateError::StrideMismatch {
            group: 1,
            expected: 32,
            found: 24,
            semantic: GeometrySemantic::Normal,
        };
        assert_eq!(
            format!("{err}"),
            "Vertex buffer group 1 has stride 32, but its Normal source reports 24"
        );
    }

    #[test]
    fn unsupported_layout_display() {
        let err = SubstrateError::UnsupportedVertexLayout {
            semantic: GeometrySemantic::Color,
            bytes_per_component: 1,
            components_per_vertex: 4,
        };
        assert_eq!(
            format!("{err}"),
            "Unsupported vertex layout for Color: 4 components of 1 bytes"
        );
    }

    #[test]
    fn geometry_error_chains_to_resource_error() {
        let substrate: SubstrateError = ResourceError::OutOfBounds.into();
        let geometry: GeometryError = substrate.into();
        assert_eq!(
            format!("{geometry}"),
            "Geometry substrate error: Substrate resource error: Resource access out of bounds."
        );
        let source = geometry.source().unwrap();
        assert!(source.source().is_some());
    }

    #[test]
    fn render_error_wraps_substrate_error() {
        let err: RenderError = SubstrateError::EmptyMaterials.into();
        assert_eq!(
            format!("{err}"),
            "Substrate unavailable: Geometry has no materials"
        );
        assert!(err.source().is_some());
    }
}
