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

//! Shader modules and entry points.

use std::borrow::Cow;

/// An opaque handle to a compiled shader module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShaderModuleId(pub usize);

/// The source code of a shader module.
#[derive(Debug, Clone)]
pub enum ShaderSourceData<'a> {
    /// WGSL source text.
    Wgsl(Cow<'a, str>),
}

/// Describes a shader module to compile.
#[derive(Debug, Clone)]
pub struct ShaderModuleDescriptor<'a> {
    /// Debug label.
    pub label: Option<&'a str>,
    /// The shader source.
    pub source: ShaderSourceData<'a>,
}

/// One stage function: a module plus the entry point to call in it.
///
/// Material substrates hand these to geometry substrates, which use them as
/// part of their pipeline cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderFunction {
    /// The module holding the function.
    pub module: ShaderModuleId,
    /// The function name inside the module.
    pub entry_point: &'static str,
}

impl ShaderFunction {
    /// Creates a handle to `entry_point` in `module`.
    pub const fn new(module: ShaderModuleId, entry_point: &'static str) -> Self {
        Self {
            module,
            entry_point,
        }
    }
}
