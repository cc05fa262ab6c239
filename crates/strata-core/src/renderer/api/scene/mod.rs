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

//! GPU-facing uniform layouts.
//!
//! Every struct here is `#[repr(C)]` and `Pod`, laid out to match the WGSL
//! structs of the built-in shaders (16-byte aligned members only).

pub mod lighting;
pub mod material_uniforms;
pub mod view_uniforms;

pub use self::lighting::*;
pub use self::material_uniforms::*;
pub use self::view_uniforms::*;
