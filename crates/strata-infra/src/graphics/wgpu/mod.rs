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

//! The `wgpu` backend.

mod command;
mod context;
mod conversions;
mod device;

pub use self::command::{WgpuCommandEncoder, WgpuRenderPass};
pub use self::context::WgpuGraphicsContext;
pub use self::conversions::{from_wgpu_texture_format, IntoWgpu};
pub use self::device::{RenderTargetViews, WgpuDevice};
