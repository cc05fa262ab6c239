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

//! Shared utility enums.

/// The width of the indices in an index buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexFormat {
    /// 16-bit unsigned indices.
    Uint16,
    /// 32-bit unsigned indices.
    Uint32,
}

impl IndexFormat {
    /// Chooses the format for an element's index width: 16-bit for two bytes,
    /// 32-bit for anything else.
    pub fn from_bytes_per_index(bytes_per_index: usize) -> Self {
        if bytes_per_index == 2 {
            IndexFormat::Uint16
        } else {
            IndexFormat::Uint32
        }
    }

    /// The size of one index in bytes.
    pub fn byte_size(self) -> usize {
        match self {
            IndexFormat::Uint16 => 2,
            IndexFormat::Uint32 => 4,
        }
    }
}

/// The number of samples per pixel of a render target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SampleCount {
    /// One sample, no multisampling.
    #[default]
    X1,
    /// Two samples.
    X2,
    /// Four samples.
    X4,
    /// Eight samples.
    X8,
}

impl SampleCount {
    /// The sample count as an integer.
    pub fn count(self) -> u32 {
        match self {
            SampleCount::X1 => 1,
            SampleCount::X2 => 2,
            SampleCount::X4 => 4,
            SampleCount::X8 => 8,
        }
    }
}

/// Texel formats used by render targets and material textures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    /// RGBA, 8 bits per channel, linear.
    Rgba8Unorm,
    /// RGBA, 8 bits per channel, sRGB.
    Rgba8UnormSrgb,
    /// BGRA, 8 bits per channel, linear.
    Bgra8Unorm,
    /// BGRA, 8 bits per channel, sRGB.
    Bgra8UnormSrgb,
    /// RGBA, 16-bit float per channel.
    Rgba16Float,
    /// 16-bit depth.
    Depth16Unorm,
    /// 32-bit float depth.
    Depth32Float,
    /// 24-bit depth with 8-bit stencil.
    Depth24PlusStencil8,
}

impl TextureFormat {
    /// Returns `true` for depth (and depth/stencil) formats.
    pub fn is_depth(self) -> bool {
        matches!(
            self,
            TextureFormat::Depth16Unorm
                | TextureFormat::Depth32Float
                | TextureFormat::Depth24PlusStencil8
        )
    }

    /// The size of one texel in bytes.
    pub fn bytes_per_pixel(self) -> u32 {
        match self {
            TextureFormat::Depth16Unorm => 2,
            TextureFormat::Rgba8Unorm
            | TextureFormat::Rgba8UnormSrgb
            | TextureFormat::Bgra8Unorm
            | TextureFormat::Bgra8UnormSrgb
            | TextureFormat::Depth32Float
            | TextureFormat::Depth24PlusStencil8 => 4,
            TextureFormat::Rgba16Float => 8,
        }
    }
}
