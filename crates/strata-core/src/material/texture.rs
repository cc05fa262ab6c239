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

//! Decoded images referenced by materials.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Identity of a [`Texture`], the key drivers cache uploads under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureUid(pub u64);

impl TextureUid {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        TextureUid(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// An RGBA8 image, or a placeholder for one still being decoded.
#[derive(Debug, Clone)]
pub struct Texture {
    id: TextureUid,
    label: String,
    width: u32,
    height: u32,
    pixels: Option<Arc<[u8]>>,
}

impl Texture {
    /// Wraps tightly packed RGBA8 pixels, row by row.
    pub fn from_rgba8(label: impl Into<String>, width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            id: TextureUid::next(),
            label: label.into(),
            width,
            height,
            pixels: Some(pixels.into()),
        }
    }

    /// A texture whose pixels are not available; drivers cannot upload it.
    pub fn pending(label: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            id: TextureUid::next(),
            label: label.into(),
            width,
            height,
            pixels: None,
        }
    }

    /// The texture's identity.
    pub fn id(&self) -> TextureUid {
        self.id
    }

    /// Debug label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The pixels, if decoded.
    pub fn pixels(&self) -> Option<&[u8]> {
        self.pixels.as_deref()
    }

    /// Bytes a complete RGBA8 image of this size holds.
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn textures_get_distinct_ids() {
        let a = Texture::from_rgba8("a", 1, 1, vec![255; 4]);
        let b = Texture::pending("b", 1, 1);
        assert_ne!(a.id(), b.id());
        assert_eq!(a.clone().id(), a.id());
    }

    #[test]
    fn pending_texture_has_no_pixels() {
        let texture = Texture::pending("later", 4, 4);
        assert!(texture.pixels().is_none());
        assert_eq!(texture.expected_len(), 64);
    }
}
