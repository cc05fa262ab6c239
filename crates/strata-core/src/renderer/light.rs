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

//! Scene lights as seen by the material substrates.

use glam::Vec3;
use std::hash::{BuildHasher, Hash, Hasher};

/// The kind of a light source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightType {
    /// Uniform light from every direction.
    Ambient,
    /// Parallel rays, like the sun.
    Directional,
    /// A point radiating in every direction.
    Omni,
    /// A point radiating inside a cone.
    Spot,
}

impl LightType {
    /// The value written in the `w` channel of the light color uniform.
    pub fn gpu_kind(self) -> f32 {
        match self {
            LightType::Ambient => 0.0,
            LightType::Directional => 1.0,
            LightType::Omni => 2.0,
            LightType::Spot => 3.0,
        }
    }
}

/// A light source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    /// The kind of light.
    pub kind: LightType,
    /// Linear RGB color, intensity premultiplied.
    pub color: Vec3,
    /// World position (omni and spot).
    pub position: Vec3,
    /// World direction (directional and spot).
    pub direction: Vec3,
    /// Distance at which attenuation begins.
    pub attenuation_start: f32,
    /// Distance at which the light has no effect.
    pub attenuation_end: f32,
    /// Exponent of the attenuation curve between start and end.
    pub attenuation_falloff: f32,
    /// Full-intensity cone half-angle in radians (spot).
    pub spot_inner_angle: f32,
    /// Zero-intensity cone half-angle in radians (spot).
    pub spot_outer_angle: f32,
}

impl Light {
    fn base(kind: LightType, color: Vec3) -> Self {
        Self {
            kind,
            color,
            position: Vec3::ZERO,
            direction: Vec3::NEG_Z,
            attenuation_start: 2.0,
            attenuation_end: 10.0,
            attenuation_falloff: 2.0,
            spot_inner_angle: 0.0,
            spot_outer_angle: std::f32::consts::FRAC_PI_4,
        }
    }

    /// An ambient light.
    pub fn ambient(color: Vec3) -> Self {
        Self::base(LightType::Ambient, color)
    }

    /// A directional light shining along `direction`.
    pub fn directional(color: Vec3, direction: Vec3) -> Self {
        Self {
            direction: direction.normalize_or_zero(),
            ..Self::base(LightType::Directional, color)
        }
    }

    /// An omni light at `position`, attenuated between `start` and `end`.
    pub fn omni(color: Vec3, position: Vec3, start: f32, end: f32) -> Self {
        Self {
            position,
            attenuation_start: start,
            attenuation_end: end,
            ..Self::base(LightType::Omni, color)
        }
    }

    /// A spot light at `position` pointing along `direction`.
    pub fn spot(color: Vec3, position: Vec3, direction: Vec3, inner: f32, outer: f32) -> Self {
        Self {
            position,
            direction: direction.normalize_or_zero(),
            spot_inner_angle: inner,
            spot_outer_angle: outer,
            ..Self::base(LightType::Spot, color)
        }
    }

    fn hash_into<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        let floats = [
            self.color.x,
            self.color.y,
            self.color.z,
            self.position.x,
            self.position.y,
            self.position.z,
            self.direction.x,
            self.direction.y,
            self.direction.z,
            self.attenuation_start,
            self.attenuation_end,
            self.attenuation_falloff,
            self.spot_inner_angle,
            self.spot_outer_angle,
        ];
        for f in floats {
            f.to_bits().hash(state);
        }
    }
}

/// A hasher with fixed keys, so identities derived from it are stable across runs.
pub(crate) fn stable_hasher() -> ahash::AHasher {
    ahash::RandomState::with_seeds(0x5354, 0x5241, 0x5441, 0x4c49).build_hasher()
}

/// Hashes a light set. Equal sets hash equally, in the same order.
pub fn hash_lights(lights: &[Light]) -> u64 {
    let mut hasher = stable_hasher();
    lights.len().hash(&mut hasher);
    for light in lights {
        light.hash_into(&mut hasher);
    }
    hasher.finish()
}
