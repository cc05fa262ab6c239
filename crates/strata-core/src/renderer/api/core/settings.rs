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

//! Settings shared by every substrate a driver creates.

use super::{DEFAULT_FRAMES_IN_FLIGHT, MIN_FRAMES_IN_FLIGHT};
use crate::renderer::api::pipeline::enums::{CullMode, FrontFace};
use serde::{Deserialize, Serialize};

/// Tunables for geometry and material substrates.
///
/// Every field has a default, so a JSON document only needs to name the
/// values it overrides:
///
/// ```
/// use strata_core::renderer::SubstrateSettings;
///
/// let settings = SubstrateSettings::from_json_str(r#"{ "frames_in_flight": 2 }"#).unwrap();
/// assert_eq!(settings.frames_in_flight, 2);
/// assert!(settings.debug_groups);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubstrateSettings {
    /// Number of frames the CPU may record ahead of the GPU.
    pub frames_in_flight: usize,
    /// Uniform entries each (eye, frame) slot can hold before overflowing.
    pub uniform_entries_per_slot: u32,
    /// Face culling applied by every geometry pipeline.
    pub cull_mode: Option<CullMode>,
    /// Winding order considered front-facing.
    pub front_face: FrontFace,
    /// If `true`, each element's draws are wrapped in a debug group.
    pub debug_groups: bool,
}

impl Default for SubstrateSettings {
    fn default() -> Self {
        Self {
            frames_in_flight: DEFAULT_FRAMES_IN_FLIGHT,
            uniform_entries_per_slot: 16,
            cull_mode: Some(CullMode::Back),
            front_face: FrontFace::Ccw,
            debug_groups: true,
        }
    }
}

impl SubstrateSettings {
    /// Parses settings from a JSON document and sanitizes them.
    ///
    /// ## Errors
    ///
    /// Returns the `serde_json` error if the document is malformed.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<Self>(json).map(Self::sanitized)
    }

    /// Clamps values that would break slot rotation.
    pub fn sanitized(mut self) -> Self {
        if self.frames_in_flight < MIN_FRAMES_IN_FLIGHT {
            log::warn!(
                "SubstrateSettings: frames_in_flight = {} would reuse the previous frame's uniform slot, using {}",
                self.frames_in_flight,
                MIN_FRAMES_IN_FLIGHT
            );
            self.frames_in_flight = MIN_FRAMES_IN_FLIGHT;
        }
        if self.uniform_entries_per_slot == 0 {
            log::warn!("SubstrateSettings: uniform_entries_per_slot = 0, using 1");
            self.uniform_entries_per_slot = 1;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let settings = SubstrateSettings::from_json_str("{}").unwrap();
        assert_eq!(settings, SubstrateSettings::default());
    }

    #[test]
    fn overrides_are_applied() {
        let settings = SubstrateSettings::from_json_str(
            r#"{ "cull_mode": null, "front_face": "Cw", "debug_groups": false }"#,
        )
        .unwrap();
        assert_eq!(settings.cull_mode, None);
        assert_eq!(settings.front_face, FrontFace::Cw);
        assert!(!settings.debug_groups);
        assert_eq!(settings.frames_in_flight, DEFAULT_FRAMES_IN_FLIGHT);
    }

    #[test]
    fn single_frame_in_flight_is_clamped() {
        let settings =
            SubstrateSettings::from_json_str(r#"{ "frames_in_flight": 1, "uniform_entries_per_slot": 0 }"#)
                .unwrap();
        assert_eq!(settings.frames_in_flight, MIN_FRAMES_IN_FLIGHT);
        assert_eq!(settings.uniform_entries_per_slot, 1);
    }

    #[test]
    fn malformed_document_is_an_error() {
        assert!(SubstrateSettings::from_json_str("{ frames_in_flight: }").is_err());
    }
}
