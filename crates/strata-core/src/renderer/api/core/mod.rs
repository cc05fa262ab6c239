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

//! Infrastructure and backend context.
//!
//! This module contains core types and constants for the graphics subsystem.

/// The default number of frames the CPU may record ahead of the GPU.
/// Per-frame resources such as [`ConcurrentBuffer`](super::util::ConcurrentBuffer)
/// allocate one slot per frame in flight and per eye.
pub const DEFAULT_FRAMES_IN_FLIGHT: usize = 3;

/// Below two frames in flight, consecutive frames would share a uniform slot.
pub const MIN_FRAMES_IN_FLIGHT: usize = 2;

pub mod adapter;
pub mod settings;

pub use self::adapter::*;
pub use self::settings::*;
