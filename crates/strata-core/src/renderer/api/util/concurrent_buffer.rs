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

//! N-slot uniform buffer for frames in flight and stereo eyes.
//!
//! The [`ConcurrentBuffer`] lets the CPU write frame K+1's uniforms while the
//! GPU may still read frame K's. It pre-allocates one GPU buffer per
//! (frame in flight, eye) pair and picks the slot from the frame number and
//! the eye, so no slot written for a frame is touched again until
//! `frames_in_flight` frames later.
//!
//! # Architecture
//!
//! ```text
//! frames_in_flight = 2
//!              Left      Right     Monocular
//! frame % 2=0  [slot 0]  [slot 1]  [slot 2]
//! frame % 2=1  [slot 3]  [slot 4]  [slot 5]
//! ```
//!
//! Each slot holds `capacity` entries at dynamic offsets, so several draws in
//! the same eye and frame (one material on several geometries, say) do not
//! overwrite each other. Each slot has a pre-created bind group; the render
//! pass receives it together with the dynamic offset of the written entry.

use crate::renderer::{
    api::{
        command::{BindGroupDescriptor, BindGroupEntry, BindGroupId, BindGroupLayoutId},
        core::MIN_FRAMES_IN_FLIGHT,
        resource::{BufferDescriptor, BufferId, BufferUsage},
    },
    context::EyeType,
    error::ResourceError,
    traits::GraphicsDevice,
};
use std::borrow::Cow;
use std::num::NonZeroU64;
use std::sync::Mutex;

/// Alignment of dynamic uniform offsets accepted by every backend.
pub const UNIFORM_OFFSET_ALIGNMENT: u64 = 256;

/// Where a written uniform entry lives: bind this group with this dynamic offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformBinding {
    /// The bind group of the slot holding the entry.
    pub bind_group: BindGroupId,
    /// Dynamic offset of the entry inside the slot's buffer.
    pub offset: u32,
}

/// A single slot, holding a GPU buffer and its associated bind group.
#[derive(Debug)]
struct Slot {
    buffer: BufferId,
    bind_group: BindGroupId,
}

/// Write position inside one slot for the frame it was last written in.
#[derive(Debug, Default)]
struct SlotCursor {
    frame: Option<u64>,
    next: u32,
    last_offset: u32,
    last_data: Vec<u8>,
}

/// An N-buffered uniform buffer indexed by `(eye, frame)`.
///
/// # Example
///
/// ```ignore
/// let buffer = ConcurrentBuffer::new(device, layout, 0, size, 3, 16, "View")?;
///
/// // Each draw:
/// let binding = buffer.write(device, context.eye, context.frame, bytemuck::bytes_of(&uniforms))?;
/// pass.set_bind_group(0, binding.bind_group, &[binding.offset]);
/// ```
#[derive(Debug)]
pub struct ConcurrentBuffer {
    slots: Vec<Slot>,
    cursors: Mutex<Vec<SlotCursor>>,
    frames_in_flight: usize,
    data_size: u64,
    entry_stride: u64,
    capacity: u32,
    label: Cow<'static, str>,
}

impl ConcurrentBuffer {
    /// Creates the buffer with every slot pre-allocated.
    ///
    /// # Arguments
    ///
    /// * `device` - The graphics device to allocate GPU resources on.
    /// * `layout` - Layout of the bind groups; the entry at `binding` must be a
    ///   uniform buffer with a dynamic offset.
    /// * `binding` - The binding index within the bind group layout.
    /// * `data_size` - The size of one uniform entry in bytes.
    /// * `frames_in_flight` - Frames the CPU may record ahead; raised to
    ///   [`MIN_FRAMES_IN_FLIGHT`] if lower.
    /// * `capacity` - Entries per slot, at least one.
    /// * `label` - A debug label (e.g., "View", "Lighting").
    ///
    /// # Errors
    ///
    /// Returns a [`ResourceError`] if buffer or bind group creation fails.
    pub fn new(
        device: &dyn GraphicsDevice,
        layout: BindGroupLayoutId,
        binding: u32,
        data_size: u64,
        frames_in_flight: usize,
        capacity: u32,
        label: impl Into<Cow<'static, str>>,
    ) -> Result<Self, ResourceError> {
        let label = label.into();
        let frames_in_flight = frames_in_flight.max(MIN_FRAMES_IN_FLIGHT);
        let capacity = capacity.max(1);
        let entry_stride = data_size.div_ceil(UNIFORM_OFFSET_ALIGNMENT) * UNIFORM_OFFSET_ALIGNMENT;
        let binding_size = NonZeroU64::new(data_size).ok_or(ResourceError::OutOfBounds)?;

        let slot_count = frames_in_flight * EyeType::COUNT;
        let mut slots = Vec::with_capacity(slot_count);
        for i in 0..slot_count {
            let slot_label = format!("{label} [slot {i}]");
            let buffer = device.create_buffer(&BufferDescriptor {
                label: Some(Cow::Borrowed(slot_label.as_str())),
                size: entry_stride * u64::from(capacity),
                usage: BufferUsage::UNIFORM | BufferUsage::COPY_DST,
                mapped_at_creation: false,
            })?;

            let bind_group = device.create_bind_group(&BindGroupDescriptor {
                label: Some(slot_label.as_str()),
                layout,
                entries: &[BindGroupEntry::buffer(binding, buffer, 0, Some(binding_size))],
            })?;

            slots.push(Slot { buffer, bind_group });
        }

        let cursors = (0..slot_count).map(|_| SlotCursor::default()).collect();

        Ok(Self {
            slots,
            cursors: Mutex::new(cursors),
            frames_in_flight,
            data_size,
            entry_stride,
            capacity,
            label,
        })
    }

    /// The slot written for `eye` during `frame`.
    ///
    /// `(frame % frames_in_flight) * EyeType::COUNT + eye`: different eyes
    /// never share a slot, and the same eye only returns to a slot after
    /// `frames_in_flight` frames.
    pub fn slot_index(frames_in_flight: usize, eye: EyeType, frame: u64) -> usize {
        let parity = (frame % frames_in_flight as u64) as usize;
        parity * EyeType::COUNT + eye.index()
    }

    /// The slot this buffer uses for `eye` during `frame`.
    pub fn slot_for(&self, eye: EyeType, frame: u64) -> usize {
        Self::slot_index(self.frames_in_flight, eye, frame)
    }

    /// Writes one uniform entry into the `(eye, frame)` slot.
    ///
    /// The first write of a slot in a new frame starts at offset zero. A write
    /// identical to the previous write of the same slot and frame reuses that
    /// entry.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::OutOfBounds`] when the slot already holds
    /// `capacity` entries for this frame, or the backend error if the GPU
    /// write fails.
    pub fn write(
        &self,
        device: &dyn GraphicsDevice,
        eye: EyeType,
        frame: u64,
        data: &[u8],
    ) -> Result<UniformBinding, ResourceError> {
        debug_assert_eq!(
            data.len() as u64,
            self.data_size,
            "ConcurrentBuffer({}) write size mismatch: expected {}, got {}",
            self.label,
            self.data_size,
            data.len()
        );

        let index = self.slot_for(eye, frame);
        let slot = &self.slots[index];
        let mut cursors = self.cursors.lock().map_err(|_| {
            ResourceError::BackendError(format!("ConcurrentBuffer({}): cursor lock poisoned", self.label))
        })?;
        let cursor = &mut cursors[index];

        if cursor.frame != Some(frame) {
            cursor.frame = Some(frame);
            cursor.next = 0;
            cursor.last_data.clear();
        } else if cursor.next > 0 && cursor.last_data == data {
            return Ok(UniformBinding {
                bind_group: slot.bind_group,
                offset: cursor.last_offset,
            });
        }

        if cursor.next >= self.capacity {
            log::warn!(
                "ConcurrentBuffer({}): slot {} is full ({} entries) for frame {}",
                self.label,
                index,
                self.capacity,
                frame
            );
            return Err(ResourceError::OutOfBounds);
        }

        let offset = u64::from(cursor.next) * self.entry_stride;
        device.write_buffer(slot.buffer, offset, data)?;

        cursor.next += 1;
        cursor.last_offset = offset as u32;
        cursor.last_data.clear();
        cursor.last_data.extend_from_slice(data);

        Ok(UniformBinding {
            bind_group: slot.bind_group,
            offset: offset as u32,
        })
    }

    /// Returns the bind group of the `(eye, frame)` slot.
    pub fn bind_group(&self, eye: EyeType, frame: u64) -> BindGroupId {
        self.slots[self.slot_for(eye, frame)].bind_group
    }

    /// Returns the number of slots.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Returns the number of frames in flight the slots cover.
    pub fn frames_in_flight(&self) -> usize {
        self.frames_in_flight
    }

    /// Returns the size of one entry in bytes.
    pub fn data_size(&self) -> u64 {
        self.data_size
    }

    /// Returns the number of entries a slot can hold per frame.
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Destroys all GPU resources owned by this buffer.
    ///
    /// After calling this method, the buffer should not be used again.
    pub fn destroy(&self, device: &dyn GraphicsDevice) {
        for slot in &self.slots {
            if let Err(e) = device.destroy_bind_group(slot.bind_group) {
                log::warn!(
                    "ConcurrentBuffer({}): Failed to destroy bind group: {:?}",
                    self.label,
                    e
                );
            }
            if let Err(e) = device.destroy_buffer(slot.buffer) {
                log::warn!(
                    "ConcurrentBuffer({}): Failed to destroy buffer: {:?}",
                    self.label,
                    e
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::api::command::BindGroupLayoutDescriptor;
    use crate::renderer::api::command::BindGroupLayoutEntry;
    use crate::renderer::api::util::flags::ShaderStageFlags;
    use crate::renderer::traits::mock::MockGraphicsDevice;

    const EYES: [EyeType; 3] = [EyeType::Left, EyeType::Right, EyeType::Monocular];

    fn create_test_layout(device: &MockGraphicsDevice) -> BindGroupLayoutId {
        device
            .create_bind_group_layout(&BindGroupLayoutDescriptor {
                label: Some("test_layout"),
                entries: &[BindGroupLayoutEntry::uniform_buffer(
                    0,
                    ShaderStageFlags::VERTEX | ShaderStageFlags::FRAGMENT,
                    true,
                    None,
                )],
            })
            .expect("Failed to create test layout")
    }

    fn create_buffer(device: &MockGraphicsDevice, frames_in_flight: usize) -> ConcurrentBuffer {
        let layout = create_test_layout(device);
        ConcurrentBuffer::new(device, layout, 0, 64, frames_in_flight, 4, "Test").unwrap()
    }

    #[test]
    fn creation_allocates_one_slot_per_frame_and_eye() {
        let device = MockGraphicsDevice::new();
        let buffer = create_buffer(&device, 3);

        assert_eq!(buffer.slot_count(), 3 * EyeType::COUNT);
        assert_eq!(buffer.data_size(), 64);
        assert_eq!(device.buffer_sizes(), vec![UNIFORM_OFFSET_ALIGNMENT * 4; 9]);
    }

    #[test]
    fn frames_in_flight_is_raised_to_minimum() {
        let device = MockGraphicsDevice::new();
        let buffer = create_buffer(&device, 1);
        assert_eq!(buffer.frames_in_flight(), MIN_FRAMES_IN_FLIGHT);
    }

    #[test]
    fn slot_arithmetic() {
        assert_eq!(ConcurrentBuffer::slot_index(2, EyeType::Left, 0), 0);
        assert_eq!(ConcurrentBuffer::slot_index(2, EyeType::Right, 0), 1);
        assert_eq!(ConcurrentBuffer::slot_index(2, EyeType::Monocular, 1), 5);
        assert_eq!(ConcurrentBuffer::slot_index(2, EyeType::Left, 2), 0);
        assert_eq!(ConcurrentBuffer::slot_index(3, EyeType::Right, 7), 4);
    }

    #[test]
    fn consecutive_frames_never_share_a_slot() {
        for frames_in_flight in 2..=4 {
            for eye in EYES {
                for frame in 0..32u64 {
                    assert_ne!(
                        ConcurrentBuffer::slot_index(frames_in_flight, eye, frame),
                        ConcurrentBuffer::slot_index(frames_in_flight, eye, frame + 1),
                        "eye {eye:?} reused its slot between frames {frame} and {}",
                        frame + 1
                    );
                }
            }
        }
    }

    #[test]
    fn eyes_never_share_a_slot_within_a_frame() {
        let device = MockGraphicsDevice::new();
        let buffer = create_buffer(&device, 2);
        for frame in 0..4 {
            let left = buffer.bind_group(EyeType::Left, frame);
            let right = buffer.bind_group(EyeType::Right, frame);
            let mono = buffer.bind_group(EyeType::Monocular, frame);
            assert_ne!(left, right);
            assert_ne!(left, mono);
            assert_ne!(right, mono);
        }
    }

    #[test]
    fn writes_in_one_frame_get_distinct_offsets() {
        let device = MockGraphicsDevice::new();
        let buffer = create_buffer(&device, 2);

        let first = buffer.write(&device, EyeType::Left, 0, &[1u8; 64]).unwrap();
        let second = buffer.write(&device, EyeType::Left, 0, &[2u8; 64]).unwrap();

        assert_eq!(first.bind_group, second.bind_group);
        assert_eq!(first.offset, 0);
        assert_eq!(second.offset, UNIFORM_OFFSET_ALIGNMENT as u32);
    }

    #[test]
    fn identical_consecutive_write_reuses_entry() {
        let device = MockGraphicsDevice::new();
        let buffer = create_buffer(&device, 2);

        let first = buffer.write(&device, EyeType::Right, 5, &[7u8; 64]).unwrap();
        let again = buffer.write(&device, EyeType::Right, 5, &[7u8; 64]).unwrap();

        assert_eq!(first, again);
        assert_eq!(device.buffer_write_count(), 1);
    }

    #[test]
    fn new_frame_restarts_the_slot() {
        let device = MockGraphicsDevice::new();
        let buffer = create_buffer(&device, 2);

        buffer.write(&device, EyeType::Left, 0, &[1u8; 64]).unwrap();
        buffer.write(&device, EyeType::Left, 0, &[2u8; 64]).unwrap();
        let later = buffer.write(&device, EyeType::Left, 2, &[3u8; 64]).unwrap();

        assert_eq!(later.offset, 0);
        assert_eq!(later.bind_group, buffer.bind_group(EyeType::Left, 0));
    }

    #[test]
    fn overflowing_a_slot_is_an_error() {
        let device = MockGraphicsDevice::new();
        let buffer = create_buffer(&device, 2);

        for i in 0..buffer.capacity() {
            buffer
                .write(&device, EyeType::Monocular, 0, &[i as u8; 64])
                .unwrap();
        }
        let result = buffer.write(&device, EyeType::Monocular, 0, &[0xFF; 64]);
        assert!(matches!(result, Err(ResourceError::OutOfBounds)));

        // The other eye's slot is unaffected.
        assert!(buffer.write(&device, EyeType::Left, 0, &[0xFF; 64]).is_ok());
    }

    #[test]
    fn destroy_releases_every_slot() {
        let device = MockGraphicsDevice::new();
        let buffer = create_buffer(&device, 2);
        buffer.destroy(&device);
        assert_eq!(device.destroyed_buffer_count(), buffer.slot_count());
    }
}
