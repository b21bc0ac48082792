//! Semantic attribute channels and dirty-range tracking.
//!
//! A [`NamedAttribute`] is one channel of per-particle data (position,
//! velocity, packed color keyframes, ...) backed by a [`ResizableBuffer`]
//! and paired with a [`BufferHandle`] describing what the renderer must
//! re-upload. Dirty tracking accumulates the union of touched element
//! ranges each frame so upload cost follows the particles actually
//! modified, not the whole buffer.
//!
//! [`AttributeSet`] owns the ten canonical channels shared by every emitter
//! in a group and dispatches on [`AttributeKey`] with a plain `match`.

use crate::buffer::ResizableBuffer;

/// Component layout of an attribute channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeType {
    /// Single float.
    Scalar,
    /// Two components.
    Vec2,
    /// Three components.
    Vec3,
    /// Four components.
    Vec4,
    /// RGB triple.
    Color,
    /// 3x3 matrix, column-major.
    Mat3,
    /// 4x4 matrix, column-major.
    Mat4,
}

impl AttributeType {
    /// Number of floats one element of this type occupies.
    pub fn component_size(self) -> usize {
        match self {
            AttributeType::Scalar => 1,
            AttributeType::Vec2 => 2,
            AttributeType::Vec3 | AttributeType::Color => 3,
            AttributeType::Vec4 => 4,
            AttributeType::Mat3 => 9,
            AttributeType::Mat4 => 16,
        }
    }
}

/// The canonical per-particle channels.
///
/// `Params` packs `(alive, age, max_age, wiggle)` per slot; `Acceleration`
/// carries drag in its fourth component; `Rotation` carries
/// `(packed_axis, angle, animated_flag)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKey {
    Position,
    Velocity,
    Acceleration,
    Rotation,
    RotationCenter,
    Params,
    Size,
    Angle,
    Color,
    Opacity,
}

impl AttributeKey {
    /// Every canonical channel, in population order.
    pub const ALL: [AttributeKey; 10] = [
        AttributeKey::Position,
        AttributeKey::Velocity,
        AttributeKey::Acceleration,
        AttributeKey::Rotation,
        AttributeKey::RotationCenter,
        AttributeKey::Params,
        AttributeKey::Size,
        AttributeKey::Angle,
        AttributeKey::Color,
        AttributeKey::Opacity,
    ];

    /// Dense index for per-key bookkeeping tables.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            AttributeKey::Position => 0,
            AttributeKey::Velocity => 1,
            AttributeKey::Acceleration => 2,
            AttributeKey::Rotation => 3,
            AttributeKey::RotationCenter => 4,
            AttributeKey::Params => 5,
            AttributeKey::Size => 6,
            AttributeKey::Angle => 7,
            AttributeKey::Color => 8,
            AttributeKey::Opacity => 9,
        }
    }

    /// Component layout of this channel.
    pub fn attribute_type(self) -> AttributeType {
        match self {
            AttributeKey::Position
            | AttributeKey::Velocity
            | AttributeKey::RotationCenter => AttributeType::Vec3,
            AttributeKey::Acceleration
            | AttributeKey::Rotation
            | AttributeKey::Params
            | AttributeKey::Size
            | AttributeKey::Angle
            | AttributeKey::Color
            | AttributeKey::Opacity => AttributeType::Vec4,
        }
    }
}

/// Upload-frequency hint forwarded to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BufferUsage {
    /// Contents change in small ranges most frames.
    #[default]
    Static,
    /// A broad update just happened; expect another one next frame.
    Stream,
}

/// Byte range of an attribute buffer the renderer must re-upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadRange {
    pub byte_offset: usize,
    pub byte_len: usize,
}

/// Renderer-visible state of one attribute buffer.
///
/// The handle carries no GPU resources itself; it tells the renderer
/// collaborator what to upload and how the buffer is expected to behave.
#[derive(Debug, Clone, Default)]
pub struct BufferHandle {
    needs_update: bool,
    upload_offset: usize,
    upload_count: usize,
    usage: BufferUsage,
    generation: u64,
}

impl BufferHandle {
    /// Whether any range is pending upload.
    #[inline]
    pub fn needs_update(&self) -> bool {
        self.needs_update
    }

    /// Current upload-frequency hint.
    #[inline]
    pub fn usage(&self) -> BufferUsage {
        self.usage
    }

    /// Bumped whenever the backing allocation is replaced; consumers
    /// holding raw views of the old allocation must re-acquire them.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// One semantic channel: a growable buffer plus dirty-range bookkeeping.
pub struct NamedAttribute {
    key: AttributeKey,
    ty: AttributeType,
    buffer: ResizableBuffer,
    handle: BufferHandle,
    update_min: usize,
    update_max: usize,
}

impl NamedAttribute {
    /// Create an empty channel; storage is allocated on first
    /// [`ensure_size`](Self::ensure_size).
    pub fn new(key: AttributeKey) -> Self {
        let ty = key.attribute_type();
        Self {
            key,
            ty,
            buffer: ResizableBuffer::new(0, ty.component_size()),
            handle: BufferHandle::default(),
            update_min: 0,
            update_max: 0,
        }
    }

    /// Which canonical channel this is.
    #[inline]
    pub fn key(&self) -> AttributeKey {
        self.key
    }

    /// Component layout of the channel.
    #[inline]
    pub fn attribute_type(&self) -> AttributeType {
        self.ty
    }

    /// Number of floats one element occupies.
    #[inline]
    pub fn component_size(&self) -> usize {
        self.ty.component_size()
    }

    /// The backing storage.
    #[inline]
    pub fn buffer(&self) -> &ResizableBuffer {
        &self.buffer
    }

    /// Mutable backing storage. Dirty ranges are the caller's business;
    /// emitters report them through their own per-class ranges.
    #[inline]
    pub fn buffer_mut(&mut self) -> &mut ResizableBuffer {
        &mut self.buffer
    }

    /// The renderer-visible handle.
    #[inline]
    pub fn handle(&self) -> &BufferHandle {
        &self.handle
    }

    /// Grow or shrink the backing buffer to `slots` elements. Any actual
    /// resize may replace the allocation, so the whole buffer is flagged
    /// for upload and the generation bumped; consumers holding views of
    /// the old allocation must re-acquire them.
    pub fn ensure_size(&mut self, slots: usize) {
        if self.buffer.element_len() == slots {
            return;
        }
        self.buffer.set_size(slots);
        self.handle.generation += 1;
        self.handle.needs_update = true;
        self.handle.upload_offset = 0;
        self.handle.upload_count = self.buffer.len();
    }

    /// Widen the accumulated dirty range by the element range
    /// `[min, max]`. Idempotent and monotonically widening within a frame.
    pub fn set_update_range(&mut self, min: usize, max: usize) {
        let cs = self.ty.component_size();
        self.update_min = self.update_min.min(min * cs);
        self.update_max = self.update_max.max(max * cs);
    }

    /// Clear the accumulated dirty bounds. Called at the start of each
    /// group tick.
    pub fn reset_update_range(&mut self) {
        self.update_min = 0;
        self.update_max = 0;
    }

    /// Convert the accumulated dirty bounds into the renderer's upload
    /// window and mark the handle dirty over exactly that range.
    pub fn flag_update(&mut self) {
        if self.buffer.is_empty() {
            log::error!("flag_update on empty {:?} attribute buffer", self.key);
            return;
        }
        self.handle.upload_offset = self.update_min;
        self.handle.upload_count = (self.update_max - self.update_min
            + self.ty.component_size())
        .min(self.buffer.len());
        self.handle.needs_update = true;
    }

    /// Mark the entire buffer dirty and hint the renderer that another
    /// broad update is likely next frame. Used once after any structural
    /// change (emitter add/remove, resize).
    pub fn force_update_all(&mut self) {
        self.handle.upload_offset = 0;
        self.handle.upload_count = self.buffer.len();
        self.handle.usage = BufferUsage::Stream;
        self.handle.needs_update = true;
    }

    /// Revert the usage hint to its steady state, assuming subsequent
    /// frames resume touching only small ranges.
    pub fn reset_dynamic(&mut self) {
        self.handle.usage = BufferUsage::Static;
    }

    /// Remove the element range `[start, end)` from the backing buffer,
    /// compacting the survivors, and flag a full upload.
    pub fn splice(&mut self, start: usize, end: usize) {
        self.buffer.splice(start, end);
        self.force_update_all();
    }

    /// The pending upload window, or `None` if the renderer has nothing
    /// to do for this channel.
    pub fn pending_upload(&self) -> Option<UploadRange> {
        if !self.handle.needs_update {
            return None;
        }
        let float = std::mem::size_of::<f32>();
        Some(UploadRange {
            byte_offset: self.handle.upload_offset * float,
            byte_len: self.handle.upload_count * float,
        })
    }

    /// The full buffer contents as bytes, for the renderer to slice with
    /// [`pending_upload`](Self::pending_upload).
    pub fn bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.buffer.as_slice())
    }

    /// Clear the pending-upload flag once the renderer has consumed it.
    pub fn acknowledge_upload(&mut self) {
        self.handle.needs_update = false;
    }

    /// Drop renderer-visible state, keeping the simulation data intact.
    pub(crate) fn release_handle(&mut self) {
        self.handle = BufferHandle::default();
    }
}

/// The canonical set of channels shared by all emitters in a group.
pub struct AttributeSet {
    position: NamedAttribute,
    velocity: NamedAttribute,
    acceleration: NamedAttribute,
    rotation: NamedAttribute,
    rotation_center: NamedAttribute,
    params: NamedAttribute,
    size: NamedAttribute,
    angle: NamedAttribute,
    color: NamedAttribute,
    opacity: NamedAttribute,
}

impl AttributeSet {
    pub fn new() -> Self {
        Self {
            position: NamedAttribute::new(AttributeKey::Position),
            velocity: NamedAttribute::new(AttributeKey::Velocity),
            acceleration: NamedAttribute::new(AttributeKey::Acceleration),
            rotation: NamedAttribute::new(AttributeKey::Rotation),
            rotation_center: NamedAttribute::new(AttributeKey::RotationCenter),
            params: NamedAttribute::new(AttributeKey::Params),
            size: NamedAttribute::new(AttributeKey::Size),
            angle: NamedAttribute::new(AttributeKey::Angle),
            color: NamedAttribute::new(AttributeKey::Color),
            opacity: NamedAttribute::new(AttributeKey::Opacity),
        }
    }

    pub fn get(&self, key: AttributeKey) -> &NamedAttribute {
        match key {
            AttributeKey::Position => &self.position,
            AttributeKey::Velocity => &self.velocity,
            AttributeKey::Acceleration => &self.acceleration,
            AttributeKey::Rotation => &self.rotation,
            AttributeKey::RotationCenter => &self.rotation_center,
            AttributeKey::Params => &self.params,
            AttributeKey::Size => &self.size,
            AttributeKey::Angle => &self.angle,
            AttributeKey::Color => &self.color,
            AttributeKey::Opacity => &self.opacity,
        }
    }

    pub fn get_mut(&mut self, key: AttributeKey) -> &mut NamedAttribute {
        match key {
            AttributeKey::Position => &mut self.position,
            AttributeKey::Velocity => &mut self.velocity,
            AttributeKey::Acceleration => &mut self.acceleration,
            AttributeKey::Rotation => &mut self.rotation,
            AttributeKey::RotationCenter => &mut self.rotation_center,
            AttributeKey::Params => &mut self.params,
            AttributeKey::Size => &mut self.size,
            AttributeKey::Angle => &mut self.angle,
            AttributeKey::Color => &mut self.color,
            AttributeKey::Opacity => &mut self.opacity,
        }
    }

    /// Grow every channel to at least `slots` elements.
    pub fn ensure_size(&mut self, slots: usize) {
        for key in AttributeKey::ALL {
            self.get_mut(key).ensure_size(slots);
        }
    }

    /// Reset every channel's dirty bounds.
    pub fn reset_update_ranges(&mut self) {
        for key in AttributeKey::ALL {
            self.get_mut(key).reset_update_range();
        }
    }
}

impl Default for AttributeSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_size_table() {
        assert_eq!(AttributeType::Scalar.component_size(), 1);
        assert_eq!(AttributeType::Vec2.component_size(), 2);
        assert_eq!(AttributeType::Vec3.component_size(), 3);
        assert_eq!(AttributeType::Vec4.component_size(), 4);
        assert_eq!(AttributeType::Color.component_size(), 3);
        assert_eq!(AttributeType::Mat3.component_size(), 9);
        assert_eq!(AttributeType::Mat4.component_size(), 16);
    }

    #[test]
    fn test_update_range_widens_monotonically() {
        let mut attr = NamedAttribute::new(AttributeKey::Position);
        attr.ensure_size(100);
        attr.acknowledge_upload();
        attr.reset_update_range();

        attr.set_update_range(10, 12);
        attr.set_update_range(11, 11); // idempotent within the union
        attr.set_update_range(10, 40);
        attr.flag_update();

        let upload = attr.pending_upload().unwrap();
        assert_eq!(upload.byte_offset, 0);
        // max touched component is 40 * 3; window is max - min + components
        assert_eq!(upload.byte_len, (40 * 3 + 3) * 4);
    }

    #[test]
    fn test_upload_window_is_clamped_to_buffer() {
        let mut attr = NamedAttribute::new(AttributeKey::Params);
        attr.ensure_size(10);
        attr.reset_update_range();
        attr.set_update_range(9, 9);
        attr.flag_update();

        let upload = attr.pending_upload().unwrap();
        assert!(upload.byte_offset + upload.byte_len <= attr.bytes().len());
    }

    #[test]
    fn test_force_update_all_switches_usage() {
        let mut attr = NamedAttribute::new(AttributeKey::Color);
        attr.ensure_size(8);
        attr.force_update_all();
        assert_eq!(attr.handle().usage(), BufferUsage::Stream);
        assert_eq!(attr.pending_upload().unwrap().byte_len, attr.bytes().len());

        attr.reset_dynamic();
        assert_eq!(attr.handle().usage(), BufferUsage::Static);
    }

    #[test]
    fn test_resize_bumps_generation_and_flags_upload() {
        let mut attr = NamedAttribute::new(AttributeKey::Velocity);
        attr.ensure_size(4);
        let gen_before = attr.handle().generation();
        attr.acknowledge_upload();

        // Same size: nothing to do.
        attr.ensure_size(4);
        assert!(!attr.handle().needs_update());

        attr.ensure_size(4096);
        assert!(attr.handle().generation() > gen_before);
        assert!(attr.handle().needs_update());
    }

    #[test]
    fn test_splice_forces_full_upload() {
        let mut attr = NamedAttribute::new(AttributeKey::Opacity);
        attr.ensure_size(10);
        attr.acknowledge_upload();

        attr.splice(2, 5);
        assert_eq!(attr.buffer().element_len(), 7);
        assert_eq!(attr.pending_upload().unwrap().byte_len, attr.bytes().len());
    }

    #[test]
    fn test_no_upload_when_untouched() {
        let mut attr = NamedAttribute::new(AttributeKey::Angle);
        attr.ensure_size(10);
        attr.acknowledge_upload();
        attr.reset_update_range();
        assert!(attr.pending_upload().is_none());
    }
}
