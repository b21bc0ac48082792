//! Growable, component-aware storage for particle attributes.
//!
//! Every particle attribute (position, velocity, color keyframes, ...) lives
//! in one contiguous `f32` array shared by all emitters in a group. A
//! [`ResizableBuffer`] wraps that array and knows how many components one
//! element occupies, so callers address it in *element* units (particle
//! slots) while the storage stays flat.
//!
//! Shrinking is capacity-preserving: the logical length drops but the
//! allocation is retained, so a later grow within the old capacity does not
//! reallocate. Writes past the logical length are dropped.

use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};

/// Contiguous `f32` storage addressed in multi-component elements.
///
/// The buffer holds `size * component_size` floats. An optional
/// `index_offset` shifts all element addressing, allowing a buffer to stand
/// in for a sub-region of a larger one.
///
/// # Example
///
/// ```ignore
/// let mut buf = ResizableBuffer::new(100, 3); // 100 vec3 slots
/// buf.set_vec3(4, Vec3::new(1.0, 2.0, 3.0));
/// assert_eq!(buf.value_at(4 * 3 + 1), Some(2.0));
/// ```
#[derive(Debug, Clone)]
pub struct ResizableBuffer {
    data: Vec<f32>,
    component_size: usize,
    index_offset: usize,
}

impl ResizableBuffer {
    /// Create a buffer with `size` elements of `component_size` components,
    /// zero-initialised.
    pub fn new(size: usize, component_size: usize) -> Self {
        Self::with_offset(size, component_size, 0)
    }

    /// Create a buffer whose element addressing starts at `index_offset`.
    pub fn with_offset(size: usize, component_size: usize, index_offset: usize) -> Self {
        let component_size = component_size.max(1);
        Self {
            data: vec![0.0; size * component_size],
            component_size,
            index_offset,
        }
    }

    /// Number of components one element occupies.
    #[inline]
    pub fn component_size(&self) -> usize {
        self.component_size
    }

    /// Logical length in raw components.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the buffer currently holds no components.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Logical length in elements.
    #[inline]
    pub fn element_len(&self) -> usize {
        self.data.len() / self.component_size
    }

    /// Raw view of the whole buffer.
    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Mutable raw view of the whole buffer.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Resize to `size` elements, dispatching to [`grow`](Self::grow) or
    /// [`shrink`](Self::shrink) by comparison with the current length.
    pub fn set_size(&mut self, size: usize) {
        let new_len = size * self.component_size;
        if new_len < self.data.len() {
            self.shrink(new_len);
        } else if new_len > self.data.len() {
            self.grow(new_len);
        }
    }

    /// Truncate to `new_len` components. Capacity is retained, so no data
    /// is moved and a later grow back within capacity will not reallocate.
    pub fn shrink(&mut self, new_len: usize) {
        self.data.truncate(new_len);
    }

    /// Extend to `new_len` components, copying existing contents forward
    /// and zero-filling the tail.
    pub fn grow(&mut self, new_len: usize) {
        if new_len > self.data.len() {
            self.data.resize(new_len, 0.0);
        }
    }

    /// Remove the element range `[start, end)`, compacting the survivors
    /// toward the front. O(n) in the buffer length.
    pub fn splice(&mut self, start: usize, end: usize) {
        let from = (start * self.component_size).min(self.data.len());
        let to = (end * self.component_size).min(self.data.len());
        if from < to {
            self.data.drain(from..to);
        }
    }

    /// Copy `source` into the buffer starting at raw component `index`,
    /// growing the buffer if the copy would run past the current length.
    pub fn set_from_array(&mut self, index: usize, source: &[f32]) {
        let target = self.index_offset + index;
        let needed = target + source.len();
        if needed > self.data.len() {
            self.grow(needed);
        }
        self.data[target..needed].copy_from_slice(source);
    }

    #[inline]
    fn base(&self, index: usize) -> usize {
        self.index_offset + index * self.component_size
    }

    /// Write `count` consecutive components at element `index`. Out-of-range
    /// writes are dropped.
    #[inline]
    fn write(&mut self, index: usize, values: &[f32]) {
        let base = self.base(index);
        let end = base + values.len();
        if end <= self.data.len() {
            self.data[base..end].copy_from_slice(values);
        }
    }

    /// Set a single component of the element at `index`.
    pub fn set_component(&mut self, index: usize, component: usize, value: f32) {
        let at = self.base(index) + component;
        if at < self.data.len() {
            self.data[at] = value;
        }
    }

    /// Set a vec2 element.
    pub fn set_vec2(&mut self, index: usize, v: Vec2) {
        self.set_vec2_components(index, v.x, v.y);
    }

    /// Set a vec2 element from raw components.
    pub fn set_vec2_components(&mut self, index: usize, x: f32, y: f32) {
        self.write(index, &[x, y]);
    }

    /// Set a vec3 element.
    pub fn set_vec3(&mut self, index: usize, v: Vec3) {
        self.set_vec3_components(index, v.x, v.y, v.z);
    }

    /// Set a vec3 element from raw components.
    pub fn set_vec3_components(&mut self, index: usize, x: f32, y: f32, z: f32) {
        self.write(index, &[x, y, z]);
    }

    /// Set a vec4 element.
    pub fn set_vec4(&mut self, index: usize, v: Vec4) {
        self.set_vec4_components(index, v.x, v.y, v.z, v.w);
    }

    /// Set a vec4 element from raw components.
    pub fn set_vec4_components(&mut self, index: usize, x: f32, y: f32, z: f32, w: f32) {
        self.write(index, &[x, y, z, w]);
    }

    /// Set a 3x3 matrix element from its flat column-major form.
    pub fn set_mat3(&mut self, index: usize, m: &Mat3) {
        self.write(index, &m.to_cols_array());
    }

    /// Set a 4x4 matrix element from its flat column-major form.
    pub fn set_mat4(&mut self, index: usize, m: &Mat4) {
        self.write(index, &m.to_cols_array());
    }

    /// Set an RGB color element (three components).
    pub fn set_color(&mut self, index: usize, color: Vec3) {
        self.set_vec3_components(index, color.x, color.y, color.z);
    }

    /// Set a scalar element.
    pub fn set_number(&mut self, index: usize, value: f32) {
        let at = self.base(index);
        if at < self.data.len() {
            self.data[at] = value;
        }
    }

    /// Read the raw component at `index` (ignores component size).
    #[inline]
    pub fn value_at(&self, index: usize) -> Option<f32> {
        self.data.get(self.index_offset + index).copied()
    }

    /// Zero-copy sub-view starting at the element at `index`, running to the
    /// end of the buffer. Empty if the element lies past the logical length.
    pub fn component_view(&self, index: usize) -> &[f32] {
        let base = self.base(index);
        if base <= self.data.len() {
            &self.data[base..]
        } else {
            &[]
        }
    }
}
