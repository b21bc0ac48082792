//! Particle emitters.
//!
//! An emitter owns a contiguous range of particle slots inside its group's
//! shared attribute buffers and runs the per-particle lifecycle: aging
//! live particles toward death, and activating dead slots at a steady rate
//! with freshly sampled attribute values.
//!
//! # Lifecycle
//!
//! An emitter is *detached* until added to a [`Group`](crate::Group),
//! which assigns its slot range and eagerly populates every slot. While
//! attached it can be enabled and disabled freely; disabling stops
//! activation but lets live particles age to their natural death. Removing
//! it from the group reclaims the slot range and hands the emitter back,
//! detached, ready to be added elsewhere.
//!
//! # Example
//!
//! ```ignore
//! let mut group = Group::new(GroupConfig::default());
//! let id = group.add_emitter(Emitter::new(
//!     EmitterConfig::new()
//!         .with_particle_count(200)
//!         .with_distribution(Distribution::Sphere)
//!         .with_max_age(2.0, 0.5),
//! ));
//!
//! group.tick(Some(0.016));
//! assert!(group.emitter(id).unwrap().active_particle_count() > 0);
//! ```

use crate::attribute::{AttributeKey, AttributeSet};
use crate::config::{
    AgeDirection, ColorProp, Distribution, EmitterConfig, KeyframeProp, RotationProp, ScalarProp,
    VectorProp,
};
use crate::keyframes::{values_are_equal, VALUE_OVER_LIFETIME_LENGTH};
use crate::spawn::{self, Sampler};
use glam::Vec3;
use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};

const KEY_COUNT: usize = AttributeKey::ALL.len();
const PARAMS: usize = 5; // AttributeKey::Params.index()

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identity of an emitter, valid across add/remove cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EmitterId(u64);

/// Dirty bounds for one attribute class, in particle-slot units.
#[derive(Debug, Clone, Copy)]
pub(crate) struct UpdateRange {
    pub min: usize,
    pub max: usize,
}

impl UpdateRange {
    pub(crate) const UNTOUCHED: UpdateRange = UpdateRange {
        min: usize::MAX,
        max: 0,
    };

    #[inline]
    pub(crate) fn bump(&mut self, index: usize) {
        self.min = self.min.min(index);
        self.max = self.max.max(index);
    }

    #[inline]
    pub(crate) fn is_touched(&self) -> bool {
        self.min <= self.max
    }
}

/// A particle emitter: lifecycle state machine plus per-slot attribute
/// generation.
///
/// Configuration properties can be edited live through the `set_*`
/// mutators; each edit opens a bounded transition window during which
/// respawning particles pick up the new values, closing automatically once
/// every slot has respawned.
pub struct Emitter {
    id: EmitterId,

    distribution: Distribution,
    position: VectorProp,
    velocity: VectorProp,
    acceleration: VectorProp,
    drag: ScalarProp,
    wiggle: ScalarProp,
    rotation: RotationProp,
    max_age: ScalarProp,
    color: ColorProp,
    opacity: KeyframeProp,
    size: KeyframeProp,
    angle: KeyframeProp,

    particle_count: usize,
    duration: Option<f32>,
    is_static: bool,
    active_multiplier: f32,
    direction: AgeDirection,
    alive: bool,

    particles_per_second: f32,
    activation_index: f32,
    attribute_offset: usize,
    activation_end: usize,
    age: f32,
    active_particle_count: usize,
    attached: bool,

    sampler: Sampler,
    reset_flags: [bool; KEY_COUNT],
    update_flags: [bool; KEY_COUNT],
    update_counts: [usize; KEY_COUNT],
    ranges: [UpdateRange; KEY_COUNT],
}

impl Emitter {
    /// Build an emitter from its configuration. Keyframed properties are
    /// normalized to [`VALUE_OVER_LIFETIME_LENGTH`] entries here, once.
    pub fn new(config: EmitterConfig) -> Self {
        let EmitterConfig {
            distribution,
            particle_count,
            duration,
            is_static,
            active_multiplier,
            direction,
            alive,
            max_age,
            position,
            velocity,
            acceleration,
            drag,
            wiggle,
            rotation,
            mut color,
            mut opacity,
            mut size,
            mut angle,
        } = config;

        color.normalize();
        opacity.normalize();
        size.normalize();
        angle.normalize();

        let mut reset_flags = [false; KEY_COUNT];
        reset_flags[AttributeKey::Position.index()] = position.randomise;
        reset_flags[AttributeKey::Velocity.index()] = velocity.randomise;
        reset_flags[AttributeKey::Acceleration.index()] =
            acceleration.randomise || drag.randomise;
        reset_flags[AttributeKey::Rotation.index()] = rotation.randomise;
        reset_flags[AttributeKey::RotationCenter.index()] = rotation.randomise;
        reset_flags[AttributeKey::Size.index()] = size.randomise;
        reset_flags[AttributeKey::Angle.index()] = angle.randomise;
        reset_flags[AttributeKey::Color.index()] = color.randomise;
        reset_flags[AttributeKey::Opacity.index()] = opacity.randomise;

        Self {
            id: EmitterId(NEXT_ID.fetch_add(1, Ordering::Relaxed)),
            distribution,
            position,
            velocity,
            acceleration,
            drag,
            wiggle,
            rotation,
            max_age,
            color,
            opacity,
            size,
            angle,
            particle_count,
            duration,
            is_static,
            active_multiplier,
            direction,
            alive,
            particles_per_second: 0.0,
            activation_index: 0.0,
            attribute_offset: 0,
            activation_end: 0,
            age: 0.0,
            active_particle_count: 0,
            attached: false,
            sampler: Sampler::new(),
            reset_flags,
            update_flags: [false; KEY_COUNT],
            update_counts: [0; KEY_COUNT],
            ranges: [UpdateRange::UNTOUCHED; KEY_COUNT],
        }
    }

    /// Replace the internal sampler with a seeded one, for reproducible
    /// attribute generation.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.sampler = Sampler::seeded(seed);
        self
    }

    // ========== Accessors ==========

    #[inline]
    pub fn id(&self) -> EmitterId {
        self.id
    }

    /// Number of particle slots this emitter owns.
    #[inline]
    pub fn particle_count(&self) -> usize {
        self.particle_count
    }

    /// Number of slots currently alive.
    #[inline]
    pub fn active_particle_count(&self) -> usize {
        self.active_particle_count
    }

    /// Whether the emitter is currently activating particles.
    #[inline]
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Static emitters are populated once and never stepped.
    #[inline]
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Whether the emitter currently belongs to a group.
    #[inline]
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Seconds since the emitter was last enabled.
    #[inline]
    pub fn age(&self) -> f32 {
        self.age
    }

    #[inline]
    pub fn duration(&self) -> Option<f32> {
        self.duration
    }

    #[inline]
    pub fn max_age(&self) -> ScalarProp {
        self.max_age
    }

    /// Activation rate derived from particle count, lifetime span, and
    /// duration when the emitter was attached.
    #[inline]
    pub fn particles_per_second(&self) -> f32 {
        self.particles_per_second
    }

    /// This emitter's slot range in the shared buffers. Meaningful only
    /// while attached.
    #[inline]
    pub fn slice(&self) -> Range<usize> {
        self.attribute_offset..self.attribute_offset + self.particle_count
    }

    // ========== State machine ==========

    /// Start (or resume) activating particles.
    pub fn enable(&mut self) {
        self.alive = true;
    }

    /// Stop activating particles. Slots already alive keep aging to their
    /// natural death.
    pub fn disable(&mut self) {
        self.alive = false;
    }

    /// Zero the running age and stop activation. With `force`, also kill
    /// every slot in the slice immediately and flag a full upload of the
    /// params channel.
    pub fn reset(&mut self, force: bool, attributes: &mut AttributeSet) {
        self.age = 0.0;
        self.alive = false;

        if force {
            let params = attributes.get_mut(AttributeKey::Params);
            let data = params.buffer_mut().as_mut_slice();
            for i in self.attribute_offset..self.attribute_offset + self.particle_count {
                let base = i * 4;
                if base + 1 < data.len() {
                    data[base] = 0.0;
                    data[base + 1] = 0.0;
                }
            }
            params.force_update_all();
            self.active_particle_count = 0;
        }
    }

    // ========== Live property mutators ==========
    //
    // Each mutator writes the value and opens the transition window for
    // the attribute class it maps to: maxAge and wiggle land in params,
    // drag lands in acceleration.

    fn touch(&mut self, key: AttributeKey) {
        let k = key.index();
        self.update_flags[k] = true;
        self.update_counts[k] = 0;
    }

    pub fn set_position_value(&mut self, value: Vec3) {
        self.position.value = value;
        self.touch(AttributeKey::Position);
    }

    pub fn set_position_spread(&mut self, spread: Vec3) {
        self.position.spread = spread;
        self.touch(AttributeKey::Position);
    }

    pub fn set_position_spread_clamp(&mut self, clamp: Vec3) {
        self.position.spread_clamp = clamp;
        self.touch(AttributeKey::Position);
    }

    pub fn set_position_radius(&mut self, radius: f32) {
        self.position.radius = radius;
        self.touch(AttributeKey::Position);
    }

    pub fn set_position_radius_scale(&mut self, scale: Vec3) {
        self.position.radius_scale = scale;
        self.touch(AttributeKey::Position);
    }

    pub fn set_position_distribution(&mut self, distribution: Distribution) {
        self.position.distribution = Some(distribution);
        self.touch(AttributeKey::Position);
    }

    pub fn set_position_randomise(&mut self, randomise: bool) {
        self.position.randomise = randomise;
        self.reset_flags[AttributeKey::Position.index()] = randomise;
    }

    pub fn set_velocity_value(&mut self, value: Vec3) {
        self.velocity.value = value;
        self.touch(AttributeKey::Velocity);
    }

    pub fn set_velocity_spread(&mut self, spread: Vec3) {
        self.velocity.spread = spread;
        self.touch(AttributeKey::Velocity);
    }

    pub fn set_velocity_distribution(&mut self, distribution: Distribution) {
        self.velocity.distribution = Some(distribution);
        self.touch(AttributeKey::Velocity);
    }

    pub fn set_velocity_randomise(&mut self, randomise: bool) {
        self.velocity.randomise = randomise;
        self.reset_flags[AttributeKey::Velocity.index()] = randomise;
    }

    pub fn set_acceleration_value(&mut self, value: Vec3) {
        self.acceleration.value = value;
        self.touch(AttributeKey::Acceleration);
    }

    pub fn set_acceleration_spread(&mut self, spread: Vec3) {
        self.acceleration.spread = spread;
        self.touch(AttributeKey::Acceleration);
    }

    pub fn set_acceleration_distribution(&mut self, distribution: Distribution) {
        self.acceleration.distribution = Some(distribution);
        self.touch(AttributeKey::Acceleration);
    }

    pub fn set_acceleration_randomise(&mut self, randomise: bool) {
        self.acceleration.randomise = randomise;
        self.reset_flags[AttributeKey::Acceleration.index()] = randomise;
    }

    pub fn set_drag(&mut self, value: f32, spread: f32) {
        self.drag.value = value;
        self.drag.spread = spread;
        self.touch(AttributeKey::Acceleration);
    }

    pub fn set_drag_randomise(&mut self, randomise: bool) {
        self.drag.randomise = randomise;
        self.reset_flags[AttributeKey::Acceleration.index()] = randomise;
    }

    pub fn set_wiggle(&mut self, value: f32, spread: f32) {
        self.wiggle.value = value;
        self.wiggle.spread = spread;
        self.touch(AttributeKey::Params);
    }

    pub fn set_max_age(&mut self, value: f32, spread: f32) {
        self.max_age.value = value;
        self.max_age.spread = spread;
        self.touch(AttributeKey::Params);
    }

    pub fn set_rotation_axis(&mut self, axis: Vec3, axis_spread: Vec3) {
        self.rotation.axis = axis;
        self.rotation.axis_spread = axis_spread;
        self.touch(AttributeKey::Rotation);
    }

    pub fn set_rotation_angle(&mut self, angle: f32, angle_spread: f32) {
        self.rotation.angle = angle;
        self.rotation.angle_spread = angle_spread;
        self.touch(AttributeKey::Rotation);
    }

    pub fn set_rotation_static(&mut self, is_static: bool) {
        self.rotation.is_static = is_static;
        self.touch(AttributeKey::Rotation);
    }

    pub fn set_rotation_center(&mut self, center: Option<Vec3>) {
        self.rotation.center = center;
        self.touch(AttributeKey::RotationCenter);
    }

    pub fn set_rotation_randomise(&mut self, randomise: bool) {
        self.rotation.randomise = randomise;
        self.reset_flags[AttributeKey::Rotation.index()] = randomise;
        self.reset_flags[AttributeKey::RotationCenter.index()] = randomise;
    }

    pub fn set_color_value(&mut self, value: Vec<Vec3>) {
        self.color.value = value;
        self.color.normalize();
        self.touch(AttributeKey::Color);
    }

    pub fn set_color_spread(&mut self, spread: Vec<Vec3>) {
        self.color.spread = spread;
        self.color.normalize();
        self.touch(AttributeKey::Color);
    }

    pub fn set_color_randomise(&mut self, randomise: bool) {
        self.color.randomise = randomise;
        self.reset_flags[AttributeKey::Color.index()] = randomise;
    }

    pub fn set_opacity_value(&mut self, value: Vec<f32>) {
        self.opacity.value = value;
        self.opacity.normalize();
        self.touch(AttributeKey::Opacity);
    }

    pub fn set_opacity_spread(&mut self, spread: Vec<f32>) {
        self.opacity.spread = spread;
        self.opacity.normalize();
        self.touch(AttributeKey::Opacity);
    }

    pub fn set_opacity_randomise(&mut self, randomise: bool) {
        self.opacity.randomise = randomise;
        self.reset_flags[AttributeKey::Opacity.index()] = randomise;
    }

    pub fn set_size_value(&mut self, value: Vec<f32>) {
        self.size.value = value;
        self.size.normalize();
        self.touch(AttributeKey::Size);
    }

    pub fn set_size_spread(&mut self, spread: Vec<f32>) {
        self.size.spread = spread;
        self.size.normalize();
        self.touch(AttributeKey::Size);
    }

    pub fn set_size_randomise(&mut self, randomise: bool) {
        self.size.randomise = randomise;
        self.reset_flags[AttributeKey::Size.index()] = randomise;
    }

    pub fn set_angle_value(&mut self, value: Vec<f32>) {
        self.angle.value = value;
        self.angle.normalize();
        self.touch(AttributeKey::Angle);
    }

    pub fn set_angle_spread(&mut self, spread: Vec<f32>) {
        self.angle.spread = spread;
        self.angle.normalize();
        self.touch(AttributeKey::Angle);
    }

    pub fn set_angle_randomise(&mut self, randomise: bool) {
        self.angle.randomise = randomise;
        self.reset_flags[AttributeKey::Angle.index()] = randomise;
    }

    pub fn set_active_multiplier(&mut self, multiplier: f32) {
        self.active_multiplier = multiplier;
    }

    // ========== Group-side wiring ==========

    /// Assign this emitter's slot range and derive its activation rate.
    pub(crate) fn attach(&mut self, offset: usize) {
        let age_span = self.max_age.value + self.max_age.spread;
        self.particles_per_second = match self.duration {
            Some(duration) => self.particle_count as f32 / age_span.min(duration),
            None => self.particle_count as f32 / age_span,
        };
        self.attribute_offset = offset;
        self.activation_index = offset as f32;
        self.activation_end = offset + self.particle_count;
        self.attached = true;
        self.ranges = [UpdateRange::UNTOUCHED; KEY_COUNT];
    }

    /// Clear group-assigned state, returning the emitter to detached.
    pub(crate) fn detach(&mut self) {
        self.particles_per_second = 0.0;
        self.attribute_offset = 0;
        self.activation_index = 0.0;
        self.activation_end = 0;
        self.active_particle_count = 0;
        self.age = 0.0;
        self.attached = false;
    }

    /// Per-class dirty bounds accumulated by the last tick.
    pub(crate) fn update_ranges(&self) -> &[UpdateRange; KEY_COUNT] {
        &self.ranges
    }

    /// Generate initial values for every slot in the slice, all classes.
    /// Positions go first so position-relative samplers can read them.
    pub(crate) fn populate_slice(&mut self, attributes: &mut AttributeSet) {
        for i in self.attribute_offset..self.attribute_offset + self.particle_count {
            self.assign_position(i, attributes);
            self.assign_force(AttributeKey::Velocity, i, attributes);
            self.assign_force(AttributeKey::Acceleration, i, attributes);
            self.assign_lifetime(AttributeKey::Opacity, i, attributes);
            self.assign_lifetime(AttributeKey::Size, i, attributes);
            self.assign_angle(i, attributes);
            self.assign_rotation(i, attributes);
            self.assign_params(i, attributes);
            self.assign_color(i, attributes);
        }
    }

    // ========== Per-frame simulation ==========

    /// Simulate one frame: age live slots, then activate dead slots in the
    /// current activation window. No-op for static emitters.
    pub fn tick(&mut self, dt: f32, attributes: &mut AttributeSet) {
        if self.is_static {
            return;
        }

        let start = self.attribute_offset;
        let end = start + self.particle_count;

        self.ranges = [UpdateRange::UNTOUCHED; KEY_COUNT];
        self.check_particle_ages(start, end, dt, attributes);

        if !self.alive {
            self.age = 0.0;
            return;
        }

        if let Some(duration) = self.duration {
            if self.age > duration {
                self.alive = false;
                self.age = 0.0;
                return;
            }
        }

        let spawn = self.particles_per_second * self.active_multiplier * dt;
        let cursor = self.activation_index;
        let batch_start = if self.particle_count == 1 {
            cursor
        } else {
            cursor.floor()
        };
        let batch_end = (batch_start + spawn).min(self.activation_end as f32);
        let batch = ((batch_end - cursor).floor().max(0.0)) as usize;
        let dt_per_particle = if batch > 0 { dt / batch as f32 } else { 0.0 };

        self.activate_particles(batch_start, batch_end, dt_per_particle, attributes);

        self.activation_index += spawn;
        if self.activation_index > end as f32 {
            self.activation_index = start as f32;
        }
        self.age += dt;
    }

    /// Advance the age of every live slot, killing those that cross their
    /// lifetime boundary.
    fn check_particle_ages(
        &mut self,
        start: usize,
        end: usize,
        dt: f32,
        attributes: &mut AttributeSet,
    ) {
        let data = attributes
            .get_mut(AttributeKey::Params)
            .buffer_mut()
            .as_mut_slice();

        for i in start..end {
            let base = i * 4;
            if base + 3 >= data.len() {
                break;
            }
            if data[base] == 0.0 {
                continue;
            }

            let mut alive = data[base];
            let mut age = data[base + 1];
            let max_age = data[base + 2];

            match self.direction {
                AgeDirection::Forward => {
                    age += dt;
                    if age >= max_age {
                        age = 0.0;
                        alive = 0.0;
                        self.active_particle_count = self.active_particle_count.saturating_sub(1);
                    }
                }
                AgeDirection::Reverse => {
                    age -= dt;
                    if age <= 0.0 {
                        age = max_age;
                        alive = 0.0;
                        self.active_particle_count = self.active_particle_count.saturating_sub(1);
                    }
                }
            }

            data[base] = alive;
            data[base + 1] = age;
            self.ranges[PARAMS].bump(i);
        }
    }

    /// Activate dead slots in `[batch_start, batch_end)`, staggering each
    /// one's initial age so a frame's batch doesn't pop in at once. A
    /// single-slot emitter may re-activate its slot while still alive.
    fn activate_particles(
        &mut self,
        batch_start: f32,
        batch_end: f32,
        dt_per_particle: f32,
        attributes: &mut AttributeSet,
    ) {
        let first = if self.particle_count == 1 {
            batch_start.ceil() as usize
        } else {
            batch_start.floor() as usize
        };

        let mut i = first;
        while (i as f32) < batch_end {
            let base = i * 4;
            let already_alive = attributes
                .get(AttributeKey::Params)
                .buffer()
                .value_at(base)
                .unwrap_or(0.0)
                != 0.0;

            if already_alive && self.particle_count != 1 {
                i += 1;
                continue;
            }

            self.active_particle_count += 1;
            attributes
                .get_mut(AttributeKey::Params)
                .buffer_mut()
                .set_component(i, 0, 1.0);

            self.reset_particle(i, attributes);

            let delay = dt_per_particle * (i as f32 - batch_start);
            let age = match self.direction {
                AgeDirection::Forward => delay,
                AgeDirection::Reverse => {
                    let max_age = attributes
                        .get(AttributeKey::Params)
                        .buffer()
                        .value_at(base + 2)
                        .unwrap_or(0.0);
                    max_age - delay
                }
            };
            attributes
                .get_mut(AttributeKey::Params)
                .buffer_mut()
                .set_component(i, 1, age);

            self.ranges[PARAMS].bump(i);
            i += 1;
        }
    }

    /// Re-assign the attribute classes whose reset or update flag is set,
    /// stepping each open transition window toward auto-close.
    fn reset_particle(&mut self, index: usize, attributes: &mut AttributeSet) {
        for key in AttributeKey::ALL {
            let k = key.index();
            if self.reset_flags[k] || self.update_flags[k] {
                self.assign_value(key, index, attributes);
                self.ranges[k].bump(index);

                if self.update_flags[k] {
                    if self.update_counts[k] == self.particle_count {
                        self.update_flags[k] = false;
                        self.update_counts[k] = 0;
                    } else {
                        self.update_counts[k] += 1;
                    }
                }
            }
        }
    }

    // ========== Attribute assignment ==========

    fn assign_value(&mut self, key: AttributeKey, index: usize, attributes: &mut AttributeSet) {
        match key {
            AttributeKey::Position => self.assign_position(index, attributes),
            AttributeKey::Velocity | AttributeKey::Acceleration => {
                self.assign_force(key, index, attributes)
            }
            AttributeKey::Size | AttributeKey::Opacity => {
                self.assign_lifetime(key, index, attributes)
            }
            AttributeKey::Angle => self.assign_angle(index, attributes),
            AttributeKey::Params => self.assign_params(index, attributes),
            AttributeKey::Rotation => self.assign_rotation(index, attributes),
            AttributeKey::Color => self.assign_color(index, attributes),
            // Written together with Rotation.
            AttributeKey::RotationCenter => {}
        }
    }

    fn assign_position(&mut self, index: usize, attributes: &mut AttributeSet) {
        let prop = &self.position;
        let value = match prop.distribution.unwrap_or(self.distribution) {
            Distribution::Box => {
                self.sampler
                    .random_vec3(prop.value, prop.spread, Some(prop.spread_clamp))
            }
            Distribution::Sphere => self.sampler.random_vec3_on_sphere(
                prop.value,
                prop.radius,
                prop.spread.x,
                prop.radius_scale,
                prop.spread_clamp.x,
            ),
            Distribution::Disc => self.sampler.random_vec3_on_disc(
                prop.value,
                prop.radius,
                prop.spread.x,
                prop.radius_scale,
                prop.spread_clamp.x,
            ),
            Distribution::Line => self.sampler.random_vec3_on_line(prop.value, prop.spread),
        };

        attributes
            .get_mut(AttributeKey::Position)
            .buffer_mut()
            .set_vec3(index, value);
    }

    fn assign_force(&mut self, key: AttributeKey, index: usize, attributes: &mut AttributeSet) {
        let prop = match key {
            AttributeKey::Velocity => &self.velocity,
            _ => &self.acceleration,
        };

        let value = match prop.distribution.unwrap_or(self.distribution) {
            Distribution::Box => self.sampler.random_vec3(prop.value, prop.spread, None),
            Distribution::Sphere | Distribution::Disc => {
                let planar = prop.distribution.unwrap_or(self.distribution) == Distribution::Disc;
                let pos = attributes.get(AttributeKey::Position).buffer();
                let base = index * 3;
                let particle_pos = match (
                    pos.value_at(base),
                    pos.value_at(base + 1),
                    pos.value_at(base + 2),
                ) {
                    (Some(x), Some(y), Some(z)) => Vec3::new(x, y, z),
                    _ => {
                        log::error!(
                            "no position data for slot {index}; skipping {:?} assignment",
                            key
                        );
                        return;
                    }
                };

                if planar {
                    self.sampler.random_direction_on_disc(
                        particle_pos,
                        self.position.value,
                        prop.value.x,
                        prop.spread.x,
                    )
                } else {
                    self.sampler.random_direction_on_sphere(
                        particle_pos,
                        self.position.value,
                        prop.value.x,
                        prop.spread.x,
                    )
                }
            }
            Distribution::Line => self.sampler.random_vec3_on_line(prop.value, prop.spread),
        };

        let buffer = attributes.get_mut(key).buffer_mut();
        buffer.set_vec3(index, value);

        if key == AttributeKey::Acceleration {
            let drag = self
                .sampler
                .random_float(self.drag.value, self.drag.spread)
                .clamp(0.0, 1.0);
            attributes
                .get_mut(AttributeKey::Acceleration)
                .buffer_mut()
                .set_component(index, 3, drag);
        }
    }

    fn assign_lifetime(&mut self, key: AttributeKey, index: usize, attributes: &mut AttributeSet) {
        let (value, spread) = match key {
            AttributeKey::Size => (&self.size.value, &self.size.spread),
            _ => (&self.opacity.value, &self.opacity.spread),
        };

        let mut out = [0.0f32; VALUE_OVER_LIFETIME_LENGTH];
        if values_are_equal(value) && values_are_equal(spread) {
            let sampled = self.sampler.random_float(value[0], spread[0]).abs();
            out = [sampled; VALUE_OVER_LIFETIME_LENGTH];
        } else {
            for k in 0..VALUE_OVER_LIFETIME_LENGTH {
                out[k] = self.sampler.random_float(value[k], spread[k]).abs();
            }
        }

        attributes
            .get_mut(key)
            .buffer_mut()
            .set_vec4_components(index, out[0], out[1], out[2], out[3]);
    }

    fn assign_angle(&mut self, index: usize, attributes: &mut AttributeSet) {
        let (value, spread) = (&self.angle.value, &self.angle.spread);

        let mut out = [0.0f32; VALUE_OVER_LIFETIME_LENGTH];
        if values_are_equal(value) && values_are_equal(spread) {
            let sampled = self.sampler.random_float(value[0], spread[0]);
            out = [sampled; VALUE_OVER_LIFETIME_LENGTH];
        } else {
            for k in 0..VALUE_OVER_LIFETIME_LENGTH {
                out[k] = self.sampler.random_float(value[k], spread[k]);
            }
        }

        attributes
            .get_mut(AttributeKey::Angle)
            .buffer_mut()
            .set_vec4_components(index, out[0], out[1], out[2], out[3]);
    }

    fn assign_params(&mut self, index: usize, attributes: &mut AttributeSet) {
        let max_age = self
            .sampler
            .random_float(self.max_age.value, self.max_age.spread)
            .abs();
        let wiggle = self.sampler.random_float(self.wiggle.value, self.wiggle.spread);

        attributes
            .get_mut(AttributeKey::Params)
            .buffer_mut()
            .set_vec4_components(
                index,
                if self.is_static { 1.0 } else { 0.0 },
                0.0,
                max_age,
                wiggle,
            );
    }

    fn assign_rotation(&mut self, index: usize, attributes: &mut AttributeSet) {
        let rotation = self.rotation;
        let packed_axis = self
            .sampler
            .packed_rotation_axis(rotation.axis, rotation.axis_spread);
        let angle = self
            .sampler
            .random_float(rotation.angle, rotation.angle_spread);

        attributes
            .get_mut(AttributeKey::Rotation)
            .buffer_mut()
            .set_vec3_components(
                index,
                packed_axis,
                angle,
                if rotation.is_static { 0.0 } else { 1.0 },
            );

        attributes
            .get_mut(AttributeKey::RotationCenter)
            .buffer_mut()
            .set_vec3(index, rotation.center.unwrap_or(self.position.value));
    }

    fn assign_color(&mut self, index: usize, attributes: &mut AttributeSet) {
        let mut packed = [0.0f32; VALUE_OVER_LIFETIME_LENGTH];
        for k in 0..VALUE_OVER_LIFETIME_LENGTH {
            let color = self
                .sampler
                .random_color(self.color.value[k], self.color.spread[k]);
            packed[k] = spawn::pack_rgb(color);
        }

        attributes
            .get_mut(AttributeKey::Color)
            .buffer_mut()
            .set_vec4_components(index, packed[0], packed[1], packed[2], packed[3]);
    }
}
