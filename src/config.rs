//! Declarative configuration for emitters and groups.
//!
//! Every field is independently defaulted, so a config can be as small as
//! `EmitterConfig::default()` or spell out each property with struct-update
//! syntax and builder methods:
//!
//! ```ignore
//! let config = EmitterConfig::new()
//!     .with_particle_count(500)
//!     .with_distribution(Distribution::Sphere)
//!     .with_max_age(2.0, 0.5)
//!     .with_position(VectorProp {
//!         radius: 3.0,
//!         ..VectorProp::default()
//!     });
//! ```

use crate::keyframes::{self, VALUE_OVER_LIFETIME_LENGTH};
use crate::visuals::RenderSettings;
use glam::Vec3;

/// Spatial sampling rule for generated attribute values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Distribution {
    /// Independent per-axis jitter within a box volume.
    #[default]
    Box,
    /// Uniform over a sphere surface with randomized radius.
    Sphere,
    /// Planar disc; the third component stays at the base origin.
    Disc,
    /// Uniform along a line segment.
    Line,
}

/// Direction particle age runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AgeDirection {
    /// Age counts up from 0 toward `max_age`.
    #[default]
    Forward,
    /// Age counts down from `max_age` toward 0.
    Reverse,
}

impl AgeDirection {
    /// Sign multiplier for age deltas.
    #[inline]
    pub fn sign(self) -> f32 {
        match self {
            AgeDirection::Forward => 1.0,
            AgeDirection::Reverse => -1.0,
        }
    }
}

/// A vector-valued property (position, velocity, acceleration).
///
/// Which fields apply depends on the distribution in effect: box uses
/// `value`/`spread`/`spread_clamp`; sphere and disc use `radius`,
/// `radius_scale`, and `spread.x` as the radius spread (for velocity and
/// acceleration, `value.x` is the speed and `spread.x` its spread); line
/// interpolates from `value` to `spread`, which doubles as the end point.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorProp {
    pub value: Vec3,
    pub spread: Vec3,
    /// Per-axis multiple to snap box samples to. Zero disables snapping.
    pub spread_clamp: Vec3,
    /// Overrides the emitter's base distribution when set.
    pub distribution: Option<Distribution>,
    /// Re-randomize this property when a particle respawns.
    pub randomise: bool,
    /// Sphere/disc radius. The sampled radius is rounded to a multiple of
    /// `spread_clamp.x` when that is nonzero.
    pub radius: f32,
    /// Per-axis scale applied to sphere/disc samples.
    pub radius_scale: Vec3,
}

impl Default for VectorProp {
    fn default() -> Self {
        Self {
            value: Vec3::ZERO,
            spread: Vec3::ZERO,
            spread_clamp: Vec3::ZERO,
            distribution: None,
            randomise: false,
            radius: 10.0,
            radius_scale: Vec3::ONE,
        }
    }
}

/// A scalar property with random variance (drag, wiggle, max age).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScalarProp {
    pub value: f32,
    pub spread: f32,
    pub randomise: bool,
}

impl ScalarProp {
    pub fn new(value: f32, spread: f32) -> Self {
        Self {
            value,
            spread,
            randomise: false,
        }
    }
}

/// Rotation configuration: a packed axis plus an angle, optionally
/// animated over each particle's lifetime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationProp {
    /// Rotation axis; normalized before packing.
    pub axis: Vec3,
    /// Per-component jitter applied to the axis.
    pub axis_spread: Vec3,
    /// Rotation angle in radians.
    pub angle: f32,
    pub angle_spread: f32,
    /// When true the rotation is applied once rather than animated.
    pub is_static: bool,
    /// Pivot of the rotation; defaults to the emitter's base position.
    pub center: Option<Vec3>,
    pub randomise: bool,
}

impl Default for RotationProp {
    fn default() -> Self {
        Self {
            axis: Vec3::Y,
            axis_spread: Vec3::ZERO,
            angle: 0.0,
            angle_spread: 0.0,
            is_static: false,
            center: None,
            randomise: false,
        }
    }
}

/// A scalar value-over-lifetime property (opacity, size, angle).
///
/// `value` and `spread` may be authored with 1 to
/// [`VALUE_OVER_LIFETIME_LENGTH`] entries; they are normalized to exactly
/// that many keyframes when the emitter is constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyframeProp {
    pub value: Vec<f32>,
    pub spread: Vec<f32>,
    pub randomise: bool,
}

impl KeyframeProp {
    pub fn constant(value: f32) -> Self {
        Self {
            value: vec![value],
            spread: vec![0.0],
            randomise: false,
        }
    }

    /// Normalize both lists to the fixed keyframe count.
    pub(crate) fn normalize(&mut self) {
        keyframes::ensure_compliance(
            &mut self.value,
            &mut self.spread,
            VALUE_OVER_LIFETIME_LENGTH,
            VALUE_OVER_LIFETIME_LENGTH,
        );
    }
}

/// A color value-over-lifetime property, RGB per keyframe.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorProp {
    pub value: Vec<Vec3>,
    pub spread: Vec<Vec3>,
    pub randomise: bool,
}

impl Default for ColorProp {
    fn default() -> Self {
        Self {
            value: vec![Vec3::ONE],
            spread: vec![Vec3::ZERO],
            randomise: false,
        }
    }
}

impl ColorProp {
    pub(crate) fn normalize(&mut self) {
        keyframes::ensure_compliance(
            &mut self.value,
            &mut self.spread,
            VALUE_OVER_LIFETIME_LENGTH,
            VALUE_OVER_LIFETIME_LENGTH,
        );
    }
}

/// Full configuration for one emitter.
#[derive(Debug, Clone, PartialEq)]
pub struct EmitterConfig {
    /// Base distribution inherited by position, velocity, and
    /// acceleration unless overridden per-property.
    pub distribution: Distribution,
    /// Number of particle slots this emitter owns.
    pub particle_count: usize,
    /// Seconds the emitter stays alive once enabled. `None` is infinite.
    pub duration: Option<f32>,
    /// Static emitters are populated once and never stepped.
    pub is_static: bool,
    /// Multiplier on the activation rate, `0.0..=1.0` to thin output.
    pub active_multiplier: f32,
    /// Which way particle age runs.
    pub direction: AgeDirection,
    /// Whether the emitter starts enabled.
    pub alive: bool,
    /// Particle lifetime in seconds.
    pub max_age: ScalarProp,
    pub position: VectorProp,
    pub velocity: VectorProp,
    pub acceleration: VectorProp,
    /// Drag factor stored alongside acceleration, clamped to `[0, 1]`.
    pub drag: ScalarProp,
    /// Wiggle-phase seed written to each particle.
    pub wiggle: ScalarProp,
    pub rotation: RotationProp,
    pub color: ColorProp,
    pub opacity: KeyframeProp,
    pub size: KeyframeProp,
    pub angle: KeyframeProp,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            distribution: Distribution::Box,
            particle_count: 100,
            duration: None,
            is_static: false,
            active_multiplier: 1.0,
            direction: AgeDirection::Forward,
            alive: true,
            max_age: ScalarProp::new(2.0, 0.0),
            position: VectorProp::default(),
            velocity: VectorProp::default(),
            acceleration: VectorProp::default(),
            drag: ScalarProp::default(),
            wiggle: ScalarProp::default(),
            rotation: RotationProp::default(),
            color: ColorProp::default(),
            opacity: KeyframeProp::constant(1.0),
            size: KeyframeProp::constant(1.0),
            angle: KeyframeProp::constant(0.0),
        }
    }
}

impl EmitterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_distribution(mut self, distribution: Distribution) -> Self {
        self.distribution = distribution;
        self
    }

    pub fn with_particle_count(mut self, count: usize) -> Self {
        self.particle_count = count;
        self
    }

    pub fn with_duration(mut self, seconds: f32) -> Self {
        self.duration = Some(seconds);
        self
    }

    pub fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }

    pub fn with_active_multiplier(mut self, multiplier: f32) -> Self {
        self.active_multiplier = multiplier;
        self
    }

    pub fn with_direction(mut self, direction: AgeDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_max_age(mut self, value: f32, spread: f32) -> Self {
        self.max_age = ScalarProp::new(value, spread);
        self
    }

    pub fn with_position(mut self, position: VectorProp) -> Self {
        self.position = position;
        self
    }

    pub fn with_velocity(mut self, velocity: VectorProp) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_acceleration(mut self, acceleration: VectorProp) -> Self {
        self.acceleration = acceleration;
        self
    }

    pub fn with_color(mut self, color: ColorProp) -> Self {
        self.color = color;
        self
    }

    pub fn with_size(mut self, size: KeyframeProp) -> Self {
        self.size = size;
        self
    }

    pub fn with_opacity(mut self, opacity: KeyframeProp) -> Self {
        self.opacity = opacity;
        self
    }
}

/// Configuration for a particle group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupConfig {
    /// Seconds to advance the simulation when `tick` is called without an
    /// explicit delta.
    pub fixed_time_step: f32,
    /// Soft capacity cap; exceeding it warns once and continues.
    pub max_particle_count: Option<usize>,
    /// Hints forwarded to the renderer collaborator.
    pub render: RenderSettings,
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self {
            fixed_time_step: 0.016,
            max_particle_count: None,
            render: RenderSettings::default(),
        }
    }
}

impl GroupConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fixed_time_step(mut self, seconds: f32) -> Self {
        self.fixed_time_step = seconds;
        self
    }

    pub fn with_max_particle_count(mut self, count: usize) -> Self {
        self.max_particle_count = Some(count);
        self
    }
}
