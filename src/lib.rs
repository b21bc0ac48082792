//! # Embers - CPU Particle Simulation Core
//!
//! Embers ages, respawns, and re-randomizes large pools of particles every
//! frame and writes their attributes into contiguous `f32` buffers, with
//! dirty-range tracking so a renderer uploads only what changed.
//!
//! The crate is renderer-agnostic: it produces buffers, component counts,
//! dirty byte ranges, and a draw count. What consumes them - and the
//! shaders that animate particles from their birth values - lives
//! elsewhere.
//!
//! ## Quick Start
//!
//! ```ignore
//! use embers::{Distribution, Emitter, EmitterConfig, Group, GroupConfig, Vec3};
//!
//! let mut group = Group::new(GroupConfig::new().with_max_particle_count(10_000));
//!
//! let id = group.add_emitter(Emitter::new(
//!     EmitterConfig::new()
//!         .with_particle_count(2_000)
//!         .with_distribution(Distribution::Sphere)
//!         .with_max_age(2.0, 0.5),
//! ));
//!
//! // Per frame:
//! group.tick(Some(dt));
//! group.for_each_pending_upload(|key, bytes, range| {
//!     // upload bytes[range.byte_offset .. range.byte_offset + range.byte_len]
//! });
//! let draw_count = group.draw_count();
//! ```
//!
//! ## Core Concepts
//!
//! ### Slots and slices
//!
//! A particle is nothing but an index into the shared attribute buffers.
//! Each emitter owns a contiguous *slice* of slots, assigned when it is
//! added to a [`Group`]; emitters write only inside their own slice.
//!
//! ### Distributions
//!
//! Position, velocity, and acceleration are generated by a spatial
//! sampling rule - [`Distribution::Box`], [`Distribution::Sphere`],
//! [`Distribution::Disc`], or [`Distribution::Line`] - configured per
//! emitter and overridable per property.
//!
//! ### Value over lifetime
//!
//! Color, opacity, size, and angle are authored as up to four keyframes
//! interpolated across each particle's age. Shorter lists are normalized
//! at construction; see [`keyframes`].
//!
//! ### Dirty ranges
//!
//! Every tick, each emitter reports the minimal slot range it touched per
//! attribute class. The group merges those into each channel's upload
//! window, so a mostly idle buffer costs almost nothing to sync.
//!
//! ## Feature Overview
//!
//! | Concern | Entry point |
//! |---------|-------------|
//! | Storage | [`ResizableBuffer`], [`NamedAttribute`], [`AttributeSet`] |
//! | Sampling | [`Sampler`], [`Distribution`] |
//! | Keyframes | [`keyframes::ensure_compliance`], [`VALUE_OVER_LIFETIME_LENGTH`] |
//! | Simulation | [`Emitter`], [`Group`] |
//! | Pooling | [`Group::add_pool`], [`Group::trigger_pool_emitter`] |
//! | Renderer handoff | [`Group::for_each_pending_upload`], [`Group::draw_count`] |

mod attribute;
mod buffer;
pub mod config;
mod emitter;
mod group;
pub mod keyframes;
mod spawn;
pub mod time;
pub mod visuals;

pub use attribute::{
    AttributeKey, AttributeSet, AttributeType, BufferHandle, BufferUsage, NamedAttribute,
    UploadRange,
};
pub use buffer::ResizableBuffer;
pub use config::{
    AgeDirection, ColorProp, Distribution, EmitterConfig, GroupConfig, KeyframeProp, RotationProp,
    ScalarProp, VectorProp,
};
pub use emitter::{Emitter, EmitterId};
pub use glam::{Vec2, Vec3, Vec4};
pub use group::{Group, PoolTrigger};
pub use keyframes::VALUE_OVER_LIFETIME_LENGTH;
pub use spawn::Sampler;
pub use visuals::{BlendMode, RenderSettings};
