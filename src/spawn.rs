//! Randomized attribute sampling for particle spawning.
//!
//! A [`Sampler`] wraps a small, fast RNG and provides one routine per
//! spawning pattern. All routines return plain values; the emitter decides
//! where they land in the attribute buffers.
//!
//! # Distributions
//!
//! | Pattern | Description |
//! |---------|-------------|
//! | [`Sampler::random_vec3`] | Box: each axis independently jittered around a base |
//! | [`Sampler::random_vec3_on_sphere`] | Uniform point on a sphere surface, randomized radius |
//! | [`Sampler::random_vec3_on_disc`] | Planar variant: angle-only randomization in 2D |
//! | [`Sampler::random_vec3_on_line`] | Uniform point on a line segment |
//! | [`Sampler::random_direction_on_sphere`] | Velocity/acceleration radial to the emitter origin |
//! | [`Sampler::random_direction_on_disc`] | Radial variant with the third component zeroed |

use glam::Vec3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::TAU;

/// Randomized value generator for particle attributes.
///
/// One sampler per emitter; reusing it across respawns keeps allocation out
/// of the per-frame path.
#[derive(Debug, Clone)]
pub struct Sampler {
    rng: SmallRng,
}

impl Sampler {
    /// Create a sampler seeded from system entropy.
    pub fn new() -> Self {
        Self {
            rng: SmallRng::from_entropy(),
        }
    }

    /// Create a sampler with a fixed seed, for reproducible output.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Random f32 between 0.0 and 1.0.
    #[inline]
    pub fn random(&mut self) -> f32 {
        self.rng.gen()
    }

    /// Random value centered on `base`, varying by at most `spread / 2`
    /// in each direction.
    #[inline]
    pub fn random_float(&mut self, base: f32, spread: f32) -> f32 {
        base + spread * (self.random() - 0.5)
    }

    // ========== Vector sampling ==========

    /// Box sampling: each axis independently drawn from
    /// `base ± spread / 2`. If `spread_clamp` is given, each axis is
    /// snapped to the nearest multiple of its clamp value and re-centered
    /// by half a clamp step.
    pub fn random_vec3(&mut self, base: Vec3, spread: Vec3, spread_clamp: Option<Vec3>) -> Vec3 {
        let mut x = base.x + (self.random() * spread.x - spread.x * 0.5);
        let mut y = base.y + (self.random() * spread.y - spread.y * 0.5);
        let mut z = base.z + (self.random() * spread.z - spread.z * 0.5);

        if let Some(clamp) = spread_clamp {
            x = -clamp.x * 0.5 + round_to_nearest_multiple(x, clamp.x);
            y = -clamp.y * 0.5 + round_to_nearest_multiple(y, clamp.y);
            z = -clamp.z * 0.5 + round_to_nearest_multiple(z, clamp.z);
        }

        Vec3::new(x, y, z)
    }

    /// Uniform point on a sphere surface around `base`, at a randomized
    /// radius `radius ± radius_spread / 2`, optionally rounded to a
    /// `radius_clamp` multiple and scaled per-axis by `radius_scale`.
    pub fn random_vec3_on_sphere(
        &mut self,
        base: Vec3,
        radius: f32,
        radius_spread: f32,
        radius_scale: Vec3,
        radius_clamp: f32,
    ) -> Vec3 {
        let depth = 2.0 * self.random() - 1.0;
        let t = TAU * self.random();
        let r = (1.0 - depth * depth).sqrt();
        let mut rand = self.random_float(radius, radius_spread);

        if radius_clamp != 0.0 {
            rand = (rand / radius_clamp).round() * radius_clamp;
        }

        let x = r * t.cos() * rand * radius_scale.x;
        let y = r * t.sin() * rand * radius_scale.y;
        let z = depth * rand * radius_scale.z;

        base + Vec3::new(x, y, z)
    }

    /// Planar variant of [`random_vec3_on_sphere`](Self::random_vec3_on_sphere):
    /// angle-only randomization in 2D, the third component staying at the
    /// base origin's own value.
    pub fn random_vec3_on_disc(
        &mut self,
        base: Vec3,
        radius: f32,
        radius_spread: f32,
        radius_scale: Vec3,
        radius_clamp: f32,
    ) -> Vec3 {
        let t = TAU * self.random();
        let mut rand = self.random_float(radius, radius_spread).abs();

        if radius_clamp != 0.0 {
            rand = (rand / radius_clamp).round() * radius_clamp;
        }

        let x = t.cos() * rand * radius_scale.x;
        let y = t.sin() * rand * radius_scale.y;

        base + Vec3::new(x, y, 0.0)
    }

    /// Uniform point on the segment from `start` to `end`.
    pub fn random_vec3_on_line(&mut self, start: Vec3, end: Vec3) -> Vec3 {
        start.lerp(end, self.random())
    }

    // ========== Directional sampling ==========

    /// Direction radial to the emitter: points from `emitter_origin` away
    /// through `particle_pos`, with magnitude `speed ± speed_spread / 2`.
    pub fn random_direction_on_sphere(
        &mut self,
        particle_pos: Vec3,
        emitter_origin: Vec3,
        speed: f32,
        speed_spread: f32,
    ) -> Vec3 {
        let v = emitter_origin - particle_pos;
        v.normalize_or_zero() * -self.random_float(speed, speed_spread)
    }

    /// Radial direction with the third component zeroed (planar motion).
    pub fn random_direction_on_disc(
        &mut self,
        particle_pos: Vec3,
        emitter_origin: Vec3,
        speed: f32,
        speed_spread: f32,
    ) -> Vec3 {
        let v = (emitter_origin - particle_pos).normalize_or_zero()
            * -self.random_float(speed, speed_spread);
        Vec3::new(v.x, v.y, 0.0)
    }

    // ========== Color and rotation packing ==========

    /// Randomized RGB color: each channel jittered by its spread component
    /// and clamped to `[0, 1]`.
    pub fn random_color(&mut self, base: Vec3, spread: Vec3) -> Vec3 {
        Vec3::new(
            (base.x + (self.random() * spread.x - spread.x * 0.5)).clamp(0.0, 1.0),
            (base.y + (self.random() * spread.y - spread.y * 0.5)).clamp(0.0, 1.0),
            (base.z + (self.random() * spread.z - spread.z * 0.5)).clamp(0.0, 1.0),
        )
    }

    /// Randomize a rotation axis and pack it into a single float.
    ///
    /// The axis is normalized, each component jittered by
    /// `± axis_spread / 2`, renormalized, remapped from `[-1, 1]` to
    /// `[0, 1]`, and encoded as a 24-bit color integer.
    pub fn packed_rotation_axis(&mut self, axis: Vec3, axis_spread: Vec3) -> f32 {
        let mut v = axis.normalize_or_zero();

        v.x += -axis_spread.x * 0.5 + self.random() * axis_spread.x;
        v.y += -axis_spread.y * 0.5 + self.random() * axis_spread.y;
        v.z += -axis_spread.z * 0.5 + self.random() * axis_spread.z;

        let v = (v.normalize_or_zero() + Vec3::ONE) * 0.5;
        pack_rgb(v)
    }
}

impl Default for Sampler {
    fn default() -> Self {
        Self::new()
    }
}

/// Encode an RGB triple in `[0, 1]` as a 24-bit integer, stored in an f32.
#[inline]
pub fn pack_rgb(c: Vec3) -> f32 {
    let r = (c.x.clamp(0.0, 1.0) * 255.0).round() as u32;
    let g = (c.y.clamp(0.0, 1.0) * 255.0).round() as u32;
    let b = (c.z.clamp(0.0, 1.0) * 255.0).round() as u32;
    ((r << 16) | (g << 8) | b) as f32
}

/// Round `n` up to the next multiple of `multiple` (toward zero for
/// negative values). A zero multiple returns `n` unchanged.
pub fn round_to_nearest_multiple(n: f32, multiple: f32) -> f32 {
    if multiple == 0.0 {
        return n;
    }

    let remainder = n.abs() % multiple;
    if remainder == 0.0 {
        return n;
    }

    if n < 0.0 {
        -(n.abs() - remainder)
    } else {
        n + multiple - remainder
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_spread_box_equals_base() {
        let mut sampler = Sampler::seeded(7);
        let base = Vec3::new(1.5, -2.0, 0.25);
        for _ in 0..100 {
            assert_eq!(sampler.random_vec3(base, Vec3::ZERO, None), base);
        }
    }

    #[test]
    fn test_zero_spread_box_with_zero_clamp_equals_base() {
        let mut sampler = Sampler::seeded(7);
        let base = Vec3::new(4.0, 8.0, -12.0);
        let out = sampler.random_vec3(base, Vec3::ZERO, Some(Vec3::ZERO));
        assert_eq!(out, base);
    }

    #[test]
    fn test_sphere_zero_spread_lies_on_radius() {
        let mut sampler = Sampler::seeded(11);
        let base = Vec3::new(1.0, 2.0, 3.0);
        for _ in 0..200 {
            let p = sampler.random_vec3_on_sphere(base, 5.0, 0.0, Vec3::ONE, 0.0);
            assert!(((p - base).length() - 5.0).abs() < 1e-3);
        }
    }

    #[test]
    fn test_disc_stays_planar() {
        let mut sampler = Sampler::seeded(13);
        let base = Vec3::new(0.0, 0.0, 4.0);
        for _ in 0..100 {
            let p = sampler.random_vec3_on_disc(base, 2.0, 1.0, Vec3::ONE, 0.0);
            assert_eq!(p.z, 4.0);
        }
    }

    #[test]
    fn test_line_samples_stay_on_segment() {
        let mut sampler = Sampler::seeded(17);
        let start = Vec3::ZERO;
        let end = Vec3::new(10.0, 0.0, 0.0);
        for _ in 0..1000 {
            let p = sampler.random_vec3_on_line(start, end);
            assert_eq!(p.y, 0.0);
            assert_eq!(p.z, 0.0);
            assert!((0.0..=10.0).contains(&p.x));
        }
    }

    #[test]
    fn test_direction_magnitude_without_spread() {
        let mut sampler = Sampler::seeded(19);
        let v = sampler.random_direction_on_sphere(Vec3::new(0.0, 3.0, 0.0), Vec3::ZERO, 2.0, 0.0);
        assert!((v.length() - 2.0).abs() < 1e-5);
        // Points away from the origin through the particle.
        assert!(v.y > 0.0);
    }

    #[test]
    fn test_direction_on_disc_zeroes_third_component() {
        let mut sampler = Sampler::seeded(23);
        let v = sampler.random_direction_on_disc(Vec3::new(1.0, 1.0, 1.0), Vec3::ZERO, 3.0, 0.0);
        assert_eq!(v.z, 0.0);
    }

    #[test]
    fn test_pack_rgb() {
        assert_eq!(pack_rgb(Vec3::new(1.0, 0.0, 0.0)), (255 << 16) as f32);
        assert_eq!(pack_rgb(Vec3::ONE), 0x00FF_FFFF as f32);
        assert_eq!(pack_rgb(Vec3::ZERO), 0.0);
    }

    #[test]
    fn test_round_to_nearest_multiple() {
        assert_eq!(round_to_nearest_multiple(7.0, 5.0), 10.0);
        assert_eq!(round_to_nearest_multiple(10.0, 5.0), 10.0);
        assert_eq!(round_to_nearest_multiple(-7.0, 5.0), -5.0);
        assert_eq!(round_to_nearest_multiple(3.0, 0.0), 3.0);
    }

    #[test]
    fn test_seeded_sampler_is_reproducible() {
        let mut a = Sampler::seeded(42);
        let mut b = Sampler::seeded(42);
        for _ in 0..32 {
            assert_eq!(a.random(), b.random());
        }
    }
}
