//! Particle groups: shared storage and per-frame orchestration.
//!
//! A [`Group`] owns the canonical [`AttributeSet`] every member emitter
//! writes into, assigns each emitter a contiguous slot range, and drives
//! the per-frame tick: age and activate particles, merge each emitter's
//! dirty ranges into the shared channels, and flag what the renderer must
//! upload.
//!
//! # Renderer handoff
//!
//! After a tick, [`Group::for_each_pending_upload`] yields, per channel,
//! the buffer contents as bytes plus the dirty byte range;
//! [`Group::draw_count`] is the number of elements to draw. The group
//! never issues draw calls itself.
//!
//! # Pooling
//!
//! Emitters can be pre-created and parked in a free-list for reuse:
//!
//! ```ignore
//! let mut group = Group::new(GroupConfig::default());
//! group.add_pool(3, EmitterConfig::new().with_duration(0.5), false);
//!
//! // One-shot effect at a position; auto-released when it burns out.
//! group.trigger_pool_emitter(1, Some(Vec3::new(0.0, 2.0, 0.0)));
//! ```

use crate::attribute::{AttributeKey, AttributeSet, NamedAttribute, UploadRange};
use crate::config::{EmitterConfig, GroupConfig};
use crate::emitter::{Emitter, EmitterId};
use crate::time::Clock;
use crate::visuals::RenderSettings;
use glam::Vec3;

/// Outcome of a pool trigger request.
///
/// Running out of pooled emitters is an ordinary result, not a failure;
/// callers decide whether to retry, grow the pool, or drop the effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolTrigger {
    /// This many emitters were acquired and enabled.
    Fired(usize),
    /// The pool was empty and auto-create is disabled.
    Unavailable,
}

/// A scheduled pool return, armed by `trigger_pool_emitter`.
#[derive(Debug, Clone, Copy)]
struct PendingRelease {
    id: EmitterId,
    fire_at: f32,
}

/// A collection of emitters sharing one set of attribute buffers.
pub struct Group {
    clock: Clock,
    max_particle_count: Option<usize>,
    capacity_warned: bool,
    render: RenderSettings,

    emitters: Vec<Emitter>,
    pool: Vec<EmitterId>,
    pool_creation_settings: Option<EmitterConfig>,
    create_new_when_pool_empty: bool,
    pending_releases: Vec<PendingRelease>,

    attributes: AttributeSet,
    particle_count: usize,

    attributes_need_refresh: bool,
    attributes_need_dynamic_reset: bool,
}

impl Group {
    pub fn new(config: GroupConfig) -> Self {
        Self {
            clock: Clock::new(config.fixed_time_step),
            max_particle_count: config.max_particle_count,
            capacity_warned: false,
            render: config.render,
            emitters: Vec::new(),
            pool: Vec::new(),
            pool_creation_settings: None,
            create_new_when_pool_empty: false,
            pending_releases: Vec::new(),
            attributes: AttributeSet::new(),
            particle_count: 0,
            attributes_need_refresh: false,
            attributes_need_dynamic_reset: false,
        }
    }

    // ========== Accessors ==========

    /// Total particle slots across member emitters.
    #[inline]
    pub fn particle_count(&self) -> usize {
        self.particle_count
    }

    /// Number of elements the renderer should draw.
    #[inline]
    pub fn draw_count(&self) -> usize {
        self.particle_count
    }

    /// Soft capacity cap, if configured.
    #[inline]
    pub fn max_particle_count(&self) -> Option<usize> {
        self.max_particle_count
    }

    /// Rendering hints for the renderer collaborator.
    #[inline]
    pub fn render_settings(&self) -> &RenderSettings {
        &self.render
    }

    /// Cumulative simulated seconds.
    #[inline]
    pub fn run_time(&self) -> f32 {
        self.clock.run_time()
    }

    /// Delta applied by the most recent tick.
    #[inline]
    pub fn delta_time(&self) -> f32 {
        self.clock.delta()
    }

    /// The canonical attribute channels.
    #[inline]
    pub fn attributes(&self) -> &AttributeSet {
        &self.attributes
    }

    /// One canonical channel.
    #[inline]
    pub fn attribute(&self, key: AttributeKey) -> &NamedAttribute {
        self.attributes.get(key)
    }

    /// A member emitter by id.
    pub fn emitter(&self, id: EmitterId) -> Option<&Emitter> {
        self.emitters.iter().find(|e| e.id() == id)
    }

    /// Mutable access to a member emitter, for live property edits and
    /// enable/disable.
    pub fn emitter_mut(&mut self, id: EmitterId) -> Option<&mut Emitter> {
        self.emitters.iter_mut().find(|e| e.id() == id)
    }

    /// Member emitters in slice order.
    pub fn emitters(&self) -> impl Iterator<Item = &Emitter> {
        self.emitters.iter()
    }

    /// Number of emitters parked in the pool.
    #[inline]
    pub fn pool_len(&self) -> usize {
        self.pool.len()
    }

    // ========== Membership ==========

    /// Add an emitter, assigning it the next contiguous slot range and
    /// eagerly populating every slot with freshly sampled values.
    ///
    /// Exceeding the capacity cap warns once and continues; the single
    /// full-buffer upload afterward is cheaper than tracking the scattered
    /// ranges a fresh slice would produce.
    pub fn add_emitter(&mut self, mut emitter: Emitter) -> EmitterId {
        let start = self.particle_count;
        self.particle_count = start + emitter.particle_count();

        if let Some(max) = self.max_particle_count {
            if self.particle_count > max && !self.capacity_warned {
                log::warn!(
                    "max_particle_count exceeded: requesting {} particles, can support only {}",
                    self.particle_count,
                    max
                );
                self.capacity_warned = true;
            }
        }

        emitter.attach(start);

        let slots = self.max_particle_count.unwrap_or(self.particle_count);
        self.attributes.ensure_size(slots);
        emitter.populate_slice(&mut self.attributes);

        let id = emitter.id();
        self.emitters.push(emitter);
        self.attributes_need_refresh = true;
        id
    }

    /// Remove a member emitter: kill its slice, compact every attribute
    /// buffer, and hand the emitter back detached. Returns `None` (and
    /// logs) if `id` is not a member.
    pub fn remove_emitter(&mut self, id: EmitterId) -> Option<Emitter> {
        let Some(index) = self.emitters.iter().position(|e| e.id() == id) else {
            log::error!("emitter {id:?} is not a member of this group; will not remove");
            return None;
        };

        let slice = self.emitters[index].slice();

        {
            let data = self
                .attributes
                .get_mut(AttributeKey::Params)
                .buffer_mut()
                .as_mut_slice();
            for i in slice.clone() {
                let base = i * 4;
                if base + 1 < data.len() {
                    data[base] = 0.0;
                    data[base + 1] = 0.0;
                }
            }
        }

        for key in AttributeKey::ALL {
            self.attributes.get_mut(key).splice(slice.start, slice.end);
        }

        self.particle_count -= self.emitters[index].particle_count();
        self.pool.retain(|&pooled| pooled != id);
        self.pending_releases.retain(|pending| pending.id != id);

        let mut emitter = self.emitters.remove(index);
        emitter.detach();
        self.attributes_need_refresh = true;
        Some(emitter)
    }

    // ========== Pooling ==========

    /// Acquire an emitter from the pool, creating and adding a new one
    /// from the stored settings when the pool is empty and auto-create is
    /// on. Returns `None` when nothing is available.
    pub fn get_from_pool(&mut self) -> Option<EmitterId> {
        if let Some(id) = self.pool.pop() {
            return Some(id);
        }
        if self.create_new_when_pool_empty {
            if let Some(config) = self.pool_creation_settings.clone() {
                return Some(self.add_emitter(Emitter::new(config)));
            }
        }
        None
    }

    /// Park a member emitter in the pool after a soft reset. Returns
    /// `false` (and logs) if `id` is not a member.
    pub fn release_into_pool(&mut self, id: EmitterId) -> bool {
        let Self {
            emitters,
            attributes,
            pool,
            ..
        } = self;

        let Some(emitter) = emitters.iter_mut().find(|e| e.id() == id) else {
            log::error!("emitter {id:?} is not a member of this group; will not release");
            return false;
        };

        emitter.reset(false, attributes);
        pool.insert(0, id);
        true
    }

    /// Bulk-create `count` emitters from `config`, add them as members,
    /// and park them all in the pool. `create_new` controls whether a
    /// later [`get_from_pool`](Self::get_from_pool) on an empty pool may
    /// construct more.
    pub fn add_pool(&mut self, count: usize, config: EmitterConfig, create_new: bool) {
        self.pool_creation_settings = Some(config.clone());
        self.create_new_when_pool_empty = create_new;

        for _ in 0..count {
            let id = self.add_emitter(Emitter::new(config.clone()));
            self.release_into_pool(id);
        }
    }

    /// Acquire and enable `count` pooled emitters, optionally moving each
    /// to `position` first. Each acquisition arms a deferred pool return
    /// that fires once the emitter has burned out.
    pub fn trigger_pool_emitter(&mut self, count: usize, position: Option<Vec3>) -> PoolTrigger {
        let mut fired = 0;

        for _ in 0..count.max(1) {
            let Some(id) = self.get_from_pool() else {
                log::warn!("emitter pool ran out");
                break;
            };

            let now = self.clock.run_time();
            let Some(emitter) = self.emitters.iter_mut().find(|e| e.id() == id) else {
                continue;
            };

            if let Some(position) = position {
                emitter.set_position_value(position);
            }
            emitter.enable();

            let lifetime = emitter
                .duration()
                .unwrap_or(0.0)
                .max(emitter.max_age().value + emitter.max_age().spread);
            self.pending_releases.push(PendingRelease {
                id,
                fire_at: now + lifetime,
            });
            fired += 1;
        }

        if fired == 0 {
            PoolTrigger::Unavailable
        } else {
            PoolTrigger::Fired(fired)
        }
    }

    /// Disable and re-park emitters whose deferred release has come due.
    /// A release whose emitter was removed in the meantime is a no-op.
    fn process_pending_releases(&mut self) {
        let now = self.clock.run_time();
        if self.pending_releases.iter().all(|p| p.fire_at > now) {
            return;
        }

        let due: Vec<EmitterId> = self
            .pending_releases
            .iter()
            .filter(|p| p.fire_at <= now)
            .map(|p| p.id)
            .collect();
        self.pending_releases.retain(|p| p.fire_at > now);

        for id in due {
            let Self {
                emitters,
                attributes,
                pool,
                ..
            } = self;
            if let Some(emitter) = emitters.iter_mut().find(|e| e.id() == id) {
                emitter.disable();
                emitter.reset(false, attributes);
                pool.insert(0, id);
            }
        }
    }

    // ========== Per-frame orchestration ==========

    /// Advance the simulation one frame. With `None`, the group's fixed
    /// timestep is used.
    pub fn tick(&mut self, dt: Option<f32>) {
        let delta = self.clock.advance(dt);

        self.process_pending_releases();
        self.attributes.reset_update_ranges();

        if self.emitters.is_empty()
            && !self.attributes_need_refresh
            && !self.attributes_need_dynamic_reset
        {
            return;
        }

        let Self {
            emitters,
            attributes,
            ..
        } = self;

        for emitter in emitters.iter_mut() {
            emitter.tick(delta, attributes);

            for key in AttributeKey::ALL {
                let range = emitter.update_ranges()[key.index()];
                if range.is_touched() {
                    let attribute = attributes.get_mut(key);
                    attribute.set_update_range(range.min, range.max);
                    attribute.flag_update();
                }
            }
        }

        if self.attributes_need_dynamic_reset {
            for key in AttributeKey::ALL {
                self.attributes.get_mut(key).reset_dynamic();
            }
            self.attributes_need_dynamic_reset = false;
        }

        if self.attributes_need_refresh {
            for key in AttributeKey::ALL {
                self.attributes.get_mut(key).force_update_all();
            }
            self.attributes_need_refresh = false;
            self.attributes_need_dynamic_reset = true;
        }
    }

    /// Visit every channel with a pending upload, yielding its contents
    /// as bytes and the dirty byte range, then clear the pending flags.
    pub fn for_each_pending_upload(&mut self, mut f: impl FnMut(AttributeKey, &[u8], UploadRange)) {
        for key in AttributeKey::ALL {
            let attribute = self.attributes.get_mut(key);
            if let Some(range) = attribute.pending_upload() {
                f(key, attribute.bytes(), range);
                attribute.acknowledge_upload();
            }
        }
    }

    /// Release renderer-visible resources. Simulation state stays valid;
    /// pending pool returns are cancelled.
    pub fn dispose(&mut self) {
        self.pending_releases.clear();
        for key in AttributeKey::ALL {
            self.attributes.get_mut(key).release_handle();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EmitterConfig;

    fn small_emitter(count: usize) -> Emitter {
        Emitter::new(
            EmitterConfig::new()
                .with_particle_count(count)
                .with_max_age(2.0, 0.0),
        )
        .with_seed(5)
    }

    #[test]
    fn test_consecutive_emitters_get_disjoint_ordered_slices() {
        let mut group = Group::new(GroupConfig::default());
        let a = group.add_emitter(small_emitter(10));
        let b = group.add_emitter(small_emitter(20));
        let c = group.add_emitter(small_emitter(5));

        let sa = group.emitter(a).unwrap().slice();
        let sb = group.emitter(b).unwrap().slice();
        let sc = group.emitter(c).unwrap().slice();

        assert_eq!(sa, 0..10);
        assert_eq!(sb, 10..30);
        assert_eq!(sc, 30..35);
        assert_eq!(group.particle_count(), 35);
    }

    #[test]
    fn test_buffers_sized_to_cap_when_configured() {
        let mut group = Group::new(GroupConfig::new().with_max_particle_count(64));
        group.add_emitter(small_emitter(10));
        assert_eq!(
            group.attribute(AttributeKey::Position).buffer().element_len(),
            64
        );
    }

    #[test]
    fn test_exceeding_cap_warns_but_continues() {
        let mut group = Group::new(GroupConfig::new().with_max_particle_count(8));
        group.add_emitter(small_emitter(10));
        assert_eq!(group.particle_count(), 10);
    }

    #[test]
    fn test_remove_unknown_emitter_is_rejected() {
        let mut group = Group::new(GroupConfig::default());
        group.add_emitter(small_emitter(10));

        let mut other = Group::new(GroupConfig::default());
        let foreign = other.add_emitter(small_emitter(4));

        assert!(group.remove_emitter(foreign).is_none());
        assert_eq!(group.particle_count(), 10);
    }

    #[test]
    fn test_remove_compacts_buffers_and_detaches() {
        let mut group = Group::new(GroupConfig::default());
        let a = group.add_emitter(small_emitter(10));
        let b = group.add_emitter(small_emitter(10));

        group.tick(Some(0.5));

        let removed = group.remove_emitter(b).unwrap();
        assert!(!removed.is_attached());
        assert_eq!(group.particle_count(), 10);
        assert_eq!(
            group.attribute(AttributeKey::Params).buffer().element_len(),
            10
        );
        assert!(group.emitter(a).is_some());

        // The detached emitter can join another group.
        let mut other = Group::new(GroupConfig::default());
        let readded = other.add_emitter(removed);
        assert_eq!(other.emitter(readded).unwrap().slice(), 0..10);
    }

    #[test]
    fn test_remove_zeroes_alive_flags_before_compacting() {
        let mut group = Group::new(GroupConfig::new().with_max_particle_count(20));
        let a = group.add_emitter(small_emitter(10));
        group.tick(Some(1.0));
        assert!(group.emitter(a).unwrap().active_particle_count() > 0);

        group.remove_emitter(a).unwrap();

        // Buffers stay sized to the cap; the reclaimed region reads dead.
        let params = group.attribute(AttributeKey::Params).buffer();
        for i in 0..params.element_len() {
            assert_eq!(params.value_at(i * 4), Some(0.0));
        }
    }

    #[test]
    fn test_offsets_are_not_recomputed_after_remove() {
        // Compaction shifts surviving data down, but later emitters keep
        // their original offsets. Documented behavior; see DESIGN.md.
        let mut group = Group::new(GroupConfig::default());
        let a = group.add_emitter(small_emitter(10));
        let b = group.add_emitter(small_emitter(10));

        group.remove_emitter(a).unwrap();
        assert_eq!(group.emitter(b).unwrap().slice(), 10..20);
        assert_eq!(group.particle_count(), 10);
    }

    #[test]
    fn test_structural_change_forces_full_upload_then_reverts() {
        let mut group = Group::new(GroupConfig::default());
        group.add_emitter(small_emitter(10));

        group.tick(Some(0.016));
        let position = group.attribute(AttributeKey::Position);
        assert!(position.handle().needs_update());
        assert_eq!(position.handle().usage(), crate::attribute::BufferUsage::Stream);

        // Uploads consumed; next tick reverts the usage hint.
        group.for_each_pending_upload(|_, _, _| {});
        group.tick(Some(0.016));
        assert_eq!(
            group.attribute(AttributeKey::Position).handle().usage(),
            crate::attribute::BufferUsage::Static
        );
    }

    #[test]
    fn test_tick_uses_fixed_step_fallback() {
        let mut group = Group::new(GroupConfig::new().with_fixed_time_step(0.25));
        group.add_emitter(small_emitter(10));
        group.tick(None);
        assert_eq!(group.delta_time(), 0.25);
        assert!((group.run_time() - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_pool_acquire_release_order() {
        let mut group = Group::new(GroupConfig::default());
        group.add_pool(3, EmitterConfig::new().with_particle_count(4), false);
        assert_eq!(group.pool_len(), 3);
        assert_eq!(group.particle_count(), 12);

        let first = group.get_from_pool().unwrap();
        assert_eq!(group.pool_len(), 2);

        group.release_into_pool(first);
        assert_eq!(group.pool_len(), 3);
    }

    #[test]
    fn test_pool_exhaustion_is_unavailable_not_panic() {
        let mut group = Group::new(GroupConfig::default());
        group.add_pool(1, EmitterConfig::new().with_particle_count(4), false);

        assert_eq!(group.trigger_pool_emitter(1, None), PoolTrigger::Fired(1));
        assert_eq!(
            group.trigger_pool_emitter(1, None),
            PoolTrigger::Unavailable
        );
    }

    #[test]
    fn test_pool_auto_create_grows_group() {
        let mut group = Group::new(GroupConfig::default());
        group.add_pool(1, EmitterConfig::new().with_particle_count(4), true);

        group.get_from_pool().unwrap();
        let extra = group.get_from_pool().unwrap();
        assert!(group.emitter(extra).is_some());
        assert_eq!(group.particle_count(), 8);
    }

    #[test]
    fn test_trigger_repositions_and_schedules_release() {
        let mut group = Group::new(GroupConfig::default());
        group.add_pool(
            1,
            EmitterConfig::new()
                .with_particle_count(4)
                .with_max_age(0.5, 0.0),
            false,
        );

        let outcome = group.trigger_pool_emitter(1, Some(Vec3::new(3.0, 0.0, 0.0)));
        assert_eq!(outcome, PoolTrigger::Fired(1));
        assert_eq!(group.pool_len(), 0);

        // After the emitter's lifetime passes, it returns to the pool.
        group.tick(Some(0.3));
        assert_eq!(group.pool_len(), 0);
        group.tick(Some(0.3));
        assert_eq!(group.pool_len(), 1);
    }

    #[test]
    fn test_pending_release_tolerates_removed_emitter() {
        let mut group = Group::new(GroupConfig::default());
        group.add_pool(
            1,
            EmitterConfig::new()
                .with_particle_count(4)
                .with_max_age(0.5, 0.0),
            false,
        );

        group.trigger_pool_emitter(1, None);
        let id = group.emitters().next().unwrap().id();
        group.remove_emitter(id).unwrap();

        // Removal cancels the armed release; nothing fires later.
        group.tick(Some(1.0));
        assert_eq!(group.pool_len(), 0);
        assert_eq!(group.particle_count(), 0);
    }

    #[test]
    fn test_dispose_cancels_pending_releases() {
        let mut group = Group::new(GroupConfig::default());
        group.add_pool(
            1,
            EmitterConfig::new()
                .with_particle_count(4)
                .with_max_age(0.5, 0.0),
            false,
        );
        group.trigger_pool_emitter(1, None);

        group.dispose();
        group.tick(Some(1.0));
        assert_eq!(group.pool_len(), 0);
    }
}
