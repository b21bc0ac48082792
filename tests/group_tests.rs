//! Integration tests for group simulation.
//!
//! These drive whole groups through multi-frame scenarios: lifecycle
//! cycling, distribution guarantees, pooling, and the renderer handoff.

use embers::{
    AttributeKey, Distribution, Emitter, EmitterConfig, Group, GroupConfig, PoolTrigger,
    VectorProp, Vec3,
};

fn box_emitter(count: usize, max_age: f32) -> Emitter {
    Emitter::new(
        EmitterConfig::new()
            .with_particle_count(count)
            .with_max_age(max_age, 0.0),
    )
    .with_seed(1234)
}

// ============================================================================
// Lifecycle scenarios
// ============================================================================

#[test]
fn test_particles_cycle_through_death_and_respawn() {
    let mut group = Group::new(GroupConfig::new().with_max_particle_count(100));
    let id = group.add_emitter(box_emitter(10, 2.0));
    let slice = group.emitter(id).unwrap().slice();

    let mut alive_history = Vec::new();
    for _ in 0..6 {
        group.tick(Some(1.0));

        let params = group.attribute(AttributeKey::Params).buffer();
        let emitter = group.emitter(id).unwrap();

        // Ages never exceed the configured lifetime, and the live count
        // never exceeds the emitter's slot count.
        for i in slice.clone() {
            let age = params.value_at(i * 4 + 1).unwrap();
            assert!(age <= 2.0 + 1e-5, "age {age} exceeded max_age");
        }
        assert!(emitter.active_particle_count() <= 10);

        alive_history.push(params.value_at(slice.start * 4).unwrap());
    }

    // The first slot was activated, died, and respawned.
    let first_alive = alive_history.iter().position(|&a| a == 1.0).unwrap();
    let died = alive_history[first_alive..]
        .iter()
        .position(|&a| a == 0.0)
        .map(|p| p + first_alive)
        .expect("slot never died");
    assert!(
        alive_history[died..].iter().any(|&a| a == 1.0),
        "slot never respawned after dying"
    );
}

#[test]
fn test_active_count_reaches_slot_count_then_recycles() {
    let mut group = Group::new(GroupConfig::default());
    let id = group.add_emitter(box_emitter(10, 2.0));

    group.tick(Some(1.0));
    group.tick(Some(1.0));
    assert_eq!(group.emitter(id).unwrap().active_particle_count(), 10);

    // Two more seconds: the first wave has expired, the cursor wrapped.
    group.tick(Some(1.0));
    group.tick(Some(1.0));
    let active = group.emitter(id).unwrap().active_particle_count();
    assert!(active <= 10);
    assert!(active > 0);
}

// ============================================================================
// Distribution scenarios
// ============================================================================

#[test]
fn test_line_distribution_positions_stay_on_segment() {
    let mut group = Group::new(GroupConfig::default());
    let id = group.add_emitter(
        Emitter::new(
            EmitterConfig::new()
                .with_particle_count(1000)
                .with_distribution(Distribution::Line)
                .with_position(VectorProp {
                    value: Vec3::ZERO,
                    spread: Vec3::new(10.0, 0.0, 0.0), // line end point
                    ..VectorProp::default()
                }),
        )
        .with_seed(7),
    );

    let positions = group.attribute(AttributeKey::Position).buffer();
    for i in group.emitter(id).unwrap().slice() {
        let x = positions.value_at(i * 3).unwrap();
        let y = positions.value_at(i * 3 + 1).unwrap();
        let z = positions.value_at(i * 3 + 2).unwrap();
        assert_eq!(y, 0.0);
        assert_eq!(z, 0.0);
        assert!((0.0..=10.0).contains(&x), "x = {x} off the segment");
    }
}

#[test]
fn test_sphere_distribution_positions_lie_on_radius() {
    let mut group = Group::new(GroupConfig::default());
    let center = Vec3::new(1.0, 2.0, 3.0);
    let id = group.add_emitter(
        Emitter::new(
            EmitterConfig::new()
                .with_particle_count(200)
                .with_distribution(Distribution::Sphere)
                .with_position(VectorProp {
                    value: center,
                    spread: Vec3::ZERO,
                    radius: 4.0,
                    ..VectorProp::default()
                }),
        )
        .with_seed(7),
    );

    let positions = group.attribute(AttributeKey::Position).buffer();
    for i in group.emitter(id).unwrap().slice() {
        let p = Vec3::new(
            positions.value_at(i * 3).unwrap(),
            positions.value_at(i * 3 + 1).unwrap(),
            positions.value_at(i * 3 + 2).unwrap(),
        );
        assert!(((p - center).length() - 4.0).abs() < 1e-3);
    }
}

// ============================================================================
// Pooling scenarios
// ============================================================================

#[test]
fn test_pool_of_three_rejects_fourth_trigger() {
    let mut group = Group::new(GroupConfig::default());
    group.add_pool(
        3,
        EmitterConfig::new()
            .with_particle_count(8)
            .with_max_age(1.0, 0.0),
        false,
    );

    for _ in 0..3 {
        assert_eq!(group.trigger_pool_emitter(1, None), PoolTrigger::Fired(1));
    }
    assert_eq!(group.trigger_pool_emitter(1, None), PoolTrigger::Unavailable);
}

#[test]
fn test_triggered_emitters_return_to_pool_and_refire() {
    let mut group = Group::new(GroupConfig::default());
    group.add_pool(
        2,
        EmitterConfig::new()
            .with_particle_count(8)
            .with_max_age(0.5, 0.0),
        false,
    );

    assert_eq!(group.trigger_pool_emitter(2, None), PoolTrigger::Fired(2));
    assert_eq!(group.pool_len(), 0);

    // Burn past both lifetimes; the deferred releases fire in tick.
    group.tick(Some(0.6));
    assert_eq!(group.pool_len(), 2);

    assert_eq!(group.trigger_pool_emitter(1, None), PoolTrigger::Fired(1));
}

// ============================================================================
// Renderer handoff
// ============================================================================

#[test]
fn test_upload_ranges_cover_touched_slots_only() {
    let mut group = Group::new(GroupConfig::default());
    group.add_emitter(box_emitter(100, 2.0));

    // First tick after a structural change uploads everything.
    group.tick(Some(0.016));
    let mut uploaded = Vec::new();
    group.for_each_pending_upload(|key, bytes, range| {
        assert!(range.byte_offset + range.byte_len <= bytes.len());
        uploaded.push(key);
    });
    assert!(uploaded.contains(&AttributeKey::Params));
    assert!(uploaded.contains(&AttributeKey::Position));

    // Steady state: only channels touched by aging/activation re-upload.
    group.tick(Some(0.016));
    let mut steady = Vec::new();
    group.for_each_pending_upload(|key, bytes, range| {
        assert!(range.byte_offset + range.byte_len <= bytes.len());
        steady.push(key);
    });
    assert!(steady.contains(&AttributeKey::Params));

    // Nothing pending once acknowledged and no further tick has run.
    let mut again = 0;
    group.for_each_pending_upload(|_, _, _| again += 1);
    assert_eq!(again, 0);
}

#[test]
fn test_draw_count_tracks_membership() {
    let mut group = Group::new(GroupConfig::default());
    assert_eq!(group.draw_count(), 0);

    let a = group.add_emitter(box_emitter(10, 2.0));
    group.add_emitter(box_emitter(20, 2.0));
    assert_eq!(group.draw_count(), 30);

    group.remove_emitter(a).unwrap();
    assert_eq!(group.draw_count(), 20);
}
