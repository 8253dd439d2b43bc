mod common;

use common::seeded_world;

#[test]
fn test_same_seed_same_run() {
    let mut a = seeded_world(42, 200);
    let mut b = seeded_world(42, 200);
    assert_eq!(a.snapshot(), b.snapshot());

    a.step_n(300, 1.0 / 30.0).unwrap();
    b.step_n(300, 1.0 / 30.0).unwrap();

    assert_eq!(a.snapshot(), b.snapshot());
    assert_eq!(a.state_hash(), b.state_hash());
    assert_eq!(a.observer().events, b.observer().events);
}

#[test]
fn test_state_hash_tracks_progress() {
    let mut sim = seeded_world(4, 30);
    let before = sim.state_hash();
    sim.step(1.0 / 30.0).unwrap();
    assert_ne!(before, sim.state_hash());
}

#[test]
fn test_different_seeds_diverge() {
    let a = seeded_world(1, 50);
    let b = seeded_world(2, 50);
    assert_ne!(a.snapshot(), b.snapshot());
}

#[test]
fn test_snapshot_json_roundtrip_after_run() {
    let mut sim = seeded_world(9, 40);
    sim.step_n(20, 1.0 / 30.0).unwrap();
    let snapshot = sim.snapshot();
    let json = snapshot.to_json().unwrap();
    let parsed = murmur_core::snapshot::SimulationSnapshot::from_json(&json).unwrap();
    assert_eq!(parsed.tick, 20);
    assert_eq!(parsed.agents.len(), sim.population());
}
