/// Asserts that no live agent moves faster than its `max_speed`.
#[macro_export]
macro_rules! assert_speed_limited {
    ($sim:expr) => {
        for agent in $sim.registry().all() {
            assert!(
                agent.velocity.length() <= agent.params.max_speed + 1e-4,
                "{} speed {} exceeds {}",
                agent.id,
                agent.velocity.length(),
                agent.params.max_speed
            );
        }
    };
}

/// Asserts that every live agent sits inside the wrap-around map.
#[macro_export]
macro_rules! assert_in_bounds {
    ($sim:expr) => {
        for agent in $sim.registry().all() {
            assert!(
                agent.params.bounds.contains(agent.position),
                "{} at {:?} is outside the map",
                agent.id,
                agent.position
            );
        }
    };
}

/// Asserts the current state of one predator.
#[macro_export]
macro_rules! assert_predator_state {
    ($sim:expr, $id:expr, $state:expr) => {
        let predator = $sim.predator($id).expect("Predator not found");
        assert_eq!(
            predator.state, $state,
            "{} is in {} (energy {})",
            $id, predator.state, predator.energy
        );
    };
}

/// Asserts that every predator's energy is within `[0, max_energy]`.
#[macro_export]
macro_rules! assert_energy_bounded {
    ($sim:expr) => {
        for predator in $sim.predators() {
            assert!(
                (0.0..=predator.params.max_energy).contains(&predator.energy),
                "{} energy {} out of range",
                predator.id,
                predator.energy
            );
        }
    };
}
