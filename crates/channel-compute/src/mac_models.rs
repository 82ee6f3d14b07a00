//! C5: statistical MAC activity models. These produce the `active_prob` fed
//! into [`crate::interference::Interferer`] rather than simulating a real
//! MAC state machine.

use channel_model::{CsmaConfig, TdmaConfig, TdmaMode};

/// CSMA/CA: an interferer within carrier-sense range of the receiver defers
/// and is treated as silent; beyond that range it transmits at its
/// configured traffic load (the hidden-terminal case).
pub fn csma_activity_prob(distance_m: f64, comm_range_m: f64, config: &CsmaConfig) -> f64 {
    if !config.enabled {
        return 1.0;
    }
    let sense_range = comm_range_m * config.carrier_sense_range_multiplier;
    if distance_m < sense_range {
        0.0
    } else {
        config.traffic_load
    }
}

/// TDMA: activity probability derived from whether the interferer's assigned
/// slot(s) overlap the receiver's own slot.
pub fn tdma_activity_prob(
    config: &TdmaConfig,
    interferer_slots: &[u32],
    own_slots: &[u32],
) -> f64 {
    if !config.enabled {
        return 1.0;
    }
    match config.slot_assignment_mode {
        TdmaMode::Fixed => {
            let overlap = interferer_slots.iter().any(|s| own_slots.contains(s));
            if overlap {
                1.0
            } else {
                0.0
            }
        }
        // Orthogonal slot rotation: no interferer ever shares the receiver's slot.
        TdmaMode::RoundRobin => 0.0,
        TdmaMode::Random => config.slot_probability.unwrap_or(0.0),
        TdmaMode::Distributed => config.slot_probability.unwrap_or(0.0) * 0.5,
    }
}

/// Throughput multiplier for a node running TDMA, given its own owned slots.
pub fn tdma_throughput_multiplier(config: &TdmaConfig, own_slots: &[u32], num_nodes: u32) -> f64 {
    match config.slot_assignment_mode {
        TdmaMode::Fixed => own_slots.len() as f64 / config.num_slots.max(1) as f64,
        TdmaMode::RoundRobin => 1.0 / num_nodes.max(1) as f64,
        TdmaMode::Random | TdmaMode::Distributed => config.slot_probability.unwrap_or(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn csma(enabled: bool, multiplier: f64, load: f64) -> CsmaConfig {
        CsmaConfig {
            enabled,
            carrier_sense_range_multiplier: multiplier,
            traffic_load: load,
        }
    }

    #[test]
    fn csma_within_sense_range_is_silent() {
        let config = csma(true, 2.5, 0.3);
        assert_eq!(csma_activity_prob(10.0, 10.0, &config), 0.0);
    }

    #[test]
    fn csma_beyond_sense_range_uses_traffic_load() {
        let config = csma(true, 2.5, 0.3);
        assert_eq!(csma_activity_prob(100.0, 10.0, &config), 0.3);
    }

    #[test]
    fn csma_disabled_always_active() {
        let config = csma(false, 2.5, 0.3);
        assert_eq!(csma_activity_prob(1.0, 10.0, &config), 1.0);
    }

    fn tdma(mode: TdmaMode, slot_probability: Option<f64>) -> TdmaConfig {
        TdmaConfig {
            enabled: true,
            num_slots: 4,
            frame_duration_ms: 10.0,
            slot_assignment_mode: mode,
            fixed_slot_map: None,
            slot_probability,
        }
    }

    #[test]
    fn fixed_tdma_overlap_forces_activity() {
        let config = tdma(TdmaMode::Fixed, None);
        assert_eq!(tdma_activity_prob(&config, &[0, 1], &[1, 2]), 1.0);
    }

    #[test]
    fn fixed_tdma_no_overlap_is_silent() {
        let config = tdma(TdmaMode::Fixed, None);
        assert_eq!(tdma_activity_prob(&config, &[0], &[1, 2]), 0.0);
    }

    #[test]
    fn random_tdma_uses_slot_probability() {
        let config = tdma(TdmaMode::Random, Some(0.4));
        assert_eq!(tdma_activity_prob(&config, &[0], &[1]), 0.4);
    }

    #[test]
    fn round_robin_is_always_silent_even_on_slot_overlap() {
        let config = tdma(TdmaMode::RoundRobin, None);
        assert_eq!(tdma_activity_prob(&config, &[0, 1], &[1, 2]), 0.0);
    }

    #[test]
    fn distributed_applies_coordination_factor() {
        let config = tdma(TdmaMode::Distributed, Some(0.4));
        assert_eq!(tdma_activity_prob(&config, &[0], &[1]), 0.2);
    }

    #[test]
    fn fixed_throughput_multiplier_is_slot_share() {
        let config = tdma(TdmaMode::Fixed, None);
        assert_eq!(tdma_throughput_multiplier(&config, &[0, 1], 3), 0.5);
    }

    #[test]
    fn round_robin_throughput_multiplier_is_inverse_node_count() {
        let config = tdma(TdmaMode::RoundRobin, None);
        assert_eq!(tdma_throughput_multiplier(&config, &[], 4), 0.25);
    }
}
