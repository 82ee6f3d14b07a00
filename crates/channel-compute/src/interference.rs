//! C4: ACLR attenuation and SINR aggregation across active interferers.

use channel_model::{InterferenceTerm, NodeId, Position, Regime};

/// Adjacent-channel leakage attenuation in dB for a frequency separation
/// `delta_f_hz` between a transmitter of bandwidth `b_tx_hz` and a receiver
/// of bandwidth `b_rx_hz`. `None` means the interferer is dropped entirely
/// (orthogonal / out of range).
pub fn aclr_db(delta_f_hz: f64, b_tx_hz: f64, b_rx_hz: f64) -> Option<f64> {
    let delta = delta_f_hz.abs();
    let orthogonal_cutoff = 2.0 * b_tx_hz.max(b_rx_hz);
    if delta > orthogonal_cutoff {
        return None;
    }

    let min_sep = (b_tx_hz + b_rx_hz) / 2.0;
    if delta < min_sep {
        return Some(0.0);
    }

    let t_start = b_tx_hz / 2.0;
    let bp1 = t_start + 40e6;
    let bp2 = t_start + 80e6;

    let value = if delta <= bp1 {
        let frac = ((delta - t_start) / (bp1 - t_start)).clamp(0.0, 1.0);
        lerp(20.0, 28.0, frac)
    } else if delta <= bp2 {
        let frac = ((delta - bp1) / (bp2 - bp1)).clamp(0.0, 1.0);
        lerp(28.0, 40.0, frac)
    } else {
        45.0
    };
    Some(value)
}

fn lerp(a: f64, b: f64, frac: f64) -> f64 {
    a + (b - a) * frac
}

#[derive(Debug, Clone)]
pub struct Interferer {
    pub node: NodeId,
    pub position: Position,
    pub tx_power_dbm: f64,
    pub g_tx_dbi: f64,
    pub frequency_hz: f64,
    pub bandwidth_hz: f64,
    /// MAC-model activity probability in `[0, 1]`; `0.0` means silenced.
    pub active_prob: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct ReceiverContext {
    pub position: Position,
    pub g_rx_dbi: f64,
    pub frequency_hz: f64,
    pub bandwidth_hz: f64,
    pub noise_dbm: f64,
    pub rx_sensitivity_dbm: f64,
}

#[derive(Debug, Clone)]
pub struct InterferenceResult {
    pub terms: Vec<InterferenceTerm>,
    pub sinr_db: f64,
    pub regime: Regime,
}

/// Aggregate interference at a receiver from a set of candidate interferers,
/// given a function that resolves path loss between two positions (the
/// propagation engine already selected for this request).
pub fn aggregate_interference(
    receiver: &ReceiverContext,
    signal_dbm: f64,
    interferers: &[Interferer],
    antenna_gain_embedded: bool,
    path_loss_fn: impl Fn(Position, Position) -> f64,
) -> InterferenceResult {
    let mut terms = Vec::new();
    let mut interference_linear_mw = 0.0;

    for interferer in interferers {
        if interferer.active_prob <= 0.0 {
            continue;
        }
        let delta_f = interferer.frequency_hz - receiver.frequency_hz;
        let Some(aclr) = aclr_db(delta_f, interferer.bandwidth_hz, receiver.bandwidth_hz) else {
            continue;
        };
        let path_loss_db = path_loss_fn(interferer.position, receiver.position);
        let (g_tx, g_rx) = if antenna_gain_embedded {
            (0.0, 0.0)
        } else {
            (interferer.g_tx_dbi, receiver.g_rx_dbi)
        };
        let power_dbm = interferer.tx_power_dbm + g_tx + g_rx - path_loss_db - aclr;
        if power_dbm < receiver.rx_sensitivity_dbm {
            continue;
        }

        interference_linear_mw += interferer.active_prob * 10f64.powf(power_dbm / 10.0);
        terms.push(InterferenceTerm {
            source_node: interferer.node.clone(),
            power_dbm,
            tx_frequency_hz: interferer.frequency_hz,
            tx_bandwidth_hz: interferer.bandwidth_hz,
            frequency_separation_hz: delta_f,
            aclr_db: aclr,
        });
    }

    let noise_linear_mw = 10f64.powf(receiver.noise_dbm / 10.0);
    let total_linear_mw = noise_linear_mw + interference_linear_mw;
    let sinr_db = signal_dbm - 10.0 * total_linear_mw.log10();

    let interference_dbm = if interference_linear_mw > 0.0 {
        10.0 * interference_linear_mw.log10()
    } else {
        f64::NEG_INFINITY
    };
    let regime = if interference_dbm < receiver.noise_dbm - 10.0 {
        Regime::NoiseLimited
    } else if interference_dbm > receiver.noise_dbm + 10.0 {
        Regime::InterferenceLimited
    } else {
        Regime::Mixed
    };

    InterferenceResult {
        terms,
        sinr_db,
        regime,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn co_channel_has_zero_aclr() {
        assert_eq!(aclr_db(0.0, 20e6, 20e6), Some(0.0));
    }

    #[test]
    fn far_enough_interferer_is_dropped() {
        assert_eq!(aclr_db(1_000e6, 20e6, 20e6), None);
    }

    #[test]
    fn aclr_increases_with_separation() {
        let near = aclr_db(30e6, 20e6, 20e6).unwrap();
        let far = aclr_db(70e6, 20e6, 20e6).unwrap();
        assert!(far > near);
    }

    #[test]
    fn aclr_symmetric_for_equal_bandwidths() {
        let a = aclr_db(50e6, 20e6, 20e6);
        let b = aclr_db(50e6, 20e6, 20e6);
        assert_eq!(a, b);
        let swapped = aclr_db(-50e6, 20e6, 20e6);
        assert_eq!(a, swapped);
    }

    fn ctx() -> ReceiverContext {
        ReceiverContext {
            position: Position::origin(),
            g_rx_dbi: 0.0,
            frequency_hz: 5.18e9,
            bandwidth_hz: 20e6,
            noise_dbm: -94.0,
            rx_sensitivity_dbm: -90.0,
        }
    }

    #[test]
    fn no_interferers_is_noise_limited() {
        let result = aggregate_interference(&ctx(), -60.0, &[], false, |_, _| 80.0);
        assert_eq!(result.regime, Regime::NoiseLimited);
        assert!(result.terms.is_empty());
    }

    #[test]
    fn strong_close_interferer_drives_interference_limited() {
        let interferers = vec![Interferer {
            node: NodeId::from("jammer"),
            position: Position::new(5.0, 0.0, 0.0),
            tx_power_dbm: 30.0,
            g_tx_dbi: 0.0,
            frequency_hz: 5.18e9,
            bandwidth_hz: 20e6,
            active_prob: 1.0,
        }];
        let result = aggregate_interference(&ctx(), -60.0, &interferers, false, |_, _| 30.0);
        assert_eq!(result.terms.len(), 1);
        assert_eq!(result.regime, Regime::InterferenceLimited);
    }

    #[test]
    fn silenced_interferer_is_excluded() {
        let interferers = vec![Interferer {
            node: NodeId::from("silent"),
            position: Position::new(5.0, 0.0, 0.0),
            tx_power_dbm: 30.0,
            g_tx_dbi: 0.0,
            frequency_hz: 5.18e9,
            bandwidth_hz: 20e6,
            active_prob: 0.0,
        }];
        let result = aggregate_interference(&ctx(), -60.0, &interferers, false, |_, _| 30.0);
        assert!(result.terms.is_empty());
    }
}
