//! C2: link budget and SNR, given a path loss figure from C1.

const BOLTZMANN_DBM_HZ: f64 = -174.0;
const SPEED_OF_LIGHT_M_S: f64 = 299_792_458.0;

/// Free-space propagation delay for `distance_m`, in milliseconds. The spec
/// defines delay-spread separately for diagnostics; this is the `delay_ms`
/// carried in link state and compute responses.
pub fn propagation_delay_ms(distance_m: f64) -> f64 {
    (distance_m.max(0.0) / SPEED_OF_LIGHT_M_S) * 1000.0
}

/// Thermal noise floor in dBm: `-174 + 10*log10(B_Hz) + NF_dB`.
pub fn thermal_noise_dbm(bandwidth_hz: f64, noise_figure_db: f64) -> f64 {
    BOLTZMANN_DBM_HZ + 10.0 * bandwidth_hz.log10() + noise_figure_db
}

/// Received power and link SNR.
///
/// `g_tx_dbi`/`g_rx_dbi` must be `0.0` when the propagation engine already
/// embeds antenna gain into `path_loss_db` (see
/// [`crate::propagation::PropagationEngine::antenna_gain_embedded`]).
pub fn snr_link(
    tx_power_dbm: f64,
    g_tx_dbi: f64,
    g_rx_dbi: f64,
    path_loss_db: f64,
    bandwidth_hz: f64,
    noise_figure_db: f64,
) -> (f64, f64) {
    let rx_power_dbm = tx_power_dbm + g_tx_dbi + g_rx_dbi - path_loss_db;
    let noise_dbm = thermal_noise_dbm(bandwidth_hz, noise_figure_db);
    (rx_power_dbm, rx_power_dbm - noise_dbm)
}
