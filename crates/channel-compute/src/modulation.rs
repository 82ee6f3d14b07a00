//! C3: modulation BER, FEC coding gain, BER -> BLER -> PER, and effective
//! throughput.

use crate::error::ComputeError;
use mcs_table::FecType;

/// Complementary error function via the Abramowitz & Stegun 7.1.26
/// rational approximation (max error ~1.5e-7), adequate for AWGN BER work.
fn erfc(x: f64) -> f64 {
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + 0.3275911 * x);
    let poly = t
        * (0.254829592
            + t * (-0.284496736
                + t * (1.421413741 + t * (-1.453152027 + t * 1.061405429))));
    let erf = 1.0 - poly * (-x * x).exp();
    1.0 - sign * erf
}

fn q_function(x: f64) -> f64 {
    0.5 * erfc(x / std::f64::consts::SQRT_2)
}

/// Bits per symbol for a modulation name like `"BPSK"`, `"QPSK"`, `"16QAM"`.
fn bits_per_symbol(modulation: &str) -> Result<u32, ComputeError> {
    match modulation.to_ascii_uppercase().as_str() {
        "BPSK" => Ok(1),
        "QPSK" => Ok(2),
        "16QAM" => Ok(4),
        "64QAM" => Ok(6),
        "256QAM" => Ok(8),
        "1024QAM" => Ok(10),
        other => Err(ComputeError::UnknownModulation(other.to_string())),
    }
}

/// AWGN bit error rate for BPSK/QPSK/M-QAM, from the effective (post
/// coding-gain) SNR in dB.
pub fn ber_for_modulation(modulation: &str, effective_snr_db: f64) -> Result<f64, ComputeError> {
    let bps = bits_per_symbol(modulation)?;
    let snr_linear = 10f64.powf(effective_snr_db / 10.0);
    let ber = match bps {
        1 => q_function((2.0 * snr_linear).sqrt()),
        2 => q_function((2.0 * snr_linear).sqrt()),
        bps => {
            let m = 2f64.powi(bps as i32);
            let k = bps as f64;
            // Standard square-QAM approximation.
            (4.0 / k) * (1.0 - 1.0 / m.sqrt()) * q_function((3.0 * k * snr_linear / (m - 1.0)).sqrt())
        }
    };
    Ok(ber.clamp(0.0, 0.5))
}

/// FEC coding gain in dB, interpolated between the rate-1/2 and rate-3/4
/// LDPC anchor points and offset per FEC family.
pub fn coding_gain_db(fec_type: FecType, code_rate: f64) -> f64 {
    if matches!(fec_type, FecType::None) {
        return 0.0;
    }
    let r = code_rate.clamp(0.5, 0.75);
    let frac = (r - 0.5) / 0.25;
    let ldpc_gain = 6.5 + frac * (4.2 - 6.5);
    match fec_type {
        FecType::Ldpc => ldpc_gain,
        FecType::Polar => ldpc_gain - 0.5,
        FecType::Turbo => ldpc_gain - 1.0,
        FecType::None => 0.0,
    }
}

pub const DEFAULT_BLOCK_BITS: u32 = 1000;

#[derive(Debug, Clone, Copy)]
pub struct ModulationResult {
    pub ber: f64,
    pub bler: f64,
    pub per: f64,
    pub effective_rate_mbps: f64,
}

/// BER -> BLER -> PER pipeline for one MCS choice, plus the effective
/// throughput it implies over `bandwidth_hz`.
pub fn evaluate_mcs(
    modulation: &str,
    code_rate: f64,
    fec_type: FecType,
    snr_db: f64,
    bandwidth_hz: f64,
    block_bits: u32,
) -> Result<ModulationResult, ComputeError> {
    let gain_db = coding_gain_db(fec_type, code_rate);
    let ber = ber_for_modulation(modulation, snr_db + gain_db)?;
    let bler = 1.0 - (1.0 - ber).powi(block_bits as i32);
    let bler = bler.clamp(0.0, 1.0);
    let per = bler;
    let bps = bits_per_symbol(modulation)? as f64;
    let effective_rate_mbps =
        (bandwidth_hz * bps * code_rate * 0.8 * (1.0 - per)) / 1_000_000.0;
    Ok(ModulationResult {
        ber,
        bler,
        per,
        effective_rate_mbps: effective_rate_mbps.max(0.0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ber_decreases_as_snr_increases() {
        let low = ber_for_modulation("QPSK", 0.0).unwrap();
        let high = ber_for_modulation("QPSK", 20.0).unwrap();
        assert!(high < low);
    }

    #[test]
    fn higher_order_modulation_has_worse_ber_at_same_snr() {
        let qpsk = ber_for_modulation("QPSK", 15.0).unwrap();
        let qam64 = ber_for_modulation("64QAM", 15.0).unwrap();
        assert!(qam64 > qpsk);
    }

    #[test]
    fn ldpc_gain_drops_from_low_to_high_code_rate() {
        let low_rate_gain = coding_gain_db(FecType::Ldpc, 0.5);
        let high_rate_gain = coding_gain_db(FecType::Ldpc, 0.75);
        assert!(low_rate_gain > high_rate_gain);
    }

    #[test]
    fn polar_and_turbo_trail_ldpc_at_same_rate() {
        let ldpc = coding_gain_db(FecType::Ldpc, 0.5);
        let polar = coding_gain_db(FecType::Polar, 0.5);
        let turbo = coding_gain_db(FecType::Turbo, 0.5);
        assert!(polar < ldpc);
        assert!(turbo < ldpc);
    }

    #[test]
    fn none_fec_has_zero_gain() {
        assert_eq!(coding_gain_db(FecType::None, 0.5), 0.0);
    }

    #[test]
    fn evaluate_mcs_yields_lower_per_at_higher_snr() {
        let weak = evaluate_mcs("64QAM", 0.75, FecType::Ldpc, 10.0, 20e6, 1000).unwrap();
        let strong = evaluate_mcs("64QAM", 0.75, FecType::Ldpc, 30.0, 20e6, 1000).unwrap();
        assert!(strong.per < weak.per);
        assert!(strong.effective_rate_mbps > weak.effective_rate_mbps);
    }

    #[test]
    fn unknown_modulation_is_an_error() {
        assert!(ber_for_modulation("FOO", 10.0).is_err());
    }
}
