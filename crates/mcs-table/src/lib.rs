//! MCS table: `mcs_index, modulation, code_rate, fec_type, bandwidth_mhz, min_snr_db`.
//!
//! The table is a finite ordered set; the selector in `channel-compute` relies on
//! `min_snr_db` being monotone non-decreasing in `mcs_index`, which this crate
//! enforces at load time rather than trusting every caller to re-check it.

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum McsTableError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("empty MCS table")]
    Empty,

    #[error("min_snr_db is not monotone non-decreasing at mcs_index {0}")]
    NotMonotone(u32),

    #[error("unknown fec_type '{0}'")]
    UnknownFecType(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FecType {
    None,
    Ldpc,
    Turbo,
    Polar,
}

impl FecType {
    fn parse(s: &str) -> Result<Self, McsTableError> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(FecType::None),
            "ldpc" => Ok(FecType::Ldpc),
            "turbo" => Ok(FecType::Turbo),
            "polar" => Ok(FecType::Polar),
            other => Err(McsTableError::UnknownFecType(other.to_string())),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawRow {
    mcs_index: u32,
    modulation: String,
    code_rate: f64,
    fec_type: String,
    bandwidth_mhz: f64,
    min_snr_db: f64,
}

#[derive(Debug, Clone)]
pub struct McsEntry {
    pub mcs_index: u32,
    pub modulation: String,
    pub code_rate: f64,
    pub fec_type: FecType,
    pub bandwidth_mhz: f64,
    pub min_snr_db: f64,
}

#[derive(Debug, Clone)]
pub struct McsTable {
    /// Ordered ascending by `mcs_index`.
    entries: Vec<McsEntry>,
}

impl McsTable {
    pub fn from_csv_str(data: &str) -> Result<Self, McsTableError> {
        let mut reader = csv::Reader::from_reader(data.as_bytes());
        let mut entries = Vec::new();
        for result in reader.deserialize() {
            let row: RawRow = result?;
            entries.push(McsEntry {
                mcs_index: row.mcs_index,
                modulation: row.modulation,
                code_rate: row.code_rate,
                fec_type: FecType::parse(&row.fec_type)?,
                bandwidth_mhz: row.bandwidth_mhz,
                min_snr_db: row.min_snr_db,
            });
        }
        Self::from_entries(entries)
    }

    pub fn from_entries(mut entries: Vec<McsEntry>) -> Result<Self, McsTableError> {
        if entries.is_empty() {
            return Err(McsTableError::Empty);
        }
        entries.sort_by_key(|e| e.mcs_index);
        for window in entries.windows(2) {
            if window[1].min_snr_db < window[0].min_snr_db {
                return Err(McsTableError::NotMonotone(window[1].mcs_index));
            }
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[McsEntry] {
        &self.entries
    }

    pub fn get(&self, mcs_index: u32) -> Option<&McsEntry> {
        self.entries.iter().find(|e| e.mcs_index == mcs_index)
    }

    pub fn min_index(&self) -> u32 {
        self.entries.first().map(|e| e.mcs_index).unwrap_or(0)
    }

    pub fn max_index(&self) -> u32 {
        self.entries.last().map(|e| e.mcs_index).unwrap_or(0)
    }

    /// The highest `mcs_index` whose `min_snr_db <= snr_db`, ignoring hysteresis.
    /// `None` if even the lowest entry's threshold is not met.
    pub fn highest_supported(&self, snr_db: f64) -> Option<&McsEntry> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.min_snr_db <= snr_db)
    }
}

/// A minimal WiFi-6-class table used as a default/fixture, spanning
/// MCS 0..=11 with typical 802.11ax AWGN thresholds at 80 MHz.
pub fn wifi6_default_table() -> McsTable {
    let rows: &[(u32, &str, f64, f64)] = &[
        (0, "BPSK", 0.5, 2.0),
        (1, "QPSK", 0.5, 5.0),
        (2, "QPSK", 0.75, 8.0),
        (3, "16QAM", 0.5, 11.0),
        (4, "16QAM", 0.75, 15.0),
        (5, "64QAM", 0.667, 18.0),
        (6, "64QAM", 0.75, 20.0),
        (7, "64QAM", 0.833, 22.0),
        (8, "256QAM", 0.75, 26.0),
        (9, "256QAM", 0.833, 29.0),
        (10, "1024QAM", 0.75, 33.0),
        (11, "1024QAM", 0.833, 36.0),
    ];
    let entries = rows
        .iter()
        .map(|(idx, modulation, code_rate, min_snr)| McsEntry {
            mcs_index: *idx,
            modulation: modulation.to_string(),
            code_rate: *code_rate,
            fec_type: FecType::Ldpc,
            bandwidth_mhz: 80.0,
            min_snr_db: *min_snr,
        })
        .collect();
    McsTable::from_entries(entries).expect("built-in table is monotone by construction")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_table() {
        assert!(matches!(
            McsTable::from_entries(vec![]),
            Err(McsTableError::Empty)
        ));
    }

    #[test]
    fn rejects_non_monotone_thresholds() {
        let entries = vec![
            McsEntry {
                mcs_index: 0,
                modulation: "BPSK".to_string(),
                code_rate: 0.5,
                fec_type: FecType::None,
                bandwidth_mhz: 20.0,
                min_snr_db: 10.0,
            },
            McsEntry {
                mcs_index: 1,
                modulation: "QPSK".to_string(),
                code_rate: 0.5,
                fec_type: FecType::None,
                bandwidth_mhz: 20.0,
                min_snr_db: 5.0,
            },
        ];
        assert!(matches!(
            McsTable::from_entries(entries),
            Err(McsTableError::NotMonotone(1))
        ));
    }

    #[test]
    fn loads_from_csv() {
        let csv = "mcs_index,modulation,code_rate,fec_type,bandwidth_mhz,min_snr_db\n\
                    0,BPSK,0.5,none,20.0,2.0\n\
                    1,QPSK,0.5,ldpc,20.0,5.0\n";
        let table = McsTable::from_csv_str(csv).unwrap();
        assert_eq!(table.entries().len(), 2);
        assert_eq!(table.get(1).unwrap().fec_type, FecType::Ldpc);
    }

    #[test]
    fn highest_supported_respects_threshold() {
        let table = wifi6_default_table();
        let entry = table.highest_supported(19.0).unwrap();
        assert_eq!(entry.mcs_index, 5);

        assert!(table.highest_supported(-10.0).is_none());
    }

    #[test]
    fn wifi6_default_is_monotone_and_spans_0_to_11() {
        let table = wifi6_default_table();
        assert_eq!(table.min_index(), 0);
        assert_eq!(table.max_index(), 11);
    }
}
