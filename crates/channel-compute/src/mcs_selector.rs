//! C3: adaptive MCS selection with hysteresis, keyed per directional link so
//! that independent links don't perturb each other's state.

use channel_model::NodeId;
use dashmap::DashMap;
use mcs_table::McsTable;

pub const DEFAULT_HYSTERESIS_DB: f64 = 2.0;

#[derive(Debug, Clone, Copy)]
pub struct McsSelection {
    pub mcs_index: u32,
    /// `true` when `snr_db` fell below even the lowest MCS threshold; the
    /// selector still reports the lowest index, but the link should be
    /// flagged degraded upstream.
    pub below_floor: bool,
}

/// Per-link previous selection, so hysteresis has something to compare
/// against. One entry per `(tx, rx)` directional link.
#[derive(Debug, Default)]
pub struct McsSelector {
    state: DashMap<(NodeId, NodeId), u32>,
    hysteresis_db: f64,
}

impl McsSelector {
    pub fn new(hysteresis_db: f64) -> Self {
        Self {
            state: DashMap::new(),
            hysteresis_db,
        }
    }

    /// Select an MCS index for `(tx, rx)` given the current metric
    /// (SINR when available, SNR otherwise — the caller decides which to
    /// pass in, per the "never raw SNR once SINR is active" rule).
    pub fn select(&self, tx: &NodeId, rx: &NodeId, metric_db: f64, table: &McsTable) -> McsSelection {
        let key = (tx.clone(), rx.clone());
        let candidate = table.highest_supported(metric_db);

        let Some(candidate) = candidate else {
            let floor = table.min_index();
            self.state.insert(key, floor);
            return McsSelection {
                mcs_index: floor,
                below_floor: true,
            };
        };

        let previous = self.state.get(&key).map(|r| *r);
        let new_index = match previous {
            None => candidate.mcs_index,
            Some(prev_index) => {
                let prev_min_snr = table.get(prev_index).map(|e| e.min_snr_db).unwrap_or(f64::MIN);
                if metric_db < prev_min_snr {
                    // Downgrade is immediate.
                    candidate.mcs_index
                } else if candidate.min_snr_db >= prev_min_snr + self.hysteresis_db {
                    // Upgrade only once the margin clears hysteresis.
                    candidate.mcs_index
                } else {
                    prev_index
                }
            }
        };

        self.state.insert(key, new_index);
        McsSelection {
            mcs_index: new_index,
            below_floor: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use channel_model::NodeId;

    fn table() -> McsTable {
        mcs_table::wifi6_default_table()
    }

    #[test]
    fn below_floor_reports_lowest_index_and_flag() {
        let selector = McsSelector::new(DEFAULT_HYSTERESIS_DB);
        let tx = NodeId::from("a");
        let rx = NodeId::from("b");
        let selection = selector.select(&tx, &rx, -10.0, &table());
        assert_eq!(selection.mcs_index, 0);
        assert!(selection.below_floor);
    }

    #[test]
    fn initial_selection_picks_highest_supported() {
        let selector = McsSelector::new(DEFAULT_HYSTERESIS_DB);
        let tx = NodeId::from("a");
        let rx = NodeId::from("b");
        let selection = selector.select(&tx, &rx, 19.0, &table());
        assert_eq!(selection.mcs_index, 5);
    }

    #[test]
    fn small_upgrade_within_hysteresis_is_suppressed() {
        let selector = McsSelector::new(DEFAULT_HYSTERESIS_DB);
        let tx = NodeId::from("a");
        let rx = NodeId::from("b");
        // Lock onto MCS 5 (min_snr 18.0).
        selector.select(&tx, &rx, 18.0, &table());
        // MCS 6 needs 20.0; 19.5 clears the threshold but not +2dB hysteresis
        // above 18.0 (would need >= 20.0).
        let selection = selector.select(&tx, &rx, 19.5, &table());
        assert_eq!(selection.mcs_index, 5);
    }

    #[test]
    fn upgrade_past_hysteresis_margin_succeeds() {
        let selector = McsSelector::new(DEFAULT_HYSTERESIS_DB);
        let tx = NodeId::from("a");
        let rx = NodeId::from("b");
        selector.select(&tx, &rx, 18.0, &table());
        let selection = selector.select(&tx, &rx, 25.0, &table());
        assert_eq!(selection.mcs_index, 6);
    }

    #[test]
    fn downgrade_is_immediate() {
        let selector = McsSelector::new(DEFAULT_HYSTERESIS_DB);
        let tx = NodeId::from("a");
        let rx = NodeId::from("b");
        selector.select(&tx, &rx, 22.0, &table()); // MCS 7
        let selection = selector.select(&tx, &rx, 12.0, &table());
        assert_eq!(selection.mcs_index, 3);
    }

    #[test]
    fn independent_links_do_not_share_state() {
        let selector = McsSelector::new(DEFAULT_HYSTERESIS_DB);
        selector.select(&NodeId::from("a"), &NodeId::from("b"), 22.0, &table());
        let other = selector.select(&NodeId::from("c"), &NodeId::from("d"), 2.0, &table());
        assert_eq!(other.mcs_index, 0);
    }
}
