//! Queries over a ledger read back from disk.

use pcal_results::{Ledger, LedgerRow};

/// Best rows of one basin, highest NSE first.
#[derive(Debug, Clone, PartialEq)]
pub struct BasinRanking {
    /// `None` for single-basin ledgers
    pub basin: Option<String>,
    pub rows: Vec<LedgerRow>,
}

/// Top `top` scored rows per basin by NSE. Ties keep ledger order; failed
/// rows never rank.
pub fn best_trials(ledger: &Ledger, top: usize) -> Vec<BasinRanking> {
    let mut rankings: Vec<BasinRanking> = Vec::new();
    for (row, _) in ledger.scored() {
        let pos = match rankings.iter().position(|r| r.basin == row.basin) {
            Some(pos) => pos,
            None => {
                rankings.push(BasinRanking {
                    basin: row.basin.clone(),
                    rows: Vec::new(),
                });
                rankings.len() - 1
            }
        };
        rankings[pos].rows.push(row.clone());
    }

    for ranking in &mut rankings {
        ranking.rows.sort_by(|a, b| {
            let nse = |r: &LedgerRow| r.scores().map(|s| s.nse).unwrap_or(f64::NEG_INFINITY);
            nse(b).total_cmp(&nse(a))
        });
        ranking.rows.truncate(top);
    }
    rankings
}

#[cfg(test)]
mod tests {
    use super::*;
    use pcal_grid::CurveNumbers;
    use pcal_results::{LedgerScores, RowOutcome};

    fn row(trial: u32, nse: Option<f64>, basin: &str) -> LedgerRow {
        LedgerRow {
            trial,
            curve_numbers: CurveNumbers::new(72, 81, 88, 91).unwrap(),
            infiltration_mm_day: 10.0 + f64::from(trial),
            outcome: match nse {
                Some(nse) => RowOutcome::Scored(LedgerScores {
                    nse,
                    pbias: 0.0,
                    rsr: 0.5,
                    r2: 0.9,
                }),
                None => RowOutcome::Failed,
            },
            basin: Some(basin.to_string()),
        }
    }

    #[test]
    fn ranks_each_basin_separately() {
        let ledger = Ledger {
            site: None,
            period: None,
            rows: vec![
                row(0, Some(0.2), "Hen"),
                row(0, Some(0.9), "Plume"),
                row(1, Some(0.7), "Hen"),
                row(1, None, "Plume"),
                row(2, Some(-1.5), "Hen"),
                row(2, Some(0.95), "Plume"),
            ],
        };

        let best = best_trials(&ledger, 2);
        assert_eq!(best.len(), 2);
        assert_eq!(best[0].basin.as_deref(), Some("Hen"));
        let hen: Vec<u32> = best[0].rows.iter().map(|r| r.trial).collect();
        assert_eq!(hen, vec![1, 0]);
        let plume: Vec<u32> = best[1].rows.iter().map(|r| r.trial).collect();
        assert_eq!(plume, vec![2, 0]);
    }

    #[test]
    fn failed_only_ledger_has_no_rankings() {
        let ledger = Ledger {
            site: None,
            period: None,
            rows: vec![row(0, None, "Hen")],
        };
        assert!(best_trials(&ledger, 5).is_empty());
    }
}
