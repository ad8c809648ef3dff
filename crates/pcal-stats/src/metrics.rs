//! Hydrological fit metrics.

use crate::{FitError, FitResult};

/// Minimum series length; the sample standard deviation needs two values.
const MIN_LEN: usize = 2;

/// Fit statistics of one basin for one trial.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitStatistics {
    /// Nash-Sutcliffe efficiency. Range: (-inf, 1], 1 = perfect.
    pub nse: f64,
    /// Percent bias. Optimal = 0. Positive = underestimation.
    pub pbias: f64,
    /// Root mean square error, in the units of the series.
    pub rmse: f64,
    /// RMSE over the observed sample standard deviation.
    pub rsr: f64,
    /// Coefficient of determination (squared Pearson correlation).
    pub r2: f64,
}

/// Score a simulated series against observations.
///
/// Fails instead of truncating when the lengths differ, and refuses
/// observations that would make NSE, PBIAS or RSR undefined.
pub fn evaluate(observed: &[f64], simulated: &[f64]) -> FitResult<FitStatistics> {
    if observed.len() != simulated.len() {
        return Err(FitError::LengthMismatch {
            observed: observed.len(),
            simulated: simulated.len(),
        });
    }
    if observed.len() < MIN_LEN {
        return Err(FitError::TooShort {
            len: observed.len(),
            min: MIN_LEN,
        });
    }
    ensure_all_finite("observed", observed)?;
    ensure_all_finite("simulated", simulated)?;

    let sd = sample_std_dev(observed);
    if sd == 0.0 {
        return Err(FitError::DegenerateObserved {
            reason: "all values are equal",
        });
    }
    if observed.iter().sum::<f64>() == 0.0 {
        return Err(FitError::DegenerateObserved {
            reason: "values sum to zero",
        });
    }

    let rmse = rmse(observed, simulated);
    Ok(FitStatistics {
        nse: nse(observed, simulated),
        pbias: pbias(observed, simulated),
        rmse,
        rsr: rmse / sd,
        r2: r_squared(observed, simulated),
    })
}

fn ensure_all_finite(series: &'static str, values: &[f64]) -> FitResult<()> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(FitError::NonFinite {
            series,
            index,
            value: values[index],
        }),
        None => Ok(()),
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Nash-Sutcliffe efficiency.
pub fn nse(observed: &[f64], simulated: &[f64]) -> f64 {
    let mean_obs = mean(observed);
    let numerator: f64 = observed
        .iter()
        .zip(simulated)
        .map(|(o, s)| (o - s).powi(2))
        .sum();
    let denominator: f64 = observed.iter().map(|o| (o - mean_obs).powi(2)).sum();
    1.0 - numerator / denominator
}

/// Percent bias, `100 * sum(obs - sim) / sum(obs)`.
pub fn pbias(observed: &[f64], simulated: &[f64]) -> f64 {
    let sum_obs: f64 = observed.iter().sum();
    let diff_sum: f64 = observed.iter().zip(simulated).map(|(o, s)| o - s).sum();
    100.0 * diff_sum / sum_obs
}

/// Root mean square error.
pub fn rmse(observed: &[f64], simulated: &[f64]) -> f64 {
    let mse: f64 = observed
        .iter()
        .zip(simulated)
        .map(|(o, s)| (o - s).powi(2))
        .sum::<f64>()
        / observed.len() as f64;
    mse.sqrt()
}

/// Sample standard deviation (n - 1 denominator).
pub fn sample_std_dev(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (ss / (n - 1) as f64).sqrt()
}

/// Squared Pearson correlation of observed vs simulated.
///
/// A constant series has no correlation and scores 0.
pub fn r_squared(observed: &[f64], simulated: &[f64]) -> f64 {
    let mean_o = mean(observed);
    let mean_s = mean(simulated);
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (o, s) in observed.iter().zip(simulated) {
        let dx = o - mean_o;
        let dy = s - mean_s;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return 0.0;
    }
    let r = (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0);
    r * r
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn self_comparison_is_perfect(values in prop::collection::vec(0.0f64..1.0e4, 2..60)) {
            prop_assume!(sample_std_dev(&values) > 1e-6);
            let stats = evaluate(&values, &values).unwrap();
            prop_assert_eq!(stats.nse, 1.0);
            prop_assert_eq!(stats.pbias, 0.0);
            prop_assert_eq!(stats.rmse, 0.0);
            prop_assert!((stats.r2 - 1.0).abs() < 1e-9);
        }

        #[test]
        fn nse_never_exceeds_one(
            pairs in prop::collection::vec((0.0f64..1.0e3, 0.0f64..1.0e3), 2..60)
        ) {
            let (obs, sim): (Vec<f64>, Vec<f64>) = pairs.into_iter().unzip();
            if let Ok(stats) = evaluate(&obs, &sim) {
                prop_assert!(stats.nse <= 1.0);
                prop_assert!(stats.rmse >= 0.0);
                prop_assert!((0.0..=1.0).contains(&stats.r2));
            }
        }
    }
}
