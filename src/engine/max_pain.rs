use crate::error::{ChainError, Result};
use crate::model::{MaxPainResult, ValuationProfile};

/// Candidate points on each side of the discrete minimum used for the fit.
pub const HALF_WINDOW: usize = 3;

/// Estimate the max-pain price of a valuation profile.
///
/// Takes the candidate with the smallest total payout, fits a parabola by
/// least squares to the points within [`HALF_WINDOW`] indices of it, and
/// returns the vertex. The window is clipped to the profile, so a minimum
/// at either end is fitted with the in-range points only.
pub fn estimate(profile: &ValuationProfile) -> Result<MaxPainResult> {
    let (lo, hi) = window(profile)?;
    let (xs, ys) = (&profile.prices[lo..hi], &profile.total_payout[lo..hi]);
    let coeffs = fit_quadratic(xs, ys)?;
    ensure_curved(coeffs[2], xs, ys)?;
    Ok(MaxPainResult {
        price: Some(vertex(coeffs)?),
    })
}

/// Half-open index range `[lo, hi)` of the fit window.
pub fn window(profile: &ValuationProfile) -> Result<(usize, usize)> {
    if profile.prices.len() != profile.total_payout.len() {
        return Err(ChainError::parse(format!(
            "{} prices but {} payouts",
            profile.prices.len(),
            profile.total_payout.len()
        )));
    }
    let m = profile
        .total_payout
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, _)| i)
        .ok_or_else(|| ChainError::DegenerateFit("empty valuation profile".into()))?;

    let lo = m.saturating_sub(HALF_WINDOW);
    let hi = (m + HALF_WINDOW + 1).min(profile.prices.len());
    Ok((lo, hi))
}

/// Ordinary least-squares fit of `y = c0 + c1 x + c2 x^2`.
///
/// Builds the normal equations from the power sums `Σu^0..Σu^4` and the
/// moments `Σy u^p` of `u = x - mean(x)`, solves the 3×3 system, then maps
/// the coefficients back to `x`. Centering keeps the system well
/// conditioned when prices are far from zero.
pub fn fit_quadratic(xs: &[f64], ys: &[f64]) -> Result<[f64; 3]> {
    if xs.len() != ys.len() {
        return Err(ChainError::DegenerateFit(format!(
            "{} x values but {} y values",
            xs.len(),
            ys.len()
        )));
    }
    let mut distinct: Vec<f64> = xs.to_vec();
    distinct.sort_by(f64::total_cmp);
    distinct.dedup();
    if distinct.len() < 3 {
        return Err(ChainError::DegenerateFit(format!(
            "{} distinct price points, need at least 3",
            distinct.len()
        )));
    }

    let shift = xs.iter().sum::<f64>() / xs.len() as f64;
    let mut power = [0.0f64; 5];
    let mut moment = [0.0f64; 3];
    for (&x, &y) in xs.iter().zip(ys) {
        let u = x - shift;
        let mut up = 1.0;
        for (p, sum) in power.iter_mut().enumerate() {
            *sum += up;
            if p < 3 {
                moment[p] += y * up;
            }
            up *= u;
        }
    }

    let a = [
        [power[0], power[1], power[2]],
        [power[1], power[2], power[3]],
        [power[2], power[3], power[4]],
    ];
    let [a0, a1, a2] = solve3(a, moment)?;
    Ok([
        a0 - a1 * shift + a2 * shift * shift,
        a1 - 2.0 * a2 * shift,
        a2,
    ])
}

/// Vertex `-c1 / (2 c2)` of a fitted parabola.
pub fn vertex([_, c1, c2]: [f64; 3]) -> Result<f64> {
    let x = -c1 / (2.0 * c2);
    if c2 == 0.0 || !x.is_finite() {
        return Err(ChainError::DegenerateFit(format!(
            "quadratic coefficient {c2} has no vertex"
        )));
    }
    Ok(x)
}

/// Rejects a fit whose quadratic term is negligible over the window, where
/// the vertex would be an artifact of rounding.
fn ensure_curved(c2: f64, xs: &[f64], ys: &[f64]) -> Result<()> {
    let span = xs.iter().fold(f64::NEG_INFINITY, |m, &x| m.max(x))
        - xs.iter().fold(f64::INFINITY, |m, &x| m.min(x));
    let y_scale = ys.iter().fold(0.0f64, |m, &y| m.max(y.abs()));
    if c2.abs() * span * span <= 1e-9 * y_scale || c2 == 0.0 {
        return Err(ChainError::DegenerateFit(format!(
            "quadratic coefficient {c2:e} is negligible over the window"
        )));
    }
    Ok(())
}

/// Gaussian elimination with partial pivoting.
fn solve3(mut a: [[f64; 3]; 3], mut b: [f64; 3]) -> Result<[f64; 3]> {
    let scale = a
        .iter()
        .flatten()
        .fold(0.0f64, |m, v| m.max(v.abs()));
    let eps = scale * 1e-13;

    for col in 0..3 {
        let pivot = (col..3)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .unwrap_or(col);
        if a[pivot][col].abs() <= eps {
            return Err(ChainError::DegenerateFit("singular normal equations".into()));
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in col + 1..3 {
            let f = a[row][col] / a[col][col];
            for k in col..3 {
                a[row][k] -= f * a[col][k];
            }
            b[row] -= f * b[col];
        }
    }

    let mut x = [0.0f64; 3];
    for row in (0..3).rev() {
        let tail: f64 = (row + 1..3).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    if x.iter().any(|v| !v.is_finite()) {
        return Err(ChainError::DegenerateFit("non-finite solution".into()));
    }
    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solve3_identity() {
        let a = [[1.0, 0.0, 0.0], [0.0, 2.0, 0.0], [0.0, 0.0, 4.0]];
        let x = solve3(a, [1.0, 1.0, 1.0]).unwrap();
        assert_eq!(x, [1.0, 0.5, 0.25]);
    }

    #[test]
    fn test_solve3_needs_pivoting() {
        // Zero in the leading position forces a row swap.
        let a = [[0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]];
        let x = solve3(a, [2.0, 3.0, 4.0]).unwrap();
        assert_eq!(x, [3.0, 2.0, 4.0]);
    }

    #[test]
    fn test_solve3_singular() {
        let r = solve3([[1.0, 2.0, 3.0], [2.0, 4.0, 6.0], [0.0, 0.0, 1.0]], [1.0, 2.0, 3.0]);
        assert!(matches!(r, Err(ChainError::DegenerateFit(_))));
    }
}
