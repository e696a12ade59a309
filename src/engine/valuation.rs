use crate::error::Result;
use crate::model::{StrikeSeries, ValuationProfile};

/// Payout owed to holders of every option in the chain, at each candidate
/// settlement price.
///
/// Candidates are the sorted distinct strikes of both sides. A call pays
/// `(P - strike) * oi` when its strike is strictly below `P`; a put pays
/// `(strike - P) * oi` when its strike is strictly above `P`.
pub fn value(calls: &StrikeSeries, puts: &StrikeSeries) -> Result<ValuationProfile> {
    let call_strikes = calls.strikes()?;
    let call_oi = calls.open_interest()?;
    let put_strikes = puts.strikes()?;
    let put_oi = puts.open_interest()?;

    let mut prices: Vec<f64> = call_strikes.iter().chain(put_strikes).copied().collect();
    prices.sort_by(f64::total_cmp);
    prices.dedup();

    let mut profile = ValuationProfile {
        call_payout: Vec::with_capacity(prices.len()),
        put_payout: Vec::with_capacity(prices.len()),
        total_payout: Vec::with_capacity(prices.len()),
        prices: Vec::new(),
    };

    for &p in &prices {
        let call: f64 = call_strikes
            .iter()
            .zip(call_oi)
            .filter(|&(&k, _)| k < p)
            .map(|(&k, &oi)| (p - k) * oi as f64)
            .sum();
        let put: f64 = put_strikes
            .iter()
            .zip(put_oi)
            .filter(|&(&k, _)| k > p)
            .map(|(&k, &oi)| (k - p) * oi as f64)
            .sum();
        profile.call_payout.push(call);
        profile.put_payout.push(put);
        profile.total_payout.push(call + put);
    }
    profile.prices = prices;

    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_union_of_strikes() {
        let calls = StrikeSeries::from_strikes(vec![15.0, 10.0], vec![1, 1]).unwrap();
        let puts = StrikeSeries::from_strikes(vec![10.0, 25.0], vec![1, 1]).unwrap();
        let profile = value(&calls, &puts).unwrap();
        assert_eq!(profile.prices, vec![10.0, 15.0, 25.0]);
        assert_eq!(profile.total_payout.len(), 3);
    }
}
