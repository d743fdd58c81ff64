//! Quantile-based abstention: return nothing rather than weak matches.

/// Value at quantile `q` (0..=1) with linear interpolation between order
/// statistics. `None` for an empty input.
pub fn quantile(values: &[f32], q: f32) -> Option<f32> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f32::total_cmp);
    #[allow(clippy::cast_precision_loss)]
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f32;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let lo = pos.floor() as usize;
    let hi = (lo + 1).min(sorted.len() - 1);
    #[allow(clippy::cast_precision_loss)]
    let frac = pos - lo as f32;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// True when the best score is strictly below `quantile(scores, q) + delta`.
/// Never abstains on an empty distribution.
pub fn should_abstain(scores: &[f32], q: f32, delta: f32) -> bool {
    let Some(bar) = quantile(scores, q) else {
        return false;
    };
    let best = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    best < bar + delta
}
