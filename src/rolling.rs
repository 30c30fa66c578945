// src/rolling.rs

use anyhow::Result;

use crate::convert::round1;
use crate::error::IndexError;

/// Samples in one averaging window (80 predecessors + current).
pub const WINDOW: usize = 81;

/// Weight of the k-th sample in the window, k = 0 oldest, k = 80 newest.
pub fn weight(k: usize) -> f64 {
    1.0 + (0.5 * k as f64) / (WINDOW - 1) as f64
}

/// Σ W(k) over the whole window.
pub fn weight_sum() -> f64 {
    (0..WINDOW).map(weight).sum()
}

/// Backward-weighted 81-sample average ending at `history[newest]`.
///
/// Fails with [`IndexError::InsufficientHistory`] unless `history` holds the
/// current sample plus 80 predecessors.
pub fn weighted_average(history: &[f64], newest: usize) -> Result<f64> {
    let available = if newest < history.len() { newest + 1 } else { 0 };
    if available < WINDOW {
        return Err(IndexError::InsufficientHistory {
            needed: WINDOW,
            available,
        }
        .into());
    }

    let window = &history[newest + 1 - WINDOW..=newest];
    let numerator: f64 = window
        .iter()
        .enumerate()
        .map(|(k, s)| s * weight(k))
        .sum();
    Ok(round1(numerator / weight_sum()))
}
