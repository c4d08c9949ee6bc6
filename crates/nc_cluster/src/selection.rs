use std::fmt;

use nc_core::KRange;

/// Picks the cluster count from the inertia curve of a k sweep.
pub trait KSelector: Send + Sync + fmt::Debug {
    /// How many k values below `range.min` the sweep should also fit.
    fn lookbehind(&self) -> usize {
        0
    }

    /// `inertias[i]` is the inertia of the fit with `ks[i]` clusters. The
    /// result must lie inside `range`.
    fn select_k(&self, inertias: &[f64], ks: &[usize], range: KRange) -> usize;
}

/// Elbow heuristic: the k where the inertia curve bends hardest, i.e. the
/// argmax of the absolute second difference shifted by one position.
///
/// The sweep includes one anchor fit at `range.min - 1`, so the bend can be
/// measured at `range.min` itself. The anchor biases the choice toward
/// `range.min`: the drop from the anchor to `range.min` is usually the
/// steepest on the curve, so a later elbow of almost equal bend loses to it.
/// Four equally spaced groups can come out as k = 2 for that reason.
#[derive(Debug, Clone, Copy, Default)]
pub struct ElbowSelector;

impl KSelector for ElbowSelector {
    fn lookbehind(&self) -> usize {
        1
    }

    fn select_k(&self, inertias: &[f64], ks: &[usize], range: KRange) -> usize {
        if inertias.len() < 3 || inertias.len() != ks.len() {
            return range.min;
        }

        let mut best_index = 0;
        let mut best_bend = f64::NEG_INFINITY;
        for (i, window) in inertias.windows(3).enumerate() {
            let bend = (window[2] - 2.0 * window[1] + window[0]).abs();
            if bend > best_bend {
                best_index = i;
                best_bend = bend;
            }
        }

        range.clamp(ks[best_index + 1])
    }
}
