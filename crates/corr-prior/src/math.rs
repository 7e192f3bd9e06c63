//! Guarded transcendental operations used during prior packaging.

use corr_core::gvar::Gvar;
use log::warn;

/// Logarithm that always yields a usable prior entry.
///
/// Degenerate inputs (non-positive or non-finite mean) are replaced by the
/// fixed fallback `log(1.0) +- log(1.9)`, a loosely constrained,
/// roughly-unit distribution. Prior construction must never abort on one
/// bad correlator; an uninformative entry is always preferable.
pub fn safelog(x: &Gvar) -> Gvar {
    let logx = x.ln();
    if logx.mean().is_finite() {
        logx
    } else {
        warn!("invalid argument for log ({x}) - replacing with log(1.0) +- log(1.9)");
        Gvar::new(0.0, 1.9_f64.ln())
    }
}

/// Remaps a distrusted estimate to sit one sigma above a zero buffer.
///
/// Given an estimate with mean `m` and width `s`, the result is
/// `(zb / (1 - s/m), zb / (m/s - 1))`: its mean minus its width equals `zb`
/// while the fractional spread of the input survives. The remap encodes
/// "only the rough scale and spread of this estimate are trustworthy".
///
/// The formula is singular at `s == m` and meaningless for `s >= m` or a
/// non-positive mean; those cases collapse to `(zb, zb)`, the loosest
/// value the remap can produce.
pub fn zero_buffered(estimate: &Gvar, zero_buffer: f64) -> Gvar {
    let m = estimate.mean();
    let s = estimate.sdev();
    if !m.is_finite() || !s.is_finite() || m <= 0.0 || s >= m {
        warn!("estimate {estimate} is consistent with zero - buffering at {zero_buffer}");
        return Gvar::new(zero_buffer, zero_buffer);
    }
    Gvar::new(zero_buffer / (1.0 - s / m), zero_buffer / (m / s - 1.0))
}
