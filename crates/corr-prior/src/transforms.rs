//! Pure numeric transforms on correlator sequences.
//!
//! All operators take a correlator (time-ordered uncertain values) and
//! produce a new, usually shorter, sequence; nothing is mutated in place.
//! Inputs shorter than an operator's window produce an empty output.

use corr_core::errors::{CorrError, ErrorInfo};
use corr_core::gvar::Gvar;

/// Swaps the role of oscillating and non-oscillating states by mapping
/// `C(t) -> (-1)^(t+1) C(t)`. Length preserved; applying it twice restores
/// the input.
pub fn invertosc(c: &[Gvar]) -> Vec<Gvar> {
    c.iter()
        .enumerate()
        .map(|(t, value)| {
            if (t + 1) % 2 == 1 {
                -value.clone()
            } else {
                value.clone()
            }
        })
        .collect()
}

/// Applies the superaverage `C(t) -> (C(t) + C(t+1)) / 2` a total of `n`
/// times. Each application shortens the sequence by one.
pub fn superav(c: &[Gvar], n: usize) -> Vec<Gvar> {
    let mut smoothed = c.to_vec();
    for _ in 0..n {
        smoothed = smoothed
            .windows(2)
            .map(|w| (w[0].clone() + w[1].clone()) * 0.5)
            .collect();
    }
    smoothed
}

/// Asymmetric second-order superaverage
/// `C(t) -> (2 C(t) + C(t+1) + C(t+2)) / 4`. Shortens the sequence by two;
/// suppresses excited-state contamination more strongly than [`superav`].
pub fn superav2(c: &[Gvar]) -> Vec<Gvar> {
    c.windows(3)
        .map(|w| (w[0].clone() * 2.0 + w[1].clone() + w[2].clone()) * 0.25)
        .collect()
}

/// Effective mass `m_eff(t) = log( C(t) / C(t+1) )`, with the ratio squared
/// and rooted first so slightly negative (oscillating) correlator values
/// cannot push a negative argument into the logarithm. Shortens by one.
pub fn effective_mass(c: &[Gvar]) -> Vec<Gvar> {
    c.windows(2)
        .map(|w| (w[0].clone() / w[1].clone()).powi(2).sqrt().ln())
        .collect()
}

/// Effective amplitude `a_eff(t) = sqrt( C(t) * exp(m_eff(t) * t) )`,
/// undoing the exponential decay to expose the prefactor per time slice.
pub fn effective_amp(c: &[Gvar]) -> Vec<Gvar> {
    effective_mass(c)
        .into_iter()
        .enumerate()
        .map(|(t, m)| (c[t].clone() * (m * t as f64).exp()).sqrt())
        .collect()
}

/// Effective amplitude of the superaveraged correlator, with the
/// closed-form factor `sqrt(2 / (1 + exp(-m)))` that cancels the amplitude
/// shift superaveraging induces on a single-exponential signal.
pub fn amp_superav(c: &[Gvar]) -> Vec<Gvar> {
    let smoothed = superav(c, 1);
    effective_mass(&smoothed)
        .into_iter()
        .enumerate()
        .map(|(t, m)| {
            let correction = 2.0 / (1.0 + (-m.clone()).exp());
            (smoothed[t].clone() * (m * t as f64).exp() * correction).sqrt()
        })
        .collect()
}

/// Effective amplitude of the second-order superaveraged correlator, with
/// the matching correction `sqrt(2 / (1 + (exp(-m) + exp(-2m)) / 2))`.
/// Exact for a single exponential; only approximate once excited states
/// contaminate the signal, which is acceptable for rough priors.
pub fn amp_superav2(c: &[Gvar]) -> Vec<Gvar> {
    let smoothed = superav2(c);
    effective_mass(&smoothed)
        .into_iter()
        .enumerate()
        .map(|(t, m)| {
            let correction =
                2.0 / (1.0 + ((-m.clone()).exp() + (m.clone() * -2.0).exp()) * 0.5);
            (smoothed[t].clone() * (m * t as f64).exp() * correction).sqrt()
        })
        .collect()
}

/// Transition-amplitude ratio
/// `R(t) = C3(t) / ( C2_1(T - t) * C2_2(t) )` for `t` in `0..T`, with the
/// standard time-reversal convention on the first 2-point correlator.
/// `C2_1` must span at least `T + 1` slices and `C2_2` at least `T`.
pub fn ratio(c3: &[Gvar], c2_1: &[Gvar], c2_2: &[Gvar]) -> Result<Vec<Gvar>, CorrError> {
    let separation = c3.len();
    if c2_1.len() < separation + 1 || c2_2.len() < separation {
        return Err(CorrError::Data(
            ErrorInfo::new(
                "ratio-window",
                "2-point correlators are too short for the 3-point separation",
            )
            .with_context("separation", separation.to_string())
            .with_context("len_2pt_1", c2_1.len().to_string())
            .with_context("len_2pt_2", c2_2.len().to_string()),
        ));
    }
    Ok((0..separation)
        .map(|t| c3[t].clone() / (c2_1[separation - t].clone() * c2_2[t].clone()))
        .collect())
}
