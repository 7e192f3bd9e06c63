use corr_core::gvar::Gvar;
use corr_prior::math::{safelog, zero_buffered};

#[test]
fn safelog_matches_the_direct_logarithm_for_positive_means() {
    let x = Gvar::new(2.0, 0.2);
    let logx = safelog(&x);
    assert!((logx.mean() - 2.0_f64.ln()).abs() < 1e-12);
    assert!((logx.sdev() - 0.1).abs() < 1e-12);
}

#[test]
fn safelog_substitutes_the_fixed_fallback_and_never_panics() {
    for bad in [
        Gvar::new(-1.0, 0.1),
        Gvar::exact(0.0),
        Gvar::new(f64::NAN, 0.1),
    ] {
        let fallback = safelog(&bad);
        assert_eq!(fallback.mean(), 0.0);
        assert!((fallback.sdev() - 1.9_f64.ln()).abs() < 1e-12);
    }
}

#[test]
fn zero_buffer_remap_sits_one_sigma_above_the_buffer() {
    let estimate = Gvar::new(1.0, 0.3);
    let buffered = zero_buffered(&estimate, 0.1);
    assert!((buffered.mean() - 0.1 / 0.7).abs() < 1e-12);
    assert!((buffered.sdev() - 0.1 / (1.0 / 0.3 - 1.0)).abs() < 1e-12);
    // mean minus one sigma lands exactly on the buffer
    assert!((buffered.mean() - buffered.sdev() - 0.1).abs() < 1e-12);
    // the fractional spread of the input survives
    let input_fraction = estimate.sdev() / estimate.mean();
    let output_fraction = buffered.sdev() / buffered.mean();
    assert!((input_fraction - output_fraction).abs() < 1e-12);
}

#[test]
fn zero_buffer_remap_collapses_for_untrustworthy_estimates() {
    for hopeless in [
        Gvar::new(0.2, 0.2),  // the singular point s == m
        Gvar::new(0.2, 0.5),  // wider than its own mean
        Gvar::new(-0.4, 0.1), // negative scale
        Gvar::exact(f64::NAN),
    ] {
        let buffered = zero_buffered(&hopeless, 0.1);
        assert_eq!(buffered.mean(), 0.1);
        assert!((buffered.sdev() - 0.1).abs() < 1e-12);
    }
}
