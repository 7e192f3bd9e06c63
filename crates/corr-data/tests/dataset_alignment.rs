use corr_core::rng::RngHandle;
use corr_data::dataset::Dataset;

fn sample_rows(offset: f64, nsamples: usize, length: usize) -> Vec<Vec<f64>> {
    (0..nsamples)
        .map(|s| (0..length).map(|t| offset + s as f64 + 0.1 * t as f64).collect())
        .collect()
}

#[test]
fn insertion_validates_cross_key_alignment() {
    let mut dataset = Dataset::new();
    dataset.insert("etac.ll", sample_rows(1.0, 4, 8)).unwrap();
    assert_eq!(dataset.nsamples(), 4);

    let err = dataset.insert("pi.ll", sample_rows(2.0, 3, 8)).unwrap_err();
    assert_eq!(err.info().code, "misaligned-samples");

    // a matching count is fine even with a different slice length
    dataset.insert("pi.ll", sample_rows(2.0, 4, 12)).unwrap();
    assert_eq!(dataset.len(), 2);
}

#[test]
fn insertion_rejects_ragged_and_empty_rows() {
    let mut dataset = Dataset::new();
    assert_eq!(
        dataset.insert("etac.ll", vec![]).unwrap_err().info().code,
        "empty-rows"
    );
    let ragged = vec![vec![1.0, 2.0], vec![1.0]];
    assert_eq!(
        dataset.insert("etac.ll", ragged).unwrap_err().info().code,
        "ragged-rows"
    );
}

#[test]
fn subset_draw_is_reproducible_and_bounded() {
    let mut dataset = Dataset::new();
    dataset.insert("etac.ll", sample_rows(1.0, 10, 6)).unwrap();

    let first = dataset.draw_subset(&mut RngHandle::from_seed(42), 4).unwrap();
    let second = dataset.draw_subset(&mut RngHandle::from_seed(42), 4).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.len(), 4);
    assert!(first.windows(2).all(|w| w[0] < w[1]));
    assert!(first.iter().all(|&idx| idx < 10));

    assert_eq!(
        dataset
            .draw_subset(&mut RngHandle::from_seed(1), 11)
            .unwrap_err()
            .info()
            .code,
        "subset-too-large"
    );
    assert_eq!(
        dataset
            .draw_subset(&mut RngHandle::from_seed(1), 0)
            .unwrap_err()
            .info()
            .code,
        "empty-subset"
    );
}

#[test]
fn row_averages_are_correlated_means() {
    let mut dataset = Dataset::new();
    dataset
        .insert("etac.ll", vec![vec![1.0, 3.0], vec![3.0, 5.0]])
        .unwrap();

    let averaged = dataset.average_rows("etac.ll", &[0, 1]).unwrap();
    assert_eq!(averaged.len(), 2);
    assert!((averaged[0].mean() - 2.0).abs() < 1e-12);
    assert!((averaged[1].mean() - 4.0).abs() < 1e-12);
    // both slices move together across the two rows
    assert!((averaged[0].cov(&averaged[1]) - averaged[0].var()).abs() < 1e-12);

    assert_eq!(
        dataset.average_rows("missing", &[0]).unwrap_err().info().code,
        "unknown-key"
    );
}

#[test]
fn removal_is_positional_and_identical_across_keys() {
    let mut dataset = Dataset::new();
    dataset.insert("a", sample_rows(0.0, 5, 3)).unwrap();
    dataset.insert("b", sample_rows(100.0, 5, 4)).unwrap();

    dataset.remove_rows(&[1, 3]).unwrap();
    assert_eq!(dataset.nsamples(), 3);

    // survivors keep their order; rows 0, 2 and 4 remain under every key
    let a = dataset.rows("a").unwrap();
    assert_eq!(a.iter().map(|row| row[0]).collect::<Vec<_>>(), vec![0.0, 2.0, 4.0]);
    let b = dataset.rows("b").unwrap();
    assert_eq!(
        b.iter().map(|row| row[0]).collect::<Vec<_>>(),
        vec![100.0, 102.0, 104.0]
    );

    assert_eq!(
        dataset.remove_rows(&[7]).unwrap_err().info().code,
        "row-out-of-range"
    );
}
