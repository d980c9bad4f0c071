use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::dataset::Dataset;
use crate::error::TrainingError;

/// Splits into `(train, test)` keeping the class balance of `dataset`.
///
/// Each class is shuffled with a seeded RNG and `round(len * test_size)` of
/// its rows go to the test split. Both splits keep the original row order.
pub fn stratified_split(
    dataset: &Dataset,
    test_size: f64,
    seed: u64,
) -> Result<(Dataset, Dataset), TrainingError> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(TrainingError::InvalidParameter(format!(
            "test_size must be in (0, 1), got {test_size}"
        )));
    }
    if dataset.is_empty() {
        return Err(TrainingError::EmptyDataset);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train_idx = Vec::with_capacity(dataset.n_samples());
    let mut test_idx = Vec::new();

    for positive in [false, true] {
        let mut members: Vec<usize> = (0..dataset.n_samples())
            .filter(|&i| (dataset.y[i] >= 0.5) == positive)
            .collect();
        members.shuffle(&mut rng);

        let n_test = (members.len() as f64 * test_size).round() as usize;
        test_idx.extend_from_slice(&members[..n_test]);
        train_idx.extend_from_slice(&members[n_test..]);
    }

    if train_idx.is_empty() || test_idx.is_empty() {
        return Err(TrainingError::InvalidParameter(format!(
            "test_size {test_size} leaves an empty split for {} rows",
            dataset.n_samples()
        )));
    }

    train_idx.sort_unstable();
    test_idx.sort_unstable();
    Ok((dataset.select(&train_idx), dataset.select(&test_idx)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, Array2};

    fn dataset(positives: usize, negatives: usize) -> Dataset {
        let n = positives + negatives;
        let x = Array2::from_shape_fn((n, 2), |(i, j)| (i * 2 + j) as f64);
        let y = Array1::from_shape_fn(n, |i| if i < positives { 1.0 } else { 0.0 });
        Dataset::new(x, y, vec!["a".into(), "b".into()])
    }

    #[test]
    fn test_split_preserves_class_balance() {
        let data = dataset(30, 70);
        let (train, test) = stratified_split(&data, 0.2, 42).unwrap();

        assert_eq!(test.n_samples(), 20);
        assert_eq!(train.n_samples(), 80);
        assert_eq!(test.class_counts(), (14, 6));
        assert_eq!(train.class_counts(), (56, 24));
    }

    #[test]
    fn test_split_is_deterministic_for_seed() {
        let data = dataset(25, 40);
        let (_, a) = stratified_split(&data, 0.2, 42).unwrap();
        let (_, b) = stratified_split(&data, 0.2, 42).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_splits_are_disjoint() {
        let data = dataset(12, 18);
        let (train, test) = stratified_split(&data, 0.3, 7).unwrap();
        // first feature is 2 * original index, so it identifies the row
        let mut seen: Vec<f64> = train.x.column(0).to_vec();
        seen.extend(test.x.column(0).iter());
        seen.sort_by(|a, b| a.partial_cmp(b).unwrap());
        seen.dedup();
        assert_eq!(seen.len(), 30);
    }

    #[test]
    fn test_rejects_bad_parameters() {
        let data = dataset(5, 5);
        assert!(matches!(
            stratified_split(&data, 1.0, 42),
            Err(TrainingError::InvalidParameter(_))
        ));
        assert!(matches!(
            stratified_split(&dataset(0, 0), 0.2, 42),
            Err(TrainingError::EmptyDataset)
        ));
        assert!(matches!(
            stratified_split(&dataset(1, 1), 0.2, 42),
            Err(TrainingError::InvalidParameter(_))
        ));
    }
}
