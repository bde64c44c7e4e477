use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::model::Label;
use crate::error::{DatasetError, Result};

/// Disjoint train/test ordinals into the filtered label table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Stratified train/test split of `labels`.
///
/// The test set gets `round(M * test_size)` ordinals, shared out across
/// classes by largest remainder so each class lands within one sample of
/// its exact proportional share in both sets. Ties in the remainder go to
/// the lower label code.
///
/// With `shuffle`, every class is permuted by a `StdRng` seeded from `seed`
/// (classes visited in label order) and both outputs are permuted again by
/// the same generator. Without it, the last members of each class go to
/// test and both outputs come back sorted.
pub fn stratified_split(
    labels: &[Label],
    test_size: f64,
    shuffle: bool,
    seed: u64,
) -> Result<SplitIndices> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(DatasetError::InvalidSplit(format!(
            "test_size must be in (0, 1), got {test_size}"
        )));
    }

    let total = labels.len();
    let n_test = (total as f64 * test_size).round() as usize;
    if n_test == 0 || n_test >= total {
        return Err(DatasetError::InvalidSplit(format!(
            "test_size {test_size} on {total} samples gives {n_test} test and {} train samples",
            total.saturating_sub(n_test)
        )));
    }

    let mut classes: BTreeMap<Label, Vec<usize>> = BTreeMap::new();
    for (ordinal, &label) in labels.iter().enumerate() {
        classes.entry(label).or_default().push(ordinal);
    }

    if let Some((label, members)) = classes.iter().find(|(_, m)| m.len() < 2) {
        return Err(DatasetError::InvalidSplit(format!(
            "class {label} has {} member(s), stratification needs at least 2",
            members.len()
        )));
    }
    let n_train = total - n_test;
    if n_test < classes.len() || n_train < classes.len() {
        return Err(DatasetError::InvalidSplit(format!(
            "{n_train} train / {n_test} test samples cannot hold {} classes each",
            classes.len()
        )));
    }

    let allocation = allocate_test_counts(&classes, n_test, total);

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(n_train);
    let mut test = Vec::with_capacity(n_test);

    for ((_, members), &take) in classes.iter_mut().zip(&allocation) {
        if shuffle {
            members.shuffle(&mut rng);
            test.extend_from_slice(&members[..take]);
            train.extend_from_slice(&members[take..]);
        } else {
            let cut = members.len() - take;
            train.extend_from_slice(&members[..cut]);
            test.extend_from_slice(&members[cut..]);
        }
    }

    if shuffle {
        train.shuffle(&mut rng);
        test.shuffle(&mut rng);
    } else {
        train.sort_unstable();
        test.sort_unstable();
    }

    log::debug!(
        "stratified split: {} train, {} test over {} classes (seed {seed})",
        train.len(),
        test.len(),
        classes.len()
    );

    Ok(SplitIndices { train, test })
}

/// Per-class test counts summing to `n_test`, in class order.
fn allocate_test_counts(
    classes: &BTreeMap<Label, Vec<usize>>,
    n_test: usize,
    total: usize,
) -> Vec<usize> {
    let mut counts = Vec::with_capacity(classes.len());
    let mut remainders = Vec::with_capacity(classes.len());
    for (slot, members) in classes.values().enumerate() {
        let scaled = members.len() * n_test;
        counts.push(scaled / total);
        remainders.push((scaled % total, slot));
    }

    let assigned: usize = counts.iter().sum();
    // Largest remainder first; equal remainders keep class order.
    remainders.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    for &(_, slot) in remainders.iter().take(n_test - assigned) {
        counts[slot] += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn labels_from_codes(codes: &[i64]) -> Vec<Label> {
        codes.iter().map(|&c| Label::from_code(c).unwrap()).collect()
    }

    fn imbalanced(n_neg: usize, n_pos: usize) -> Vec<Label> {
        let mut v = vec![Label::Negative; n_neg];
        v.extend(std::iter::repeat(Label::Positive).take(n_pos));
        v
    }

    fn count(labels: &[Label], idx: &[usize], label: Label) -> usize {
        idx.iter().filter(|&&i| labels[i] == label).count()
    }

    #[test]
    fn ten_row_scenario() {
        let labels = labels_from_codes(&[2, 2, 2, 3, 3, 3, 2, 2, 3, 3]);
        let split = stratified_split(&labels, 0.2, true, 42).unwrap();
        assert_eq!(split.train.len(), 8);
        assert_eq!(split.test.len(), 2);
        assert_eq!(count(&labels, &split.test, Label::Negative), 1);
        assert_eq!(count(&labels, &split.test, Label::Positive), 1);
        assert_eq!(count(&labels, &split.train, Label::Negative), 4);
        assert_eq!(count(&labels, &split.train, Label::Positive), 4);

        let again = stratified_split(&labels, 0.2, true, 42).unwrap();
        assert_eq!(split, again);
    }

    #[test]
    fn same_seed_same_split() {
        let labels = imbalanced(70, 30);
        for seed in [0, 1, 42, u64::MAX] {
            let a = stratified_split(&labels, 0.3, true, seed).unwrap();
            let b = stratified_split(&labels, 0.3, true, seed).unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn different_seeds_differ() {
        let labels = imbalanced(70, 30);
        let a = stratified_split(&labels, 0.3, true, 1).unwrap();
        let b = stratified_split(&labels, 0.3, true, 2).unwrap();
        assert_ne!(a.test, b.test);
    }

    #[test]
    fn disjoint_and_covering() {
        let labels = imbalanced(37, 23);
        for &f in &[0.05, 0.2, 0.5, 0.77, 0.95] {
            let split = stratified_split(&labels, f, true, 7).unwrap();
            let train: BTreeSet<_> = split.train.iter().copied().collect();
            let test: BTreeSet<_> = split.test.iter().copied().collect();
            assert_eq!(train.len(), split.train.len(), "duplicates in train");
            assert_eq!(test.len(), split.test.len(), "duplicates in test");
            assert!(train.is_disjoint(&test));
            let all: BTreeSet<_> = train.union(&test).copied().collect();
            assert_eq!(all, (0..labels.len()).collect());
            assert_eq!(split.test.len(), (60.0 * f).round() as usize);
        }
    }

    #[test]
    fn class_proportions_within_one_sample() {
        let labels = imbalanced(83, 17);
        let total = labels.len() as f64;
        for &f in &[0.1, 0.2, 0.33, 0.5] {
            let split = stratified_split(&labels, f, true, 42).unwrap();
            for label in [Label::Negative, Label::Positive] {
                let n_c = count(&labels, &(0..labels.len()).collect::<Vec<_>>(), label) as f64;
                let ideal_test = n_c * split.test.len() as f64 / total;
                let ideal_train = n_c * split.train.len() as f64 / total;
                let got_test = count(&labels, &split.test, label) as f64;
                let got_train = count(&labels, &split.train, label) as f64;
                assert!((got_test - ideal_test).abs() <= 1.0, "test {label} f={f}");
                assert!((got_train - ideal_train).abs() <= 1.0, "train {label} f={f}");
            }
        }
    }

    #[test]
    fn no_shuffle_is_ordered() {
        let labels = labels_from_codes(&[2, 3, 2, 3, 2, 3, 2, 3, 2, 3]);
        let split = stratified_split(&labels, 0.4, false, 0).unwrap();
        assert_eq!(split.train, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(split.test, vec![6, 7, 8, 9]);
        // Seed is irrelevant without shuffling.
        assert_eq!(split, stratified_split(&labels, 0.4, false, 99).unwrap());
    }

    #[test]
    fn rejects_fraction_out_of_range() {
        let labels = imbalanced(10, 10);
        for f in [0.0, 1.0, -0.5, 1.5, f64::NAN] {
            assert!(matches!(
                stratified_split(&labels, f, true, 42),
                Err(DatasetError::InvalidSplit(_))
            ));
        }
    }

    #[test]
    fn rejects_empty_split() {
        let labels = imbalanced(5, 5);
        // round(10 * 0.01) == 0
        assert!(stratified_split(&labels, 0.01, true, 42).is_err());
        // round(10 * 0.99) == 10
        assert!(stratified_split(&labels, 0.99, true, 42).is_err());
    }

    #[test]
    fn rejects_singleton_class() {
        let labels = imbalanced(9, 1);
        let err = stratified_split(&labels, 0.2, true, 42).unwrap_err();
        assert!(err.to_string().contains("class 3"));
    }

    #[test]
    fn rejects_split_smaller_than_class_count() {
        let labels = imbalanced(10, 10);
        // round(20 * 0.05) == 1 test sample for 2 classes
        assert!(stratified_split(&labels, 0.05, true, 42).is_err());
    }
}
