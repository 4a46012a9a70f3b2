use docqa_core::config::Metric;
use docqa_core::error::Error;
use docqa_vector::FlatIndex;

/// Small deterministic pseudo-random generator so the corpus is reproducible.
fn lcg(seed: &mut u64) -> f32 {
    *seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    ((*seed >> 33) as f32) / (u32::MAX >> 1) as f32 - 0.5
}

fn corpus(rows: usize, dim: usize, seed: u64) -> Vec<Vec<f32>> {
    let mut s = seed;
    (0..rows).map(|_| (0..dim).map(|_| lcg(&mut s)).collect()).collect()
}

#[test]
fn search_results_are_bounded_sorted_and_in_range() {
    for (rows, dim, k) in [(1, 4, 5), (10, 8, 3), (50, 16, 50), (50, 16, 80), (7, 3, 0)] {
        let vectors = corpus(rows, dim, rows as u64 * 31 + dim as u64);
        for metric in [Metric::L2, Metric::Cosine] {
            let index = FlatIndex::build(&vectors, metric).expect("build");
            assert_eq!(index.len(), rows);
            let query = corpus(1, dim, 99).remove(0);
            let hits = index.search(&query, k).expect("search");
            assert_eq!(hits.len(), k.min(rows));
            assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
            assert!(hits.iter().all(|h| h.row < rows));
        }
    }
}

#[test]
fn l2_matches_brute_force() {
    let vectors = corpus(40, 8, 7);
    let index = FlatIndex::build(&vectors, Metric::L2).expect("build");
    let query = corpus(1, 8, 1234).remove(0);
    let mut expected: Vec<(usize, f32)> = vectors
        .iter()
        .enumerate()
        .map(|(i, v)| (i, v.iter().zip(&query).map(|(a, b)| (a - b) * (a - b)).sum()))
        .collect();
    expected.sort_by(|a, b| a.1.total_cmp(&b.1));
    let hits = index.search(&query, 5).expect("search");
    for (hit, (row, dist)) in hits.iter().zip(expected.iter()) {
        assert_eq!(hit.row, *row);
        assert!((hit.distance - dist).abs() < 1e-5);
    }
}

#[test]
fn exact_match_is_nearest() {
    let vectors = corpus(25, 6, 3);
    let index = FlatIndex::build(&vectors, Metric::L2).expect("build");
    let hits = index.search(&vectors[17], 1).expect("search");
    assert_eq!(hits[0].row, 17);
    assert!(hits[0].distance.abs() < 1e-9);
}

#[test]
fn inconsistent_rows_are_rejected() {
    let err = FlatIndex::build(&[vec![1.0, 2.0], vec![1.0]], Metric::L2).unwrap_err();
    assert!(matches!(err, Error::DimensionMismatch { expected: 2, found: 1, .. }));
}

#[test]
fn query_of_wrong_dimension_is_rejected() {
    let index = FlatIndex::build(&[vec![1.0, 2.0]], Metric::L2).expect("build");
    assert!(matches!(index.search(&[1.0, 2.0, 3.0], 1), Err(Error::DimensionMismatch { .. })));
}

#[test]
fn empty_index_returns_nothing() {
    let index = FlatIndex::build(&[], Metric::L2).expect("build");
    assert!(index.is_empty());
    assert!(index.search(&[0.5, 0.5], 3).expect("search").is_empty());
}
