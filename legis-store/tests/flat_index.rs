use legis_store::FlatL2Index;
use pretty_assertions::assert_eq;

fn line_index(n: usize) -> FlatL2Index {
    let vectors: Vec<Vec<f32>> = (0..n).map(|i| vec![i as f32, 0.0]).collect();
    FlatL2Index::from_vectors(&vectors).expect("index")
}

#[test]
fn k_within_size_returns_exactly_k_sorted_hits() {
    let idx = line_index(10);
    let slots = idx.search(&[3.2, 0.0], 4).expect("search");

    assert_eq!(slots.len(), 4);
    let hits: Vec<_> = slots.map(|s| s.expect("filled slot")).collect();
    assert_eq!(hits[0].id, 3);
    assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
    let min = (0..10)
        .map(|i| (i as f32 - 3.2).powi(2))
        .fold(f32::INFINITY, f32::min);
    assert!((hits[0].distance - min).abs() < 1e-6);
}

#[test]
fn k_beyond_size_leaves_empty_slots() {
    let idx = line_index(3);
    let slots: Vec<_> = idx.search(&[0.0, 0.0], 5).expect("search").collect();

    assert_eq!(slots.len(), 5);
    assert_eq!(slots.iter().filter(|s| s.is_some()).count(), 3);
    assert!(slots[3].is_none() && slots[4].is_none());
}

#[test]
fn unbounded_k_does_not_allocate_slots() {
    let idx = line_index(2);
    let slots = idx.search(&[0.0, 0.0], usize::MAX).expect("search");

    assert_eq!(slots.len(), usize::MAX);
    let head: Vec<_> = slots.take(3).collect();
    assert_eq!(head.iter().filter(|s| s.is_some()).count(), 2);
    assert!(head[2].is_none());
}

#[test]
fn query_dimension_is_checked() {
    let idx = line_index(2);
    assert!(idx.search(&[1.0], 1).is_err());
}

#[test]
fn ids_follow_insertion_order() {
    let mut idx = FlatL2Index::new(3).expect("index");
    assert_eq!(idx.add(&[1.0, 1.0, 1.0]).expect("add"), 0);
    assert_eq!(idx.add(&[2.0, 2.0, 2.0]).expect("add"), 1);
    assert_eq!(idx.len(), 2);
    assert_eq!(idx.vector(1), Some(&[2.0, 2.0, 2.0][..]));
    assert_eq!(idx.vector(2), None);
}
