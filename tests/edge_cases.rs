use spatio_lsm::{BoundingBox, Config, LsmError, LsmRTree, MergeTree, TrajectoryPoint};

fn tree_with(points: &[(f64, f64)], min: usize, max: usize) -> MergeTree<BoundingBox> {
    let mut tree = MergeTree::new(min, max).unwrap();
    for &(x, y) in points {
        tree.insert(BoundingBox::new(x, y, x + 1.0, y + 1.0)).unwrap();
    }
    tree
}

fn row(start: usize, count: usize) -> Vec<(f64, f64)> {
    (start..start + count).map(|i| (i as f64 * 2.0, 0.0)).collect()
}

/// Test 1: Merging an empty tree changes nothing
#[test]
fn test_merge_empty_source() {
    let mut target = tree_with(&row(0, 30), 2, 4);
    let root_id = target.root().id();
    let stats = target.stats();

    target.merge(MergeTree::new(2, 4).unwrap());

    assert_eq!(target.root().id(), root_id);
    assert_eq!(target.stats(), stats);
}

/// Test 2: An empty target adopts the source without routing or splitting
#[test]
fn test_merge_into_empty_target() {
    let source = tree_with(&row(0, 30), 2, 4);
    let root_id = source.root().id();
    let splits = source.split_count();

    let mut target = MergeTree::new(2, 4).unwrap();
    target.merge(source);

    assert_eq!(target.root().id(), root_id);
    assert_eq!(target.record_count(), 30);
    assert_eq!(target.split_count(), splits);
}

/// Test 3: A leaf at exactly M entries does not split, M + 1 splits once
#[test]
fn test_split_boundary() {
    let mut full = tree_with(&row(0, 3), 2, 4);
    full.merge(tree_with(&row(3, 1), 2, 4));
    assert_eq!(full.split_count(), 0);
    assert_eq!(full.height(), 0);

    let mut over = tree_with(&row(0, 3), 2, 4);
    over.merge(tree_with(&row(3, 2), 2, 4));
    assert_eq!(over.split_count(), 1);
    assert_eq!(over.height(), 1);
    assert!(over.is_valid());
}

/// Test 4: Fanout bounds are validated at construction
#[test]
fn test_invalid_fanout_rejected() {
    assert!(matches!(
        MergeTree::<BoundingBox>::new(3, 4),
        Err(LsmError::InvalidConfig(_))
    ));
    assert!(MergeTree::<BoundingBox>::new(0, 4).is_err());
    assert!(MergeTree::<BoundingBox>::new(1, 1).is_err());
    assert!(LsmRTree::<BoundingBox>::new(Config::default().with_growth_factor(1)).is_err());
}

/// Test 5: Many identical points
#[test]
fn test_identical_points() {
    let same = vec![(5.0, 5.0); 60];
    let mut target = tree_with(&same, 2, 4);
    target.merge(tree_with(&same, 2, 4));
    target.merge(tree_with(&same[..7], 2, 4));

    assert_eq!(target.record_count(), 127);
    target.check_invariants().unwrap();
    let (hits, _) = target.search(&BoundingBox::new(5.5, 5.5, 5.5, 5.5));
    assert_eq!(hits.len(), 127);
}

/// Test 6: Smallest legal fanout
#[test]
fn test_minimal_fanout() {
    let points: Vec<_> = (0..50).map(|i| ((i * 7 % 13) as f64, (i * 3 % 11) as f64)).collect();
    let mut target = tree_with(&points[..25], 1, 2);
    target.merge(tree_with(&points[25..], 1, 2));
    assert_eq!(target.count_leaf_records(), 50);
    target.check_invariants().unwrap();
}

/// Test 7: Zero-area payloads
#[test]
fn test_point_payloads() {
    let mut target: MergeTree<TrajectoryPoint> = MergeTree::new(2, 5).unwrap();
    let mut source: MergeTree<TrajectoryPoint> = MergeTree::new(2, 5).unwrap();
    for seq in 0..40u32 {
        target.insert(TrajectoryPoint::new(0, seq, seq as f64, 0.0)).unwrap();
        source.insert(TrajectoryPoint::new(1, seq, seq as f64, 0.0)).unwrap();
    }
    target.merge(source);
    target.check_invariants().unwrap();

    let (hits, _) = target.search(&BoundingBox::new(10.0, 0.0, 10.0, 0.0));
    assert_eq!(hits.len(), 2);
    assert!(target.overlap_ratio().is_finite());
    assert!(target.coverage_ratio().is_finite());
}

/// Test 8: Large but finite coordinates
#[test]
fn test_large_coordinates() {
    let points: Vec<_> = (0..30).map(|i| (i as f64 * 1e100, -(i as f64) * 1e100)).collect();
    let mut target = tree_with(&points[..15], 2, 4);
    target.merge(tree_with(&points[15..], 2, 4));
    assert_eq!(target.count_leaf_records(), 30);
    assert!(target.is_valid());
}

/// Test 9: Non-finite input never reaches a tree
#[test]
fn test_non_finite_rejected() {
    let index = LsmRTree::new(Config::default()).unwrap();
    let inf = BoundingBox::new(0.0, 0.0, f64::INFINITY, 1.0);
    assert!(matches!(index.insert(inf), Err(LsmError::InvalidInput(_))));
    assert!(matches!(
        index.search(&BoundingBox::new(f64::NAN, 0.0, 1.0, 1.0)),
        Err(LsmError::InvalidInput(_))
    ));

    let mut tree = MergeTree::new(2, 4).unwrap();
    assert!(tree.insert(inf).is_err());
    assert!(tree.is_empty());
}

/// Test 10: Operations after close
#[test]
fn test_operations_after_close() {
    let index = LsmRTree::new(Config::default().with_memtable_capacity(8)).unwrap();
    for i in 0..20 {
        index.insert(BoundingBox::new(i as f64, 0.0, i as f64, 0.0)).unwrap();
    }
    index.close().unwrap();

    assert!(matches!(
        index.insert(BoundingBox::new(0.0, 0.0, 1.0, 1.0)),
        Err(LsmError::ShutDown)
    ));
    let (hits, _) = index.search(&BoundingBox::new(-1.0, -1.0, 100.0, 1.0)).unwrap();
    assert_eq!(hits.len(), 20);
}

/// Test 11: Level trees are read-only through `with_level`
#[test]
fn test_missing_level() {
    let index = LsmRTree::<BoundingBox>::new(Config::default()).unwrap();
    assert!(index.with_level(0, |tree| tree.record_count()).is_none());
    assert_eq!(index.level_record_count(3), 0);
}
