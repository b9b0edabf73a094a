use spatio_lsm::{BoundingBox, Config, LsmBuilder, LsmRTree, TrajectoryPoint};
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// m=2, M=4, memtable capacity 4, growth factor 2
fn small_config() -> Config {
    Config::default()
        .with_growth_factor(2)
        .with_fanout(2, 4)
        .with_memtable_capacity(4)
}

fn unit_point(i: usize) -> BoundingBox {
    let x = i as f64 * 3.0;
    BoundingBox::new(x, 0.0, x + 1.0, 1.0)
}

fn whole_space() -> BoundingBox {
    BoundingBox::new(-1e12, -1e12, 1e12, 1e12)
}

#[test]
fn test_first_flush_installs_single_leaf() {
    init_logging();
    let index = LsmRTree::new(small_config()).unwrap();
    for i in 0..4 {
        index.insert(unit_point(i)).unwrap();
    }
    index.await_all().unwrap();

    assert_eq!(index.level_count(), 1);
    assert_eq!(index.memtable_record_count(), 0);
    let (height, entries, splits) = index
        .with_level(0, |tree| (tree.height(), tree.root().len(), tree.split_count()))
        .unwrap();
    assert_eq!(height, 0);
    assert_eq!(entries, 4);
    assert_eq!(splits, 0);
}

#[test]
fn test_second_flush_cascades_into_level_one() {
    init_logging();
    let index = LsmRTree::new(small_config()).unwrap();
    for i in 0..9 {
        index.insert(unit_point(i)).unwrap();
    }
    index.await_all().unwrap();

    assert_eq!(index.level_count(), 2);
    assert_eq!(index.level_record_count(0), 0);
    assert_eq!(index.level_record_count(1), 8);
    assert_eq!(index.with_level(1, |tree| tree.count_leaf_records()), Some(8));
    assert_eq!(index.memtable_record_count(), 1);
    assert_eq!(index.record_count(), 9);
    index.check_invariants().unwrap();
}

#[test]
fn test_whole_space_search_on_single_leaf_level() {
    let index = LsmRTree::new(small_config()).unwrap();
    for i in 0..4 {
        index.insert(unit_point(i)).unwrap();
    }
    index.await_all().unwrap();

    let (hits, visited) = index.with_level(0, |tree| tree.search(&whole_space())).unwrap();
    assert_eq!(hits.len(), 4);
    assert_eq!(visited, 1);

    // the empty memtable root is visited as well
    let (hits, visited) = index.search(&whole_space()).unwrap();
    assert_eq!(hits.len(), 4);
    assert_eq!(visited, 2);
}

#[test]
fn test_disjoint_search_visits_roots_only() {
    let index = LsmRTree::new(small_config()).unwrap();
    for i in 0..4 {
        index.insert(unit_point(i)).unwrap();
    }
    index.await_all().unwrap();

    let far = BoundingBox::new(500.0, 500.0, 501.0, 501.0);
    let (hits, visited) = index.with_level(0, |tree| tree.search(&far)).unwrap();
    assert!(hits.is_empty());
    assert!(visited >= 1);

    let (hits, visited) = index.search(&far).unwrap();
    assert!(hits.is_empty());
    assert!(visited >= 1);
}

#[test]
fn test_levels_stay_below_threshold_after_quiesce() {
    init_logging();
    let index = LsmRTree::new(small_config()).unwrap();
    for i in 0..500 {
        index.insert(unit_point(i)).unwrap();
    }
    index.await_all().unwrap();

    assert!(index.level_count() >= 5);
    for level in 0..index.level_count() {
        assert!(
            (index.level_record_count(level) as u64) < index.level_threshold(level),
            "level {} holds {} records",
            level,
            index.level_record_count(level)
        );
    }
    assert_eq!(index.record_count(), 500);
    let (hits, _) = index.search(&whole_space()).unwrap();
    assert_eq!(hits.len(), 500);
    index.check_invariants().unwrap();
}

#[test]
fn test_search_results_are_order_independent() {
    let index = LsmRTree::new(small_config()).unwrap();
    for i in 0..200 {
        let x = (i * 37 % 101) as f64;
        let y = (i * 53 % 89) as f64;
        index.insert(BoundingBox::new(x, y, x + 2.0, y + 2.0)).unwrap();
    }
    index.await_all().unwrap();

    let query = BoundingBox::new(20.0, 20.0, 60.0, 50.0);
    let key = |b: &BoundingBox| (b.min_x().to_bits(), b.min_y().to_bits());
    let mut first: Vec<_> = index.search(&query).unwrap().0.iter().map(key).collect();
    let mut second: Vec<_> = index.search(&query).unwrap().0.iter().map(key).collect();
    first.sort_unstable();
    second.sort_unstable();
    assert_eq!(first, second);
    assert!(!first.is_empty());
}

#[test]
fn test_concurrent_inserts_and_searches() {
    init_logging();
    let index = Arc::new(
        LsmBuilder::new()
            .growth_factor(3)
            .fanout(2, 6)
            .memtable_capacity(16)
            .build::<TrajectoryPoint>()
            .unwrap(),
    );
    let writers_done = Arc::new(AtomicBool::new(false));

    let reader = {
        let index = Arc::clone(&index);
        let writers_done = Arc::clone(&writers_done);
        thread::spawn(move || {
            let mut last_seen = 0;
            while !writers_done.load(Ordering::SeqCst) {
                let (hits, _) = index.search(&BoundingBox::new(-1.0, -1.0, 1e6, 1e6)).unwrap();
                let unique: HashSet<(u64, u32)> = hits.iter().map(|p| (p.trip(), p.seq())).collect();
                assert_eq!(unique.len(), hits.len(), "search reported a record twice");
                assert!(hits.len() >= last_seen, "search lost records");
                last_seen = hits.len();
            }
        })
    };

    let writers: Vec<_> = (0..4u64)
        .map(|trip| {
            let index = Arc::clone(&index);
            thread::spawn(move || {
                for seq in 0..500u32 {
                    let x = seq as f64 * 0.5;
                    let y = trip as f64 * 10.0;
                    index.insert(TrajectoryPoint::new(trip, seq, x, y)).unwrap();
                }
            })
        })
        .collect();

    for writer in writers {
        writer.join().unwrap();
    }
    writers_done.store(true, Ordering::SeqCst);
    reader.join().unwrap();
    index.await_all().unwrap();

    assert_eq!(index.record_count(), 2000);
    let (hits, _) = index.search(&BoundingBox::new(-1.0, -1.0, 1e6, 1e6)).unwrap();
    assert_eq!(hits.len(), 2000);
    let stats = index.stats();
    assert_eq!(stats.total_records(), 2000);
    assert_eq!(stats.failed_tasks, 0);
    index.check_invariants().unwrap();

    // one trip's row
    let (hits, _) = index.search(&BoundingBox::new(-1.0, 19.0, 1e6, 21.0)).unwrap();
    assert_eq!(hits.len(), 500);
    assert!(hits.iter().all(|p| p.trip() == 2));
}

#[test]
fn test_blocking_flush_matches_background_flush() {
    let blocking = LsmRTree::new(small_config().with_blocking_flush(true)).unwrap();
    let background = LsmRTree::new(small_config()).unwrap();
    for i in 0..50 {
        blocking.insert(unit_point(i)).unwrap();
        background.insert(unit_point(i)).unwrap();
    }
    background.await_all().unwrap();
    blocking.await_all().unwrap();

    assert_eq!(blocking.record_count(), background.record_count());
    for level in 0..background.level_count() {
        assert_eq!(
            blocking.level_record_count(level),
            background.level_record_count(level)
        );
    }
}

#[test]
fn test_stats_track_merge_work() {
    let index = LsmRTree::new(small_config()).unwrap();
    for i in 0..40 {
        index.insert(unit_point(i)).unwrap();
    }
    index.await_all().unwrap();

    let stats = index.stats();
    assert_eq!(stats.flush_count, 10);
    assert!(stats.cascade_count >= 1);
    assert_eq!(stats.memtable_records, 0);
    assert_eq!(stats.in_transit_records, 0);
    assert_eq!(stats.levels.len(), index.level_count());
    for level in &stats.levels {
        assert_eq!(level.tree.record_count, level.record_count);
    }
}
