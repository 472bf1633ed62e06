//! End-to-end persistence scenarios: caches surviving simulated process
//! restarts (drop + reopen over the same directory and schema).

use mnemo_store::{Cache, CacheConfig, ConcurrentCache, DepKey};
use tempfile::TempDir;
use uuid::Uuid;

fn test_config() -> (CacheConfig, TempDir) {
    let dir = TempDir::new().expect("TempDir creation should succeed");
    let config = CacheConfig::new().with_dir(dir.path());
    (config, dir)
}

#[test]
fn end_to_end_int_key_int_value() {
    let (config, _dir) = test_config();

    {
        let mut cache: Cache<DepKey<(i32,)>, i32> =
            Cache::open(&config).expect("open should succeed");
        cache.store(DepKey::new((1,)), 1);
    }

    let cache: Cache<DepKey<(i32,)>, i32> =
        Cache::open(&config).expect("reopen should succeed");
    assert_eq!(cache.load(&DepKey::new((1,))), Some(1));
}

#[test]
fn many_records_survive_restart() {
    let (config, _dir) = test_config();
    type C = Cache<DepKey<(u64, bool)>, f64>;

    {
        let mut cache: C = Cache::open(&config).expect("open should succeed");
        for n in 0..500_u64 {
            cache.store(DepKey::new((n, n % 3 == 0)), n as f64 * 0.5);
        }
    }

    let cache: C = Cache::open(&config).expect("reopen should succeed");
    assert_eq!(cache.len(), 500);
    for n in 0..500_u64 {
        assert_eq!(
            cache.load(&DepKey::new((n, n % 3 == 0))),
            Some(n as f64 * 0.5),
            "record {n} should survive the restart"
        );
    }
}

#[test]
fn overwrite_persists_only_second_value() {
    let (config, _dir) = test_config();

    {
        let mut cache: Cache<DepKey<(i32,)>, i32> =
            Cache::open(&config).expect("open should succeed");
        cache.store(DepKey::new((1,)), 1);
        cache.store(DepKey::new((1,)), 2);
    }

    let cache: Cache<DepKey<(i32,)>, i32> =
        Cache::open(&config).expect("reopen should succeed");
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.load(&DepKey::new((1,))), Some(2));
}

#[test]
fn tag_isolation_across_restart() {
    let dir = TempDir::new().expect("TempDir creation should succeed");
    let lexer = CacheConfig::new().with_dir(dir.path()).with_tag("lexer");
    let parser = CacheConfig::new().with_dir(dir.path()).with_tag("parser");
    type C = Cache<DepKey<(i32,)>, i32>;

    {
        let mut cache: C = Cache::open(&lexer).expect("open should succeed");
        cache.store(DepKey::new((1,)), 100);
    }
    {
        let mut cache: C = Cache::open(&parser).expect("open should succeed");
        cache.store(DepKey::new((1,)), 200);
    }

    let lexer_cache: C = Cache::open(&lexer).expect("reopen should succeed");
    let parser_cache: C = Cache::open(&parser).expect("reopen should succeed");
    assert_eq!(lexer_cache.load(&DepKey::new((1,))), Some(100));
    assert_eq!(parser_cache.load(&DepKey::new((1,))), Some(200));
    assert_ne!(lexer_cache.path(), parser_cache.path());
}

#[test]
fn distinct_schemas_use_distinct_files() {
    let (config, _dir) = test_config();

    {
        let mut ints: Cache<DepKey<(i32,)>, i32> =
            Cache::open(&config).expect("open should succeed");
        ints.store(DepKey::new((1,)), 1);
    }
    {
        let mut floats: Cache<DepKey<(i32,)>, f64> =
            Cache::open(&config).expect("open should succeed");
        floats.store(DepKey::new((1,)), 1.5);
    }

    let ints: Cache<DepKey<(i32,)>, i32> =
        Cache::open(&config).expect("reopen should succeed");
    let floats: Cache<DepKey<(i32,)>, f64> =
        Cache::open(&config).expect("reopen should succeed");
    assert_eq!(ints.load(&DepKey::new((1,))), Some(1));
    assert_eq!(floats.load(&DepKey::new((1,))), Some(1.5));
}

#[test]
fn snapshot_file_lands_in_configured_dir_with_expected_name() {
    let (config, dir) = test_config();

    {
        let mut cache: Cache<DepKey<(i32, u16)>, u64> =
            Cache::open(&config).expect("open should succeed");
        cache.store(DepKey::new((1, 2)), 3);
    }

    let expected = dir.path().join("_cache_i32_u16__u64.bin");
    assert!(expected.exists(), "snapshot should use the schema-derived name");
    let len = std::fs::metadata(&expected)
        .expect("snapshot should exist")
        .len() as usize;
    assert_eq!(len, Cache::<DepKey<(i32, u16)>, u64>::RECORD_WIDTH);
}

#[test]
fn uuid_keyed_cache_survives_restart() {
    let (config, _dir) = test_config();
    type C = Cache<DepKey<(Uuid, u8)>, [u8; 32]>;

    let id = Uuid::now_v7();
    let digest = [0x5A_u8; 32];

    {
        let mut cache: C = Cache::open(&config).expect("open should succeed");
        cache.store(DepKey::new((id, 1)), digest);
    }

    let cache: C = Cache::open(&config).expect("reopen should succeed");
    assert_eq!(cache.load(&DepKey::new((id, 1))), Some(digest));
    assert_eq!(cache.load(&DepKey::new((id, 2))), None);
}

#[test]
fn concurrent_cache_shares_snapshots_with_plain_cache() {
    let (config, _dir) = test_config();

    {
        let mut cache: Cache<DepKey<(i32,)>, i32> =
            Cache::open(&config).expect("open should succeed");
        cache.store(DepKey::new((1,)), 11);
    }

    {
        let cache: ConcurrentCache<DepKey<(i32,)>, i32> =
            ConcurrentCache::open(&config).expect("reopen should succeed");
        assert_eq!(cache.load(&DepKey::new((1,))), Some(11));
        cache.store(DepKey::new((2,)), 22);
    }

    let cache: Cache<DepKey<(i32,)>, i32> =
        Cache::open(&config).expect("reopen should succeed");
    assert_eq!(cache.load(&DepKey::new((1,))), Some(11));
    assert_eq!(cache.load(&DepKey::new((2,))), Some(22));
}

#[test]
fn corrupt_snapshot_recovers_to_empty_and_repersists() {
    let (config, _dir) = test_config();
    type C = Cache<DepKey<(i32,)>, i32>;

    {
        let mut cache: C = Cache::open(&config).expect("open should succeed");
        cache.store(DepKey::new((1,)), 1);
    }

    // Corrupt the snapshot with a trailing partial record.
    let path = config.file_path::<DepKey<(i32,)>, i32>();
    let mut data = std::fs::read(&path).expect("snapshot should exist");
    data.push(0xFF);
    std::fs::write(&path, &data).expect("write should succeed");

    {
        let mut cache: C = Cache::open(&config).expect("open should succeed");
        assert!(cache.is_empty(), "corrupt snapshot must be discarded whole");
        cache.store(DepKey::new((2,)), 2);
    }

    // The rewritten snapshot is well formed again.
    let cache: C = Cache::open(&config).expect("reopen should succeed");
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.load(&DepKey::new((2,))), Some(2));
}
