//! Integration tests for the cache module
//!
//! These tests verify the complete cache functionality including:
//! - Capacity and FIFO eviction
//! - TTL expiration against a simulated clock
//! - Key derivation and namespacing
//! - Tier registry construction and configuration
//! - Concurrent access from many threads

use rag_cache::cache::{
    cache_key, CacheConfig, CacheKeyBuilder, CacheTiers, ManualClock, RagAnswer, TierKind,
    TiersConfig, TtlCache,
};
use rag_cache::CacheError;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

fn simulated(max_size: usize, ttl: Duration) -> (TtlCache<String>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new());
    let config = CacheConfig::builder()
        .max_size(max_size)
        .default_ttl(ttl)
        .build();
    let cache = TtlCache::with_clock(config, clock.clone()).unwrap();
    (cache, clock)
}

#[test]
fn test_capacity_invariant_for_distinct_keys() {
    let (cache, _) = simulated(50, Duration::from_secs(60));

    for i in 0..500 {
        cache.set(format!("k{}", i), i.to_string());
        assert!(cache.len() <= 50, "size exceeded after set #{}", i);
    }

    let stats = cache.stats();
    assert_eq!(stats.entries, 50);
    assert_eq!(stats.evictions_capacity, 450);
}

#[test]
fn test_ttl_expiry_on_simulated_clock() {
    let (early, clock) = simulated(10, Duration::from_secs(60));
    early.set_with_ttl("k", "v".to_string(), Duration::from_millis(100));
    clock.advance_ms(99);
    assert_eq!(early.get("k"), Some("v".to_string()));

    let (late, clock) = simulated(10, Duration::from_secs(60));
    late.set_with_ttl("k", "v".to_string(), Duration::from_millis(100));
    clock.advance_ms(101);
    assert_eq!(late.get("k"), None);
}

#[test]
fn test_fifo_eviction_scenario() {
    let (cache, _) = simulated(2, Duration::from_secs(60));

    cache.set("a", "1".to_string());
    cache.set("b", "2".to_string());
    cache.set("c", "3".to_string());

    assert_eq!(cache.get("a"), None);
    assert_eq!(cache.get("b"), Some("2".to_string()));
    assert_eq!(cache.get("c"), Some("3".to_string()));
}

#[test]
fn test_overwrite_at_capacity() {
    let (cache, _) = simulated(2, Duration::from_secs(60));

    cache.set("a", "1".to_string());
    cache.set("b", "2".to_string());
    cache.set("a", "new".to_string());

    assert_eq!(cache.len(), 2);
    assert_eq!(cache.get("a"), Some("new".to_string()));
    assert_eq!(cache.get("b"), Some("2".to_string()));
}

#[test]
fn test_delete_and_clear() {
    let (cache, _) = simulated(10, Duration::from_secs(60));

    cache.set("k", "v".to_string());
    cache.set("other", "w".to_string());

    assert!(cache.remove("k"));
    assert_eq!(cache.get("k"), None);
    assert!(!cache.remove("k"));

    cache.clear();
    assert_eq!(cache.len(), 0);
    assert_eq!(cache.get("other"), None);
}

#[test]
fn test_key_determinism_and_namespacing() {
    assert_eq!(
        cache_key("q", [("b", 2), ("a", 1)]),
        cache_key("q", [("a", 1), ("b", 2)])
    );
    assert_ne!(
        cache_key("embedding", [("text", "x")]),
        cache_key("query", [("text", "x")])
    );
    assert_ne!(
        CacheTiers::key(TierKind::Embedding, [("text", "x")]),
        CacheTiers::key(TierKind::Query, [("text", "x")])
    );
}

#[test]
fn test_builder_and_tier_keys_agree() {
    let from_builder = CacheKeyBuilder::new(TierKind::Query.prefix())
        .param("query", "vector databases")
        .param("limit", 10)
        .build();
    let from_tier = CacheTiers::key(
        TierKind::Query,
        [("limit", "10"), ("query", "vector databases")],
    );

    assert_eq!(from_builder, from_tier);
    assert!(from_tier.starts_with("query:"));
}

#[test]
fn test_rag_tier_end_to_end() {
    let clock = Arc::new(ManualClock::new());
    let config = CacheConfig::builder()
        .max_size(100)
        .default_ttl(Duration::from_millis(600_000))
        .build();
    let tier: TtlCache<String> = TtlCache::with_clock(config, clock.clone()).unwrap();

    tier.set("rag:q:abc", "answer1".to_string());
    assert_eq!(tier.get("rag:q:abc"), Some("answer1".to_string()));
    assert_eq!(tier.len(), 1);

    clock.advance_ms(600_001);
    assert_eq!(tier.get("rag:q:abc"), None);
    assert_eq!(tier.len(), 0);
}

#[test]
fn test_registry_rag_tier_with_shared_clock() {
    let clock = Arc::new(ManualClock::new());
    let tiers = CacheTiers::with_clock(&TiersConfig::default(), clock.clone()).unwrap();
    let rag = tiers.rag_answer();

    let answer = RagAnswer {
        answer: "Tiers are independent caches.".to_string(),
        sources: Vec::new(),
        model: "test-model".to_string(),
        generated_at: chrono::Utc::now(),
    };
    let key = CacheTiers::key(TierKind::RagAnswer, [("question", "what is a tier?")]);
    rag.set(key.clone(), answer.clone());

    clock.advance(Duration::from_secs(599));
    assert_eq!(rag.get(&key), Some(answer));

    // The embedding tier lives much longer on the same clock
    let emb_key = CacheTiers::key(TierKind::Embedding, [("text", "tier")]);
    tiers.embedding().set(emb_key.clone(), vec![0.5; 4]);

    clock.advance(Duration::from_secs(2));
    assert_eq!(rag.get(&key), None);
    assert!(tiers.embedding().get(&emb_key).is_some());
}

#[test]
fn test_ttl_override_beats_default() {
    let (cache, clock) = simulated(10, Duration::from_millis(100));

    cache.set("default", "d".to_string());
    cache.set_with_ttl("override", "o".to_string(), Duration::from_secs(10));

    clock.advance_ms(500);
    assert_eq!(cache.get("default"), None);
    assert_eq!(cache.get("override"), Some("o".to_string()));
}

#[test]
fn test_concurrent_readers_and_writers() {
    let (cache, _) = simulated(32, Duration::from_secs(60));
    let cache = Arc::new(cache);

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let cache = cache.clone();
            std::thread::spawn(move || {
                for i in 0..500 {
                    let key = format!("k{}", (t * 31 + i) % 64);
                    if i % 3 == 0 {
                        cache.get(&key);
                    } else {
                        cache.set(key, format!("{}-{}", t, i));
                    }
                    assert!(cache.len() <= 32);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert!(cache.len() <= 32);
}

#[test]
fn test_tiers_config_from_env_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tiers.env");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "RAG_CACHE_EMBEDDING_MAX_SIZE=750").unwrap();
    writeln!(file, "RAG_CACHE_EMBEDDING_TTL_MS=120000").unwrap();
    drop(file);

    let config = TiersConfig::from_env_file(&path).unwrap();
    assert_eq!(config.embedding.max_size, 750);
    assert_eq!(config.embedding.default_ttl, Duration::from_secs(120));
    assert_eq!(config.query, CacheConfig::query());
}

#[test]
fn test_missing_env_file_is_config_error() {
    let err = TiersConfig::from_env_file("/definitely/not/here.env").unwrap_err();
    assert!(matches!(err, CacheError::Config(_)));
}
