//! Performance benchmarks for WaaV Phonemizer
//!
//! Run with: cargo bench
//! Or for specific benchmarks: cargo bench -- <filter>

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use std::sync::Arc;
use std::time::Duration;
use waav_phonemizer::cache::{ResultCache, cache_key};
use waav_phonemizer::lts::{LetterToSoundEngine, english_rule_set};
use waav_phonemizer::{LanguageDetector, PhonemeOptions, PhonemeResult, PhonemizationService, PhonemizerConfig};

/// Benchmark letter-to-sound rule traversal with and without the memo
fn bench_lts(c: &mut Criterion) {
    let mut group = c.benchmark_group("lts");
    group.measurement_time(Duration::from_secs(5));

    let rules = Arc::new(english_rule_set().unwrap());
    let words = ["zxqvb", "phonemization", "throughput", "knightly", "quizzical"];

    group.bench_function("apply_memoized", |b| {
        let engine = LetterToSoundEngine::new(rules.clone());
        b.iter(|| {
            for word in words {
                black_box(engine.apply(black_box(word)));
            }
        });
    });

    group.bench_function("apply_cold", |b| {
        let engine = LetterToSoundEngine::new(rules.clone());
        b.iter(|| {
            engine.clear_memo();
            for word in words {
                black_box(engine.apply(black_box(word)));
            }
        });
    });

    group.finish();
}

/// Benchmark language detection and segmentation
fn bench_detection(c: &mut Criterion) {
    let mut group = c.benchmark_group("detection");
    let detector = LanguageDetector::default();

    for (name, text) in [
        ("english", "The quick brown fox jumps over the lazy dog"),
        ("spanish", "¿Dónde está la biblioteca? Gracias por todo"),
        ("korean", "오늘은 날씨가 아주 좋습니다"),
        ("mixed", "Hello 你好 world 안녕하세요 friends"),
    ] {
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::new("detect", name), &text, |b, text| {
            b.iter(|| black_box(detector.detect(black_box(text))));
        });
        group.bench_with_input(BenchmarkId::new("segment_mixed", name), &text, |b, text| {
            b.iter(|| black_box(detector.segment_mixed(black_box(text))));
        });
    }

    group.finish();
}

/// Benchmark result cache operations
fn bench_cache(c: &mut Criterion) {
    let mut group = c.benchmark_group("cache");
    let cache = ResultCache::new(10_000, 10 * 1024 * 1024);
    let options = PhonemeOptions::default();
    let result = PhonemeResult {
        phonemes: ["hh", "ah0", "l", "ow1"].iter().map(|s| s.to_string()).collect(),
        success: true,
        language: "en-US".to_string(),
        ..Default::default()
    };

    group.bench_function("key", |b| {
        b.iter(|| black_box(cache_key("en-US", black_box("hello world"), &options)));
    });

    let key = cache_key("en-US", "hello", &options);
    let _ = cache.insert(key, result.clone());
    group.bench_function("get_hit", |b| {
        b.iter(|| black_box(cache.get(&key)));
    });

    let mut next = 0u128;
    group.bench_function("insert_evicting", |b| {
        b.iter(|| {
            next += 1;
            let _ = cache.insert(next, result.clone());
        });
    });

    group.finish();
}

/// Benchmark end-to-end service calls
fn bench_service(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let service = rt
        .block_on(PhonemizationService::new(PhonemizerConfig::default()))
        .unwrap();
    let mut group = c.benchmark_group("service");
    group.measurement_time(Duration::from_secs(5));

    let sentence = "The quick brown fox jumps over the lazy dog";
    group.bench_function("english_cached", |b| {
        b.to_async(&rt).iter(|| async {
            black_box(service.phonemize(sentence, Some("en-US")).await);
        });
    });

    group.bench_function("english_uncached", |b| {
        b.to_async(&rt).iter(|| async {
            service.clear_cache();
            black_box(service.phonemize(sentence, Some("en-US")).await);
        });
    });

    for (name, text, language) in [
        ("chinese", "我们一起学习中文", "zh-CN"),
        ("korean", "한국어를 공부합니다", "ko-KR"),
        ("spanish", "La lluvia en Sevilla es una maravilla", "es-ES"),
    ] {
        group.bench_function(BenchmarkId::new("uncached", name), |b| {
            b.to_async(&rt).iter(|| async {
                service.clear_cache();
                black_box(service.phonemize(text, Some(language)).await);
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_lts, bench_detection, bench_cache, bench_service);
criterion_main!(benches);
