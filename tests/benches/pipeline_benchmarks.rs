//! # Moderated Chat Benchmarks
//!
//! | Area | Operation |
//! |------|-----------|
//! | mc-02 Moderation | whole-word filter scan |
//! | mc-03 Coordinator | next message selection across k users |
//! | shared-types | request envelope encode and decode |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use mc_02_moderation::WordFilter;
use mc_03_group_coordinator::{select_next, UserStreamState};
use shared_types::{Address, ChatMessage, Envelope, GroupId, ModerationRequest, UserId};

// ============================================================================
// MC-02: Word filter
// ============================================================================

fn bench_word_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("mc-02-word-filter");

    let words: Vec<String> = (0..64).map(|i| format!("word{i}")).collect();
    let filter = WordFilter::new(words.iter().map(String::as_str)).unwrap();

    for len in [16usize, 256, 4096] {
        let text: String = "lorem ipsum word7 dolor ".chars().cycle().take(len).collect();
        group.throughput(Throughput::Bytes(len as u64));
        group.bench_with_input(BenchmarkId::new("count_violations", len), &text, |b, text| {
            b.iter(|| black_box(filter.count_violations(text)))
        });
    }
    group.finish();
}

// ============================================================================
// MC-03: Merge selection
// ============================================================================

fn bench_select_next(c: &mut Criterion) {
    let mut group = c.benchmark_group("mc-03-merge");
    let mut rng = StdRng::seed_from_u64(7);

    for users in [2u32, 16, 128] {
        let streams: Vec<UserStreamState> = (0..users)
            .map(|u| {
                let mut s = UserStreamState::new(UserId(u));
                let ts = rng.gen_range(0..1_000);
                s.fill(ChatMessage::new(ts, GroupId(1), UserId(u), "x").unwrap());
                s
            })
            .collect();
        group.throughput(Throughput::Elements(u64::from(users)));
        group.bench_with_input(BenchmarkId::new("select_next", users), &streams, |b, s| {
            b.iter(|| black_box(select_next(s)))
        });
    }
    group.finish();
}

// ============================================================================
// Envelope codec
// ============================================================================

fn bench_envelope_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("envelope-codec");
    let request = ModerationRequest {
        group_id: GroupId(3),
        user_id: UserId(9),
        text: "a reasonably sized chat message with a few words".to_string(),
        cumulative_violations: 1,
    };

    group.bench_function("request_encode", |b| {
        b.iter(|| black_box(Envelope::request(&request, Address(5000)).unwrap()))
    });
    let envelope = Envelope::request(&request, Address(5000)).unwrap();
    group.bench_function("request_decode", |b| {
        b.iter(|| black_box(envelope.decode_request().unwrap()))
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_word_filter,
    bench_select_next,
    bench_envelope_codec
);
criterion_main!(benches);
