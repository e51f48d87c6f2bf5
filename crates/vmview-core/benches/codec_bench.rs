//! Criterion benchmarks for the vmview wire codec and input encoders.
//!
//! Inbound classification runs once per server frame and the input encoders
//! run once per pointer or key event, so both sit on the hot path.
//!
//! Run with:
//! ```bash
//! cargo bench --package vmview-core --bench codec_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use vmview_core::{
    classify, encode_binary, encode_key, encode_text, ButtonMask, ClientMessage, Discriminant,
    DomKeysymTable, KeyEvent, KeyLocation, PointerEvent, PointerState, WheelEvent,
};

// ── Frame fixtures ────────────────────────────────────────────────────────────

fn make_text_frame(json: &str) -> Vec<u8> {
    encode_binary(Discriminant::Text, json.as_bytes())
}

fn make_image_frame(size: usize) -> Vec<u8> {
    let mut jpeg = vec![0xFF, 0xD8];
    jpeg.resize(size, 0xA5);
    encode_binary(Discriminant::Image, &jpeg)
}

// ── Benchmarks ────────────────────────────────────────────────────────────────

fn bench_classify(c: &mut Criterion) {
    let frames = vec![
        ("ping", make_text_frame(r#"{"type":"ping","pingNumber":42}"#)),
        (
            "turnUpdate",
            make_text_frame(r#"{"type":"turnUpdate","secondsRemaining":12,"queueSize":3}"#),
        ),
        ("vgaSizeUpdate", make_text_frame(r#"{"type":"vgaSizeUpdate","width":1024,"height":768}"#)),
        ("image_16k", make_image_frame(16 * 1024)),
        ("image_256k", make_image_frame(256 * 1024)),
    ];

    let mut group = c.benchmark_group("classify");
    for (name, frame) in &frames {
        group.bench_with_input(BenchmarkId::new("frame", name), frame, |b, frame| {
            b.iter(|| classify(black_box(frame)).expect("fixture frames are valid"))
        });
    }
    group.finish();
}

fn bench_encode_text(c: &mut Criterion) {
    let messages = vec![
        ("mouse", ClientMessage::Mouse { x: 640, y: 480, mask: ButtonMask::LEFT }),
        ("key", ClientMessage::Key { key_code: 0x61, down: true }),
        ("ping", ClientMessage::Ping { ping_number: 42 }),
    ];

    let mut group = c.benchmark_group("encode_text");
    for (name, msg) in &messages {
        group.bench_with_input(BenchmarkId::new("msg", name), msg, |b, msg| {
            b.iter(|| encode_text(black_box(msg)).expect("client messages always encode"))
        });
    }
    group.finish();
}

fn bench_input_encoders(c: &mut Criterion) {
    let mut group = c.benchmark_group("input");

    let pointer = PointerEvent::new(512, 384, ButtonMask(ButtonMask::LEFT));
    group.bench_function("pointer_move", |b| {
        b.iter(|| PointerState::default().with_pointer(black_box(pointer)).to_message())
    });

    let wheel = WheelEvent {
        x: 512,
        y: 384,
        buttons: ButtonMask::default(),
        delta_y: -120.0,
    };
    group.bench_function("wheel", |b| {
        b.iter(|| PointerState::default().with_wheel(black_box(wheel)).to_message())
    });

    let key = KeyEvent::new("a", 65, KeyLocation::Standard, true);
    group.bench_function("key_printable", |b| {
        b.iter(|| encode_key(&DomKeysymTable, black_box(&key)))
    });

    let named = KeyEvent::new("ArrowLeft", 37, KeyLocation::Standard, true);
    group.bench_function("key_named", |b| {
        b.iter(|| encode_key(&DomKeysymTable, black_box(&named)))
    });

    group.finish();
}

criterion_group!(benches, bench_classify, bench_encode_text, bench_input_encoders);
criterion_main!(benches);
