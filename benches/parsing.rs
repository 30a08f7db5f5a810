//! Benchmarks for line classification and the fence rescan.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use markline::document::Document;

fn bench_load_simple(c: &mut Criterion) {
    let md = "# Hello\n\nWorld";
    c.bench_function("load_simple", |b| {
        b.iter(|| Document::from_markdown(black_box(md)))
    });
}

fn bench_load_medium(c: &mut Criterion) {
    let md = include_str!("../tests/fixtures/sample.md");
    c.bench_function("load_medium", |b| {
        b.iter(|| Document::from_markdown(black_box(md)))
    });
}

fn bench_rescan_after_edit(c: &mut Criterion) {
    let md = include_str!("../tests/fixtures/sample.md").repeat(40);
    let mut doc = Document::from_markdown(&md);
    let mut toggle = false;
    c.bench_function("rescan_after_edit", |b| {
        b.iter(|| {
            toggle = !toggle;
            let raw = if toggle { "```" } else { "plain" };
            doc.set_raw(black_box(3), raw)
        });
    });
}

criterion_group!(benches, bench_load_simple, bench_load_medium, bench_rescan_after_edit);
criterion_main!(benches);
