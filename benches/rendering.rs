//! Benchmarks for line rendering.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use markline::document::Document;
use markline::render::{RenderMode, render_line};

fn bench_render_lines(c: &mut Criterion) {
    let md = include_str!("../tests/fixtures/sample.md");
    let doc = Document::from_markdown(md);

    for (name, mode) in [
        ("render_editable", RenderMode::Editable),
        ("render_read_only", RenderMode::ReadOnly),
    ] {
        c.bench_function(name, |b| {
            b.iter(|| {
                doc.lines()
                    .iter()
                    .map(|line| render_line(black_box(line), mode).to_html().len())
                    .sum::<usize>()
            });
        });
    }
}

criterion_group!(benches, bench_render_lines);
criterion_main!(benches);
