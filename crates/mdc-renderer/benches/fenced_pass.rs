//! Benchmarks for the fenced code block pass and full conversion.

#![allow(clippy::format_push_string)] // Benchmark setup code, performance not critical

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use mdc_renderer::{Converter, DocumentOptions, FencedBlockPreprocessor, FencedCodeConfig};

/// Generate markdown with `sections` sections, each holding `blocks` code blocks.
fn generate_markdown(sections: usize, blocks: usize) -> String {
    let mut md = String::with_capacity(sections * blocks * 120);
    md.push_str("# Document Title\n\n");

    for i in 0..sections {
        md.push_str(&format!("## Section {i}\n\nSome **bold** and *italic* text.\n\n"));
        for j in 0..blocks {
            if j % 2 == 0 {
                md.push_str(&format!(
                    "```python hl_lines=\"1\"\nprint(\"block {j} & <{i}>\")\n```\n\n"
                ));
            } else {
                md.push_str(&format!("~~~\nplain {j}\n~~~\n\n"));
            }
        }
    }
    md
}

fn bench_preprocess(c: &mut Criterion) {
    let config = FencedCodeConfig::confluence();
    let mut group = c.benchmark_group("fenced_pass");

    for (sections, blocks) in [(5, 2), (20, 5), (50, 10)] {
        let markdown = generate_markdown(sections, blocks);
        group.throughput(Throughput::Bytes(markdown.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("preprocess", format!("{sections}s_{blocks}b")),
            &markdown,
            |b, md| {
                b.iter(|| {
                    let mut preprocessor = FencedBlockPreprocessor::new(&config);
                    preprocessor.run(md)
                });
            },
        );
    }

    group.finish();
}

fn bench_convert(c: &mut Criterion) {
    let converter = Converter::new(FencedCodeConfig::confluence(), DocumentOptions::default());
    let markdown = generate_markdown(20, 5);

    c.bench_function("convert_20_sections", |b| {
        b.iter(|| converter.convert(&markdown));
    });
}

criterion_group!(benches, bench_preprocess, bench_convert);
criterion_main!(benches);
