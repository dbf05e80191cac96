//! Benchmarks for mdocx rendering performance.
//!
//! Run with: cargo bench
//!
//! These benchmarks use synthetic markdown and records; image references
//! are data URIs so no storage root is needed.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mdocx::{ExportOptions, ExportRecord, ImageResolver, InlineFormatter};

/// 1x1 transparent PNG.
const PNG_1X1: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

/// Creates markdown with the given number of sections.
fn create_markdown(sections: usize) -> String {
    let mut content = String::new();

    for i in 0..sections {
        content.push_str(&format!("## Section {}\n\n", i + 1));
        content.push_str(
            "Some **bold** text, some *italic* text and a `code span` in one line.\n",
        );
        content.push_str("A second line with a literal 5 * 3 and an open ** marker.\n\n");
        content.push_str("```\nfn main() {\n    println!(\"hello\");\n}\n```\n\n");
        if i % 4 == 0 {
            content.push_str(&format!("![figure](data:image/png;base64,{})\n\n", PNG_1X1));
        }
    }

    content
}

fn create_records(count: usize) -> Vec<ExportRecord> {
    (0..count)
        .map(|i| {
            ExportRecord::new(2020 + (i % 5) as i32, create_markdown(1))
                .with_number(i as u32 + 1)
                .with_options(r#"["First **choice**", "Second", "Third", "Fourth"]"#)
                .with_answer("The *second* choice.")
        })
        .collect()
}

/// Benchmark block scanning.
fn bench_block_scanning(c: &mut Criterion) {
    let mut group = c.benchmark_group("block_scanning");

    for sections in [10, 100].iter() {
        let markdown = create_markdown(*sections);

        group.bench_function(format!("{}_sections", sections), |b| {
            b.iter(|| mdocx::parse_blocks(black_box(&markdown)));
        });
    }

    group.finish();
}

/// Benchmark inline formatting of a single paragraph.
fn bench_inline_formatting(c: &mut Criterion) {
    let resolver = ImageResolver::with_root(std::env::temp_dir());
    let formatter = InlineFormatter::new(&resolver);
    let plain = "Plain text without any markup at all, just words and spaces.";
    let marked = "Mix of **bold**, *italic*, `code` and **more *nested* text** here.";

    c.bench_function("format_plain", |b| {
        b.iter(|| formatter.format(black_box(plain)));
    });

    c.bench_function("format_marked", |b| {
        b.iter(|| formatter.format(black_box(marked)));
    });
}

/// Benchmark full record export at various sizes.
fn bench_record_export(c: &mut Criterion) {
    let mut group = c.benchmark_group("record_export");
    let options = ExportOptions::new().with_timestamp(false);

    for count in [1, 10, 50].iter() {
        let records = create_records(*count);

        group.bench_function(format!("{}_records", count), |b| {
            b.iter(|| mdocx::export_records(black_box(&records), &options).unwrap());
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_block_scanning,
    bench_inline_formatting,
    bench_record_export,
);
criterion_main!(benches);
