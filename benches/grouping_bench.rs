// benches/grouping_bench.rs
//! Benchmarks for block validation and list grouping.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use notion_content::{group_blocks, transform_blocks, Block, RichText, SchemaValidator, TextBlock};
use serde_json::{json, Value};

fn text(id: usize) -> TextBlock {
    TextBlock {
        id: format!("block-{}", id),
        rich_text: vec![RichText::plain("Lorem ipsum dolor sit amet")],
    }
}

/// Paragraphs interleaved with runs of bulleted and numbered items.
fn create_blocks(count: usize) -> Vec<Block> {
    (0..count)
        .map(|i| match i % 7 {
            0 => Block::Paragraph(text(i)),
            1..=3 => Block::BulletedListItem(text(i)),
            4 | 5 => Block::NumberedListItem(text(i)),
            _ => Block::Heading2(text(i)),
        })
        .collect()
}

fn create_raw_blocks(count: usize) -> Vec<Value> {
    (0..count)
        .map(|i| {
            let kind = match i % 4 {
                0 => "paragraph",
                1 | 2 => "bulleted_list_item",
                _ => "numbered_list_item",
            };
            json!({
                "object": "block",
                "id": format!("block-{}", i),
                "type": kind,
                "has_children": false,
                kind: {
                    "rich_text": [{"type": "text", "plain_text": "Lorem ipsum", "href": null}],
                    "color": "default"
                }
            })
        })
        .collect()
}

fn bench_grouping(c: &mut Criterion) {
    let mut group = c.benchmark_group("group_blocks");

    for size in [10, 100, 1000] {
        let blocks = create_blocks(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &blocks, |b, blocks| {
            b.iter(|| group_blocks(black_box(blocks.clone())))
        });
    }

    group.finish();
}

fn bench_transform(c: &mut Criterion) {
    let mut group = c.benchmark_group("transform_blocks");
    let validator = SchemaValidator::default();

    for size in [10, 100, 1000] {
        let raw = create_raw_blocks(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &raw, |b, raw| {
            b.iter(|| transform_blocks(&validator, black_box(raw)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_grouping, bench_transform);
criterion_main!(benches);
