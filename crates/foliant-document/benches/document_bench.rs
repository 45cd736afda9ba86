// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the foliant-document crate: range parsing and
// merging of synthetic documents.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use foliant_document::{Document, PageSize, merge_pdfs, parse_ranges};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A document of `pages` blank Letter pages.
fn blank_pdf(pages: usize) -> Vec<u8> {
    let mut doc = Document::new();
    for _ in 0..pages {
        doc.add_blank_page(PageSize::new(612.0, 792.0))
            .expect("blank page");
    }
    doc.save().expect("serialise")
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// A long expression with overlaps, junk terms, and an oversized range that
/// must be clamped rather than iterated.
fn bench_parse_ranges(c: &mut Criterion) {
    let expression = "1-3, 5, 7-9, x, 12-40, 3-6, 100-4000000000, 2-, -8";

    c.bench_function("parse_ranges (500 pages)", |b| {
        b.iter(|| black_box(parse_ranges(black_box(expression), 500)));
    });
}

/// Merge four 25-page documents.
fn bench_merge(c: &mut Criterion) {
    let inputs: Vec<Vec<u8>> = (0..4).map(|_| blank_pdf(25)).collect();

    c.bench_function("merge_pdfs (4 x 25 pages)", |b| {
        b.iter(|| black_box(merge_pdfs(black_box(&inputs))));
    });
}

criterion_group!(benches, bench_parse_ranges, bench_merge);
criterion_main!(benches);
