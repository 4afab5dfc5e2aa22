//! Benchmarks for notebook analysis and rendering.
//!
//! Run with: cargo bench
//!
//! These benchmarks use synthetic notebooks without image outputs.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::json;

/// Creates a synthetic notebook with the given number of sections.
fn create_test_notebook(section_count: usize) -> Vec<u8> {
    let mut cells = vec![json!({
        "cell_type": "markdown",
        "metadata": {},
        "source": "# Benchmark Paper\n**Authors:** A. Researcher, B. Scholar\n**Keywords:** benchmark"
    })];

    for i in 0..section_count {
        cells.push(json!({
            "cell_type": "markdown",
            "metadata": {},
            "source": format!(
                "## Section {}\nThe quantity $x_{}$ grows with **load** [1].\n$$y_{} = a x_{}^2 + b$$\nPhysically, the response is quadratic.",
                i + 1, i, i, i
            )
        }));
        cells.push(json!({
            "cell_type": "code",
            "metadata": {},
            "execution_count": i + 1,
            "source": format!("y{} = a * x{} ** 2 + b", i, i),
            "outputs": []
        }));
    }

    cells.push(json!({
        "cell_type": "markdown",
        "metadata": {},
        "source": "## References\n[1] Smith, J. (2020). Loads and responses. Journal."
    }));

    json!({"nbformat": 4, "nbformat_minor": 5, "metadata": {}, "cells": cells})
        .to_string()
        .into_bytes()
}

/// Benchmark notebook format detection.
fn bench_format_detection(c: &mut Criterion) {
    let data = create_test_notebook(1);
    let non_notebook = b"Not a notebook at all, just random text content";

    c.bench_function("detect_valid_notebook", |b| {
        b.iter(|| nbpaper::detect_format_from_bytes(black_box(&data)).unwrap());
    });

    c.bench_function("detect_non_notebook", |b| {
        b.iter(|| nbpaper::detect_format_from_bytes(black_box(non_notebook)).is_err());
    });
}

/// Benchmark loading and model building at various sizes.
fn bench_document_building(c: &mut Criterion) {
    let mut group = c.benchmark_group("document_building");

    for section_count in [1, 10, 50].iter() {
        let data = create_test_notebook(*section_count);

        group.bench_function(format!("{}_sections", section_count), |b| {
            b.iter(|| {
                let _ = nbpaper::Nbpaper::new()
                    .include_code(true)
                    .load_bytes(black_box(&data));
            });
        });
    }

    group.finish();
}

/// Benchmark rendering every template.
fn bench_rendering(c: &mut Criterion) {
    let data = create_test_notebook(20);
    let result = nbpaper::Nbpaper::new()
        .include_code(true)
        .load_bytes(&data)
        .unwrap();
    let mut group = c.benchmark_group("rendering");

    for id in nbpaper::TemplateId::ALL {
        group.bench_function(id.name(), |b| {
            b.iter(|| nbpaper::render::render(black_box(result.document()), id.name()));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_format_detection,
    bench_document_building,
    bench_rendering,
);
criterion_main!(benches);
