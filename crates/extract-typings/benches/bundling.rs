use std::{fmt::Write as _, fs, hint::black_box, path::Path, time::Duration};

use criterion::{Criterion, criterion_group, criterion_main};
use extract_typings::{
    Orchestrator, emitter::IsolatedDeclarationEmitter, resolver::ModuleResolver,
    visitors::collect_declaration_specifiers,
};
use tempfile::TempDir;

/// Write a tree of `width` directories with `depth` chained modules each, all
/// re-exported from `index.ts`. Every directory reuses the same basenames so
/// name allocation has to suffix.
fn write_synthetic_project(root: &Path, width: usize, depth: usize) {
    let mut index = String::new();
    for dir in 0..width {
        let package = root.join(format!("pkg{dir}"));
        fs::create_dir_all(&package).expect("Failed to create package directory");
        for level in 0..depth {
            let mut source = String::new();
            if level + 1 < depth {
                let _ = writeln!(source, "export * from './module{}';", level + 1);
            }
            let _ = writeln!(
                source,
                "export interface Item{dir}x{level} {{ id: number; label: string }}\n\
                 export function make{dir}x{level}(id: number): Item{dir}x{level} {{ \
                 return {{ id, label: '' }}; }}"
            );
            fs::write(package.join(format!("module{level}.ts")), source)
                .expect("Failed to write module");
        }
        let _ = writeln!(index, "export * from './pkg{dir}/module0';");
    }
    fs::write(root.join("index.ts"), index).expect("Failed to write entry");
}

fn benchmark_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate");
    group.sample_size(20);
    group.measurement_time(Duration::from_secs(10));

    for (width, depth) in [(4, 4), (16, 8)] {
        let project = TempDir::new().expect("Failed to create temp dir");
        write_synthetic_project(project.path(), width, depth);
        let entry = project.path().join("index.ts");
        let outdir = project.path().join("out");

        group.bench_function(format!("tree_{width}x{depth}"), |b| {
            b.iter(|| {
                let mut orchestrator = Orchestrator::new(
                    IsolatedDeclarationEmitter::default(),
                    ModuleResolver::relative_only(),
                );
                let report = orchestrator.generate(&entry, &outdir, "index");
                assert!(report.is_success());
                black_box(report)
            });
        });
    }

    group.finish();
}

fn benchmark_collect_specifiers(c: &mut Criterion) {
    let mut declaration = String::new();
    for i in 0..500 {
        let _ = writeln!(declaration, "export * from \"./module{i}\";");
        let _ = writeln!(declaration, "export declare const value{i}: number;");
    }

    c.bench_function("collect_specifiers_500", |b| {
        b.iter(|| collect_declaration_specifiers(black_box(&declaration)));
    });
}

criterion_group!(benches, benchmark_generate, benchmark_collect_specifiers);
criterion_main!(benches);
