#![allow(clippy::disallowed_methods)]

use std::{
    fs,
    path::{Path, PathBuf},
};

use extract_typings::{ExtractOptions, GenerateReport, ModuleError, extract_in};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

/// Project directory with a `tsconfig.json` and the given source files
fn project(files: &[(&str, &str)]) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("tsconfig.json"),
        "{ \"compilerOptions\": { \"declaration\": true } }",
    )
    .unwrap();
    for (path, contents) in files {
        let path = temp_dir.path().join(path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }
    temp_dir
}

fn run(root: &Path, entry: &str, file_name: &str) -> GenerateReport {
    let options = ExtractOptions {
        entry: PathBuf::from(entry),
        outdir: PathBuf::from("out"),
        file_name: file_name.to_owned(),
        auto_clean: true,
        project: None,
        root: root.to_path_buf(),
    };
    extract_in(&options, root).unwrap()
}

/// Names of the files in `dir`, sorted
fn output_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

fn read(root: &Path, name: &str) -> String {
    fs::read_to_string(root.join("out").join(name)).unwrap()
}

#[test]
fn test_single_dependency() {
    let temp_dir = project(&[
        ("src/index.ts", "export * from './util';\n"),
        (
            "src/util.ts",
            "export function double(n: number): number { return n * 2; }\n",
        ),
    ]);
    let root = temp_dir.path();

    let report = run(root, "src/index.ts", "index");

    assert!(report.is_success(), "errors: {:?}", report.errors);
    assert_eq!(output_files(&root.join("out")), vec!["index.d.ts", "util.d.ts"]);
    assert!(read(root, "index.d.ts").contains("\"./util\""));
    assert!(read(root, "util.d.ts").contains("export declare function double(n: number): number;"));
}

#[test]
fn test_cycle_back_to_entry() {
    let temp_dir = project(&[
        ("src/index.ts", "export * from './a';\nexport type Id = string;\n"),
        ("src/a.ts", "export * from './index';\nexport type Name = string;\n"),
    ]);
    let root = temp_dir.path();

    let report = run(root, "src/index.ts", "index");

    assert!(report.is_success(), "errors: {:?}", report.errors);
    assert_eq!(report.written.len(), 2, "each module is written exactly once");
    assert_eq!(output_files(&root.join("out")), vec!["a.d.ts", "index.d.ts"]);
    assert!(read(root, "a.d.ts").contains("\"./index\""));
    assert_eq!(
        report.cycles,
        vec![vec![root.join("src/a.ts"), root.join("src/index.ts")]]
    );
}

#[test]
fn test_basename_collisions_are_suffixed() {
    let temp_dir = project(&[
        (
            "src/index.ts",
            "export { Circle } from './shapes/circle';\nexport { Circle as Model } from './models/circle';\n",
        ),
        ("src/shapes/circle.ts", "export type Circle = { radius: number };\n"),
        ("src/models/circle.ts", "export type Circle = { id: string };\n"),
    ]);
    let root = temp_dir.path();

    let report = run(root, "src/index.ts", "index");

    assert!(report.is_success(), "errors: {:?}", report.errors);
    assert_eq!(
        output_files(&root.join("out")),
        vec!["circle.d.ts", "circle_1.d.ts", "index.d.ts"]
    );
    let index = read(root, "index.d.ts");
    assert!(index.contains("\"./circle\""));
    assert!(index.contains("\"./circle_1\""));
    assert!(read(root, "circle.d.ts").contains("radius"));
    assert!(read(root, "circle_1.d.ts").contains("id"));
}

#[test]
fn test_json_module() {
    let temp_dir = project(&[
        ("src/index.ts", "export { default as data } from './data.json';\n"),
        ("src/data.json", "{\"a\":1}"),
    ]);
    let root = temp_dir.path();

    let report = run(root, "src/index.ts", "index");

    assert!(report.is_success(), "errors: {:?}", report.errors);
    assert!(read(root, "index.d.ts").contains("\"./data\""));
    let data = read(root, "data.d.ts");
    assert!(data.contains("export interface Root {\n    a: number;\n}"));
    assert!(data.contains("export default root;"));
}

#[test]
fn test_unresolved_specifier_is_kept() {
    let temp_dir = project(&[(
        "src/index.ts",
        "export * from './missing';\nexport * from 'some-package';\n",
    )]);
    let root = temp_dir.path();

    let report = run(root, "src/index.ts", "index");

    assert!(report.is_success(), "errors: {:?}", report.errors);
    assert_eq!(output_files(&root.join("out")), vec!["index.d.ts"]);
    let index = read(root, "index.d.ts");
    assert!(index.contains("\"./missing\""));
    assert!(index.contains("\"some-package\""));
}

#[test]
fn test_entry_file_name_override() {
    let temp_dir = project(&[
        ("src/main.ts", "export * from './types';\n"),
        ("src/types.ts", "export type Flag = boolean;\n"),
    ]);
    let root = temp_dir.path();

    let report = run(root, "src/main.ts", "types.d.ts");

    assert!(report.is_success(), "errors: {:?}", report.errors);
    assert_eq!(
        output_files(&root.join("out")),
        vec!["types.d.ts", "types_1.d.ts"],
        "the entry keeps the requested name and the dependency is suffixed"
    );
    assert!(read(root, "types.d.ts").contains("\"./types_1\""));
    assert!(read(root, "types_1.d.ts").contains("Flag"));
}

#[test]
fn test_declaration_files_are_followed() {
    let temp_dir = project(&[
        ("src/index.ts", "export * from './globals';\n"),
        (
            "src/globals.d.ts",
            "import { Extra } from \"./extra\";\nexport declare const extra: Extra;\n",
        ),
        ("src/extra.d.ts", "export interface Extra { on: boolean }\n"),
    ]);
    let root = temp_dir.path();

    let report = run(root, "src/index.ts", "index");

    assert!(report.is_success(), "errors: {:?}", report.errors);
    assert_eq!(
        output_files(&root.join("out")),
        vec!["extra.d.ts", "globals.d.ts", "index.d.ts"]
    );
    assert_eq!(
        read(root, "globals.d.ts"),
        "import { Extra } from \"./extra\";\nexport declare const extra: Extra;\n"
    );
}

#[test]
fn test_runs_are_idempotent() {
    let temp_dir = project(&[
        ("src/index.ts", "export * from './a';\nexport * from './lib/a';\n"),
        ("src/a.ts", "export type A = 1;\n"),
        ("src/lib/a.ts", "export * from '../a';\nexport type B = 2;\n"),
    ]);
    let root = temp_dir.path();

    run(root, "src/index.ts", "index");
    let first: Vec<(String, String)> = output_files(&root.join("out"))
        .into_iter()
        .map(|name| {
            let contents = read(root, &name);
            (name, contents)
        })
        .collect();

    run(root, "src/index.ts", "index");
    let second: Vec<(String, String)> = output_files(&root.join("out"))
        .into_iter()
        .map(|name| {
            let contents = read(root, &name);
            (name, contents)
        })
        .collect();

    assert_eq!(first, second);
    assert_eq!(first.len(), 3);
}

#[test]
fn test_missing_entry() {
    let temp_dir = project(&[]);
    let root = temp_dir.path();

    let report = run(root, "src/nope.ts", "index");

    assert!(!report.entry_found);
    assert!(!report.is_success());
    assert!(report.written.is_empty());
    assert!(output_files(&root.join("out")).is_empty());
}

#[test]
fn test_invalid_json_dependency() {
    let temp_dir = project(&[
        ("src/index.ts", "export { default as cfg } from './broken.json';\n"),
        ("src/broken.json", "{ nope"),
    ]);
    let root = temp_dir.path();

    let report = run(root, "src/index.ts", "index");

    assert!(!report.is_success());
    assert_eq!(read(root, "broken.d.ts"), "");
    assert!(matches!(
        report.errors.as_slice(),
        [ModuleError::InvalidJson { .. }]
    ));
    assert!(
        report.errors[0]
            .describe(root)
            .starts_with("src/broken.json Error: Invalid JSON file.")
    );
}

#[test]
fn test_missing_annotations_are_reported_but_written() {
    let temp_dir = project(&[(
        "src/index.ts",
        "export function twice(n: number) { return n * 2; }\n",
    )]);
    let root = temp_dir.path();

    let report = run(root, "src/index.ts", "index");

    assert!(!report.is_success());
    assert_eq!(report.written.len(), 1);
    assert!(
        report
            .errors
            .iter()
            .all(|error| matches!(error, ModuleError::Diagnostic(_)))
    );
    assert!(report.errors[0].describe(root).starts_with("src/index.ts:1:"));
}

#[test]
fn test_missing_tsconfig_is_fatal() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    fs::write(root.join("index.ts"), "export type A = 1;\n").unwrap();
    let options = ExtractOptions {
        project: Some(PathBuf::from("does-not-exist.json")),
        root: root.to_path_buf(),
        ..ExtractOptions::new("index.ts")
    };

    let err = extract_in(&options, root).unwrap_err();

    assert!(err.to_string().contains("does-not-exist.json"));
    assert!(!root.join("dist").exists(), "nothing is written on config errors");
}
