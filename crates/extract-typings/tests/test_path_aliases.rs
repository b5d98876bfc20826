#![allow(clippy::disallowed_methods)]

use std::{fs, path::PathBuf};

use extract_typings::{ExtractOptions, extract_in, tsconfig::ProjectConfig};
use tempfile::TempDir;

fn write(root: &std::path::Path, path: &str, contents: &str) {
    let path = root.join(path);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

#[test]
fn test_wildcard_alias_is_resolved_and_relinked() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(
        root,
        "tsconfig.json",
        r#"{
            // comments and trailing commas are accepted
            "compilerOptions": {
                "baseUrl": ".",
                "paths": { "@lib/*": ["src/lib/*"], },
            },
        }"#,
    );
    write(root, "src/index.ts", "export * from '@lib/math';\n");
    write(
        root,
        "src/lib/math.ts",
        "export declare function add(a: number, b: number): number;\n",
    );

    let options = ExtractOptions {
        outdir: PathBuf::from("typings"),
        root: root.to_path_buf(),
        ..ExtractOptions::new("src/index.ts")
    };
    let report = extract_in(&options, root).unwrap();

    assert!(report.is_success(), "errors: {:?}", report.errors);
    let index = fs::read_to_string(root.join("typings/index.d.ts")).unwrap();
    assert!(
        index.contains("\"./math\""),
        "alias specifier should be relinked: {index}"
    );
    assert!(!index.contains("@lib/math"));
    assert!(root.join("typings/math.d.ts").is_file());
}

#[test]
fn test_extends_chain_supplies_paths() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(
        root,
        "config/base.json",
        r#"{ "compilerOptions": { "paths": { "~shared": ["../shared/index.ts"] } } }"#,
    );
    write(
        root,
        "tsconfig.json",
        r#"{ "extends": "./config/base", "compilerOptions": { "stripInternal": true } }"#,
    );
    write(root, "shared/index.ts", "export type Shared = string;\n");
    write(root, "src/index.ts", "export * from '~shared';\n");

    let config = ProjectConfig::discover(root, None).unwrap();
    assert!(config.strip_internal);
    assert_eq!(config.paths_base, root.join("config"));

    let options = ExtractOptions {
        outdir: PathBuf::from("out"),
        root: root.to_path_buf(),
        ..ExtractOptions::new("src/index.ts")
    };
    let report = extract_in(&options, root).unwrap();

    assert!(report.is_success(), "errors: {:?}", report.errors);
    let written: Vec<_> = report
        .written
        .iter()
        .map(|path| path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(written, vec!["index.d.ts", "index_1.d.ts"]);
    let entry = fs::read_to_string(root.join("out/index.d.ts")).unwrap();
    assert!(entry.contains("\"./index_1\""));
}

#[test]
fn test_invalid_paths_pattern_aborts() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(
        root,
        "tsconfig.json",
        r#"{ "compilerOptions": { "baseUrl": ".", "paths": { "@a/*/*": ["src/*"] } } }"#,
    );
    write(root, "src/index.ts", "export type A = 1;\n");

    let options = ExtractOptions {
        root: root.to_path_buf(),
        ..ExtractOptions::new("src/index.ts")
    };
    let err = extract_in(&options, root).unwrap_err();

    assert!(format!("{err:#}").contains("at most one '*'"));
}
