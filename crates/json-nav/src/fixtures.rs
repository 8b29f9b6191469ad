//! Fixture-driven snapshot tests, modeled on the teacher's `dir_tests` +
//! `expect_file!` lexer/parser harness: each `.json` file under `test_data/`
//! is scanned and navigated, and the result is compared against a
//! checked-in `.txt` file of the same name.
//!
//! ```bash
//! env UPDATE_EXPECT=1 cargo test --package json-nav fixtures
//! ```

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use expect_test::expect_file;

use crate::document::Document;
use crate::value::JsonValue;

#[test]
fn ok_fixtures_scan_and_dump() {
    dir_tests(&test_data_dir().join("ok"), |text, path| {
        let mut doc = Document::parse(text)
            .unwrap_or_else(|e| panic!("{}: should parse: {e}", path.display()));
        let mut out = String::new();
        writeln!(out, "size: {}", doc.size()).unwrap();
        doc.each_leaf(None, |leaf| {
            let value = leaf
                .fetch(None, JsonValue::Null)
                .expect("each_leaf only visits already-resolved nodes");
            writeln!(out, "{}\t{value:?}", leaf.where_path()).unwrap();
            Ok(())
        })
        .unwrap();
        let dumped = doc.dump(None).unwrap().expect("root always resolves");
        writeln!(out, "dump: {dumped}").unwrap();
        out
    });
}

#[test]
fn err_fixtures_fail_to_parse() {
    dir_tests(&test_data_dir().join("err"), |text, path| {
        match Document::parse(text) {
            Ok(_) => panic!("{}: should fail to parse", path.display()),
            Err(err) => format!("{err}\n"),
        }
    });
}

/// Compares each `.json` file in `dir` against a sibling `.txt` file holding
/// the expected output of `f`.
fn dir_tests<F>(dir: &Path, f: F)
where
    F: Fn(&str, &Path) -> String,
{
    for path in json_files_in_dir(dir) {
        let text =
            fs::read_to_string(&path).unwrap_or_else(|_| panic!("{path:?} should be valid"));
        let actual = f(&text, &path);
        let expected_path = path.with_extension("txt");
        expect_file![expected_path].assert_eq(&actual);
    }
}

fn json_files_in_dir(dir: &Path) -> Vec<PathBuf> {
    let mut paths = fs::read_dir(dir)
        .unwrap_or_else(|_| panic!("{dir:?} should exist"))
        .map(|entry| entry.unwrap().path())
        .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some("json"))
        .collect::<Vec<_>>();
    paths.sort();
    paths
}

fn test_data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_data")
}
