//! Integration tests for tandem
//!
//! These tests drive the library pipeline and reporter together with
//! in-process transforms, so they run on every platform.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]

use std::fs;
use std::path::{Path, PathBuf};

use tandem_fmt::commands::pipeline_options;
use tandem_fmt::{
    echo_results_to, Config, DiscoveredConfig, FixedConfig, Mode, Pipeline, Processed, ToolConfig,
    Transform,
};
use tempfile::TempDir;

/// Sorts `import` lines to the top, in order
struct SortImports;

impl Transform for SortImports {
    fn name(&self) -> &str {
        "sort-imports"
    }

    fn apply(
        &self,
        _path: &Path,
        content: &[u8],
        _encoding: &str,
        _config: &ToolConfig,
    ) -> tandem_fmt::Result<Option<Vec<u8>>> {
        let text = std::str::from_utf8(content)?;
        let (mut imports, rest): (Vec<&str>, Vec<&str>) =
            text.lines().partition(|line| line.starts_with("import "));
        imports.sort_unstable();

        let mut sorted = String::new();
        for line in imports.into_iter().chain(rest) {
            sorted.push_str(line);
            sorted.push('\n');
        }
        Ok((sorted.as_bytes() != content).then(|| sorted.into_bytes()))
    }
}

/// Collapses runs of spaces, failing on tabs
struct Squash;

impl Transform for Squash {
    fn name(&self) -> &str {
        "squash"
    }

    fn apply(
        &self,
        _path: &Path,
        content: &[u8],
        _encoding: &str,
        _config: &ToolConfig,
    ) -> tandem_fmt::Result<Option<Vec<u8>>> {
        if content.contains(&b'\t') {
            anyhow::bail!("tabs are not allowed\nfound in input");
        }
        let mut out = Vec::with_capacity(content.len());
        for &b in content {
            if b == b' ' && out.last() == Some(&b' ') {
                continue;
            }
            out.push(b);
        }
        Ok((out != content).then_some(out))
    }
}

fn tree(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (name, content) in files {
        let path = dir.path().join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
    dir
}

fn pipeline(mode: Mode, config: Config) -> Pipeline {
    Pipeline::new(Box::new(FixedConfig(config)))
        .with_sorter(SortImports)
        .with_formatter(Squash)
        .with_options(pipeline_options(mode))
}

fn report(results: Vec<tandem_fmt::FileResult>, diff: bool) -> (String, String, (usize, usize)) {
    colored::control::set_override(false);
    let mut err = Vec::new();
    let mut out = Vec::new();
    let counts = echo_results_to(results, diff, false, &mut err, &mut out).unwrap();
    (
        String::from_utf8(err).unwrap(),
        String::from_utf8(out).unwrap(),
        counts,
    )
}

#[test]
fn test_both_passes_run_in_order() {
    let dir = tree(&[("a.py", "import sys\nimport os\nx  =  1\n")]);
    let results = pipeline(Mode::Format, Config::default())
        .format_paths(&[dir.path().to_path_buf()])
        .unwrap();

    assert_eq!(results.len(), 1);
    assert!(results[0].written);
    assert_eq!(
        fs::read_to_string(dir.path().join("a.py")).unwrap(),
        "import os\nimport sys\nx = 1\n"
    );
}

#[test]
fn test_check_mixed_tree() {
    let dir = tree(&[
        ("clean.py", "import os\nx = 1\n"),
        ("dirty.py", "x  = 1\n"),
        ("pkg/tabs.py", "x =\t1\n"),
        ("pkg/stub.pyi", "def f() -> int: ...\n"),
        ("README.md", "not  python\n"),
    ]);

    let results = pipeline(Mode::Check, Config::default())
        .format_paths(&[dir.path().to_path_buf()])
        .unwrap();
    assert_eq!(results.len(), 4);

    let (err, out, counts) = report(results, false);
    assert_eq!(counts, (1, 1));
    assert!(out.is_empty());
    assert!(err.contains("Would format "));
    assert!(err.contains("dirty.py\n"));
    assert!(err.contains("tabs.py: tabs are not allowed\n"));
    assert!(!err.contains("found in input"));
    assert!(err.ends_with(
        "✨ 1 errors, 1 file would be formatted, 2 files already formatted ✨\n"
    ));

    assert_eq!(
        fs::read_to_string(dir.path().join("dirty.py")).unwrap(),
        "x  = 1\n"
    );
}

#[test]
fn test_diff_mode_reports_to_stdout() {
    let dir = tree(&[("pkg/a.py", "import b\nimport a\n")]);
    let results = pipeline(Mode::Diff, Config::default())
        .format_paths(&[dir.path().join("pkg")])
        .unwrap();

    let (err, out, counts) = report(results, true);
    assert_eq!(counts, (1, 0));
    assert!(err.starts_with("Would format "));
    assert!(out.contains("--- a/"));
    assert!(out.contains("+++ b/"));
    assert!(out.contains("@@ -1,2 +1,2 @@"));
    assert!(out.contains("import a\n"));
}

#[test]
fn test_format_preserves_crlf() {
    let dir = tree(&[("a.py", "import b\r\nimport a\r\n")]);
    let results = pipeline(Mode::Format, Config::default())
        .format_paths(&[dir.path().join("a.py")])
        .unwrap();

    let (err, _, counts) = report(results, false);
    assert_eq!(counts, (1, 0));
    assert!(err.ends_with("✨ 1 file formatted ✨\n"));
    assert_eq!(
        fs::read(dir.path().join("a.py")).unwrap(),
        b"import a\r\nimport b\r\n"
    );
}

#[test]
fn test_skip_marker_and_excludes() {
    let dir = tree(&[
        ("gen.py", "# @generated\nx  = 1\n"),
        ("vendor/lib.py", "x  = 1\n"),
        ("ok.py", "x = 1\n"),
    ]);
    let config = Config {
        excludes: vec!["vendor/".to_string()],
        skip_marker: Some("@generated".to_string()),
        ..Config::default()
    };

    let results = pipeline(Mode::Format, config)
        .format_paths(&[dir.path().to_path_buf()])
        .unwrap();
    let (err, _, counts) = report(results, false);

    assert_eq!(counts, (0, 0));
    assert!(err.contains("gen.py: contains @generated\n"));
    assert!(!err.contains("lib.py"));
    assert!(err.ends_with("✨ 1 file already formatted ✨\n"));
    assert_eq!(
        fs::read_to_string(dir.path().join("vendor/lib.py")).unwrap(),
        "x  = 1\n"
    );
}

#[test]
fn test_custom_post_processor_skips() {
    let dir = tree(&[("a.py", "x  = 1\n")]);
    let pipeline = pipeline(Mode::Format, Config::default()).with_post_processor(
        |_: &Path, content: Vec<u8>, _: &str| -> tandem_fmt::Result<Processed> {
            if content.starts_with(b"x = ") {
                Ok(Processed::Skip(Some("post-check rejected".to_string())))
            } else {
                Ok(Processed::Proceed(content))
            }
        },
    );

    let results = pipeline.format_paths(&[dir.path().to_path_buf()]).unwrap();
    let (err, _, counts) = report(results, false);
    assert_eq!(counts, (0, 0));
    assert!(err.contains(": post-check rejected\n"));
    assert_eq!(fs::read_to_string(dir.path().join("a.py")).unwrap(), "x  = 1\n");
}

#[test]
fn test_discovered_config_per_subtree() {
    let dir = tree(&[
        ("tandem.toml", "extensions = [\"py\"]\n"),
        ("a.py", "x  = 1\n"),
        ("b.pyi", "x  = 1\n"),
        ("sub/pyproject.toml", "[tool.tandem]\nextensions = [\"pyi\"]\n"),
        ("sub/c.py", "x  = 1\n"),
        ("sub/d.pyi", "x  = 1\n"),
    ]);

    let pipeline = Pipeline::new(Box::new(DiscoveredConfig::new()))
        .with_formatter(Squash)
        .with_options(pipeline_options(Mode::Check));
    let results = pipeline
        .format_paths(&[dir.path().to_path_buf(), dir.path().join("sub")])
        .unwrap();

    let mut names: Vec<PathBuf> = results
        .iter()
        .map(|r| r.path.strip_prefix(dir.path().canonicalize().unwrap()).unwrap().to_path_buf())
        .collect();
    names.sort();
    assert_eq!(
        names,
        vec![
            PathBuf::from("a.py"),
            PathBuf::from("sub/c.py"),
            PathBuf::from("sub/d.pyi"),
        ]
    );
}

#[test]
fn test_stdin_content_round_trip() {
    let mut input: &[u8] = b"import b\r\nimport a\r\n";
    let mut output = Vec::new();
    let result = pipeline(Mode::Format, Config::default()).format_reader(
        Path::new("pkg/name.py"),
        &mut input,
        &mut output,
    );

    assert!(result.changed);
    assert_eq!(output, b"import a\r\nimport b\r\n");

    let (err, _, counts) = report(vec![result], false);
    assert_eq!(counts, (1, 0));
    assert!(err.starts_with("Formatted pkg/name.py\n"));
}

#[test]
fn test_missing_path_is_an_error() {
    let dir = TempDir::new().unwrap();
    let results = pipeline(Mode::Check, Config::default())
        .format_paths(&[dir.path().join("missing.py")])
        .unwrap();

    let (err, _, counts) = report(results, false);
    assert_eq!(counts, (0, 1));
    assert!(err.contains("Error formatting "));
    assert!(err.ends_with("✨ 1 errors ✨\n"));
}
