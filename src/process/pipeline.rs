//! Two-pass formatting pipeline
//!
//! Implements the main formatting pipeline:
//! - Pre-processors (may skip the file)
//! - Pass 1: Import sorting
//! - Pass 2: Code formatting
//! - Post-processors (may skip the file)
//!
//! Failures are captured per file on [`FileResult::error`] so one bad file
//! never stops the rest of the run.

use std::collections::BTreeMap;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};

use anyhow::Context;
use rayon::prelude::*;

use crate::config::{Config, ConfigResolver};
use crate::diff::{path_headers, unified_diff};
use crate::discover::expand_path;
use crate::process::processor::{MarkerSkip, Processed, Processor};
use crate::process::transform::{CommandTransform, Transform};
use crate::source::{
    decode_source, decode_text, normalize_newlines, read_file, write_file, SourceFile,
};
use crate::types::{is_stdin, FileContent, FileResult, Skipped, STDIN_NAME};
use crate::Result;

/// Mode flags for a pipeline run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Compute changes without writing them
    pub dry_run: bool,
    /// Attach a unified diff to changed results
    pub diff: bool,
    /// Attach before/after content to results
    pub return_content: bool,
}

/// Drives the sorter and formatter over files
pub struct Pipeline {
    resolver: Box<dyn ConfigResolver>,
    sorter: Box<dyn Transform>,
    formatter: Box<dyn Transform>,
    pre_processors: Vec<Box<dyn Processor>>,
    post_processors: Vec<Box<dyn Processor>>,
    options: PipelineOptions,
}

impl Pipeline {
    /// Pipeline using the configured external commands for both passes
    #[must_use]
    pub fn new(resolver: Box<dyn ConfigResolver>) -> Self {
        Self {
            resolver,
            sorter: Box::new(CommandTransform::sorter()),
            formatter: Box::new(CommandTransform::formatter()),
            pre_processors: Vec::new(),
            post_processors: Vec::new(),
            options: PipelineOptions::default(),
        }
    }

    #[must_use]
    pub fn with_sorter(mut self, sorter: impl Transform + 'static) -> Self {
        self.sorter = Box::new(sorter);
        self
    }

    #[must_use]
    pub fn with_formatter(mut self, formatter: impl Transform + 'static) -> Self {
        self.formatter = Box::new(formatter);
        self
    }

    #[must_use]
    pub fn with_pre_processor(mut self, processor: impl Processor + 'static) -> Self {
        self.pre_processors.push(Box::new(processor));
        self
    }

    #[must_use]
    pub fn with_post_processor(mut self, processor: impl Processor + 'static) -> Self {
        self.post_processors.push(Box::new(processor));
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    /// Format arbitrary bytes for the given path.
    ///
    /// Runs pre-processors, the sorter, the formatter and post-processors in
    /// that order. Errors from any step are returned as-is; a skip from a
    /// processor short-circuits the rest.
    pub fn format_bytes(
        &self,
        path: &Path,
        content: FileContent,
        encoding: &str,
        config: &Config,
    ) -> Result<Processed> {
        let mut content = content;
        if let Some(marker) = &config.skip_marker {
            match MarkerSkip::new(marker).process(path, content, encoding)? {
                Processed::Proceed(next) => content = next,
                skip @ Processed::Skip(_) => return Ok(skip),
            }
        }

        let mut content = match run_processors(&self.pre_processors, path, content, encoding)? {
            Processed::Proceed(content) => content,
            skip @ Processed::Skip(_) => return Ok(skip),
        };

        if let Some(sorted) = self.sorter.apply(path, &content, encoding, &config.sort)? {
            log::debug!("{} changed {}", self.sorter.name(), path.display());
            content = sorted;
        }
        if let Some(formatted) = self
            .formatter
            .apply(path, &content, encoding, &config.format)?
        {
            log::debug!("{} changed {}", self.formatter.name(), path.display());
            content = formatted;
        }

        run_processors(&self.post_processors, path, content, encoding)
    }

    /// Format a single file on disk.
    ///
    /// Writes changes back unless running dry. Any failure, including a
    /// failed write, is attached to the result rather than returned.
    #[must_use]
    pub fn format_file(&self, path: &Path) -> FileResult {
        let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        log::debug!("Checking {}", path.display());

        let mut result = FileResult::new(&path);
        let Some((source, dst)) = self.transform_source(&path, &mut result, || read_file(&path))
        else {
            return result;
        };

        let (from, to) = path_headers(&path.to_string_lossy());
        self.compare(&mut result, &source, &dst, &from, &to);

        if result.changed && !self.options.dry_run {
            log::debug!("Formatted {}", path.display());
            match write_file(&path, &dst, source.newline) {
                Ok(()) => result.written = true,
                Err(e) => result.error = Some(e),
            }
        }

        result
    }

    /// Format content from stdin, printing the result to stdout.
    ///
    /// `path` names the content for config discovery and reporting.
    #[must_use]
    pub fn format_stdin(&self, path: &Path) -> FileResult {
        let stdin = io::stdin();
        let stdout = io::stdout();
        self.format_reader(path, &mut stdin.lock(), &mut stdout.lock())
    }

    /// Format content read from `input`.
    ///
    /// Unless running dry, the final content (the original content when
    /// skipped or failed) is written to `output`, and a changed result
    /// counts as written.
    pub fn format_reader<R: Read, W: Write>(
        &self,
        path: &Path,
        input: &mut R,
        output: &mut W,
    ) -> FileResult {
        let mut result = FileResult::new(path);
        let mut raw = Vec::new();
        if let Err(e) = input.read_to_end(&mut raw).context("failed to read stdin") {
            result.error = Some(e);
            return result;
        }
        let original = decode_source(raw);

        let final_content = match self.transform_source(path, &mut result, || Ok(original.clone()))
        {
            Some((source, dst)) => {
                let label = path.to_string_lossy();
                self.compare(&mut result, &source, &dst, &label, &label);
                dst
            }
            None => original.content.clone(),
        };

        if !self.options.dry_run {
            let content = normalize_newlines(&final_content, original.newline);
            match output.write_all(&content).and_then(|()| output.flush()) {
                Ok(()) => result.written = result.changed,
                Err(e) => {
                    result.error = Some(anyhow::Error::new(e).context("failed to write stdout"));
                }
            }
        }

        result
    }

    /// Format one or more paths, recursively, honoring configured excludes.
    ///
    /// Collects the results of [`Pipeline::stream_paths`].
    pub fn format_paths(&self, paths: &[PathBuf]) -> Result<Vec<FileResult>> {
        self.stream_paths(paths, |results| results.collect())
    }

    /// Format paths and hand the results to `consume` as they complete.
    ///
    /// If the first path is `-`, stdin is formatted instead; an optional
    /// second path names the content. Files are formatted in parallel, but
    /// `consume` sees results in input path order, and within a directory in
    /// discovery order. A root whose config can't be resolved yields one
    /// error result in its place.
    pub fn stream_paths<T, F>(&self, paths: &[PathBuf], consume: F) -> Result<T>
    where
        F: FnOnce(&mut dyn Iterator<Item = FileResult>) -> T,
    {
        let Some(first) = paths.first() else {
            return Ok(consume(&mut std::iter::empty()));
        };

        if is_stdin(first) {
            let path = match paths {
                [_] => PathBuf::from(STDIN_NAME),
                [_, path] => path.clone(),
                _ => anyhow::bail!("too many stdin paths"),
            };
            return Ok(consume(&mut std::iter::once(self.format_stdin(&path))));
        }

        let entries = self.expand_roots(paths);
        Ok(std::thread::scope(|scope| {
            let (tx, rx) = mpsc::channel();
            scope.spawn(move || {
                entries
                    .into_par_iter()
                    .enumerate()
                    .for_each_with(tx, |tx, (index, entry)| {
                        let result = match entry {
                            Entry::File(path) => self.format_file(&path),
                            Entry::Failed(result) => result,
                        };
                        // The consumer may stop early; remaining results are dropped
                        tx.send((index, result)).ok();
                    });
            });
            consume(&mut InOrder::new(rx))
        }))
    }

    /// Expand every root into files, in argument order
    fn expand_roots(&self, paths: &[PathBuf]) -> Vec<Entry> {
        let mut entries = Vec::new();
        for path in paths {
            if is_stdin(path) {
                log::warn!("Cannot mix stdin ('-') with normal paths, ignoring");
                continue;
            }
            let root = path.canonicalize().unwrap_or_else(|_| path.clone());
            match self.resolver.resolve(&root) {
                Ok(config) => entries.extend(expand_path(&root, &config).map(Entry::File)),
                Err(e) => {
                    let mut result = FileResult::new(path);
                    result.error = Some(e);
                    entries.push(Entry::Failed(result));
                }
            }
        }
        entries
    }

    /// Resolve config, load the source and run both passes.
    ///
    /// Returns `None` after recording a skip or error on `result`.
    fn transform_source<F>(
        &self,
        path: &Path,
        result: &mut FileResult,
        load: F,
    ) -> Option<(SourceFile, FileContent)>
    where
        F: FnOnce() -> Result<SourceFile>,
    {
        let outcome = self.resolver.resolve(path).and_then(|config| {
            let source = load()?;
            let processed =
                self.format_bytes(path, source.content.clone(), &source.encoding, &config)?;
            Ok((source, processed))
        });

        match outcome {
            Ok((source, Processed::Proceed(dst))) => Some((source, dst)),
            Ok((_, Processed::Skip(reason))) => {
                log::debug!("Skipped {}", path.display());
                result.skipped = Skipped::from_reason(reason);
                None
            }
            Err(e) => {
                result.error = Some(e);
                None
            }
        }
    }

    /// Record whether content changed, plus diff and content if requested
    fn compare(
        &self,
        result: &mut FileResult,
        source: &SourceFile,
        dst: &[u8],
        from_header: &str,
        to_header: &str,
    ) {
        let options = self.options;
        let wants_content = options.return_content || options.diff;
        let (before, after) = if wants_content {
            (
                normalize_newlines(&source.content, source.newline),
                normalize_newlines(dst, source.newline),
            )
        } else {
            (Vec::new(), Vec::new())
        };

        if source.content != dst {
            result.changed = true;
            if options.diff {
                result.diff = Some(unified_diff(
                    &decode_text(&before, &source.encoding),
                    &decode_text(&after, &source.encoding),
                    from_header,
                    to_header,
                ));
            }
        }

        if options.return_content {
            result.before = before;
            result.after = after;
        }
    }
}

/// A unit of work from path expansion
enum Entry {
    File(PathBuf),
    Failed(FileResult),
}

/// Reorders indexed results from worker threads into index order
struct InOrder {
    rx: Receiver<(usize, FileResult)>,
    next: usize,
    pending: BTreeMap<usize, FileResult>,
}

impl InOrder {
    fn new(rx: Receiver<(usize, FileResult)>) -> Self {
        Self {
            rx,
            next: 0,
            pending: BTreeMap::new(),
        }
    }
}

impl Iterator for InOrder {
    type Item = FileResult;

    fn next(&mut self) -> Option<FileResult> {
        loop {
            if let Some(result) = self.pending.remove(&self.next) {
                self.next += 1;
                return Some(result);
            }
            let (index, result) = self.rx.recv().ok()?;
            self.pending.insert(index, result);
        }
    }
}

fn run_processors(
    processors: &[Box<dyn Processor>],
    path: &Path,
    content: FileContent,
    encoding: &str,
) -> Result<Processed> {
    let mut content = content;
    for processor in processors {
        match processor.process(path, content, encoding)? {
            Processed::Proceed(next) => content = next,
            skip @ Processed::Skip(_) => return Ok(skip),
        }
    }
    Ok(Processed::Proceed(content))
}
