//! Content transforms: the import sorter and the code formatter
//!
//! The crate does not sort or format anything itself. A [`Transform`] hands
//! the content to a collaborator and returns its output. [`CommandTransform`]
//! is the collaborator used by the CLI: it pipes content through an external
//! program named in the project configuration.

use std::io::{ErrorKind, Write};
use std::path::Path;
use std::process::{Command, Stdio};

use anyhow::Context;

use crate::config::ToolConfig;
use crate::types::FileContent;
use crate::Result;

/// Placeholder in command arguments replaced with the file path
const PATH_PLACEHOLDER: &str = "{path}";

/// Environment variable carrying the detected encoding to external commands
pub const ENCODING_ENV: &str = "TANDEM_ENCODING";

/// A content rewriting step
pub trait Transform: Send + Sync {
    /// Short name used in log messages
    fn name(&self) -> &str;

    /// Transform content for `path`.
    ///
    /// Returns `None` when the content is already in the desired form.
    fn apply(
        &self,
        path: &Path,
        content: &[u8],
        encoding: &str,
        config: &ToolConfig,
    ) -> Result<Option<FileContent>>;
}

/// Runs an external program with content on stdin and reads the result
/// from stdout
#[derive(Debug, Clone)]
pub struct CommandTransform {
    name: String,
}

impl CommandTransform {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// The import sorter, configured by the `[sort]` table
    #[must_use]
    pub fn sorter() -> Self {
        Self::new("sort")
    }

    /// The code formatter, configured by the `[format]` table
    #[must_use]
    pub fn formatter() -> Self {
        Self::new("format")
    }
}

impl Transform for CommandTransform {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(
        &self,
        path: &Path,
        content: &[u8],
        encoding: &str,
        config: &ToolConfig,
    ) -> Result<Option<FileContent>> {
        let Some((program, args)) = config.command.split_first() else {
            return Ok(None);
        };

        let path_str = path.to_string_lossy();
        let mut command = Command::new(program);
        command
            .args(args.iter().map(|arg| arg.replace(PATH_PLACEHOLDER, &path_str)))
            .env(ENCODING_ENV, encoding)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = path.parent().filter(|dir| dir.is_dir()) {
            command.current_dir(dir);
        }

        log::debug!("Running {} for {}: {program}", self.name, path.display());
        let mut child = command
            .spawn()
            .with_context(|| format!("failed to run {program}"))?;
        let mut stdin = child.stdin.take().context("child stdin not captured")?;

        // Feed stdin on its own thread while output is drained
        let (written, output) = std::thread::scope(|scope| {
            let writer = scope.spawn(move || stdin.write_all(content));
            let output = child.wait_with_output();
            (writer.join(), output)
        });
        let output = output.with_context(|| format!("failed to wait for {program}"))?;

        match written {
            Ok(Err(e)) if e.kind() != ErrorKind::BrokenPipe => {
                return Err(e).with_context(|| format!("failed to write to {program}"));
            }
            Err(_) => anyhow::bail!("stdin writer for {program} panicked"),
            _ => {}
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr = stderr.trim();
            if stderr.is_empty() {
                anyhow::bail!("{program} exited with {}", output.status);
            }
            anyhow::bail!("{program}: {stderr}");
        }

        if output.stdout == content {
            Ok(None)
        } else {
            Ok(Some(output.stdout))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool(command: &[&str]) -> ToolConfig {
        ToolConfig {
            command: command.iter().map(ToString::to_string).collect(),
        }
    }

    #[test]
    fn test_disabled_transform_is_noop() {
        let result = CommandTransform::formatter()
            .apply(Path::new("a.py"), b"x=1\n", "utf-8", &ToolConfig::default())
            .unwrap();
        assert!(result.is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_command_rewrites_content() {
        let result = CommandTransform::formatter()
            .apply(Path::new("a.py"), b"x=1\n", "utf-8", &tool(&["tr", "x", "y"]))
            .unwrap();
        assert_eq!(result, Some(b"y=1\n".to_vec()));
    }

    #[cfg(unix)]
    #[test]
    fn test_command_unchanged_output() {
        let result = CommandTransform::sorter()
            .apply(Path::new("a.py"), b"x = 1\n", "utf-8", &tool(&["cat"]))
            .unwrap();
        assert!(result.is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_command_failure_reports_stderr() {
        let err = CommandTransform::formatter()
            .apply(
                Path::new("a.py"),
                b"x = 1\n",
                "utf-8",
                &tool(&["sh", "-c", "echo 'cannot parse {path}' >&2; exit 3"]),
            )
            .unwrap_err();
        assert_eq!(err.to_string(), "sh: cannot parse a.py");
    }

    #[cfg(unix)]
    #[test]
    fn test_command_receives_encoding() {
        let result = CommandTransform::formatter()
            .apply(
                Path::new("a.py"),
                b"",
                "iso-8859-1",
                &tool(&["sh", "-c", "printf %s \"$TANDEM_ENCODING\""]),
            )
            .unwrap();
        assert_eq!(result, Some(b"iso-8859-1".to_vec()));
    }

    #[test]
    fn test_missing_program() {
        let err = CommandTransform::formatter()
            .apply(
                Path::new("a.py"),
                b"x = 1\n",
                "utf-8",
                &tool(&["tandem-no-such-program-xyz"]),
            )
            .unwrap_err();
        assert!(err
            .to_string()
            .contains("failed to run tandem-no-such-program-xyz"));
    }
}
