//! Producer running the external layout converter.

use crate::error::{Error, Result};
use crate::model::Document;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use super::{DocumentProducer, ProducerOptions};

/// Runs `<exe> <input> --to json --output <dir>` and loads `<dir>/<stem>.json`.
#[derive(Debug, Clone)]
pub struct DoclingCommandProducer {
    options: ProducerOptions,
}

impl DoclingCommandProducer {
    /// Create a producer with the given options.
    pub fn new(options: ProducerOptions) -> Self {
        Self { options }
    }

    /// Producer options.
    pub fn options(&self) -> &ProducerOptions {
        &self.options
    }

    fn command(&self, input: &Path, output_dir: &Path) -> Command {
        let mut cmd = Command::new(&self.options.executable);
        cmd.arg(input)
            .args(["--to", "json", "--output"])
            .arg(output_dir);
        if self.options.embed_images {
            cmd.args(["--image-export-mode", "embedded"]);
        }
        cmd.args(&self.options.extra_args);
        cmd
    }

    fn upstream_error(path: &Path, message: impl Into<String>) -> Error {
        Error::UpstreamParse {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }
}

impl Default for DoclingCommandProducer {
    fn default() -> Self {
        Self::new(ProducerOptions::default())
    }
}

/// Locate the JSON the converter wrote for `input`.
fn find_output(dir: &Path, input: &Path) -> io::Result<Option<PathBuf>> {
    if let Some(stem) = input.file_stem() {
        let expected = dir.join(format!("{}.json", stem.to_string_lossy()));
        if expected.is_file() {
            return Ok(Some(expected));
        }
    }

    // Some converter versions sanitize the stem; take the only JSON file.
    let mut found = None;
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|e| e == "json") {
            if found.is_some() {
                return Ok(None);
            }
            found = Some(path);
        }
    }
    Ok(found)
}

impl DocumentProducer for DoclingCommandProducer {
    fn supported_extensions(&self) -> &[&str] {
        &["pdf"]
    }

    fn name(&self) -> &str {
        "docling"
    }

    fn produce(&self, path: &Path) -> Result<Document> {
        let scratch = tempfile::Builder::new().prefix("readorder-").tempdir()?;
        let mut cmd = self.command(path, scratch.path());
        log::debug!("Running {:?}", cmd);

        let output = cmd.output().map_err(|e| {
            Self::upstream_error(
                path,
                format!(
                    "failed to run converter {}: {}",
                    self.options.executable.display(),
                    e
                ),
            )
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr = stderr.trim();
            let message = if stderr.is_empty() {
                format!("converter exited with {}", output.status)
            } else {
                format!("converter exited with {}: {}", output.status, stderr)
            };
            return Err(Self::upstream_error(path, message));
        }

        let json_path = find_output(scratch.path(), path)?
            .ok_or_else(|| Self::upstream_error(path, "converter produced no JSON output"))?;

        Document::open(&json_path)
            .map_err(|e| Self::upstream_error(path, format!("unreadable converter output: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line() {
        let producer = DoclingCommandProducer::new(
            ProducerOptions::new()
                .with_executable("docling-test")
                .with_arg("--ocr"),
        );
        let cmd = producer.command(Path::new("in.pdf"), Path::new("/tmp/out"));

        assert_eq!(cmd.get_program(), "docling-test");
        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(
            args,
            vec![
                "in.pdf",
                "--to",
                "json",
                "--output",
                "/tmp/out",
                "--image-export-mode",
                "embedded",
                "--ocr"
            ]
        );
    }

    #[test]
    fn test_missing_executable() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.pdf");
        fs::write(&input, b"%PDF-1.7\n").unwrap();

        let producer = DoclingCommandProducer::new(
            ProducerOptions::new().with_executable(dir.path().join("no-such-converter")),
        );
        let err = producer.produce(&input).unwrap_err();
        assert!(matches!(err, Error::UpstreamParse { .. }));
        assert!(err.to_string().contains("failed to run converter"));
    }

    #[test]
    fn test_find_output_prefers_stem() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("other.json"), "{}").unwrap();
        fs::write(dir.path().join("paper.json"), "{}").unwrap();

        let found = find_output(dir.path(), Path::new("/uploads/paper.pdf")).unwrap();
        assert_eq!(found, Some(dir.path().join("paper.json")));

        let ambiguous = find_output(dir.path(), Path::new("x.pdf")).unwrap();
        assert_eq!(ambiguous, None);
    }
}
