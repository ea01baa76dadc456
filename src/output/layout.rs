// Layout engine hand-off
//
// DOT text is either written out as is or piped through a Graphviz binary
// that lays it out and renders the image format named by the output file.

use crate::config::OutputConfig;
use crate::error::{Error, Result};
use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::debug;

/// Image format used when the output path has no extension
pub const DEFAULT_FORMAT: &str = "svg";

/// Where the rendered diagram goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// Raw DOT text (`.dot` / `.gv`)
    Dot,
    /// An image produced by the layout engine, e.g. `svg` or `png`
    Image(String),
}

impl OutputTarget {
    /// Pick the target from the output file extension
    pub fn for_path(path: &Path) -> Self {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("dot") | Some("gv") => OutputTarget::Dot,
            Some(ext) if !ext.is_empty() => OutputTarget::Image(ext.to_string()),
            _ => OutputTarget::Image(DEFAULT_FORMAT.to_string()),
        }
    }
}

/// Runs the external layout engine
#[derive(Debug, Clone)]
pub struct LayoutEngine {
    program: String,
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::from_config(&OutputConfig::default())
    }
}

impl LayoutEngine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn from_config(config: &OutputConfig) -> Self {
        Self::new(config.layout_engine.clone())
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Write `dot` to `output`, laying it out first unless DOT text is wanted
    pub fn write(&self, dot: &str, output: &Path) -> Result<OutputTarget> {
        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let target = OutputTarget::for_path(output);
        match &target {
            OutputTarget::Dot => fs::write(output, dot)?,
            OutputTarget::Image(format) => self.run(dot, format, output)?,
        }
        Ok(target)
    }

    fn run(&self, dot: &str, format: &str, output: &Path) -> Result<()> {
        debug!(program = %self.program, format, output = %output.display(), "running layout engine");

        let mut child = Command::new(&self.program)
            .arg(format!("-T{}", format))
            .arg("-o")
            .arg(output)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::render(format!("failed to start {}: {}", self.program, e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(dot.as_bytes())
                .map_err(|e| Error::render(format!("failed to feed {}: {}", self.program, e)))?;
        }

        let result = child.wait_with_output()?;
        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(Error::render(format!(
                "{} exited with {}: {}",
                self.program,
                result.status,
                stderr.trim()
            )));
        }
        Ok(())
    }
}
