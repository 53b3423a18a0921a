//! Graphviz process plumbing.
//!
//! The emitted DOT description is handed to the external `dot` renderer on
//! its stdin; the rendered image flows to this process's stdout.

use std::io::Write;
use std::process::{Command, ExitStatus, Stdio};
use thiserror::Error;

/// Errors from driving the external renderer.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("failed to launch `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("`{command}` exited with {status}")]
    Renderer { command: String, status: ExitStatus },
}

/// Result type for rendering operations.
pub type Result<T> = std::result::Result<T, RenderError>;

/// Runs `dot` over a graph description, producing an image on stdout.
pub struct DotRenderer {
    image_format: String,
}

impl DotRenderer {
    /// Create a renderer for the given image format (`png`, `svg`, ...).
    pub fn new(image_format: &str) -> Self {
        Self {
            image_format: image_format.to_string(),
        }
    }

    /// Feed `description` to `dot -T<format>` and wait for it to finish.
    ///
    /// The child inherits stdout and stderr, so the image and any renderer
    /// diagnostics go wherever this process's streams point. A non-zero
    /// exit status is reported as [`RenderError::Renderer`].
    pub fn render(&self, description: &str) -> Result<()> {
        let command = format!("dot -T{}", self.image_format);
        let mut child = Command::new("dot")
            .arg(format!("-T{}", self.image_format))
            .stdin(Stdio::piped())
            .spawn()
            .map_err(|source| RenderError::Spawn {
                command: command.clone(),
                source,
            })?;

        // stdin is piped above, so the handle is always present. Dropping
        // it at the end of the block closes the pipe before the wait.
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(description.as_bytes())?;
        }

        let status = child.wait()?;
        if !status.success() {
            return Err(RenderError::Renderer { command, status });
        }
        Ok(())
    }
}
