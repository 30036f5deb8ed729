//! Markdown to markup conversion.

use std::future::Future;
use std::process::{ExitStatus, Stdio};

use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::config::{ConverterConfig, ConverterKind};
use crate::markdown::markdown_to_rst;

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("failed to run converter `{program}`")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("converter `{program}` exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },
    #[error("converter `{program}` produced output that is not UTF-8")]
    Utf8 {
        program: String,
        #[source]
        source: std::string::FromUtf8Error,
    },
}

pub trait MarkupConverter {
    fn convert(&self, markdown: &str) -> impl Future<Output = Result<String, ConvertError>> + Send;
}

/// Built-in markdown to reStructuredText converter.
#[derive(Debug, Clone, Copy, Default)]
pub struct RstConverter;

impl MarkupConverter for RstConverter {
    async fn convert(&self, markdown: &str) -> Result<String, ConvertError> {
        Ok(markdown_to_rst(markdown))
    }
}

/// Pipes markdown through an external program, e.g. `pandoc -f markdown -t rst`.
#[derive(Debug, Clone)]
pub struct CommandConverter {
    program: String,
    args: Vec<String>,
}

impl CommandConverter {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    fn spawn_error(&self, source: std::io::Error) -> ConvertError {
        ConvertError::Spawn {
            program: self.program.clone(),
            source,
        }
    }
}

impl MarkupConverter for CommandConverter {
    async fn convert(&self, markdown: &str) -> Result<String, ConvertError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let stdin = child.stdin.take();
        let feed = async move {
            // Dropping the handle closes the pipe and signals EOF
            if let Some(mut stdin) = stdin {
                stdin.write_all(markdown.as_bytes()).await?;
                stdin.shutdown().await?;
            }
            Ok::<_, std::io::Error>(())
        };

        // Feed stdin while draining stdout so large documents cannot fill the pipes
        let (fed, output) = tokio::join!(feed, child.wait_with_output());
        let output = output.map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            return Err(ConvertError::Failed {
                program: self.program.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        fed.map_err(|e| self.spawn_error(e))?;

        String::from_utf8(output.stdout).map_err(|source| ConvertError::Utf8 {
            program: self.program.clone(),
            source,
        })
    }
}

/// Converter chosen from configuration at runtime.
#[derive(Debug, Clone)]
pub enum Converter {
    Rst(RstConverter),
    Command(CommandConverter),
}

impl Converter {
    pub fn from_config(config: &ConverterConfig) -> Self {
        match config.kind {
            ConverterKind::Builtin => Converter::Rst(RstConverter),
            ConverterKind::Command => {
                Converter::Command(CommandConverter::new(&config.command, config.args.clone()))
            }
        }
    }
}

impl MarkupConverter for Converter {
    async fn convert(&self, markdown: &str) -> Result<String, ConvertError> {
        match self {
            Converter::Rst(converter) => converter.convert(markdown).await,
            Converter::Command(converter) => converter.convert(markdown).await,
        }
    }
}
