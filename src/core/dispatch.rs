//! Label dispatch: the print spooler, or a diagnostic stream when no
//! spooler exists. The choice is made once by [`select_dispatcher`].

use crate::config::toml_config::{PrintBackend, PrintingConfig};
use crate::core::{DispatchMode, PrintDispatcher};
use crate::domain::model::Printer;
use crate::utils::error::{LimsError, Result};
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

/// Pipes labels to `lpr`-compatible spoolers: `<command> -P <name> -o raw`.
#[derive(Debug, Clone)]
pub struct SpoolerDispatcher {
    command: PathBuf,
}

impl SpoolerDispatcher {
    pub fn new(command: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
        }
    }

    pub fn command(&self) -> &Path {
        &self.command
    }

    pub fn spool_args(printer: &Printer) -> [&str; 4] {
        ["-P", printer.name.as_str(), "-o", "raw"]
    }
}

#[async_trait]
impl PrintDispatcher for SpoolerDispatcher {
    #[instrument(skip(self, printer, label), fields(printer = %printer.name, bytes = label.len()))]
    async fn dispatch(&self, printer: &Printer, label: &str) -> Result<()> {
        let mut child = Command::new(&self.command)
            .args(Self::spool_args(printer))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                LimsError::print(format!("failed to start {}: {}", self.command.display(), e))
            })?;

        let written = match child.stdin.take() {
            Some(mut stdin) => match stdin.write_all(label.as_bytes()).await {
                Ok(()) => stdin.shutdown().await,
                Err(e) => Err(e),
            },
            None => Ok(()),
        };

        // The child is reaped even when it stopped reading early.
        let output = child.wait_with_output().await?;
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();

        if let Err(e) = written {
            return Err(LimsError::print(format!(
                "{} closed its input ({}): {}",
                self.command.display(),
                output.status,
                if stderr.is_empty() { e.to_string() } else { stderr.to_string() }
            )));
        }

        // No acknowledgement beyond the spooler accepting the job.
        if output.status.success() {
            debug!("Label handed to spooler");
        } else {
            warn!(status = %output.status, stderr, "Spooler exited with failure status");
        }
        Ok(())
    }

    fn mode(&self) -> DispatchMode {
        DispatchMode::Spooler
    }
}

/// Line breaks become `\n`/`\r` so one label stays on one line. Everything
/// else is written as is.
fn single_line(label: &str) -> String {
    label.replace('\r', "\\r").replace('\n', "\\n")
}

/// Writes one line per label instead of printing.
pub struct DiagnosticDispatcher {
    out: Mutex<Box<dyn Write + Send>>,
}

impl DiagnosticDispatcher {
    pub fn stderr() -> Self {
        Self::with_writer(std::io::stderr())
    }

    pub fn with_writer(writer: impl Write + Send + 'static) -> Self {
        Self {
            out: Mutex::new(Box::new(writer)),
        }
    }

    fn line(printer: &Printer, label: &str) -> String {
        format!(
            "{} [{}] {}\n",
            Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            printer.name,
            single_line(label)
        )
    }
}

#[async_trait]
impl PrintDispatcher for DiagnosticDispatcher {
    async fn dispatch(&self, printer: &Printer, label: &str) -> Result<()> {
        let line = Self::line(printer, label);
        let mut out = self
            .out
            .lock()
            .map_err(|_| LimsError::print("diagnostic stream lock poisoned"))?;
        out.write_all(line.as_bytes())?;
        out.flush()?;
        Ok(())
    }

    fn mode(&self) -> DispatchMode {
        DispatchMode::Diagnostic
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Resolve a spooler command the way a shell would: paths are taken as
/// given, bare names are searched on `PATH`.
pub fn locate_command(command: &str) -> Option<PathBuf> {
    let candidate = Path::new(command);
    if candidate.components().count() > 1 {
        return is_executable(candidate).then(|| candidate.to_path_buf());
    }

    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(command))
        .find(|p| is_executable(p))
}

pub fn select_dispatcher(config: &PrintingConfig) -> Result<Arc<dyn PrintDispatcher>> {
    select_dispatcher_with(config, DiagnosticDispatcher::stderr)
}

/// Like [`select_dispatcher`], with `diagnostic` building the fallback.
pub fn select_dispatcher_with<F>(
    config: &PrintingConfig,
    diagnostic: F,
) -> Result<Arc<dyn PrintDispatcher>>
where
    F: FnOnce() -> DiagnosticDispatcher,
{
    match config.backend {
        PrintBackend::Diagnostic => {
            info!("Printing disabled by configuration; labels go to the diagnostic stream");
            Ok(Arc::new(diagnostic()))
        }
        PrintBackend::Spooler => match locate_command(&config.command) {
            Some(path) => {
                info!(command = %path.display(), "Using print spooler");
                Ok(Arc::new(SpoolerDispatcher::new(path)))
            }
            None => Err(LimsError::InvalidConfigValueError {
                field: "printing.command".to_string(),
                value: config.command.clone(),
                reason: "Spooler command not found".to_string(),
            }),
        },
        PrintBackend::Auto => match locate_command(&config.command) {
            Some(path) => {
                info!(command = %path.display(), "Using print spooler");
                Ok(Arc::new(SpoolerDispatcher::new(path)))
            }
            None => {
                warn!(
                    command = %config.command,
                    "Print spooler not found; labels go to the diagnostic stream for this run"
                );
                Ok(Arc::new(diagnostic()))
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn printer() -> Printer {
        Printer {
            id: 1,
            name: "zebra_lab1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_diagnostic_writes_one_line_per_label() {
        let buffer = SharedBuffer::default();
        let dispatcher = DiagnosticDispatcher::with_writer(buffer.clone());

        dispatcher.dispatch(&printer(), "S001").await.unwrap();
        dispatcher
            .dispatch(&printer(), "^XA\n^FDS002^FS\n^XZ")
            .await
            .unwrap();

        let out = buffer.contents();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("[zebra_lab1] S001"));
        assert!(lines[1].ends_with("[zebra_lab1] ^XA\\n^FDS002^FS\\n^XZ"));
        assert_eq!(dispatcher.mode(), DispatchMode::Diagnostic);
    }

    #[tokio::test]
    async fn test_diagnostic_keeps_label_text() {
        let buffer = SharedBuffer::default();
        let dispatcher = DiagnosticDispatcher::with_writer(buffer.clone());

        dispatcher
            .dispatch(&printer(), "^FH\\^FD\"S001\"^FS\r\n")
            .await
            .unwrap();

        let out = buffer.contents();
        assert_eq!(out.lines().count(), 1);
        assert!(out.ends_with("[zebra_lab1] ^FH\\^FD\"S001\"^FS\\r\\n\n"));
    }

    #[test]
    fn test_spool_args_use_raw_mode() {
        assert_eq!(
            SpoolerDispatcher::spool_args(&printer()),
            ["-P", "zebra_lab1", "-o", "raw"]
        );
    }

    #[test]
    fn test_locate_missing_command() {
        assert!(locate_command("definitely-not-a-spooler-7f3a").is_none());
        assert!(locate_command("/nonexistent/dir/lpr").is_none());
    }

    #[test]
    fn test_auto_falls_back_to_diagnostic() {
        let config = PrintingConfig {
            backend: PrintBackend::Auto,
            command: "definitely-not-a-spooler-7f3a".to_string(),
        };
        let dispatcher = select_dispatcher(&config).unwrap();
        assert_eq!(dispatcher.mode(), DispatchMode::Diagnostic);
    }

    #[test]
    fn test_forced_spooler_requires_command() {
        let config = PrintingConfig {
            backend: PrintBackend::Spooler,
            command: "definitely-not-a-spooler-7f3a".to_string(),
        };
        assert!(select_dispatcher(&config).is_err());
    }

    #[test]
    fn test_forced_diagnostic() {
        let config = PrintingConfig {
            backend: PrintBackend::Diagnostic,
            command: "lpr".to_string(),
        };
        assert_eq!(
            select_dispatcher(&config).unwrap().mode(),
            DispatchMode::Diagnostic
        );
    }
}
