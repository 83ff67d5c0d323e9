//! External services used by enrichment modules
//!
//! - `post`: upload a file to a web service as multipart form data
//! - `XsltProcessor`: run `xsltproc` on a service result to produce TEI
//!
//! Both are async and never retry; timeouts and retry policy belong to the
//! caller (e.g. through the `reqwest::Client` it passes in).

use crate::error::{Error, ProcessLogs, Result};
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

// ===== HTTP UPLOAD =====

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostRequest {
    /// File sent as the `file` form field
    pub filename: PathBuf,
    pub url: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct ServiceResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl ServiceResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// POST `request.filename` to `request.url`.
///
/// The file is checked before any connection is made. Non-2xx answers are
/// returned as-is; only transport failures are errors.
pub async fn post(client: &reqwest::Client, request: &PostRequest) -> Result<ServiceResponse> {
    let metadata = tokio::fs::metadata(&request.filename).await.map_err(|e| {
        Error::Transport(format!("cannot read {}: {e}", request.filename.display()))
    })?;

    let file = tokio::fs::File::open(&request.filename).await.map_err(|e| {
        Error::Transport(format!("cannot open {}: {e}", request.filename.display()))
    })?;

    let file_name = request
        .filename
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "file".to_string());
    let part = Part::stream_with_length(file, metadata.len()).file_name(file_name);
    let form = Form::new().part("file", part);

    let mut builder = client.post(&request.url).multipart(form);
    for (key, value) in &request.headers {
        builder = builder.header(key.as_str(), value.as_str());
    }

    tracing::debug!(url = %request.url, file = %request.filename.display(), bytes = metadata.len(), "posting file");
    let response = builder
        .send()
        .await
        .map_err(|e| Error::Transport(e.to_string()))?;

    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();
    let body = response
        .text()
        .await
        .map_err(|e| Error::Transport(e.to_string()))?;

    tracing::info!(url = %request.url, status, "service answered");
    Ok(ServiceResponse { status, headers, body })
}

// ===== XSLT TRANSFORM =====

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformRequest {
    /// Where xsltproc writes its result
    pub output: PathBuf,
    /// Passed to the stylesheet as the `documentId` string parameter
    pub document_id: String,
    /// Passed to the stylesheet as the `runId` string parameter
    pub run_id: String,
    pub xslt_file: PathBuf,
    pub xml_file: PathBuf,
}

#[derive(Debug, Clone, Default)]
pub struct TransformOutcome {
    pub logs: ProcessLogs,
    /// stdout and stderr lines in arrival order, tagged `[stdout] ` / `[stderr] `
    pub output: Vec<String>,
    /// `None` when the process was killed by a signal
    pub code: Option<i32>,
}

#[derive(Debug, Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

impl TransformOutcome {
    /// Store the line read into `line`, decoded lossily (xsltproc echoes file
    /// names in whatever encoding they have). Returns whether the stream is
    /// still open.
    fn record(&mut self, stream: Stream, read: io::Result<usize>, line: &mut Vec<u8>) -> bool {
        let open = match read {
            Ok(0) => false,
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(?stream, error = %e, "transform log stream failed");
                false
            }
        };

        if !line.is_empty() {
            let text = String::from_utf8_lossy(line);
            let text = text.trim_end_matches(['\n', '\r']).to_string();
            match stream {
                Stream::Stdout => {
                    self.output.push(format!("[stdout] {text}"));
                    self.logs.stdout.push(text);
                }
                Stream::Stderr => {
                    self.output.push(format!("[stderr] {text}"));
                    self.logs.stderr.push(text);
                }
            }
            line.clear();
        }
        open
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Turn a non-zero exit into a process error carrying the logs
    pub fn check(self) -> Result<Self> {
        if self.success() {
            return Ok(self);
        }
        Err(Error::Process {
            message: match self.code {
                Some(code) => format!("transform exited with code {code}"),
                None => "transform terminated by signal".to_string(),
            },
            code: self.code,
            logs: self.logs,
        })
    }
}

/// Runs stylesheets through an external XSLT processor
#[derive(Debug, Clone)]
pub struct XsltProcessor {
    program: PathBuf,
    /// Arguments placed before the xsltproc ones (wrappers, containers)
    leading_args: Vec<OsString>,
}

impl Default for XsltProcessor {
    fn default() -> Self {
        Self::new("xsltproc")
    }
}

impl XsltProcessor {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
        }
    }

    pub fn with_leading_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.leading_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// xsltproc command line for `request`
    pub fn args(&self, request: &TransformRequest) -> Vec<OsString> {
        let mut args = self.leading_args.clone();
        args.extend([
            OsString::from("--output"),
            request.output.clone().into_os_string(),
            OsString::from("--stringparam"),
            OsString::from("documentId"),
            OsString::from(&request.document_id),
            OsString::from("--stringparam"),
            OsString::from("runId"),
            OsString::from(&request.run_id),
            request.xslt_file.clone().into_os_string(),
            request.xml_file.clone().into_os_string(),
        ]);
        args
    }

    /// Run the transform and collect its logs.
    ///
    /// Launch failures are errors; a non-zero exit is reported in the
    /// outcome (see [`TransformOutcome::check`]).
    pub async fn transform(&self, request: &TransformRequest) -> Result<TransformOutcome> {
        let mut child = Command::new(&self.program)
            .args(self.args(request))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::Process {
                message: format!("failed to launch {}: {e}", self.program.display()),
                code: None,
                logs: ProcessLogs::default(),
            })?;

        let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
            return Err(Error::Process {
                message: "child process pipes unavailable".to_string(),
                code: None,
                logs: ProcessLogs::default(),
            });
        };

        let mut stdout = BufReader::new(stdout);
        let mut stderr = BufReader::new(stderr);
        // read_until keeps partial lines in these buffers across select! rounds
        let (mut stdout_line, mut stderr_line) = (Vec::new(), Vec::new());
        let mut outcome = TransformOutcome::default();
        let (mut stdout_open, mut stderr_open) = (true, true);

        // Single consumer: arrival order is the order lines are recorded in
        while stdout_open || stderr_open {
            tokio::select! {
                biased;
                read = stdout.read_until(b'\n', &mut stdout_line), if stdout_open => {
                    stdout_open = outcome.record(Stream::Stdout, read, &mut stdout_line);
                }
                read = stderr.read_until(b'\n', &mut stderr_line), if stderr_open => {
                    stderr_open = outcome.record(Stream::Stderr, read, &mut stderr_line);
                }
            }
        }

        let status = child.wait().await?;
        outcome.code = status.code();

        tracing::debug!(
            document_id = %request.document_id,
            code = ?outcome.code,
            stderr_lines = outcome.logs.stderr.len(),
            "xslt transform finished"
        );
        Ok(outcome)
    }
}
