//! Blocking preprocess worker runner.

use crate::envelope::{PreprocessRequest, Preprocessed};
use crate::RunnerError;
use blake3::Hasher;
use camino::{Utf8Path, Utf8PathBuf};
use fs2::FileExt;
use std::fs::{self, OpenOptions};
use std::io::{self, Read};
use std::process::{Command, Stdio};
use std::thread;

/// Default cap on captured worker stdout (10 MiB).
pub const DEFAULT_MAX_BUFFER: usize = 10 * 1024 * 1024;

const WORKER_SCRIPT_FILENAME: &str = "preprocess-worker.mjs";
const WORKER_SCRIPT_SOURCE: &str = r#"import { createRequire } from 'node:module';
import { pathToFileURL } from 'node:url';

const { source, filename, svelteConfig, showConsoleLog } = process.env;

// stdout carries the response; user code must not write to it unless asked.
if (showConsoleLog !== 'true') {
  console.log = () => {};
  console.info = () => {};
  console.debug = () => {};
}

const require = createRequire(pathToFileURL(process.cwd() + '/'));
const { preprocess } = await import(pathToFileURL(require.resolve('svelte/compiler')).href);

const configModule = await import(pathToFileURL(svelteConfig).href);
const config = configModule.default ?? configModule;
const processed = await preprocess(source, config.preprocess || {}, { filename });

process.stdout.write(JSON.stringify({ code: processed.code, map: processed.map ?? null }) + '\n');
"#;

/// The program the runner spawns for each request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerCommand {
    program: String,
    args: Vec<String>,
    current_dir: Option<Utf8PathBuf>,
}

impl WorkerCommand {
    /// Creates a command running `program` with no arguments.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    /// Runs the node worker script with `node`.
    ///
    /// Unhandled rejections and uncaught exceptions abort the worker, so the
    /// blocked parent always sees it exit.
    pub fn node(node: &Utf8Path, script: &Utf8Path) -> Self {
        Self::new(node.as_str())
            .arg("--unhandled-rejections=strict")
            .arg("--abort-on-uncaught-exception")
            .arg(script.as_str())
    }

    /// Appends an argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Sets the worker's working directory.
    pub fn current_dir(mut self, dir: impl Into<Utf8PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Returns the program name.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Returns the arguments.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        if let Some(dir) = &self.current_dir {
            command.current_dir(dir);
        }
        command
    }
}

#[derive(Debug, Clone)]
enum Worker {
    /// The embedded node script, located and installed on each run.
    Node { node: Option<Utf8PathBuf> },
    Custom(WorkerCommand),
}

/// Runs preprocessing in a fresh child process per request.
///
/// No worker is reused between requests and nothing is retried.
#[derive(Debug, Clone)]
pub struct PreprocessRunner {
    worker: Worker,
}

impl Default for PreprocessRunner {
    fn default() -> Self {
        Self::node(None)
    }
}

impl PreprocessRunner {
    /// Creates a runner using the embedded node worker. Without an explicit
    /// `node` path, node is looked up on PATH.
    pub fn node(node: Option<Utf8PathBuf>) -> Self {
        Self {
            worker: Worker::Node { node },
        }
    }

    /// Creates a runner spawning `command` for each request.
    pub fn with_command(command: WorkerCommand) -> Self {
        Self {
            worker: Worker::Custom(command),
        }
    }

    /// Attempts to find node on PATH.
    pub fn find_node() -> Option<Utf8PathBuf> {
        which::which("node")
            .ok()
            .and_then(|path| Utf8PathBuf::try_from(path).ok())
    }

    /// Gets the cache directory for svelte-jester.
    pub fn get_cache_dir() -> Option<Utf8PathBuf> {
        dirs::cache_dir()
            .and_then(|p| Utf8PathBuf::try_from(p).ok())
            .map(|p| p.join("svelte-jester"))
    }

    fn command(&self) -> Result<WorkerCommand, RunnerError> {
        match &self.worker {
            Worker::Custom(command) => Ok(command.clone()),
            Worker::Node { node } => {
                let node = match node {
                    Some(node) => node.clone(),
                    None => Self::find_node().ok_or_else(|| {
                        RunnerError::InstallFailed("node not found on PATH".into())
                    })?,
                };
                let script = ensure_script()?;
                Ok(WorkerCommand::node(&node, &script))
            }
        }
    }

    /// Runs one request and blocks until the worker exits.
    ///
    /// Stdout beyond `max_buffer` bytes kills the worker and fails with
    /// [`RunnerError::BufferOverflow`]. There is no timeout.
    pub fn run(
        &self,
        request: &PreprocessRequest,
        max_buffer: usize,
    ) -> Result<Preprocessed, RunnerError> {
        let command = self.command()?;
        log::debug!(
            "spawning preprocess worker `{}` for {}",
            command.program(),
            request.filename
        );

        let mut child = command
            .to_command()
            .envs(request.to_env())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(RunnerError::SpawnFailed)?;

        let stdout = child.stdout.take().ok_or_else(|| RunnerError::Protocol {
            message: "failed to open worker stdout".to_string(),
            output: String::new(),
        })?;
        let stderr = child.stderr.take().ok_or_else(|| RunnerError::Protocol {
            message: "failed to open worker stderr".to_string(),
            output: String::new(),
        })?;

        let stderr_task = thread::spawn(move || {
            let mut buffer = Vec::new();
            let _ = io::BufReader::new(stderr).read_to_end(&mut buffer);
            String::from_utf8_lossy(&buffer).into_owned()
        });

        let captured = read_capped(stdout, max_buffer).map_err(RunnerError::SpawnFailed)?;
        let Some(output) = captured else {
            let _ = child.kill();
            let _ = child.wait();
            let _ = stderr_task.join();
            return Err(RunnerError::BufferOverflow {
                program: command.program().to_string(),
                limit: max_buffer,
            });
        };

        let status = child.wait().map_err(RunnerError::SpawnFailed)?;
        let stderr = stderr_task.join().unwrap_or_default();

        if !status.success() {
            return Err(RunnerError::ProcessFailed {
                code: status.code().unwrap_or(-1),
                stderr,
            });
        }

        let output = String::from_utf8_lossy(&output);
        log::trace!("preprocess worker wrote {} bytes", output.len());
        Preprocessed::from_output(&output)
    }
}

/// Reads `reader` to the end, giving up once more than `limit` bytes arrive.
///
/// Returns `Ok(None)` on overflow.
fn read_capped(mut reader: impl Read, limit: usize) -> io::Result<Option<Vec<u8>>> {
    let mut output = Vec::new();
    let mut chunk = [0u8; 8192];
    loop {
        let read = match reader.read(&mut chunk) {
            Ok(0) => return Ok(Some(output)),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        if output.len() + read > limit {
            return Ok(None);
        }
        output.extend_from_slice(&chunk[..read]);
    }
}

/// Writes the embedded worker script to the cache directory unless an
/// identical copy is already there.
fn ensure_script() -> Result<Utf8PathBuf, RunnerError> {
    let cache_dir = PreprocessRunner::get_cache_dir()
        .ok_or_else(|| RunnerError::InstallFailed("could not determine cache directory".into()))?;
    fs::create_dir_all(&cache_dir)
        .map_err(|e| RunnerError::InstallFailed(format!("failed to create cache dir: {e}")))?;
    install_script(&cache_dir)
}

fn install_script(dir: &Utf8Path) -> Result<Utf8PathBuf, RunnerError> {
    let script_path = dir.join(WORKER_SCRIPT_FILENAME);
    let expected_hash = blake3::hash(WORKER_SCRIPT_SOURCE.as_bytes());

    if script_matches(&script_path, &expected_hash) {
        return Ok(script_path);
    }

    // Parallel test workers may install at the same time.
    let lock_path = dir.join(format!("{WORKER_SCRIPT_FILENAME}.lock"));
    let lock = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&lock_path)
        .map_err(|e| RunnerError::InstallFailed(format!("failed to open {lock_path}: {e}")))?;
    lock.lock_exclusive()
        .map_err(|e| RunnerError::InstallFailed(format!("failed to lock {lock_path}: {e}")))?;

    let result = if script_matches(&script_path, &expected_hash) {
        Ok(())
    } else {
        log::debug!("installing preprocess worker script at {}", script_path);
        fs::write(&script_path, WORKER_SCRIPT_SOURCE).map_err(|e| {
            RunnerError::InstallFailed(format!("failed to write worker script: {e}"))
        })
    };
    let _ = FileExt::unlock(&lock);

    result.map(|()| script_path)
}

fn script_matches(path: &Utf8Path, expected: &blake3::Hash) -> bool {
    match fs::read(path) {
        Ok(existing) => {
            let mut hasher = Hasher::new();
            hasher.update(&existing);
            hasher.finalize() == *expected
        }
        Err(_) => false,
    }
}
