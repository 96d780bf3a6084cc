use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::Mutex;

use anyhow::{Context, Result};
use log::debug;

use crate::runtime::Error;
use crate::utils::command_to_string;

///////////////////////////////
/// One call of an external program
#[derive(Clone, Debug, PartialEq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
}

impl Invocation {
    pub fn new<S: Into<String>>(program: S) -> Self {
        Invocation {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Path arguments; non UTF-8 paths are converted lossily
    pub fn path<P: AsRef<Path>>(self, path: P) -> Self {
        let p = path.as_ref().to_string_lossy().into_owned();
        self.arg(p)
    }

    /// Add "flag value" only when there is a value
    pub fn opt<V: fmt::Display>(self, flag: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.arg(flag).arg(v.to_string()),
            None => self,
        }
    }

    pub fn current_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Program followed by its arguments
    pub fn argv(&self) -> Vec<String> {
        let mut argv = Vec::with_capacity(self.args.len() + 1);
        argv.push(self.program.clone());
        argv.extend(self.args.iter().cloned());
        argv
    }

    fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }
        cmd
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", command_to_string(&self.program, &self.args))
    }
}

///////////////////////////////
/// Seam between the pipeline logic and the processes it starts
pub trait Runner: Send + Sync {
    /// Run to completion, failing on a nonzero exit status
    fn run(&self, inv: &Invocation) -> Result<()>;

    /// Run with stdout redirected into a file
    fn run_to_file(&self, inv: &Invocation, stdout: &Path) -> Result<()>;

    /// Run and return what the program printed on stdout
    fn run_capture(&self, inv: &Invocation) -> Result<String>;
}

///////////////////////////////
/// Starts real processes
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemRunner;

impl SystemRunner {
    fn spawn_error(inv: &Invocation, e: io::Error) -> anyhow::Error {
        match e.kind() {
            io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => {
                anyhow::Error::new(Error::utility_not_executable(&inv.program))
            }
            _ => anyhow::Error::new(e).context(format!("Could not start {}", inv.program)),
        }
    }

    fn check_status(inv: &Invocation, status: ExitStatus) -> Result<()> {
        if !status.success() {
            return Err(Error::utility_execution_error(
                &inv.program,
                inv.to_string(),
                Some(status.to_string()),
            )
            .into());
        }
        Ok(())
    }
}

impl Runner for SystemRunner {
    fn run(&self, inv: &Invocation) -> Result<()> {
        debug!("Running {}", inv);
        let status = inv
            .to_command()
            .status()
            .map_err(|e| SystemRunner::spawn_error(inv, e))?;
        SystemRunner::check_status(inv, status)
    }

    fn run_to_file(&self, inv: &Invocation, stdout: &Path) -> Result<()> {
        debug!("Running {} > {}", inv, stdout.display());
        let file = File::create(stdout)
            .with_context(|| format!("Could not create output file {:?}", stdout))?;
        let status = inv
            .to_command()
            .stdout(Stdio::from(file))
            .status()
            .map_err(|e| SystemRunner::spawn_error(inv, e))?;
        SystemRunner::check_status(inv, status)
    }

    fn run_capture(&self, inv: &Invocation) -> Result<String> {
        debug!("Running {}", inv);
        let output = inv
            .to_command()
            .stderr(Stdio::inherit())
            .output()
            .map_err(|e| SystemRunner::spawn_error(inv, e))?;
        SystemRunner::check_status(inv, output.status)?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

type Handler = Box<dyn Fn(&Invocation) -> Result<String> + Send + Sync>;

///////////////////////////////
/// Records invocations instead of starting them. Programs can be given a handler
/// that stands in for them, producing output files or stdout
#[derive(Default)]
pub struct RecordingRunner {
    calls: Mutex<Vec<Invocation>>,
    handlers: HashMap<String, Handler>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        RecordingRunner::default()
    }

    /// Stand in for `program`; the handler returns what the program would print
    pub fn on<F>(mut self, program: &str, handler: F) -> Self
    where
        F: Fn(&Invocation) -> Result<String> + Send + Sync + 'static,
    {
        self.handlers.insert(program.to_string(), Box::new(handler));
        self
    }

    /// Stand in for `program` with a fixed stdout
    pub fn with_stdout(self, program: &str, stdout: &str) -> Self {
        let stdout = stdout.to_string();
        self.on(program, move |_| Ok(stdout.clone()))
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn argvs(&self) -> Vec<Vec<String>> {
        self.invocations().iter().map(|i| i.argv()).collect()
    }

    fn record(&self, inv: &Invocation) -> Result<String> {
        debug!("Recording {}", inv);
        self.calls
            .lock()
            .map_err(|_| anyhow::anyhow!("Invocation log poisoned"))?
            .push(inv.clone());
        match self.handlers.get(&inv.program) {
            Some(handler) => handler(inv),
            None => Ok(String::new()),
        }
    }
}

impl Runner for RecordingRunner {
    fn run(&self, inv: &Invocation) -> Result<()> {
        self.record(inv).map(|_| ())
    }

    fn run_to_file(&self, inv: &Invocation, stdout: &Path) -> Result<()> {
        let out = self.record(inv)?;
        std::fs::write(stdout, out)
            .with_context(|| format!("Could not create output file {:?}", stdout))
    }

    fn run_capture(&self, inv: &Invocation) -> Result<String> {
        self.record(inv)
    }
}
