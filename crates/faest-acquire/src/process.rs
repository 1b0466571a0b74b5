//! Subprocess invocation behind a substitutable seam.
//!
//! Every external command (version probes, installers, git, meson, ninja)
//! is described by an [`Invocation`] and executed by a [`CommandRunner`].
//! `Err` from [`CommandRunner::run`] means the program could not be launched;
//! a launched program that exits non-zero is an `Ok` output with
//! `success == false`.

#[cfg(any(test, feature = "test-support"))]
use std::cell::RefCell;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

/// A fully described external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Program name or path.
    pub program: PathBuf,
    /// Arguments.
    pub args: Vec<String>,
    /// Working directory (inherits the caller's when absent).
    pub current_dir: Option<PathBuf>,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Invocation {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
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

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Captured result of a launched process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Whether the process exited with status zero.
    pub success: bool,
    /// Exit code, if the process exited normally.
    pub code: Option<i32>,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

/// Executes invocations synchronously, without a timeout.
pub trait CommandRunner {
    /// Run to completion, capturing output.
    fn run(&self, invocation: &Invocation) -> std::io::Result<ProcessOutput>;
}

/// Runs commands on the host with [`std::process::Command`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> std::io::Result<ProcessOutput> {
        tracing::debug!(command = %invocation, "running");
        let mut command = Command::new(&invocation.program);
        command.args(&invocation.args);
        if let Some(dir) = &invocation.current_dir {
            command.current_dir(dir);
        }
        let output = command.output()?;
        Ok(ProcessOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Outcome a [`ScriptedRunner`] returns for a matching invocation.
#[cfg(any(test, feature = "test-support"))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scripted {
    /// Exit zero with this stdout.
    Succeed(String),
    /// Exit one with this stderr.
    Fail(String),
    /// The program cannot be launched.
    NotFound,
}

#[cfg(any(test, feature = "test-support"))]
type Effect = Box<dyn Fn(&Invocation)>;

#[cfg(any(test, feature = "test-support"))]
struct Rule {
    pattern: String,
    outcome: Scripted,
    effect: Option<Effect>,
}

/// A [`CommandRunner`] that answers from a script and records every call.
///
/// Rules match when their pattern is a substring of the rendered command line;
/// the first matching rule wins. Unmatched invocations behave as
/// [`Scripted::NotFound`]. A rule may carry an effect, run before the outcome
/// is returned, to simulate what the real command would leave on disk.
/// Available to other crates' tests through the `test-support` feature.
#[cfg(any(test, feature = "test-support"))]
#[derive(Default)]
pub struct ScriptedRunner {
    rules: Vec<Rule>,
    calls: RefCell<Vec<Invocation>>,
}

#[cfg(any(test, feature = "test-support"))]
impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer invocations containing `pattern` with `outcome`.
    pub fn on(mut self, pattern: impl Into<String>, outcome: Scripted) -> Self {
        self.rules.push(Rule {
            pattern: pattern.into(),
            outcome,
            effect: None,
        });
        self
    }

    /// Like [`ScriptedRunner::on`], running `effect` first.
    pub fn on_with(
        mut self,
        pattern: impl Into<String>,
        outcome: Scripted,
        effect: impl Fn(&Invocation) + 'static,
    ) -> Self {
        self.rules.push(Rule {
            pattern: pattern.into(),
            outcome,
            effect: Some(Box::new(effect)),
        });
        self
    }

    /// Every invocation seen so far, in order.
    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.borrow().clone()
    }

    /// Whether any recorded command line contains `pattern`.
    pub fn ran(&self, pattern: &str) -> bool {
        self.calls
            .borrow()
            .iter()
            .any(|call| call.to_string().contains(pattern))
    }
}

#[cfg(any(test, feature = "test-support"))]
impl CommandRunner for ScriptedRunner {
    fn run(&self, invocation: &Invocation) -> std::io::Result<ProcessOutput> {
        self.calls.borrow_mut().push(invocation.clone());
        let line = invocation.to_string();
        let Some(rule) = self.rules.iter().find(|r| line.contains(&r.pattern)) else {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no such program: {}", invocation.program.display()),
            ));
        };
        if let Some(effect) = &rule.effect {
            effect(invocation);
        }
        match &rule.outcome {
            Scripted::Succeed(stdout) => Ok(ProcessOutput {
                success: true,
                code: Some(0),
                stdout: stdout.clone(),
                stderr: String::new(),
            }),
            Scripted::Fail(stderr) => Ok(ProcessOutput {
                success: false,
                code: Some(1),
                stdout: String::new(),
                stderr: stderr.clone(),
            }),
            Scripted::NotFound => Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no such program: {}", invocation.program.display()),
            )),
        }
    }
}
