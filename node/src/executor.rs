/*
Runs the commands that make up tasks. The node only ever sees a task through its
local handle, which is the process id on this machine.
*/

use std::{
    collections::HashMap,
    process::{Child, Command, Stdio},
    sync::{Arc, Mutex},
};

use load_balancer_net::data_types::{CommandLine, LocalHandle, SignalNumber};
use log::{info, warn};

#[derive(Debug, PartialEq)]
pub enum ExecutorError {
    SpawnFailed { msg: String },
    SignalFailed { msg: String },
    UnknownHandle { handle: LocalHandle },
}

pub type ExecutorResult<T> = Result<T, ExecutorError>;

pub trait ProcessExecutor: Send {
    fn spawn(self: &Self, command_line: &[String]) -> ExecutorResult<LocalHandle>;
    fn signal(self: &Self, handle: LocalHandle, signal: SignalNumber) -> ExecutorResult<()>;
}

/// Starts tasks as child processes of the node and signals them with the system
/// `kill` utility
pub struct OsProcessExecutor {
    children: Mutex<HashMap<LocalHandle, Child>>,
}

impl OsProcessExecutor {
    pub fn new() -> Self {
        Self {
            children: Mutex::new(HashMap::new()),
        }
    }

    /// Collects the exit status of children that have finished so they don't linger
    fn reap(self: &Self, children: &mut HashMap<LocalHandle, Child>) {
        children.retain(|pid, child| match child.try_wait() {
            Ok(Some(status)) => {
                info!("OsProcessExecutor: Process {pid} exited with {status}");
                false
            }
            Ok(None) => true,
            Err(e) => {
                warn!("OsProcessExecutor: Failed to poll process {pid}. {e}");
                false
            }
        });
    }
}

impl ProcessExecutor for OsProcessExecutor {
    fn spawn(self: &Self, command_line: &[String]) -> ExecutorResult<LocalHandle> {
        let (program, args) = match command_line.split_first() {
            Some(split) => split,
            None => {
                return Err(ExecutorError::SpawnFailed {
                    msg: String::from("Empty command line"),
                })
            }
        };

        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .spawn()
            .map_err(|e| ExecutorError::SpawnFailed {
                msg: format!("{program}: {e}"),
            })?;

        let pid = child.id();
        let mut children = self.children.lock().unwrap();
        self.reap(&mut children);
        children.insert(pid, child);
        Ok(pid)
    }

    fn signal(self: &Self, handle: LocalHandle, signal: SignalNumber) -> ExecutorResult<()> {
        let status = Command::new("kill")
            .arg(format!("-{signal}"))
            .arg(handle.to_string())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| ExecutorError::SignalFailed { msg: format!("{e}") })?;

        let mut children = self.children.lock().unwrap();
        self.reap(&mut children);

        if status.success() {
            Ok(())
        } else {
            Err(ExecutorError::SignalFailed {
                msg: format!("kill -{signal} {handle} returned {status}"),
            })
        }
    }
}

#[derive(Debug, Default)]
struct RecordingState {
    next_handle: LocalHandle,
    running: Vec<(LocalHandle, CommandLine)>,
    signals: Vec<(LocalHandle, SignalNumber)>,
    fail_spawn: bool,
}

/// Pretends to run processes and remembers what it was asked to do. Clones share
/// the same record, so a test can keep one while the node owns another.
#[derive(Clone, Default)]
pub struct RecordingExecutor {
    state: Arc<Mutex<RecordingState>>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        let executor = Self::default();
        executor.state.lock().unwrap().next_handle = 100;
        executor
    }

    /// Processes that were spawned and have not been signalled
    pub fn running(self: &Self) -> Vec<(LocalHandle, CommandLine)> {
        self.state.lock().unwrap().running.clone()
    }

    pub fn signals(self: &Self) -> Vec<(LocalHandle, SignalNumber)> {
        self.state.lock().unwrap().signals.clone()
    }

    pub fn fail_spawns(self: &Self, fail: bool) {
        self.state.lock().unwrap().fail_spawn = fail;
    }
}

impl ProcessExecutor for RecordingExecutor {
    fn spawn(self: &Self, command_line: &[String]) -> ExecutorResult<LocalHandle> {
        let mut state = self.state.lock().unwrap();
        if state.fail_spawn || command_line.is_empty() {
            return Err(ExecutorError::SpawnFailed {
                msg: format!("{command_line:?}"),
            });
        }
        let handle = state.next_handle;
        state.next_handle += 1;
        state.running.push((handle, command_line.to_vec()));
        Ok(handle)
    }

    fn signal(self: &Self, handle: LocalHandle, signal: SignalNumber) -> ExecutorResult<()> {
        let mut state = self.state.lock().unwrap();
        match state.running.iter().position(|(pid, _)| *pid == handle) {
            Some(index) => {
                state.running.remove(index);
                state.signals.push((handle, signal));
                Ok(())
            }
            None => Err(ExecutorError::UnknownHandle { handle }),
        }
    }
}
