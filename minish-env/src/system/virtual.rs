// This file is part of minish, a job-controlling command shell.
// Copyright (C) 2026 WATANABE Yuki
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! System simulated in Rust.
//!
//! [`VirtualSystem`] is a pure Rust implementation of [`System`] that simulates
//! the behavior of the underlying system without any interaction with the
//! actual system. `VirtualSystem` is used for testing the behavior of the shell
//! in unit tests.
//!
//! # Files
//!
//! Files are byte vectors in [`SystemState::files`], keyed by path. Writes to
//! the standard output and error are collected in [`SystemState::stdout`] and
//! [`SystemState::stderr`]. Data written to pipes is discarded.
//!
//! # Processes
//!
//! A spawned child does not run anything. It stays running until a signal
//! sent with [`System::kill`] changes its state or the test reports a status
//! change for it with [`SystemState::report`].
//!
//! # Signals
//!
//! Signals the shell catches are queued when they are delivered and returned
//! by [`System::caught_signals`]. Since nothing happens asynchronously in the
//! virtual system, the test queues [`Upcoming`] events that
//! [`System::wait_for_signals`] applies one by one while it would otherwise
//! block.

use super::Launch;
use super::OpenMode;
use super::System;
use crate::io::Fd;
use nix::errno::Errno;
use nix::sys::signal::Signal;
use nix::sys::wait::WaitStatus;
use nix::unistd::Pid;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::collections::VecDeque;
use std::ffi::CStr;
use std::ffi::OsStr;
use std::os::raw::c_int;
use std::os::unix::ffi::OsStrExt;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;
use std::time::Instant;

/// What an open file descriptor refers to
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum OpenFile {
    /// File opened for reading
    Input(PathBuf),
    /// File opened for writing
    Output(PathBuf),
    /// Reading end of a pipe
    PipeReader,
    /// Writing end of a pipe
    PipeWriter,
}

/// State of a simulated child process
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ChildState {
    Running,
    Stopped,
    Terminated,
}

/// Event that happens while the shell is waiting for signals
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Upcoming {
    /// A child changes its state, which also delivers `SIGCHLD`.
    Status(WaitStatus),
    /// A signal is delivered to the shell.
    Signal(Signal),
}

/// Collection of the simulated system state
#[derive(Debug)]
pub struct SystemState {
    /// Current time returned by the next call to `now`
    pub now: Instant,
    /// Everything written to the standard output
    pub stdout: String,
    /// Everything written to the standard error
    pub stderr: String,
    /// Contents of existing files
    pub files: HashMap<PathBuf, Vec<u8>>,
    /// File descriptors currently open, excluding the standard ones
    pub open_fds: BTreeMap<Fd, OpenFile>,
    /// Child processes that have not been reaped
    pub children: HashMap<Pid, ChildState>,
    /// Children started by `spawn`, in order
    pub launches: Vec<(Pid, Launch)>,
    /// Signals sent by `kill`, in order
    pub sent_signals: Vec<(Pid, Signal)>,
    /// Status changes not yet reported by `wait`
    pub statuses: VecDeque<WaitStatus>,
    /// Events applied by `wait_for_signals`
    pub upcoming: VecDeque<Upcoming>,
    /// If set, `spawn` fails with this error.
    pub spawn_error: Option<Errno>,
    /// Signals the shell has installed its handler for
    pub catching: Vec<Signal>,
    caught: Vec<Signal>,
    next_fd: c_int,
    next_pid: i32,
}

impl Default for SystemState {
    fn default() -> Self {
        SystemState {
            now: Instant::now(),
            stdout: String::new(),
            stderr: String::new(),
            files: HashMap::new(),
            open_fds: BTreeMap::new(),
            children: HashMap::new(),
            launches: Vec::new(),
            sent_signals: Vec::new(),
            statuses: VecDeque::new(),
            upcoming: VecDeque::new(),
            spawn_error: None,
            catching: Vec::new(),
            caught: Vec::new(),
            next_fd: 3,
            next_pid: 100,
        }
    }
}

impl SystemState {
    /// Delivers a signal to the shell.
    ///
    /// The signal is recorded if the shell catches it and ignored otherwise.
    pub fn raise(&mut self, signal: Signal) {
        if self.catching.contains(&signal) && !self.caught.contains(&signal) {
            self.caught.push(signal);
        }
    }

    /// Makes a status change of a child available to `wait`.
    ///
    /// This function updates the state of the child and delivers `SIGCHLD`.
    pub fn report(&mut self, status: WaitStatus) {
        let (pid, state) = match status {
            WaitStatus::Stopped(pid, _) => (pid, ChildState::Stopped),
            WaitStatus::Continued(pid) => (pid, ChildState::Running),
            WaitStatus::Exited(pid, _) | WaitStatus::Signaled(pid, _, _) => {
                (pid, ChildState::Terminated)
            }
            _ => return,
        };
        if let Some(child) = self.children.get_mut(&pid) {
            *child = state;
        }
        self.statuses.push_back(status);
        self.raise(Signal::SIGCHLD);
    }

    fn allocate_fd(&mut self, file: OpenFile) -> Fd {
        let fd = Fd(self.next_fd);
        self.next_fd += 1;
        self.open_fds.insert(fd, file);
        fd
    }

    fn is_open(&self, fd: Fd) -> bool {
        fd == Fd::STDIN || fd == Fd::STDOUT || fd == Fd::STDERR || self.open_fds.contains_key(&fd)
    }
}

/// Simulated system
///
/// Cloning a `VirtualSystem` yields another handle to the same state, which
/// allows a test to inspect the state after handing the system to an `Env`.
#[derive(Clone, Debug, Default)]
pub struct VirtualSystem {
    pub state: Rc<RefCell<SystemState>>,
}

impl VirtualSystem {
    /// Creates a virtual system with no files and no children.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl System for VirtualSystem {
    /// Returns the current time.
    ///
    /// The virtual clock advances by one microsecond on every call so that
    /// successive job transitions have distinct timestamps.
    fn now(&self) -> Instant {
        let mut state = self.state.borrow_mut();
        let now = state.now;
        state.now += Duration::from_micros(1);
        now
    }

    fn open(&mut self, path: &CStr, mode: OpenMode) -> Result<Fd, Errno> {
        let path = PathBuf::from(OsStr::from_bytes(path.to_bytes()));
        let mut state = self.state.borrow_mut();
        let file = match mode {
            OpenMode::Read => {
                if !state.files.contains_key(&path) {
                    return Err(Errno::ENOENT);
                }
                OpenFile::Input(path)
            }
            OpenMode::WriteTruncate => {
                state.files.insert(path.clone(), Vec::new());
                OpenFile::Output(path)
            }
        };
        Ok(state.allocate_fd(file))
    }

    fn pipe(&mut self) -> Result<(Fd, Fd), Errno> {
        let mut state = self.state.borrow_mut();
        let reader = state.allocate_fd(OpenFile::PipeReader);
        let writer = state.allocate_fd(OpenFile::PipeWriter);
        Ok((reader, writer))
    }

    fn close(&mut self, fd: Fd) -> Result<(), Errno> {
        self.state.borrow_mut().open_fds.remove(&fd);
        Ok(())
    }

    fn write(&mut self, fd: Fd, buffer: &[u8]) -> Result<usize, Errno> {
        let mut state = self.state.borrow_mut();
        let state = &mut *state;
        match fd {
            Fd::STDOUT => state.stdout.push_str(&String::from_utf8_lossy(buffer)),
            Fd::STDERR => state.stderr.push_str(&String::from_utf8_lossy(buffer)),
            _ => match state.open_fds.get(&fd) {
                Some(OpenFile::Output(path)) => state
                    .files
                    .entry(path.clone())
                    .or_default()
                    .extend_from_slice(buffer),
                Some(OpenFile::PipeWriter) => (),
                Some(OpenFile::Input(_) | OpenFile::PipeReader) | None => {
                    return Err(Errno::EBADF);
                }
            },
        }
        Ok(buffer.len())
    }

    fn spawn(&mut self, launch: &Launch) -> Result<Pid, Errno> {
        let mut state = self.state.borrow_mut();
        if let Some(errno) = state.spawn_error {
            return Err(errno);
        }
        if launch.args.is_empty() {
            return Err(Errno::EINVAL);
        }
        if !state.is_open(launch.stdin) || !state.is_open(launch.stdout) {
            return Err(Errno::EBADF);
        }

        let pid = Pid::from_raw(state.next_pid);
        state.next_pid += 1;
        state.children.insert(pid, ChildState::Running);
        state.launches.push((pid, launch.clone()));
        Ok(pid)
    }

    fn wait(&mut self) -> Result<WaitStatus, Errno> {
        let mut state = self.state.borrow_mut();
        if let Some(status) = state.statuses.pop_front() {
            if matches!(status, WaitStatus::Exited(..) | WaitStatus::Signaled(..)) {
                if let Some(pid) = status.pid() {
                    state.children.remove(&pid);
                }
            }
            return Ok(status);
        }
        if state.children.is_empty() {
            Err(Errno::ECHILD)
        } else {
            Ok(WaitStatus::StillAlive)
        }
    }

    /// Sends a signal to a child.
    ///
    /// Stop signals stop a running child, `SIGCONT` resumes a stopped child,
    /// and other signals except `SIGCHLD`, `SIGURG` and `SIGWINCH` terminate
    /// the child. Each state change is reported as by [`SystemState::report`].
    fn kill(&mut self, target: Pid, signal: Signal) -> Result<(), Errno> {
        let mut state = self.state.borrow_mut();
        let child = match state.children.get(&target) {
            Some(&child) if child != ChildState::Terminated => child,
            _ => return Err(Errno::ESRCH),
        };
        state.sent_signals.push((target, signal));

        use Signal::*;
        match signal {
            SIGSTOP | SIGTSTP | SIGTTIN | SIGTTOU => {
                if child == ChildState::Running {
                    state.report(WaitStatus::Stopped(target, signal));
                }
            }
            SIGCONT => {
                if child == ChildState::Stopped {
                    state.report(WaitStatus::Continued(target));
                }
            }
            SIGCHLD | SIGURG | SIGWINCH => (),
            _ => state.report(WaitStatus::Signaled(target, signal, false)),
        }
        Ok(())
    }

    fn catch_signals(&mut self, signals: &[Signal]) -> Result<(), Errno> {
        let mut state = self.state.borrow_mut();
        for &signal in signals {
            if !state.catching.contains(&signal) {
                state.catching.push(signal);
            }
        }
        Ok(())
    }

    fn caught_signals(&mut self) -> Vec<Signal> {
        std::mem::take(&mut self.state.borrow_mut().caught)
    }

    /// Applies upcoming events until a signal is caught.
    ///
    /// # Panics
    ///
    /// If no signal has been caught and there is no upcoming event, the real
    /// system would block forever. This function panics in that case.
    fn wait_for_signals(&mut self) -> Result<(), Errno> {
        let mut state = self.state.borrow_mut();
        while state.caught.is_empty() {
            match state.upcoming.pop_front() {
                Some(Upcoming::Status(status)) => state.report(status),
                Some(Upcoming::Signal(signal)) => state.raise(signal),
                None => panic!("wait_for_signals would block forever"),
            }
        }
        Ok(())
    }
}
