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

//! API declarations and implementations for system-managed parts of the
//! environment
//!
//! The [`System`] trait is the interface between the shell and the operating
//! system. [`RealSystem`] implements it with actual system calls, and
//! [`VirtualSystem`] simulates it in memory for testing.

pub mod real;
pub mod r#virtual;

use crate::io::Fd;
use nix::errno::Errno;
use nix::sys::signal::Signal;
use nix::sys::wait::WaitStatus;
use nix::unistd::Pid;
use std::ffi::CStr;
use std::ffi::CString;
use std::fmt::Debug;
use std::time::Instant;

#[doc(no_inline)]
pub use self::real::RealSystem;
#[doc(no_inline)]
pub use self::r#virtual::VirtualSystem;

/// How a file is opened for redirection
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum OpenMode {
    /// Read-only. The file must exist.
    Read,
    /// Write-only. The file is created if missing and truncated otherwise.
    WriteTruncate,
}

/// Description of a child process to be started by [`System::spawn`]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Launch {
    /// Command name and arguments
    ///
    /// The first element is the name of the program to run, which is searched
    /// for in `$PATH`. This vector must not be empty.
    pub args: Vec<CString>,

    /// File descriptor to become the standard input of the child
    pub stdin: Fd,

    /// File descriptor to become the standard output of the child
    pub stdout: Fd,
}

/// API to the system-managed parts of the environment.
///
/// The `System` trait defines the operating system features the shell needs
/// to run and control child processes. All file descriptors created through
/// this trait have the close-on-exec flag set, so they do not leak into
/// programs started by [`spawn`](Self::spawn) unless explicitly passed as the
/// standard input or output.
pub trait System: Debug {
    /// Returns the current time.
    fn now(&self) -> Instant;

    /// Opens a file.
    fn open(&mut self, path: &CStr, mode: OpenMode) -> Result<Fd, Errno>;

    /// Creates an unnamed pipe.
    ///
    /// If successful, returns the reading and writing ends of the pipe.
    fn pipe(&mut self) -> Result<(Fd, Fd), Errno>;

    /// Closes a file descriptor.
    ///
    /// This function returns `Ok(())` when the FD is already closed.
    fn close(&mut self, fd: Fd) -> Result<(), Errno>;

    /// Writes to the file descriptor.
    ///
    /// If successful, returns the number of bytes written.
    fn write(&mut self, fd: Fd, buffer: &[u8]) -> Result<usize, Errno>;

    /// Starts a new child process.
    ///
    /// The child connects `launch.stdin` and `launch.stdout` to its standard
    /// input and output, moves itself into a new process group so that signals
    /// sent to the shell's process group do not reach it, and executes the
    /// program named by `launch.args[0]`. If the program cannot be executed,
    /// the child prints `Unknown command` to the standard error and exits with
    /// [`ExitStatus::NOT_FOUND`](crate::exec::ExitStatus::NOT_FOUND).
    ///
    /// Returns the process ID of the child. An error means no child was
    /// created.
    fn spawn(&mut self, launch: &Launch) -> Result<Pid, Errno>;

    /// Reports updated status of a child process.
    ///
    /// This is a thin wrapper around `waitpid(-1, ..., WUNTRACED | WCONTINUED
    /// | WNOHANG)`. It returns `WaitStatus::StillAlive` if no child has
    /// changed its state, and `Err(Errno::ECHILD)` if there is no child.
    fn wait(&mut self) -> Result<WaitStatus, Errno>;

    /// Sends a signal to a process.
    fn kill(&mut self, target: Pid, signal: Signal) -> Result<(), Errno>;

    /// Installs the shell's signal handler for the given signals.
    ///
    /// The handler records the signals so that they are returned by
    /// [`caught_signals`](Self::caught_signals) and wakes up
    /// [`wait_for_signals`](Self::wait_for_signals).
    fn catch_signals(&mut self, signals: &[Signal]) -> Result<(), Errno>;

    /// Returns signals caught since the last call, each at most once.
    fn caught_signals(&mut self) -> Vec<Signal>;

    /// Blocks until a signal is caught.
    ///
    /// Returns immediately if a signal has been caught since the last call.
    fn wait_for_signals(&mut self) -> Result<(), Errno>;
}

/// Extension of [`System`] with convenience functions
pub trait SystemEx: System {
    /// Writes the whole buffer to the file descriptor.
    ///
    /// Writes interrupted by a signal are retried.
    fn write_all(&mut self, fd: Fd, mut buffer: &[u8]) -> Result<(), Errno> {
        while !buffer.is_empty() {
            match self.write(fd, buffer) {
                Ok(0) => return Err(Errno::EIO),
                Ok(count) => buffer = &buffer[count..],
                Err(Errno::EINTR) => (),
                Err(errno) => return Err(errno),
            }
        }
        Ok(())
    }
}

impl<T: System + ?Sized> SystemEx for T {}
