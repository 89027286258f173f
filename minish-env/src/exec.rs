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

//! Type definitions for command execution.

use nix::errno::Errno;
use nix::sys::signal::Signal;
use std::os::raw::c_int;
use thiserror::Error;

/// Number that summarizes the result of command execution.
///
/// An exit status is an integer returned from a utility (or command) when
/// executed. Many utilities return an exit status of zero when successful and
/// non-zero otherwise.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ExitStatus(pub c_int);

impl std::fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl From<c_int> for ExitStatus {
    fn from(value: c_int) -> ExitStatus {
        ExitStatus(value)
    }
}

impl From<ExitStatus> for c_int {
    fn from(exit_status: ExitStatus) -> c_int {
        exit_status.0
    }
}

impl From<Signal> for ExitStatus {
    /// Converts a signal to the corresponding exit status.
    ///
    /// The result is `128 + signal_number`, which is what a process killed or
    /// stopped by the signal is reported as.
    fn from(signal: Signal) -> Self {
        Self::from(signal as c_int + 0x80)
    }
}

impl ExitStatus {
    /// Exit status of 0: success.
    pub const SUCCESS: ExitStatus = ExitStatus(0);

    /// Exit status of 1: failure.
    pub const FAILURE: ExitStatus = ExitStatus(1);

    /// Exit status of 2: error severer than failure.
    pub const ERROR: ExitStatus = ExitStatus(2);

    /// Exit status of 127: command not found.
    pub const NOT_FOUND: ExitStatus = ExitStatus(127);
}

/// Error that leaves the shell unable to keep track of its child processes
///
/// Once one of these errors has occurred, the job list can no longer be trusted.
/// The shell should report the error and terminate the session.
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
pub enum FatalError {
    /// A new child process could not be created.
    #[error("cannot create a child process: {}", .0.desc())]
    Fork(Errno),

    /// Querying the status of child processes failed.
    #[error("cannot examine child processes: {}", .0.desc())]
    Wait(Errno),

    /// Waiting for a signal to arrive failed.
    #[error("cannot wait for signals: {}", .0.desc())]
    SignalWait(Errno),
}

impl FatalError {
    /// Returns the underlying system error.
    #[must_use]
    pub const fn errno(&self) -> Errno {
        match *self {
            FatalError::Fork(errno) | FatalError::Wait(errno) | FatalError::SignalWait(errno) => {
                errno
            }
        }
    }
}

/// Result of an operation that may fail fatally.
pub type Result<T = ()> = std::result::Result<T, FatalError>;
