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

//! This crate defines the job-control environment of minish.
//!
//! The environment, [`Env`], is the single context object that owns the
//! shell's bookkeeping: the [job list](job::JobList), the
//! [foreground slot](foreground::Foreground), the last exit status and the
//! table of built-ins. Every operation that inspects or changes the
//! bookkeeping takes the `Env` explicitly.
//!
//! The [`System`] trait is the interface to the operating system.
//! [`RealSystem`] provides an implementation for `System` that interacts with
//! the underlying system. [`VirtualSystem`] is a dummy for simulating the
//! system's behavior without affecting the actual system.
//!
//! # Concurrency
//!
//! The shell runs a single thread of control. Signal handlers interrupt it at
//! arbitrary points, so they never touch the `Env`. They only record which
//! signal arrived (see [`system::real`]). The main flow picks the records up in
//! [`Env::handle_signals`], which forwards interactive stop and interrupt
//! requests to the foreground coordinator and then drains every pending child
//! status change through [`Env::reap_children`]. Consequently the job list and
//! the foreground slot are only ever mutated by the main flow and need no
//! locking.
//!
//! # Lifecycle
//!
//! Create the environment with [`Env::with_system`], install the signal
//! handlers with [`Env::init_job_control`], and register the built-ins. The job
//! list is released when the `Env` is dropped.

pub mod builtin;
pub mod exec;
pub mod foreground;
pub mod io;
pub mod job;
pub mod reconcile;
pub mod system;

use self::builtin::Builtin;
use self::exec::ExitStatus;
use self::foreground::Foreground;
use self::io::Fd;
use self::job::JobList;
use nix::errno::Errno;
use nix::sys::signal::Signal;
use std::collections::HashMap;
use std::fmt::Display;
use std::time::Instant;

#[doc(no_inline)]
pub use self::system::RealSystem;
#[doc(no_inline)]
pub use self::system::System;
#[doc(no_inline)]
pub use self::system::SystemEx;
#[doc(no_inline)]
pub use self::system::VirtualSystem;

/// Signals the shell intercepts for job control
pub const JOB_CONTROL_SIGNALS: [Signal; 3] = [Signal::SIGCHLD, Signal::SIGTSTP, Signal::SIGINT];

/// Whole job-control environment of the shell
#[derive(Debug)]
pub struct Env {
    /// Name of the shell, used as the prefix of error messages
    pub shell_name: String,

    /// Exit status of the last executed command
    pub exit_status: ExitStatus,

    /// Jobs tracked by the shell
    pub jobs: JobList,

    /// Process currently running in the foreground
    pub foreground: Foreground,

    /// Built-in utilities available in the environment
    pub builtins: HashMap<&'static str, Builtin>,

    /// Interface to the system-managed parts of the environment
    pub system: Box<dyn System>,
}

impl Env {
    /// Creates a new environment with the given system.
    ///
    /// Members of the new environments are default-constructed except that
    /// `shell_name` is `minish` and `system` is initialized as specified by
    /// the argument. Signal handlers are not installed yet; call
    /// [`init_job_control`](Self::init_job_control).
    #[must_use]
    pub fn with_system(system: Box<dyn System>) -> Env {
        Env {
            shell_name: "minish".to_string(),
            exit_status: Default::default(),
            jobs: Default::default(),
            foreground: Default::default(),
            builtins: Default::default(),
            system,
        }
    }

    /// Creates a new environment with a default-constructed [`VirtualSystem`].
    #[must_use]
    pub fn new_virtual() -> Env {
        Env::with_system(Box::new(VirtualSystem::default()))
    }

    /// Installs the signal handlers needed for job control.
    ///
    /// After this function returns, `SIGCHLD`, `SIGTSTP` and `SIGINT` are
    /// caught and processed by [`handle_signals`](Self::handle_signals)
    /// instead of taking their default action.
    pub fn init_job_control(&mut self) -> Result<(), Errno> {
        self.system.catch_signals(&JOB_CONTROL_SIGNALS)?;
        tracing::trace!("job control signals are caught");
        Ok(())
    }

    /// Returns the current time from the system.
    pub fn now(&self) -> Instant {
        self.system.now()
    }

    /// Prints a line to the standard output.
    ///
    /// A newline is appended to `line`. Errors are ignored.
    pub fn print<T: Display>(&mut self, line: T) {
        let text = format!("{line}\n");
        let _ = self.system.write_all(Fd::STDOUT, text.as_bytes());
    }

    /// Prints an error message to the standard error.
    ///
    /// The message is prefixed with the shell name and followed by a newline.
    /// Errors are ignored.
    pub fn print_error<T: Display>(&mut self, message: T) {
        let text = format!("{}: {}\n", self.shell_name, message);
        let _ = self.system.write_all(Fd::STDERR, text.as_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_job_control_catches_signals() {
        let system = VirtualSystem::new();
        let state = std::rc::Rc::clone(&system.state);
        let mut env = Env::with_system(Box::new(system));
        env.init_job_control().unwrap();
        assert_eq!(state.borrow().catching, JOB_CONTROL_SIGNALS);
    }

    #[test]
    fn print_error_prefixes_shell_name() {
        let system = VirtualSystem::new();
        let state = std::rc::Rc::clone(&system.state);
        let mut env = Env::with_system(Box::new(system));
        env.shell_name = "sh".to_string();
        env.print_error("fg: no such job");
        env.print("[1] 123");
        assert_eq!(state.borrow().stderr, "sh: fg: no such job\n");
        assert_eq!(state.borrow().stdout, "[1] 123\n");
    }
}
