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

//! Stop built-in
//!
//! The **`stop`** built-in suspends a job.
//!
//! # Synopsis
//!
//! ```sh
//! stop [job]
//! ```
//!
//! # Description
//!
//! The built-in sends the `SIGTSTP` signal to the job. The job list is updated
//! and the stop notice is printed when the shell learns that the job has
//! actually stopped.
//!
//! # Operands
//!
//! The optional operand selects the job as described in
//! [`common`](crate::common).
//!
//! # Errors
//!
//! It is an error if the job is not found or the signal cannot be sent.
//!
//! # Exit status
//!
//! Zero if the signal was sent, non-zero otherwise.

use crate::common::report_error;
use crate::common::resolve_job;
use minish_env::Env;
use minish_env::exec::ExitStatus;
use minish_env::exec::Result;
use minish_env::job::Pid;
use nix::sys::signal::Signal;

/// Sends `signal` to the job selected by `args`.
///
/// This is the common part of the `stop`, `bg` and `fg` built-ins. Errors are
/// reported with the `builtin` name. On success, returns the job's process ID.
pub(crate) fn signal_job(
    env: &mut Env,
    builtin: &str,
    args: &[String],
    signal: Signal,
) -> std::result::Result<Pid, ExitStatus> {
    let (id, pid) = match resolve_job(&env.jobs, args) {
        Ok(job) => (job.id, job.pid),
        Err(error) => {
            report_error(env, builtin, &error);
            return Err(error.exit_status());
        }
    };

    match env.system.kill(pid, signal) {
        Ok(()) => {
            tracing::debug!(id, %pid, ?signal, "signal sent to job");
            Ok(pid)
        }
        Err(errno) => {
            report_error(env, builtin, errno.desc());
            Err(ExitStatus::FAILURE)
        }
    }
}

/// Entry point of the `stop` built-in
pub fn main(env: &mut Env, args: &[String]) -> Result<ExitStatus> {
    match signal_job(env, "stop", args, Signal::SIGTSTP) {
        Ok(_) => Ok(ExitStatus::SUCCESS),
        Err(exit_status) => Ok(exit_status),
    }
}
