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

//! Fg built-in
//!
//! The **`fg`** built-in resumes a job in the foreground.
//!
//! # Synopsis
//!
//! ```sh
//! fg [job]
//! ```
//!
//! # Description
//!
//! The built-in prints the job name, sends the `SIGCONT` signal to the job,
//! and makes it the foreground process. The built-in then waits for the job to
//! finish or suspend again.
//!
//! If the job finishes, it is removed from the job list. If it is suspended
//! again, it stays in the job list with the same job ID.
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
//! The exit status of the job if it finished, or 128 plus the signal number if
//! it was suspended or killed. On error, the exit status is non-zero.
//!
//! # Implementation notes
//!
//! This implementation sends the `SIGCONT` signal even if the job is already
//! running.

use crate::stop::signal_job;
use minish_env::Env;
use minish_env::exec::ExitStatus;
use minish_env::exec::Result;
use nix::sys::signal::Signal;

/// Entry point of the `fg` built-in
pub fn main(env: &mut Env, args: &[String]) -> Result<ExitStatus> {
    let pid = match signal_job(env, "fg", args, Signal::SIGCONT) {
        Ok(pid) => pid,
        Err(exit_status) => return Ok(exit_status),
    };

    let name = env
        .jobs
        .get_by_pid(pid)
        .map(|job| job.name.clone())
        .unwrap_or_default();
    env.print(&name);

    env.begin_foreground(pid, name)?;
    env.await_foreground()?;
    Ok(env.exit_status)
}
