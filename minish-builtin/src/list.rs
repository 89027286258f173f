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

//! List built-in
//!
//! The **`list`** built-in reports the jobs in the job list.
//!
//! # Synopsis
//!
//! ```sh
//! list
//! ```
//!
//! # Description
//!
//! The built-in prints one line for every job, in the order of job IDs:
//!
//! ```text
//! [1]-  Running		      sleep 1000
//! [2]+  Stopped		      vi notes.txt
//! ```
//!
//! The `+` marker indicates the job that changed its state most recently and
//! the `-` marker the one before it. See [`minish_env::job::fmt`] for the
//! format.
//!
//! Jobs that have finished are removed from the job list after being
//! reported.
//!
//! # Operands
//!
//! None. Operands are ignored.
//!
//! # Exit status
//!
//! Zero.

use minish_env::Env;
use minish_env::exec::ExitStatus;
use minish_env::exec::Result;
use minish_env::job::JobState;
use minish_env::job::fmt::Report;

/// Entry point of the `list` built-in
pub fn main(env: &mut Env, _args: &[String]) -> Result<ExitStatus> {
    let lines: Vec<String> = env
        .jobs
        .iter()
        .map(|job| Report::in_list(&env.jobs, job).to_string())
        .collect();
    for line in lines {
        env.print(line);
    }

    let done: Vec<usize> = env
        .jobs
        .iter()
        .filter(|job| job.state == JobState::Done)
        .map(|job| job.id)
        .collect();
    for id in done {
        env.jobs.remove_by_id(id);
    }

    Ok(ExitStatus::SUCCESS)
}
