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

//! Common items for implementing built-ins.
//!
//! # Job operands
//!
//! The `stop`, `bg` and `fg` built-ins take at most one operand that selects a
//! job from the job list. An optional leading `%` is ignored.
//!
//! - No operand or `+` selects the job that changed its state most recently.
//! - `-` selects the job that changed its state second most recently.
//! - A decimal number selects the job with that job ID.
//!
//! A `Done` job cannot be selected since its process has already been reaped.

use minish_env::Env;
use minish_env::exec::ExitStatus;
use minish_env::job::Job;
use minish_env::job::JobList;
use minish_env::job::JobState;
use std::fmt::Display;
use thiserror::Error;

/// Error in selecting a job
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum JobOperandError {
    /// The operand does not name any existing job.
    #[error("no such job")]
    NoSuchJob,
    /// More than one operand was given.
    #[error("too many operands")]
    TooManyOperands,
}

impl JobOperandError {
    /// Returns the exit status the built-in returns for this error.
    #[must_use]
    pub const fn exit_status(&self) -> ExitStatus {
        match self {
            JobOperandError::NoSuchJob => ExitStatus::FAILURE,
            JobOperandError::TooManyOperands => ExitStatus::ERROR,
        }
    }
}

/// Selects a job from the job list.
///
/// See the [module documentation](self) for the operand format.
pub fn resolve_job<'a>(jobs: &'a JobList, args: &[String]) -> Result<&'a Job, JobOperandError> {
    let (latest, previous) = jobs.most_recent_two();
    let id = match args {
        [] => latest,
        [operand] => match operand.strip_prefix('%').unwrap_or(operand) {
            "+" => latest,
            "-" => previous,
            number => number.parse().ok(),
        },
        _ => return Err(JobOperandError::TooManyOperands),
    };
    id.and_then(|id| jobs.get_by_id(id))
        .filter(|job| job.state != JobState::Done)
        .ok_or(JobOperandError::NoSuchJob)
}

/// Prints an error message of a built-in.
///
/// The message is printed as `<shell>: <builtin>: <error>`.
pub fn report_error<E: Display>(env: &mut Env, builtin: &str, error: E) {
    env.print_error(format_args!("{builtin}: {error}"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use minish_env::job::Pid;
    use std::time::Duration;
    use std::time::Instant;

    fn operands(args: &[&str]) -> Vec<String> {
        args.iter().map(|arg| arg.to_string()).collect()
    }

    fn resolve_id(jobs: &JobList, args: &[String]) -> Result<usize, JobOperandError> {
        resolve_job(jobs, args).map(|job| job.id)
    }

    fn three_jobs() -> JobList {
        let t0 = Instant::now();
        let mut jobs = JobList::new();
        jobs.insert(Pid::from_raw(10), JobState::Active, "a".into(), t0);
        jobs.insert(Pid::from_raw(11), JobState::Active, "b".into(), t0);
        jobs.insert(Pid::from_raw(12), JobState::Active, "c".into(), t0);
        jobs.set_state(
            Pid::from_raw(10),
            JobState::Suspended,
            t0 + Duration::from_secs(1),
        );
        jobs
    }

    #[test]
    fn default_and_plus_select_latest() {
        let jobs = three_jobs();
        assert_eq!(resolve_id(&jobs, &[]), Ok(1));
        assert_eq!(resolve_id(&jobs, &operands(&["+"])), Ok(1));
        assert_eq!(resolve_id(&jobs, &operands(&["%+"])), Ok(1));
    }

    #[test]
    fn minus_selects_previous() {
        let jobs = three_jobs();
        assert_eq!(resolve_id(&jobs, &operands(&["-"])), Ok(3));
        assert_eq!(resolve_id(&jobs, &operands(&["%-"])), Ok(3));
    }

    #[test]
    fn number_selects_job_id() {
        let jobs = three_jobs();
        assert_eq!(resolve_id(&jobs, &operands(&["2"])), Ok(2));
        assert_eq!(resolve_id(&jobs, &operands(&["%2"])), Ok(2));
    }

    #[test]
    fn unknown_jobs() {
        let jobs = three_jobs();
        let no_such_job = Err(JobOperandError::NoSuchJob);
        assert_eq!(resolve_id(&jobs, &operands(&["4"])), no_such_job);
        assert_eq!(resolve_id(&jobs, &operands(&["0"])), no_such_job);
        assert_eq!(resolve_id(&jobs, &operands(&["x"])), no_such_job);
        assert_eq!(resolve_id(&jobs, &operands(&["%"])), no_such_job);
        assert_eq!(resolve_id(&JobList::new(), &[]), no_such_job);
        assert_eq!(resolve_id(&JobList::new(), &operands(&["-"])), no_such_job);
    }

    #[test]
    fn done_jobs_are_not_selected() {
        let mut jobs = three_jobs();
        let later = Instant::now() + Duration::from_secs(2);
        jobs.set_state(Pid::from_raw(11), JobState::Done, later);
        let no_such_job = Err(JobOperandError::NoSuchJob);
        assert_eq!(resolve_id(&jobs, &[]), no_such_job);
        assert_eq!(resolve_id(&jobs, &operands(&["2"])), no_such_job);
        assert_eq!(resolve_id(&jobs, &operands(&["-"])), Ok(1));
    }

    #[test]
    fn too_many_operands() {
        let jobs = three_jobs();
        let result = resolve_id(&jobs, &operands(&["1", "2"]));
        assert_eq!(result, Err(JobOperandError::TooManyOperands));
        assert_eq!(
            JobOperandError::TooManyOperands.exit_status(),
            ExitStatus::ERROR
        );
    }
}
