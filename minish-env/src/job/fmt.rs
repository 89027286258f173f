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

//! Job report formatting
//!
//! This module defines the line format used to show a job to the user. The
//! format is used by the `list` built-in, the notice printed when a job is
//! stopped, and the report of finished jobs.
//!
//! The line includes the job ID, a marker for the most recently (`+`) and
//! second most recently (`-`) changed job, the state, and the job name:
//!
//! ```text
//! [2]+  Stopped		      sleep 1000
//! ```
//!
//! To format a job, create a [`Report`] and use its `Display` implementation.
//!
//! ```
//! use std::time::Instant;
//! use minish_env::job::{JobList, JobState, Pid};
//! use minish_env::job::fmt::{Marker, Report};
//! let mut jobs = JobList::new();
//! jobs.insert(Pid::from_raw(123), JobState::Active, "sleep 10".to_string(), Instant::now());
//! let job = jobs.get_by_id(1).unwrap();
//! let report = Report { marker: Marker::None, job };
//! assert_eq!(report.to_string(), "[1]   Running\t\t      sleep 10");
//! ```

use super::Job;
use super::JobList;
use super::JobState;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result;

/// Formats a job state as shown in job reports.
impl Display for JobState {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            JobState::Active => "Running".fmt(f),
            JobState::Suspended => "Stopped".fmt(f),
            JobState::Done => "Done".fmt(f),
            JobState::Undefined => "Undefined".fmt(f),
        }
    }
}

/// Type of a marker indicating the most recently changed jobs
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Marker {
    None,
    Latest,
    Previous,
}

impl Marker {
    /// Returns the character representation of the marker.
    ///
    /// This function returns `' '`, `'+'`, and `'-'` for `None`, `Latest`,
    /// and `Previous`, respectively.
    pub const fn as_char(self) -> char {
        match self {
            Marker::None => ' ',
            Marker::Latest => '+',
            Marker::Previous => '-',
        }
    }

    /// Returns the marker for the job with the given ID in the job list.
    #[must_use]
    pub fn of(jobs: &JobList, id: usize) -> Marker {
        match jobs.most_recent_two() {
            (Some(latest), _) if latest == id => Marker::Latest,
            (_, Some(previous)) if previous == id => Marker::Previous,
            _ => Marker::None,
        }
    }
}

impl Display for Marker {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        self.as_char().fmt(f)
    }
}

/// Wrapper for implementing job status formatting
///
/// See the [module documentation](self) for details.
#[derive(Clone, Copy, Debug)]
pub struct Report<'a> {
    /// Type of the marker shown after the job ID
    pub marker: Marker,

    /// Job to be reported
    pub job: &'a Job,
}

impl<'a> Report<'a> {
    /// Creates a report for a job, choosing the marker from the job list.
    #[must_use]
    pub fn in_list(jobs: &JobList, job: &'a Job) -> Self {
        let marker = Marker::of(jobs, job.id);
        Report { marker, job }
    }
}

/// Formats a job status report.
impl Display for Report<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let id = self.job.id;
        let marker = self.marker;
        let state = self.job.state;
        let name = &self.job.name;
        write!(f, "[{id}]{marker}  {state}\t\t      {name}")
    }
}
