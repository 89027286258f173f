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

//! Type definitions for job management.
//!
//! A [`Job`] is a child process the shell keeps track of. Jobs are stored in a
//! [`JobList`], which assigns each job a small positive integer, the job ID,
//! that the user types to refer to the job.
//!
//! Job IDs are allocated as one greater than the largest ID in the list, so IDs
//! increase as jobs are added. A freed ID is given out again only after every
//! job with a larger ID has been removed; in particular, numbering restarts
//! at 1 when the list becomes empty. Because a new job always gets the largest
//! ID, iterating the jobs in ascending ID order is the same as iterating them
//! in insertion order.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::time::Instant;

#[doc(no_inline)]
pub use nix::unistd::Pid;

pub mod fmt;

/// Maximum length of a job name in bytes
///
/// See [`Job::name_from_args`].
pub const MAX_NAME_LENGTH: usize = 64;

/// State of a job
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum JobState {
    /// The process is running.
    Active,
    /// The process has been stopped by a signal.
    Suspended,
    /// The process has exited.
    Done,
    /// The process is known to the shell but has no entry in a job list.
    ///
    /// This is the state of a foreground process before it gets stopped, which
    /// is when it is first added to the job list.
    Undefined,
}

/// Child process tracked by the shell
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Job {
    /// Job ID assigned by the containing [`JobList`]
    pub id: usize,

    /// Process ID
    pub pid: Pid,

    /// Current state
    pub state: JobState,

    /// Command line of the process, for display
    pub name: String,

    /// Time when the state last changed
    ///
    /// This is the time of insertion if the state has never changed.
    pub last_transition: Instant,
}

impl Job {
    /// Builds a job name from command arguments.
    ///
    /// The arguments are joined with single spaces. An argument that would make
    /// the name longer than [`MAX_NAME_LENGTH`] bytes is dropped together with
    /// all the arguments following it. If the first argument alone is too long,
    /// it is cut at the last character boundary within the limit.
    ///
    /// ```
    /// # use minish_env::job::Job;
    /// assert_eq!(Job::name_from_args(&["sleep", "1000"]), "sleep 1000");
    /// ```
    #[must_use]
    pub fn name_from_args<S: AsRef<str>>(args: &[S]) -> String {
        let mut name = String::new();
        for arg in args {
            let arg = arg.as_ref();
            if name.is_empty() {
                if arg.len() > MAX_NAME_LENGTH {
                    let mut end = MAX_NAME_LENGTH;
                    while !arg.is_char_boundary(end) {
                        end -= 1;
                    }
                    name.push_str(&arg[..end]);
                    break;
                }
                name.push_str(arg);
            } else {
                if name.len() + 1 + arg.len() > MAX_NAME_LENGTH {
                    break;
                }
                name.push(' ');
                name.push_str(arg);
            }
        }
        name
    }
}

/// Collection of jobs
///
/// See the [module documentation](self) for how job IDs are allocated.
///
/// Jobs are kept in a map keyed by job ID, with a secondary index from process
/// IDs to job IDs.
#[derive(Clone, Debug, Default)]
pub struct JobList {
    jobs: BTreeMap<usize, Job>,
    pids_to_ids: HashMap<Pid, usize>,
}

impl JobList {
    /// Creates an empty job list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of jobs in the list.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Returns true if the list contains no jobs.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Adds a new job and returns its job ID.
    ///
    /// The job ID is one greater than the largest existing job ID, or 1 if the
    /// list is empty. The job's last transition time is set to `now`.
    ///
    /// Process IDs are unique in the list. If there is already a job with the
    /// same process ID, that job must be a leftover of a process whose ID has
    /// since been reused by the system, so it is removed first.
    pub fn insert(&mut self, pid: Pid, state: JobState, name: String, now: Instant) -> usize {
        if let Some(stale) = self.remove_by_pid(pid) {
            tracing::debug!(id = stale.id, %pid, "dropped job with reused process ID");
        }

        let id = self.jobs.keys().next_back().map_or(1, |&max| max + 1);
        let job = Job {
            id,
            pid,
            state,
            name,
            last_transition: now,
        };
        self.jobs.insert(id, job);
        self.pids_to_ids.insert(pid, id);
        id
    }

    /// Removes the job with the given job ID.
    ///
    /// Returns the removed job, or `None` if there was no such job.
    pub fn remove_by_id(&mut self, id: usize) -> Option<Job> {
        let job = self.jobs.remove(&id)?;
        self.pids_to_ids.remove(&job.pid);
        Some(job)
    }

    /// Removes the job with the given process ID.
    ///
    /// Returns the removed job, or `None` if there was no such job.
    pub fn remove_by_pid(&mut self, pid: Pid) -> Option<Job> {
        let id = self.pids_to_ids.remove(&pid)?;
        self.jobs.remove(&id)
    }

    /// Returns the job with the given job ID.
    #[must_use]
    pub fn get_by_id(&self, id: usize) -> Option<&Job> {
        self.jobs.get(&id)
    }

    /// Returns the job with the given process ID.
    #[must_use]
    pub fn get_by_pid(&self, pid: Pid) -> Option<&Job> {
        let id = self.pids_to_ids.get(&pid)?;
        self.jobs.get(id)
    }

    /// Changes the state of the job with the given process ID.
    ///
    /// The job's last transition time is set to `now`. This function does
    /// nothing if there is no such job.
    pub fn set_state(&mut self, pid: Pid, state: JobState, now: Instant) {
        let Some(id) = self.pids_to_ids.get(&pid) else {
            return;
        };
        if let Some(job) = self.jobs.get_mut(id) {
            tracing::debug!(id = job.id, %pid, from = ?job.state, to = ?state, "job state changed");
            job.state = state;
            job.last_transition = now;
        }
    }

    /// Returns the IDs of the two most recently changed jobs.
    ///
    /// The first is the job with the latest transition time, the second the
    /// one before it. Jobs with the same transition time are ordered by
    /// insertion: the one added later counts as more recent. The results are
    /// `None` if the list has less than one or two jobs, respectively.
    ///
    /// These are the jobs marked with `+` and `-` in job reports.
    #[must_use]
    pub fn most_recent_two(&self) -> (Option<usize>, Option<usize>) {
        let mut latest: Option<&Job> = None;
        let mut previous: Option<&Job> = None;
        // Iterating in insertion order, `>=` lets a later job win a tie.
        for job in self.jobs.values() {
            if latest.is_none_or(|l| job.last_transition >= l.last_transition) {
                previous = latest;
                latest = Some(job);
            } else if previous.is_none_or(|p| job.last_transition >= p.last_transition) {
                previous = Some(job);
            }
        }
        (latest.map(|job| job.id), previous.map(|job| job.id))
    }

    /// Returns an iterator over the jobs in insertion order.
    pub fn iter(&self) -> Iter<'_> {
        Iter(self.jobs.values())
    }

    /// Removes all jobs from the list.
    pub fn clear(&mut self) {
        self.jobs.clear();
        self.pids_to_ids.clear();
    }
}

/// Iterator of jobs in a [`JobList`]
///
/// Call [`JobList::iter`] again to restart the traversal.
#[derive(Clone, Debug)]
pub struct Iter<'a>(std::collections::btree_map::Values<'a, usize, Job>);

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Job;

    #[inline]
    fn next(&mut self) -> Option<&'a Job> {
        self.0.next()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl DoubleEndedIterator for Iter<'_> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        self.0.next_back()
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl<'a> IntoIterator for &'a JobList {
    type Item = &'a Job;
    type IntoIter = Iter<'a>;

    #[inline]
    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}
