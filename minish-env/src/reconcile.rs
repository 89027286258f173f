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

//! Reconciliation of child status changes with the job list
//!
//! The operating system reports child status changes through `waitpid`. This
//! module decodes each report into a [`ChildEvent`] and applies it to the job
//! list and the foreground coordinator:
//!
//! | Event     | Foreground process                         | Background job   |
//! |-----------|--------------------------------------------|------------------|
//! | Stopped   | release; record it as `Suspended`          | `Suspended`      |
//! | Continued | `Active` if it is in the job list          | `Active`         |
//! | Exited    | release; remove it from the job list       | `Done`           |
//! | Killed    | release; remove it from the job list       | removed          |
//!
//! Releasing the coordinator also sets the shell's exit status: the exit code
//! of an exited process, or 128 plus the signal number for a stopped or killed
//! one.

use crate::Env;
use crate::exec::ExitStatus;
use crate::exec::FatalError;
use crate::job::JobState;
use crate::job::Pid;
use crate::job::fmt::Report;
use nix::errno::Errno;
use nix::sys::signal::Signal;
use nix::sys::wait::WaitStatus;

/// Decoded child status change
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ChildEvent {
    /// The child was suspended by a signal.
    Stopped(Pid, Signal),
    /// The child was resumed.
    Continued(Pid),
    /// The child terminated normally.
    Exited(Pid, ExitStatus),
    /// The child was terminated by a signal.
    Killed(Pid, Signal),
}

impl ChildEvent {
    /// Decodes a wait status.
    ///
    /// Returns `None` for statuses that do not describe a job-control state
    /// change, such as `StillAlive` and ptrace events.
    #[must_use]
    pub fn from_wait_status(status: WaitStatus) -> Option<Self> {
        match status {
            WaitStatus::Stopped(pid, signal) => Some(ChildEvent::Stopped(pid, signal)),
            WaitStatus::Continued(pid) => Some(ChildEvent::Continued(pid)),
            WaitStatus::Exited(pid, code) => Some(ChildEvent::Exited(pid, ExitStatus(code))),
            WaitStatus::Signaled(pid, signal, _) => Some(ChildEvent::Killed(pid, signal)),
            _ => None,
        }
    }

    /// Returns the process ID of the child.
    #[must_use]
    pub const fn pid(&self) -> Pid {
        match *self {
            ChildEvent::Stopped(pid, _)
            | ChildEvent::Continued(pid)
            | ChildEvent::Exited(pid, _)
            | ChildEvent::Killed(pid, _) => pid,
        }
    }
}

impl Env {
    /// Processes signals caught since the last call.
    ///
    /// `SIGTSTP` becomes a [stop request](Self::request_stop) and `SIGINT` an
    /// [interrupt request](Self::request_interrupt) for the foreground
    /// process. Then all pending child status changes are
    /// [reaped](Self::reap_children), whether or not `SIGCHLD` was among the
    /// signals, since a single `SIGCHLD` may stand for several changes.
    pub fn handle_signals(&mut self) -> crate::exec::Result {
        for signal in self.system.caught_signals() {
            tracing::trace!(?signal, "caught");
            match signal {
                Signal::SIGTSTP => self.request_stop(Signal::SIGTSTP),
                Signal::SIGINT => self.request_interrupt(),
                _ => (),
            }
        }
        self.reap_children()
    }

    /// Applies all pending child status changes to the job list.
    ///
    /// This function calls [`System::wait`](crate::System::wait) repeatedly
    /// until no more changes are pending. An error other than `ECHILD` means
    /// the job list can no longer be kept in sync with the actual processes,
    /// which is fatal.
    pub fn reap_children(&mut self) -> crate::exec::Result {
        loop {
            let status = match self.system.wait() {
                Ok(WaitStatus::StillAlive) | Err(Errno::ECHILD) => return Ok(()),
                Ok(status) => status,
                Err(Errno::EINTR) => continue,
                Err(errno) => {
                    tracing::error!(%errno, "waitpid failed");
                    return Err(FatalError::Wait(errno));
                }
            };
            tracing::debug!(?status, "reaped");

            if let Some(event) = ChildEvent::from_wait_status(status) {
                self.apply_child_event(event);
            }
        }
    }

    /// Applies a single child status change to the job list and the
    /// foreground coordinator.
    pub fn apply_child_event(&mut self, event: ChildEvent) {
        let pid = event.pid();
        let now = self.now();
        let is_foreground = self.foreground.is(pid);

        match event {
            ChildEvent::Stopped(_, signal) => {
                if is_foreground {
                    self.release_foreground(ExitStatus::from(signal));
                    if self.jobs.get_by_pid(pid).is_none() {
                        let name = self.foreground.name.clone();
                        self.jobs.insert(pid, JobState::Undefined, name, now);
                    }
                }
                self.jobs.set_state(pid, JobState::Suspended, now);
                self.print_job_of(pid);
            }

            ChildEvent::Continued(_) => self.jobs.set_state(pid, JobState::Active, now),

            ChildEvent::Exited(_, exit_status) => {
                if is_foreground {
                    self.release_foreground(exit_status);
                    self.jobs.remove_by_pid(pid);
                } else {
                    self.jobs.set_state(pid, JobState::Done, now);
                }
            }

            ChildEvent::Killed(_, signal) => {
                if is_foreground {
                    self.release_foreground(ExitStatus::from(signal));
                }
                self.jobs.remove_by_pid(pid);
            }
        }
    }

    fn release_foreground(&mut self, exit_status: ExitStatus) {
        self.foreground.released = true;
        self.exit_status = exit_status;
    }

    /// Prints the job line of the job for `pid`, if any.
    fn print_job_of(&mut self, pid: Pid) {
        if let Some(job) = self.jobs.get_by_pid(pid) {
            let line = Report::in_list(&self.jobs, job).to_string();
            self.print(line);
        }
    }

    /// Reports and removes finished jobs.
    ///
    /// This function prints the job line of every job in the
    /// [`Done`](JobState::Done) state and removes them from the job list. The
    /// shell calls it before showing the next prompt.
    pub fn report_finished_jobs(&mut self) {
        let done: Vec<(usize, String)> = self
            .jobs
            .iter()
            .filter(|job| job.state == JobState::Done)
            .map(|job| (job.id, Report::in_list(&self.jobs, job).to_string()))
            .collect();
        for (id, line) in done {
            self.print(line);
            self.jobs.remove_by_id(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::VirtualSystem;
    use crate::system::r#virtual::SystemState;
    use assert_matches::assert_matches;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn virtual_env() -> (Env, Rc<RefCell<SystemState>>) {
        let system = VirtualSystem::new();
        let state = Rc::clone(&system.state);
        let mut env = Env::with_system(Box::new(system));
        env.init_job_control().unwrap();
        (env, state)
    }

    fn set_foreground(env: &mut Env, pid: Pid, name: &str) {
        env.foreground.pid = Some(pid);
        env.foreground.name = name.to_string();
        env.foreground.released = false;
    }

    #[test]
    fn decoding_wait_statuses() {
        let pid = Pid::from_raw(10);
        assert_eq!(
            ChildEvent::from_wait_status(WaitStatus::Exited(pid, 4)),
            Some(ChildEvent::Exited(pid, ExitStatus(4)))
        );
        assert_eq!(
            ChildEvent::from_wait_status(WaitStatus::Signaled(pid, Signal::SIGTERM, true)),
            Some(ChildEvent::Killed(pid, Signal::SIGTERM))
        );
        assert_eq!(
            ChildEvent::from_wait_status(WaitStatus::Stopped(pid, Signal::SIGSTOP)),
            Some(ChildEvent::Stopped(pid, Signal::SIGSTOP))
        );
        assert_eq!(
            ChildEvent::from_wait_status(WaitStatus::Continued(pid)),
            Some(ChildEvent::Continued(pid))
        );
        assert_eq!(ChildEvent::from_wait_status(WaitStatus::StillAlive), None);
    }

    #[test]
    fn foreground_stop_inserts_suspended_job() {
        let (mut env, state) = virtual_env();
        let pid = Pid::from_raw(42);
        set_foreground(&mut env, pid, "vi notes");

        env.apply_child_event(ChildEvent::Stopped(pid, Signal::SIGTSTP));

        assert!(env.foreground.released);
        assert_eq!(env.exit_status, ExitStatus::from(Signal::SIGTSTP));
        let job = env.jobs.get_by_pid(pid).unwrap();
        assert_eq!(job.id, 1);
        assert_eq!(job.state, JobState::Suspended);
        assert_eq!(job.name, "vi notes");
        assert_eq!(state.borrow().stdout, "[1]+  Stopped\t\t      vi notes\n");
    }

    #[test]
    fn foreground_stop_of_known_job_keeps_its_id() {
        let (mut env, _state) = virtual_env();
        let now = env.now();
        env.jobs.insert(Pid::from_raw(1), JobState::Active, "a".into(), now);
        env.jobs.insert(Pid::from_raw(2), JobState::Active, "b".into(), now);
        set_foreground(&mut env, Pid::from_raw(1), "a");

        env.apply_child_event(ChildEvent::Stopped(Pid::from_raw(1), Signal::SIGSTOP));

        assert_eq!(env.jobs.len(), 2);
        let job = env.jobs.get_by_id(1).unwrap();
        assert_eq!(job.state, JobState::Suspended);
    }

    #[test]
    fn background_stop_and_continue() {
        let (mut env, state) = virtual_env();
        let pid = Pid::from_raw(7);
        let now = env.now();
        env.jobs.insert(pid, JobState::Active, "sleep 9".into(), now);

        env.apply_child_event(ChildEvent::Stopped(pid, Signal::SIGTSTP));
        assert_eq!(env.jobs.get_by_pid(pid).unwrap().state, JobState::Suspended);
        assert!(!env.foreground.released);
        assert_eq!(state.borrow().stdout, "[1]+  Stopped\t\t      sleep 9\n");

        env.apply_child_event(ChildEvent::Continued(pid));
        assert_eq!(env.jobs.get_by_pid(pid).unwrap().state, JobState::Active);
    }

    #[test]
    fn stop_of_untracked_background_process_is_ignored() {
        let (mut env, state) = virtual_env();
        env.apply_child_event(ChildEvent::Stopped(Pid::from_raw(3), Signal::SIGSTOP));
        assert!(env.jobs.is_empty());
        assert_eq!(state.borrow().stdout, "");
    }

    #[test]
    fn foreground_exit_removes_job() {
        let (mut env, _state) = virtual_env();
        let pid = Pid::from_raw(5);
        let now = env.now();
        env.jobs.insert(pid, JobState::Active, "make".into(), now);
        set_foreground(&mut env, pid, "make");

        env.apply_child_event(ChildEvent::Exited(pid, ExitStatus(2)));

        assert!(env.foreground.released);
        assert_eq!(env.exit_status, ExitStatus(2));
        assert!(env.jobs.is_empty());
    }

    #[test]
    fn background_exit_marks_job_done() {
        let (mut env, _state) = virtual_env();
        let pid = Pid::from_raw(5);
        let now = env.now();
        env.jobs.insert(pid, JobState::Active, "make".into(), now);
        env.exit_status = ExitStatus(9);

        env.apply_child_event(ChildEvent::Exited(pid, ExitStatus(0)));

        assert!(!env.foreground.released);
        assert_eq!(env.exit_status, ExitStatus(9));
        assert_eq!(env.jobs.get_by_pid(pid).unwrap().state, JobState::Done);
    }

    #[test]
    fn killed_jobs_are_removed() {
        let (mut env, _state) = virtual_env();
        let now = env.now();
        env.jobs.insert(Pid::from_raw(1), JobState::Active, "a".into(), now);
        env.jobs.insert(Pid::from_raw(2), JobState::Suspended, "b".into(), now);
        set_foreground(&mut env, Pid::from_raw(2), "b");

        env.apply_child_event(ChildEvent::Killed(Pid::from_raw(1), Signal::SIGTERM));
        assert_eq!(env.jobs.len(), 1);
        assert!(!env.foreground.released);

        env.apply_child_event(ChildEvent::Killed(Pid::from_raw(2), Signal::SIGKILL));
        assert!(env.jobs.is_empty());
        assert!(env.foreground.released);
        assert_eq!(env.exit_status, ExitStatus(128 + Signal::SIGKILL as i32));
    }

    #[test]
    fn reap_children_drains_all_statuses() {
        let (mut env, state) = virtual_env();
        let now = env.now();
        env.jobs.insert(Pid::from_raw(1), JobState::Active, "a".into(), now);
        env.jobs.insert(Pid::from_raw(2), JobState::Active, "b".into(), now);
        {
            let mut state = state.borrow_mut();
            state.report(WaitStatus::Exited(Pid::from_raw(1), 0));
            state.report(WaitStatus::Signaled(Pid::from_raw(2), Signal::SIGTERM, false));
        }

        env.handle_signals().unwrap();

        assert_eq!(env.jobs.len(), 1);
        assert_eq!(env.jobs.get_by_id(1).unwrap().state, JobState::Done);
        assert!(state.borrow().statuses.is_empty());
    }

    #[test]
    fn reap_children_failure_is_fatal() {
        #[derive(Debug)]
        struct FailingWait(VirtualSystem);
        impl crate::System for FailingWait {
            fn now(&self) -> std::time::Instant {
                self.0.now()
            }
            fn open(
                &mut self,
                path: &std::ffi::CStr,
                mode: crate::system::OpenMode,
            ) -> Result<crate::io::Fd, Errno> {
                self.0.open(path, mode)
            }
            fn pipe(&mut self) -> Result<(crate::io::Fd, crate::io::Fd), Errno> {
                self.0.pipe()
            }
            fn close(&mut self, fd: crate::io::Fd) -> Result<(), Errno> {
                self.0.close(fd)
            }
            fn write(&mut self, fd: crate::io::Fd, buffer: &[u8]) -> Result<usize, Errno> {
                self.0.write(fd, buffer)
            }
            fn spawn(&mut self, launch: &crate::system::Launch) -> Result<Pid, Errno> {
                self.0.spawn(launch)
            }
            fn wait(&mut self) -> Result<WaitStatus, Errno> {
                Err(Errno::EINVAL)
            }
            fn kill(&mut self, target: Pid, signal: Signal) -> Result<(), Errno> {
                self.0.kill(target, signal)
            }
            fn catch_signals(&mut self, signals: &[Signal]) -> Result<(), Errno> {
                self.0.catch_signals(signals)
            }
            fn caught_signals(&mut self) -> Vec<Signal> {
                self.0.caught_signals()
            }
            fn wait_for_signals(&mut self) -> Result<(), Errno> {
                self.0.wait_for_signals()
            }
        }

        let mut env = Env::with_system(Box::new(FailingWait(VirtualSystem::new())));
        assert_matches!(env.reap_children(), Err(FatalError::Wait(Errno::EINVAL)));
    }

    #[test]
    fn report_finished_jobs_prints_and_removes_done_jobs() {
        let (mut env, state) = virtual_env();
        let now = env.now();
        env.jobs.insert(Pid::from_raw(1), JobState::Active, "a".into(), now);
        env.jobs.insert(Pid::from_raw(2), JobState::Active, "b".into(), now);
        env.apply_child_event(ChildEvent::Exited(Pid::from_raw(1), ExitStatus(0)));

        env.report_finished_jobs();

        assert_eq!(state.borrow().stdout, "[1]+  Done\t\t      a\n");
        assert_eq!(env.jobs.len(), 1);
        assert!(env.jobs.get_by_id(1).is_none());
    }
}
