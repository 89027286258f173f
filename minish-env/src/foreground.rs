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

//! Foreground coordinator
//!
//! At most one child process is in the foreground at a time. While it is, the
//! main flow of the shell is blocked in [`Env::await_foreground`] until the
//! reconciler observes that the process has stopped or ended and releases the
//! coordinator. A pipeline's foreground process is its last stage.
//!
//! The coordinator never calls `wait` on the foreground process itself. The
//! same status notifications also tell the reconciler about background jobs, so
//! the reconciler is the only consumer of them and the coordinator cooperates
//! with it through the `released` flag.

use crate::Env;
use crate::exec::ExitStatus;
use crate::exec::FatalError;
use crate::job::JobState;
use crate::job::Pid;
use nix::errno::Errno;
use nix::sys::signal::Signal;

/// State of the foreground slot
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Foreground {
    /// Process currently in the foreground
    pub pid: Option<Pid>,

    /// Display name of the foreground process
    ///
    /// The reconciler uses this name when it adds a stopped foreground process
    /// to the job list.
    pub name: String,

    /// Whether the foreground process has stopped or ended
    pub released: bool,
}

impl Foreground {
    /// Tests whether `pid` is the foreground process.
    #[must_use]
    pub fn is(&self, pid: Pid) -> bool {
        self.pid == Some(pid)
    }
}

impl Env {
    /// Makes `pid` the foreground process.
    ///
    /// Stop and interrupt requests the user made while no process was in the
    /// foreground are discarded so that they do not hit the new process. Child
    /// status changes that arrived in the meantime are reconciled.
    pub fn begin_foreground(&mut self, pid: Pid, name: String) -> crate::exec::Result {
        let stale = self.system.caught_signals();
        tracing::trace!(?stale, "signals discarded before foreground");

        self.foreground = Foreground {
            pid: Some(pid),
            name,
            released: false,
        };
        tracing::debug!(%pid, "process is in the foreground");

        if stale.contains(&Signal::SIGCHLD) {
            self.reap_children()?;
        }
        Ok(())
    }

    /// Blocks until the foreground process stops or ends.
    ///
    /// The function returns only after the reconciler has released the
    /// coordinator. On return, the foreground slot is empty. There is no
    /// timeout.
    pub fn await_foreground(&mut self) -> crate::exec::Result {
        loop {
            self.handle_signals()?;
            if self.foreground.released {
                break;
            }
            match self.system.wait_for_signals() {
                Ok(()) | Err(Errno::EINTR) => (),
                Err(errno) => {
                    tracing::error!(%errno, "waiting for signals failed");
                    return Err(FatalError::SignalWait(errno));
                }
            }
        }

        self.foreground.pid = None;
        Ok(())
    }

    /// Requests the foreground process to stop.
    ///
    /// This function sends `signal` to the foreground process unless there is
    /// none or its job is already suspended. The job list is not changed here;
    /// the reconciler updates it when the process actually stops.
    pub fn request_stop(&mut self, signal: Signal) {
        let Some(pid) = self.foreground.pid else {
            return;
        };
        if self.foreground.released {
            return;
        }
        if self
            .jobs
            .get_by_pid(pid)
            .is_some_and(|job| job.state == JobState::Suspended)
        {
            return;
        }

        if let Err(errno) = self.system.kill(pid, signal) {
            tracing::warn!(%pid, %errno, "cannot send {signal:?}");
        }
    }

    /// Terminates the foreground process.
    ///
    /// This function sends `SIGKILL` to the foreground process, if any, and
    /// releases the coordinator. The exit status is set as if the process had
    /// been killed, since its status change may be reaped only after the
    /// release. Background jobs are not affected.
    pub fn request_interrupt(&mut self) {
        let Some(pid) = self.foreground.pid else {
            return;
        };
        if self.foreground.released {
            return;
        }

        if let Err(errno) = self.system.kill(pid, Signal::SIGKILL) {
            tracing::warn!(%pid, %errno, "cannot send SIGKILL");
        }
        self.foreground.released = true;
        self.exit_status = ExitStatus::from(Signal::SIGKILL);
    }
}
