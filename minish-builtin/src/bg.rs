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

//! Bg built-in
//!
//! The **`bg`** built-in resumes a suspended job in the background.
//!
//! # Synopsis
//!
//! ```sh
//! bg [job]
//! ```
//!
//! # Description
//!
//! The built-in sends the `SIGCONT` signal to the job. The job becomes
//! `Running` in the job list when the shell learns that it has been resumed.
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

/// Entry point of the `bg` built-in
pub fn main(env: &mut Env, args: &[String]) -> Result<ExitStatus> {
    match signal_job(env, "bg", args, Signal::SIGCONT) {
        Ok(_) => Ok(ExitStatus::SUCCESS),
        Err(exit_status) => Ok(exit_status),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minish_env::VirtualSystem;
    use minish_env::io::Fd;
    use minish_env::job::JobState;
    use minish_env::system::Launch;
    use minish_env::system::r#virtual::SystemState;
    use std::cell::RefCell;
    use std::ffi::CString;
    use std::rc::Rc;

    fn env_with_stopped_job() -> (Env, Rc<RefCell<SystemState>>) {
        let system = VirtualSystem::new();
        let state = Rc::clone(&system.state);
        let mut env = Env::with_system(Box::new(system));
        env.init_job_control().unwrap();
        let launch = Launch {
            args: vec![CString::new("sleep").unwrap()],
            stdin: Fd::STDIN,
            stdout: Fd::STDOUT,
        };
        let pid = env.system.spawn(&launch).unwrap();
        let now = env.now();
        env.jobs.insert(pid, JobState::Active, "sleep".into(), now);
        env.system.kill(pid, Signal::SIGSTOP).unwrap();
        env.handle_signals().unwrap();
        (env, state)
    }

    #[test]
    fn bg_resumes_job() {
        let (mut env, state) = env_with_stopped_job();
        assert_eq!(env.jobs.get_by_id(1).unwrap().state, JobState::Suspended);

        assert_eq!(main(&mut env, &["%1".to_string()]), Ok(ExitStatus::SUCCESS));
        env.handle_signals().unwrap();

        let job = env.jobs.get_by_id(1).unwrap();
        assert_eq!(job.state, JobState::Active);
        assert_eq!(
            state.borrow().sent_signals.last(),
            Some(&(job.pid, Signal::SIGCONT))
        );
        assert_eq!(env.foreground.pid, None);
    }

    #[test]
    fn bg_with_unknown_job() {
        let (mut env, state) = env_with_stopped_job();
        assert_eq!(main(&mut env, &["2".to_string()]), Ok(ExitStatus::FAILURE));
        assert_eq!(state.borrow().stderr, "minish: bg: no such job\n");
        assert_eq!(env.jobs.get_by_id(1).unwrap().state, JobState::Suspended);
    }

    #[test]
    fn bg_with_done_job() {
        let (mut env, state) = env_with_stopped_job();
        let pid = env.jobs.get_by_id(1).unwrap().pid;
        let now = env.now();
        env.jobs.set_state(pid, JobState::Done, now);
        let signal_count = state.borrow().sent_signals.len();

        assert_eq!(main(&mut env, &["1".to_string()]), Ok(ExitStatus::FAILURE));
        assert_eq!(state.borrow().stderr, "minish: bg: no such job\n");
        assert_eq!(state.borrow().sent_signals.len(), signal_count);
    }
}
