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

//! Background jobs of real processes

use minish_env::Env;
use minish_env::RealSystem;
use minish_env::exec::ExitStatus;
use minish_env::job::JobState;
use minish_semantics::CommandLine;
use minish_semantics::execute;
use nix::sys::signal::Signal;

/// Handles signals until `done` returns true.
fn wait_until(env: &mut Env, done: impl Fn(&Env) -> bool) {
    loop {
        env.handle_signals().unwrap();
        if done(env) {
            break;
        }
        env.system.wait_for_signals().unwrap();
    }
}

#[test]
fn background_job_lifecycle() {
    let mut env = Env::with_system(Box::new(unsafe { RealSystem::new() }));
    env.init_job_control().unwrap();

    let command_line = CommandLine {
        background: true,
        ..CommandLine::new([["sleep", "1000"]])
    };
    execute(&mut env, &command_line).unwrap();
    assert_eq!(env.exit_status, ExitStatus::SUCCESS);
    assert_eq!(env.jobs.len(), 1);
    let job = env.jobs.get_by_id(1).unwrap();
    assert_eq!(job.state, JobState::Active);
    assert_eq!(job.name, "sleep 1000");
    let pid = job.pid;

    env.system.kill(pid, Signal::SIGSTOP).unwrap();
    wait_until(&mut env, |env| {
        env.jobs.get_by_pid(pid).unwrap().state == JobState::Suspended
    });

    env.system.kill(pid, Signal::SIGCONT).unwrap();
    wait_until(&mut env, |env| {
        env.jobs.get_by_pid(pid).unwrap().state == JobState::Active
    });

    env.system.kill(pid, Signal::SIGTERM).unwrap();
    wait_until(&mut env, |env| env.jobs.is_empty());

    // A job that exits normally stays as done until reported.
    let command_line = CommandLine {
        background: true,
        ..CommandLine::new([["true"]])
    };
    execute(&mut env, &command_line).unwrap();
    wait_until(&mut env, |env| {
        env.jobs.iter().all(|job| job.state == JobState::Done)
    });
    assert_eq!(env.jobs.len(), 1);
    env.report_finished_jobs();
    assert!(env.jobs.is_empty());
}
