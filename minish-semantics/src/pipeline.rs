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

//! Implementation of pipeline semantics.

use crate::CommandLine;
use crate::redir::Redirections;
use crate::redir::close_unless_standard;
use minish_env::Env;
use minish_env::exec::ExitStatus;
use minish_env::exec::FatalError;
use minish_env::exec::Result;
use minish_env::io::Fd;
use minish_env::job::Job;
use minish_env::job::JobState;
use minish_env::system::Launch;
use std::ffi::CString;

/// Converts the stages to argument vectors for `Launch`.
///
/// Returns the offending argument if one contains a nul byte.
fn c_args(stages: &[Vec<String>]) -> std::result::Result<Vec<Vec<CString>>, &String> {
    stages
        .iter()
        .map(|stage| {
            stage
                .iter()
                .map(|arg| CString::new(arg.as_str()).map_err(|_| arg))
                .collect::<std::result::Result<Vec<_>, _>>()
        })
        .collect()
}

/// Executes the pipeline.
///
/// # Executing stages
///
/// All the stages are started as child processes. The standard output of a
/// stage is connected to the standard input of the next stage via a pipe. The
/// standard input of the first stage is the input file of the command line,
/// if any, or the shell's standard input. The standard output of the last
/// stage is the output file, if any, or the shell's standard output. Every
/// child runs in its own process group.
///
/// A stage whose program is not found exits with a non-zero status, but that
/// does not prevent the other stages from running.
///
/// If the command line has no stage, it is a no-op.
///
/// # Background and foreground
///
/// If the command line is in the background, every stage is added to the job
/// list as a running job and its job ID and process ID are printed. The exit
/// status is zero.
///
/// Otherwise, the last stage becomes the foreground process and this function
/// waits until it stops or ends. The exit status is set by the reconciler.
/// The other stages are not tracked in the job list.
///
/// # Errors
///
/// If a redirection target cannot be opened, the error is printed, the exit
/// status is set to 1, and no stage is started. The same happens when a pipe
/// cannot be created, except that the stages already started keep running.
///
/// A failure to create a child process is returned as
/// [`FatalError::Fork`]. Other fatal errors come from waiting for the
/// foreground process.
pub fn execute(env: &mut Env, command_line: &CommandLine) -> Result {
    let Some(last_index) = command_line.stages.len().checked_sub(1) else {
        return Ok(());
    };

    let stages = match c_args(&command_line.stages) {
        Ok(stages) => stages,
        Err(arg) => {
            env.print_error(format_args!("{arg:?}: argument contains a nul byte"));
            env.exit_status = ExitStatus::ERROR;
            return Ok(());
        }
    };

    let redirections = match Redirections::open(
        env,
        command_line.input.as_deref(),
        command_line.output.as_deref(),
    ) {
        Ok(redirections) => redirections,
        Err(error) => {
            env.print_error(error);
            env.exit_status = ExitStatus::FAILURE;
            return Ok(());
        }
    };

    let mut input = redirections.input;
    for (index, args) in stages.into_iter().enumerate() {
        let has_next = index < last_index;
        let (next_input, output) = if has_next {
            match env.system.pipe() {
                Ok(pipe) => pipe,
                Err(errno) => {
                    close_unless_standard(env, input);
                    close_unless_standard(env, redirections.output);
                    env.print_error(format_args!("cannot open a pipe: {}", errno.desc()));
                    env.exit_status = ExitStatus::FAILURE;
                    return Ok(());
                }
            }
        } else {
            (Fd::STDIN, redirections.output)
        };

        let launch = Launch {
            args,
            stdin: input,
            stdout: output,
        };
        let spawned = env.system.spawn(&launch);
        close_unless_standard(env, input);
        close_unless_standard(env, output);
        let pid = match spawned {
            Ok(pid) => pid,
            Err(errno) => {
                close_unless_standard(env, next_input);
                if has_next {
                    close_unless_standard(env, redirections.output);
                }
                tracing::error!(%errno, "fork failed");
                return Err(FatalError::Fork(errno));
            }
        };
        input = next_input;

        let name = Job::name_from_args(&command_line.stages[index]);
        tracing::debug!(%pid, %name, "stage started");

        if command_line.background {
            let now = env.now();
            let id = env.jobs.insert(pid, JobState::Active, name, now);
            env.print(format_args!("[{id}] {pid}"));
            env.exit_status = ExitStatus::SUCCESS;
        } else if !has_next {
            env.begin_foreground(pid, name)?;
            env.await_foreground()?;
        }
    }

    Ok(())
}
