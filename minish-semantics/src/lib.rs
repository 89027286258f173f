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

//! Execution of command lines.
//!
//! This crate runs a [`CommandLine`] in an [`Env`]. A command line naming a
//! built-in utility is executed in the shell process; anything else is
//! started as a [pipeline] of child processes.

pub mod command_line;
pub mod pipeline;
pub mod redir;

pub use self::command_line::CommandLine;
use minish_env::Env;
use minish_env::exec::Result;

/// Executes a command line.
///
/// An empty command line is a no-op. If the command line has a single stage
/// whose first word names a built-in registered in `env.builtins`, the
/// built-in runs in the shell process and its result becomes the exit status.
/// Redirections and the background flag are ignored for built-ins. Otherwise,
/// the command line is executed by [`pipeline::execute`].
pub fn execute(env: &mut Env, command_line: &CommandLine) -> Result {
    if let [stage] = command_line.stages.as_slice() {
        if let Some((name, args)) = stage.split_first() {
            if let Some(builtin) = env.builtins.get(name.as_str()).copied() {
                tracing::debug!(%name, "running built-in");
                env.exit_status = (builtin.execute)(env, args)?;
                return Ok(());
            }
        }
    }

    pipeline::execute(env, command_line)
}
