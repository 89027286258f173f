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

//! Redirections of a pipeline
//!
//! A command line can redirect the standard input of its first stage from a
//! file and the standard output of its last stage to a file. Both files are
//! opened in the shell before any stage is started, so that a failure aborts
//! the whole pipeline.

use minish_env::Env;
use minish_env::io::Fd;
use minish_env::system::OpenMode;
use nix::errno::Errno;
use std::ffi::CString;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use std::path::PathBuf;
use thiserror::Error;

/// Error in opening a redirection target
#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[error("{}: {}", .path.display(), .errno.desc())]
pub struct Error {
    /// Path of the file that could not be opened
    pub path: PathBuf,
    /// Cause of the failure
    pub errno: Errno,
}

/// File descriptors the pipeline reads from and writes to
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Redirections {
    /// Standard input of the first stage
    pub input: Fd,
    /// Standard output of the last stage
    pub output: Fd,
}

impl Default for Redirections {
    fn default() -> Self {
        Redirections {
            input: Fd::STDIN,
            output: Fd::STDOUT,
        }
    }
}

fn open(env: &mut Env, path: &Path, mode: OpenMode) -> Result<Fd, Error> {
    let error = |errno| Error {
        path: path.to_owned(),
        errno,
    };
    let c_path = CString::new(path.as_os_str().as_bytes()).map_err(|_| error(Errno::EINVAL))?;
    env.system.open(&c_path, mode).map_err(error)
}

impl Redirections {
    /// Opens the redirection targets.
    ///
    /// The input file is opened for reading and the output file is created or
    /// truncated. If either cannot be opened, the FD already opened is closed
    /// before the error is returned.
    pub fn open(
        env: &mut Env,
        input: Option<&Path>,
        output: Option<&Path>,
    ) -> Result<Redirections, Error> {
        let mut redirections = Redirections::default();
        if let Some(path) = input {
            redirections.input = open(env, path, OpenMode::Read)?;
        }
        if let Some(path) = output {
            match open(env, path, OpenMode::WriteTruncate) {
                Ok(fd) => redirections.output = fd,
                Err(error) => {
                    redirections.close(env);
                    return Err(error);
                }
            }
        }
        Ok(redirections)
    }

    /// Closes the FDs that are not the shell's own standard input or output.
    pub fn close(self, env: &mut Env) {
        close_unless_standard(env, self.input);
        close_unless_standard(env, self.output);
    }
}

/// Closes `fd` unless it is the standard input, output or error.
pub(crate) fn close_unless_standard(env: &mut Env, fd: Fd) {
    if fd.0 > Fd::STDERR.0 {
        let _ = env.system.close(fd);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minish_env::VirtualSystem;
    use std::rc::Rc;

    #[test]
    fn no_redirections() {
        let mut env = Env::new_virtual();
        let redirections = Redirections::open(&mut env, None, None).unwrap();
        assert_eq!(redirections, Redirections::default());
    }

    #[test]
    fn missing_input_file() {
        let system = VirtualSystem::new();
        let state = Rc::clone(&system.state);
        let mut env = Env::with_system(Box::new(system));

        let result = Redirections::open(
            &mut env,
            Some(Path::new("/no/such/file")),
            Some(Path::new("out")),
        );

        let error = result.unwrap_err();
        assert_eq!(error.errno, Errno::ENOENT);
        assert_eq!(
            error.to_string(),
            format!("/no/such/file: {}", Errno::ENOENT.desc())
        );
        // The output file is not touched.
        assert!(state.borrow().files.is_empty());
    }

    #[test]
    fn both_files_opened() {
        let system = VirtualSystem::new();
        let state = Rc::clone(&system.state);
        state
            .borrow_mut()
            .files
            .insert(PathBuf::from("in"), b"text".to_vec());
        let mut env = Env::with_system(Box::new(system));

        let redirections =
            Redirections::open(&mut env, Some(Path::new("in")), Some(Path::new("out")))
                .unwrap();
        assert_eq!(redirections.input, Fd(3));
        assert_eq!(redirections.output, Fd(4));
        assert!(state.borrow().files.contains_key(Path::new("out")));

        redirections.close(&mut env);
        assert!(state.borrow().open_fds.is_empty());
    }
}
