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

//! Parsed command line

use std::path::PathBuf;

/// Command line ready for execution
///
/// A command line is a pipeline of one or more stages, each of which is the
/// argument vector of a program to run. The first stage may read from an input
/// file and the last stage may write to an output file. A command line with
/// no stages comes from a blank input line.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CommandLine {
    /// Argument vectors of the stages
    ///
    /// No stage may be empty.
    pub stages: Vec<Vec<String>>,

    /// File connected to the standard input of the first stage
    pub input: Option<PathBuf>,

    /// File connected to the standard output of the last stage
    ///
    /// The file is created if missing and truncated otherwise.
    pub output: Option<PathBuf>,

    /// Whether the stages run in the background
    pub background: bool,
}

impl CommandLine {
    /// Creates a foreground command line without redirections.
    #[must_use]
    pub fn new<I, S>(stages: I) -> Self
    where
        I: IntoIterator,
        I::Item: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let stages = stages
            .into_iter()
            .map(|stage| stage.into_iter().map(Into::into).collect())
            .collect();
        CommandLine {
            stages,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_collects_stages() {
        let command_line = CommandLine::new([vec!["ls", "-l"], vec!["wc"]]);
        assert_eq!(command_line.stages, [vec!["ls", "-l"], vec!["wc"]]);
        assert_eq!(command_line.input, None);
        assert_eq!(command_line.output, None);
        assert!(!command_line.background);
    }
}
