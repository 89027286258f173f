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

//! Pipelines of real processes
//!
//! `waitpid(-1, ...)` sees every child of the test process, so all cases run
//! sequentially in a single test function.

use minish_env::Env;
use minish_env::RealSystem;
use minish_env::exec::ExitStatus;
use minish_semantics::CommandLine;
use minish_semantics::execute;

#[test]
fn pipelines_of_real_processes() {
    let dir = tempfile::tempdir().unwrap();
    let mut env = Env::with_system(Box::new(unsafe { RealSystem::new() }));
    env.init_job_control().unwrap();

    // Three stages: produce three lines, filter out one, count the rest.
    let count = dir.path().join("count");
    let command_line = CommandLine {
        output: Some(count.clone()),
        ..CommandLine::new([
            vec!["printf", "a\\nb\\nc\\n"],
            vec!["grep", "-v", "b"],
            vec!["wc", "-l"],
        ])
    };
    execute(&mut env, &command_line).unwrap();
    assert_eq!(env.exit_status, ExitStatus::SUCCESS);
    assert_eq!(std::fs::read_to_string(&count).unwrap().trim(), "2");
    env.reap_children().unwrap();
    assert!(env.jobs.is_empty());

    // Input redirection from a file
    let input = dir.path().join("input");
    std::fs::write(&input, "x\ny\n").unwrap();
    let copy = dir.path().join("copy");
    let command_line = CommandLine {
        input: Some(input.clone()),
        output: Some(copy.clone()),
        ..CommandLine::new([["cat"]])
    };
    execute(&mut env, &command_line).unwrap();
    assert_eq!(env.exit_status, ExitStatus::SUCCESS);
    assert_eq!(std::fs::read_to_string(&copy).unwrap(), "x\ny\n");

    // A missing input file launches nothing.
    let untouched = dir.path().join("untouched");
    let command_line = CommandLine {
        input: Some(dir.path().join("missing")),
        output: Some(untouched.clone()),
        ..CommandLine::new([["cat"]])
    };
    execute(&mut env, &command_line).unwrap();
    assert_eq!(env.exit_status, ExitStatus::FAILURE);
    assert!(!untouched.exists());

    // An unknown program does not stop the downstream stages.
    let lines = dir.path().join("lines");
    let command_line = CommandLine {
        output: Some(lines.clone()),
        ..CommandLine::new([vec!["minish-no-such-command"], vec!["wc", "-l"]])
    };
    execute(&mut env, &command_line).unwrap();
    assert_eq!(env.exit_status, ExitStatus::SUCCESS);
    assert_eq!(std::fs::read_to_string(&lines).unwrap().trim(), "0");

    let command_line = CommandLine::new([["minish-no-such-command"]]);
    execute(&mut env, &command_line).unwrap();
    assert_eq!(env.exit_status, ExitStatus::NOT_FOUND);

    // Non-zero exit status of the last stage
    let command_line = CommandLine::new([["sh", "-c", "exit 3"]]);
    execute(&mut env, &command_line).unwrap();
    assert_eq!(env.exit_status, ExitStatus(3));

    env.reap_children().unwrap();
    assert!(env.jobs.is_empty());
}
