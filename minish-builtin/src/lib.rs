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

//! Implementation of the job-control built-in utilities.
//!
//! Each built-in utility is implemented in the submodule named after the
//! utility. The submodule contains the `main` function that implements the
//! built-in utility. The module documentation for each submodule describes the
//! specification of the built-in utility.
//!
//! The [`common`] module provides common functions that are used for
//! implementing built-in utilities.
//!
//! To make the built-ins available in an environment, register them with
//! [`register`] or copy the entries of [`BUILTINS`] into
//! [`Env::builtins`](minish_env::Env::builtins).

pub mod bg;
pub mod common;
pub mod fg;
pub mod list;
pub mod stop;

use minish_env::Env;
#[doc(no_inline)]
pub use minish_env::builtin::*;

/// Array of all the implemented built-in utilities.
///
/// The array items are ordered alphabetically.
pub const BUILTINS: &[(&str, Builtin)] = &[
    ("bg", Builtin { execute: bg::main }),
    ("fg", Builtin { execute: fg::main }),
    ("list", Builtin { execute: list::main }),
    ("stop", Builtin { execute: stop::main }),
];

/// Registers all the built-ins in the environment.
pub fn register(env: &mut Env) {
    env.builtins.extend(BUILTINS.iter().copied());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_sorted() {
        BUILTINS
            .windows(2)
            .for_each(|pair| assert!(pair[0].0 < pair[1].0, "{pair:?}"));
    }

    #[test]
    fn register_adds_all_builtins() {
        let mut env = Env::new_virtual();
        register(&mut env);
        let mut names: Vec<_> = env.builtins.keys().copied().collect();
        names.sort();
        assert_eq!(names, ["bg", "fg", "list", "stop"]);
    }
}
