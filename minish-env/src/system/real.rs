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

//! Implementation of `System` that actually interacts with the system.
//!
//! # Signal handling
//!
//! Signals are caught by [`catch_signal`], which runs preemptively at any point
//! of the shell's execution. It therefore never touches the job list or any
//! other part of [`Env`](crate::Env). It only records the signal number in a
//! fixed array of atomic slots and writes a byte to a non-blocking pipe (the
//! wake-up pipe). The main flow collects the recorded signals with
//! [`System::caught_signals`] and sleeps on the wake-up pipe in
//! [`System::wait_for_signals`]. A byte written after the main flow last looked
//! at the slots stays in the pipe, so a signal cannot slip in between checking
//! and sleeping.

use super::Launch;
use super::OpenMode;
use super::System;
use super::SystemEx;
use crate::exec::ExitStatus;
use crate::io::Fd;
use nix::errno::Errno;
use nix::sys::signal::SaFlags;
use nix::sys::signal::SigAction;
use nix::sys::signal::SigHandler;
use nix::sys::signal::SigSet;
use nix::sys::signal::Signal;
use nix::sys::wait::WaitPidFlag;
use nix::sys::wait::WaitStatus;
use nix::unistd::ForkResult;
use nix::unistd::Pid;
use std::ffi::CStr;
use std::os::raw::c_int;
use std::sync::atomic::AtomicI32;
use std::sync::atomic::AtomicIsize;
use std::sync::atomic::Ordering;
use std::sync::atomic::compiler_fence;
use std::time::Instant;

static CAUGHT_SIGNALS: [AtomicIsize; 8] = {
    // In the array creation, the repeat operand must be const.
    #[allow(clippy::declare_interior_mutable_const)]
    const SIGNAL_SLOT: AtomicIsize = AtomicIsize::new(0);
    [SIGNAL_SLOT; 8]
};

/// Reading end of the wake-up pipe, or -1 if not yet opened
static WAKEUP_READER: AtomicI32 = AtomicI32::new(-1);

/// Writing end of the wake-up pipe, or -1 if not yet opened
static WAKEUP_WRITER: AtomicI32 = AtomicI32::new(-1);

/// Signal catching function.
///
/// This function records the signal in `CAUGHT_SIGNALS` and wakes up the main
/// flow through the wake-up pipe.
extern "C" fn catch_signal(signal: c_int) {
    // This function can only perform async-signal-safe operations.
    // Performing unsafe operations is undefined behavior!

    // Find an unused slot (having a value of 0) in CAUGHT_SIGNALS and write the
    // signal number into it.
    // If there is a slot having a value of the signal already, do nothing.
    // If there is no available slot, the signal will be lost!
    let number = signal as isize;
    for slot in &CAUGHT_SIGNALS {
        match slot.compare_exchange(0, number, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => break,
            Err(slot_value) if slot_value == number => break,
            _ => continue,
        }
    }

    let writer = WAKEUP_WRITER.load(Ordering::Relaxed);
    if writer >= 0 {
        let saved_errno = errno::errno();
        let byte = 0u8;
        // The pipe is non-blocking. If it is full, the main flow has not woken
        // up yet anyway.
        unsafe { libc::write(writer, (&byte as *const u8).cast(), 1) };
        errno::set_errno(saved_errno);
    }
}

fn set_fd_flags(fd: c_int, fd_flags: c_int, status_flags: c_int) -> Result<(), Errno> {
    unsafe {
        let old = Errno::result(libc::fcntl(fd, libc::F_GETFD))?;
        Errno::result(libc::fcntl(fd, libc::F_SETFD, old | fd_flags))?;
        if status_flags != 0 {
            let old = Errno::result(libc::fcntl(fd, libc::F_GETFL))?;
            Errno::result(libc::fcntl(fd, libc::F_SETFL, old | status_flags))?;
        }
    }
    Ok(())
}

/// Creates a pipe whose ends are close-on-exec and have the given status flags.
fn new_pipe(status_flags: c_int) -> Result<(c_int, c_int), Errno> {
    let mut fds: [c_int; 2] = [-1; 2];
    Errno::result(unsafe { libc::pipe(fds.as_mut_ptr()) })?;
    for fd in fds {
        if let Err(errno) = set_fd_flags(fd, libc::FD_CLOEXEC, status_flags) {
            unsafe {
                libc::close(fds[0]);
                libc::close(fds[1]);
            }
            return Err(errno);
        }
    }
    Ok((fds[0], fds[1]))
}

/// Opens the wake-up pipe if not yet opened.
fn open_wakeup_pipe() -> Result<(), Errno> {
    if WAKEUP_READER.load(Ordering::Relaxed) >= 0 {
        return Ok(());
    }
    let (reader, writer) = new_pipe(libc::O_NONBLOCK)?;
    WAKEUP_READER.store(reader, Ordering::Relaxed);
    WAKEUP_WRITER.store(writer, Ordering::Relaxed);
    Ok(())
}

/// Implementation of `System` that actually interacts with the system.
///
/// `RealSystem` is an empty `struct` because the underlying operating system
/// manages the system's internal state.
#[derive(Debug)]
pub struct RealSystem(());

impl RealSystem {
    /// Returns an instance of `RealSystem`.
    ///
    /// # Safety
    ///
    /// This function is marked `unsafe` because improper use of `RealSystem`
    /// may lead to undefined behavior. [`System::spawn`] forks the process,
    /// which is only sound in a single-threaded program, and the signal
    /// handler state is shared by the whole process. You should never use
    /// `RealSystem` in a multi-threaded program, and it is your responsibility
    /// to make sure you are using only one instance of `RealSystem` in the
    /// process.
    pub unsafe fn new() -> Self {
        RealSystem(())
    }
}

impl System for RealSystem {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn open(&mut self, path: &CStr, mode: OpenMode) -> Result<Fd, Errno> {
        let flags = match mode {
            OpenMode::Read => libc::O_RDONLY,
            OpenMode::WriteTruncate => libc::O_WRONLY | libc::O_CREAT | libc::O_TRUNC,
        } | libc::O_CLOEXEC;
        let permissions: libc::c_uint = 0o666;
        loop {
            let result = unsafe { libc::open(path.as_ptr(), flags, permissions) };
            match Errno::result(result) {
                Err(Errno::EINTR) => (),
                other => return other.map(Fd),
            }
        }
    }

    fn pipe(&mut self) -> Result<(Fd, Fd), Errno> {
        let (reader, writer) = new_pipe(0)?;
        Ok((Fd(reader), Fd(writer)))
    }

    fn close(&mut self, fd: Fd) -> Result<(), Errno> {
        loop {
            match Errno::result(unsafe { libc::close(fd.0) }) {
                Err(Errno::EBADF) => return Ok(()),
                Err(Errno::EINTR) => (),
                other => return other.map(drop),
            }
        }
    }

    fn write(&mut self, fd: Fd, buffer: &[u8]) -> Result<usize, Errno> {
        let result = unsafe { libc::write(fd.0, buffer.as_ptr().cast(), buffer.len()) };
        Errno::result(result).map(|count| count as usize)
    }

    /// Starts a new child process.
    ///
    /// This implementation calls `fork`. The child process sets its process
    /// group, redirects its standard input and output with `dup2`, and calls
    /// `execvp`. The parent also sets the child's process group so that the
    /// child is in its own group whichever process runs first.
    fn spawn(&mut self, launch: &Launch) -> Result<Pid, Errno> {
        let program = launch.args.first().ok_or(Errno::EINVAL)?;

        // SAFETY: As stated on RealSystem::new, the caller is responsible for
        // making the process single-threaded.
        match unsafe { nix::unistd::fork()? } {
            ForkResult::Parent { child } => {
                let _ = nix::unistd::setpgid(child, child);
                Ok(child)
            }
            ForkResult::Child => {
                let me = Pid::from_raw(0);
                let _ = nix::unistd::setpgid(me, me);

                for (from, to) in [(launch.stdin, Fd::STDIN), (launch.stdout, Fd::STDOUT)] {
                    // dup2 clears the close-on-exec flag of the new FD.
                    if from != to && unsafe { libc::dup2(from.0, to.0) } < 0 {
                        let _ = self.write_all(Fd::STDERR, b"cannot redirect\n");
                        unsafe { libc::_exit(ExitStatus::FAILURE.0) }
                    }
                }

                let _ = nix::unistd::execvp(program, &launch.args);
                let _ = self.write_all(Fd::STDERR, b"Unknown command\n");
                unsafe { libc::_exit(ExitStatus::NOT_FOUND.0) }
            }
        }
    }

    fn wait(&mut self) -> Result<WaitStatus, Errno> {
        let options = WaitPidFlag::WUNTRACED | WaitPidFlag::WCONTINUED | WaitPidFlag::WNOHANG;
        loop {
            match nix::sys::wait::waitpid(Pid::from_raw(-1), Some(options)) {
                Err(Errno::EINTR) => (),
                other => return other,
            }
        }
    }

    fn kill(&mut self, target: Pid, signal: Signal) -> Result<(), Errno> {
        nix::sys::signal::kill(target, signal)
    }

    fn catch_signals(&mut self, signals: &[Signal]) -> Result<(), Errno> {
        open_wakeup_pipe()?;
        let handler = SigHandler::Handler(catch_signal);
        let action = SigAction::new(handler, SaFlags::SA_RESTART, SigSet::empty());
        for &signal in signals {
            // SAFETY: The `catch_signal` function only accesses atomic variables
            // and calls async-signal-safe functions.
            unsafe { nix::sys::signal::sigaction(signal, &action) }?;
        }
        Ok(())
    }

    fn caught_signals(&mut self) -> Vec<Signal> {
        let mut signals = Vec::new();
        for slot in &CAUGHT_SIGNALS {
            // Need a fence to ensure we examine the slots in order.
            compiler_fence(Ordering::Acquire);

            let signal = slot.swap(0, Ordering::Relaxed);
            if signal == 0 {
                // The `catch_signal` function always fills the first unused
                // slot, so there is no more slot filled with a signal.
                break;
            }

            if let Ok(signal) = Signal::try_from(signal as c_int) {
                signals.push(signal)
            } else {
                // ignore unknown signal
            }
        }
        signals
    }

    fn wait_for_signals(&mut self) -> Result<(), Errno> {
        let reader = WAKEUP_READER.load(Ordering::Relaxed);
        if reader < 0 {
            // No handler installed; nothing could ever wake us up.
            return Err(Errno::EINVAL);
        }

        let mut poll_fd = libc::pollfd {
            fd: reader,
            events: libc::POLLIN,
            revents: 0,
        };
        match Errno::result(unsafe { libc::poll(&mut poll_fd, 1, -1) }) {
            Ok(_) | Err(Errno::EINTR) => (),
            Err(errno) => return Err(errno),
        }

        let mut buffer = [0u8; 64];
        while unsafe { libc::read(reader, buffer.as_mut_ptr().cast(), buffer.len()) } > 0 {}
        Ok(())
    }
}
