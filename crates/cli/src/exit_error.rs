// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process exit codes carried through anyhow.

use std::fmt;

/// Wraps an error message with the exit code the process should use.
/// Expected failures (gate blocked, not found) exit 1; usage errors are
/// clap's domain and exit 2.
#[derive(Debug)]
pub struct ExitError {
    pub code: i32,
    pub message: String,
}

impl ExitError {
    /// An expected failure: exit code 1.
    pub fn expected(message: impl Into<String>) -> anyhow::Error {
        anyhow::Error::new(Self {
            code: 1,
            message: message.into(),
        })
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExitError {}

#[cfg(test)]
#[path = "exit_error_tests.rs"]
mod tests;
