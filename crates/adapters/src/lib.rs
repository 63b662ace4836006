// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Adapters between the omx runtime and the outside world: the terminal
//! multiplexer / child-process transports and the per-CLI spawners.

pub mod env;
pub mod spawner;
pub mod subprocess;
pub mod transport;

pub use spawner::{
    AnySpawner, ClaudeSpawner, CodexSpawner, ReasoningEffort, SpawnConfig, Spawner, SpawnerKind,
};
pub use transport::{
    detect_transport, AnyTransport, ProcessTransport, SlotSpec, TmuxTransport, Transport,
    TransportError, TransportKind,
};

#[cfg(any(test, feature = "test-support"))]
pub use spawner::FakeSpawner;
#[cfg(any(test, feature = "test-support"))]
pub use transport::{FakeTransport, TransportCall};
