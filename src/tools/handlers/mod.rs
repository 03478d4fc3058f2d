// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Tool handler implementations.
//!
//! This module contains the implementations of all built-in tools.

mod batch;
mod echo;
mod fibonacci;
mod heavy;
mod random;
mod time;

pub use batch::BatchDataHandler;
pub use echo::EchoHandler;
pub use fibonacci::{FibonacciHandler, MAX_FIBONACCI_N};
pub use heavy::HeavyComputationHandler;
pub use random::RandomNumberHandler;
pub use time::GetTimeHandler;
