// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for concierge integration tests.
//!
//! # Components
//!
//! - [`MockProvider`] - scripted completion backend that records requests
//! - [`MockTransport`] - injectable events, captured replies and alerts,
//!   scripted connection owners
//! - [`TestHarness`] - a full [`AgentLoop`](concierge_agent::AgentLoop) over
//!   the mocks and a temporary SQLite admin store

pub mod harness;
pub mod mock_provider;
pub mod mock_transport;

pub use harness::TestHarness;
pub use mock_provider::MockProvider;
pub use mock_transport::MockTransport;
