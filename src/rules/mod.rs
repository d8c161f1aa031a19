// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Decision logic for event membership and the social graph.
//!
//! Everything here is synchronous and storage-free: rules take the freshly
//! loaded documents, check preconditions, and mutate them in place. Services
//! are responsible for loading, persisting and retrying.

pub mod membership;
pub mod social_graph;

pub use membership::EventPatch;
pub use social_graph::{GraphAction, GraphOutcome};
