//! End-to-end tests against the in-memory transport

mod workflow;
