//! Integration tests for the gateways
//!
//! Every test starts an in-process TCP listener on `127.0.0.1:0` that
//! plays the controller side of the conversation, points a gateway at it
//! and checks what goes over the wire and what reaches the sensors.
//!
//! # Test Structure
//!
//! - `lutron_session_test.rs` - login, setup ordering, invalid login, telnet, reconnect
//! - `amx_session_test.rs` - framing, feedback routing, status filters
//!
//! ```bash
//! cargo test -p hagw-tests
//! ```

// This crate only contains tests, no library code
