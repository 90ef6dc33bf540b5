//! rondo integration test harness.
//!
//! Every test spins up real nodes: each is a full RingNode served by axum
//! on a loopback port, and all coordination between them happens over HTTP
//! exactly as it would between independent processes. Misbehaving members
//! (black holes, tamperers, signature droppers) are small stub servers
//! registered into the ring like any other member.

mod infra;

mod ring;
