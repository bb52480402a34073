//! # pfas-cli — PFAS Compliance Command-Line Interface
//!
//! Exercises the compliance stack end to end against in-memory fixture
//! data: substance verification, compliance scans, and the evidence
//! lifecycle. The subcommand handlers live here; `main.rs` only parses
//! and dispatches.
//!
//! ## Subcommands
//!
//! - `verify` — Verify a substance against the fixture identity and
//!   regulatory providers.
//! - `scan` — Assess one or more objects against the fixture ruleset.
//! - `evidence` — Walk a declaration from intake through approval to a
//!   fresh verdict.

pub mod evidence;
pub mod fixtures;
pub mod scan;
pub mod verify;
