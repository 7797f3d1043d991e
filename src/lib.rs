//! # Quizzaic Live Session Engine
//!
//! This library runs live multiple-choice quiz sessions: a presenter steps
//! a room of participants through the questions of a quiz, answers are
//! scored with a speed bonus the moment they arrive, and a leaderboard is
//! maintained throughout. Sessions are joined with short typable codes and
//! every state change is announced to scoped audiences over a pluggable
//! transport.
//!
//! The engine is transport- and storage-agnostic: quiz content arrives
//! through [`store::ContentStore`] and events leave through
//! [`broadcast::Broadcast`]. The entry point is [`game::Orchestrator`].

#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::similar_names)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::ignored_unit_patterns)]
#![allow(clippy::struct_field_names)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::wildcard_imports)]

pub mod broadcast;
pub mod code;
pub mod constants;
pub mod game;
pub mod ledger;
pub mod quiz;
pub mod ranking;
pub mod roster;
pub mod scoring;
pub mod session;
pub mod store;
