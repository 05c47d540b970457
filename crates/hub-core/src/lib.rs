//! Core primitives for the identity-federation hub.
//!
//! This crate provides the pieces every other hub crate builds on:
//!
//! - [`config`] - message size ceilings, replay validity windows, policy knobs
//! - [`clock`] - injectable time source for validity-window computation
//! - [`event`] - structured audit events for security-relevant outcomes
//! - [`error`] - configuration error type
//!
//! The SAML pipeline itself lives in `hub-saml`; key material handling in
//! `hub-crypto`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod clock;
pub mod config;
pub mod error;
pub mod event;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{HubConfig, LevelOfAssurance, MessageLimits, ReplayWindows};
pub use error::{Error, Result};
pub use event::{Event, EventBuilder, EventOutcome, EventType};
