//! # smarthome-domain
//!
//! Pure domain model for the smarthome automation engine.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Devices** (lights, fans, AC units, sensors) and their state machine
//! - Define **Rooms** (ordered, named collections of devices)
//! - Define **Rules** (room conditions → device target state)
//! - Define **Schedules** (time-triggered device actions)
//! - Define **Scenes** (named snapshots of device states)
//! - Contain all invariant enforcement and domain logic
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod device;
pub mod room;
pub mod rule;
pub mod scene;
pub mod schedule;
