//! # smarthome-app
//!
//! Application layer: the automation engines and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Hold the in-memory home: [`house::House`], the registry of rooms
//! - Run the engines over it:
//!   - [`rule_engine::RuleEngine`]: derive device states from room readings
//!   - [`scheduler::Scheduler`]: fire time-triggered actions, in the
//!     foreground or from a cancellable background task
//!   - [`scene_manager::SceneManager`]: store and re-apply named captures
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `HomeRepository`: load and upsert rooms and devices
//! - Orchestrate domain objects without knowing *how* persistence or IO works
//!
//! ## Dependency rule
//! Depends on `smarthome-domain` only (plus `tokio` for the background task).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod house;
pub mod ports;
pub mod rule_engine;
pub mod scene_manager;
pub mod scheduler;
pub mod services;
