//! Logic clock simulation core.
//!
//! A clock entity emits a periodic on/off signal on its wire output,
//! spending `up_period` tenths of a second high and `down_period` tenths
//! low. Periods are edited through a modal dialog opened on placement or
//! on a primary click.

pub mod building;
pub mod clock;
pub mod clock_edit;
pub mod clock_state;
pub mod clock_subsystem;
pub mod command;
pub mod config;
pub mod dialog;
pub mod engine;
pub mod error;
pub mod event;
pub mod snapshot;
pub mod store;
pub mod subsystem;
pub mod types;
pub mod wires;
pub mod world;
