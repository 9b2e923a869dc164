//! Scanbench — orchestrator for the board memory test station.
//!
//! This crate drives a hardware test station over its HTTP control surface:
//! it power-cycles a daisy chain of microcontroller boards until every board
//! enumerates cleanly, then walks each board's memory in alternating passes,
//! reading values on one pass and writing inverted test patterns on the next,
//! forever. Status is mirrored to a chat channel so a human can watch the
//! run without shell access to the station host.
//!
//! The decision-making lives in [`controller::Controller`]; everything else
//! is a stateless adapter around it (the HTTP client, the inventory check,
//! the notification sink).

pub mod boot;
pub mod cli;
pub mod config;
pub mod controller;
pub mod inventory;
pub mod notify;
pub mod station;
