//! # Town Client Library
//!
//! Client side of the shared-area protocol. The client keeps a local mirror
//! of every area in the town and of every player's location, and keeps it in
//! step with the authoritative server.
//!
//! ## Consistency Model
//!
//! ### Optimistic Local Edits
//! A local edit goes through a controller setter first, so listeners see the
//! change immediately. The controller's model is then sent to the server as
//! an update request.
//!
//! ### Authoritative Reconciliation
//! The server broadcasts the canonical state of an area after every change,
//! including to the client that made it. Broadcasts are applied with the
//! same setters used for local edits, so only fields that actually differ
//! raise notifications and an echo of our own edit is silent.
//!
//! ### Identity
//! An area controller's id is fixed at construction. Updates never change
//! it, whatever id they carry.
//!
//! ## Module Organization
//!
//! - `events`: typed listener registry with per-kind registration
//! - `listening_area_controller`, `viewing_area_controller`: area mirrors
//! - `town_controller`: routes server packets and local commands to the
//!   right controller
//! - `input`: command-line parsing for the terminal client
//! - `network`: UDP connection, heartbeats and the client event loop
//!
//! ## Usage Example
//!
//! ```rust
//! use client::listening_area_controller::{ListeningAreaController, ListeningAreaEventKind};
//! use shared::ListeningAreaModel;
//!
//! let mut stage = ListeningAreaController::new(ListeningAreaModel {
//!     id: "stage".to_string(),
//!     song: None,
//!     is_playing: false,
//! });
//! stage.add_listener(ListeningAreaEventKind::SongChange, |event| {
//!     println!("now playing: {:?}", event);
//! });
//!
//! // Local edit: notifies listeners, then the model is sent to the server
//! stage.set_song(Some("spotify:track:1".to_string()));
//! let request = stage.to_model();
//!
//! // The server echo changes nothing, so nobody is notified again
//! stage.update_from(&request);
//! ```

pub mod events;
pub mod input;
pub mod listening_area_controller;
pub mod network;
pub mod town_controller;
pub mod viewing_area_controller;
