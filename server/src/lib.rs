//! # Town Server Library
//!
//! Authoritative side of the shared-area protocol. The server owns the
//! canonical state of every interactable area in a town, tracks which
//! players occupy which area, and broadcasts every change to all connected
//! clients.
//!
//! ## Module Organization
//!
//! ### Areas (`area`, `listening_area`, `viewing_area`)
//! A single generic base, [`area::InteractableArea`], provides bounds,
//! occupant management and broadcast emission. Each area kind plugs in its
//! own payload through [`area::AreaKind`]:
//! - Listening areas share a song and a playing flag
//! - Viewing areas share a video, a playing flag and playback progress
//!
//! When the last occupant leaves an area its active content is cleared and
//! the new state is broadcast as part of the same call.
//!
//! ### Town (`town`)
//! The session: players, their locations, and the areas built from the
//! static layout. Player movement decides area membership.
//!
//! ### Emitter (`emitter`)
//! The broadcast boundary. Areas hand finished packets to a
//! [`emitter::TownEmitter`]; the network layer decides how they reach
//! clients.
//!
//! ### Client Manager (`client_manager`)
//! Connection tracking, id assignment, capacity limits and timeouts.
//!
//! ### Network (`network`)
//! UDP transport and the single-task event loop that serializes every town
//! mutation.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::layout::MapLayout;
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::default();
//!     let layout = MapLayout::load(std::path::Path::new("assets/town.json"))?;
//!
//!     let mut server = Server::new(&config, &layout).await?;
//!     server.run().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod area;
pub mod client_manager;
pub mod config;
pub mod emitter;
pub mod error;
pub mod layout;
pub mod listening_area;
pub mod network;
pub mod player;
pub mod town;
pub mod viewing_area;
