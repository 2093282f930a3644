//! Broadcast boundary between the town model and the transport layer
//!
//! Areas and the town never talk to sockets directly. They hand finished
//! packets to a [`TownEmitter`], which must dispatch them before returning so
//! that "state changed" always implies "everyone has been told".

use crate::network::GameMessage;
use log::error;
use shared::{InteractableModel, Packet, PlayerModel};
use std::sync::Mutex;
use tokio::sync::mpsc;

/// Sink for server-to-all-clients broadcasts
pub trait TownEmitter: Send + Sync {
    fn emit(&self, packet: Packet);

    fn player_moved(&self, player: PlayerModel) {
        self.emit(Packet::PlayerMoved(player));
    }

    fn interactable_update(&self, area: InteractableModel) {
        self.emit(Packet::InteractableUpdate(area));
    }
}

/// Emitter that queues broadcasts onto the network sender task
///
/// A single unbounded channel drained by a single task keeps the order in
/// which clients observe broadcasts identical to the mutation order.
pub struct ChannelEmitter {
    game_tx: mpsc::UnboundedSender<GameMessage>,
}

impl ChannelEmitter {
    pub fn new(game_tx: mpsc::UnboundedSender<GameMessage>) -> Self {
        Self { game_tx }
    }
}

impl TownEmitter for ChannelEmitter {
    fn emit(&self, packet: Packet) {
        if let Err(e) = self.game_tx.send(GameMessage::BroadcastPacket { packet }) {
            error!("Failed to queue broadcast packet: {}", e);
        }
    }
}

/// Emitter that keeps every broadcast in memory, for tests and tooling
#[derive(Default)]
pub struct RecordingEmitter {
    packets: Mutex<Vec<Packet>>,
}

impl RecordingEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn packets(&self) -> Vec<Packet> {
        self.packets
            .lock()
            .map(|packets| packets.clone())
            .unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut packets) = self.packets.lock() {
            packets.clear();
        }
    }

    pub fn interactable_updates(&self) -> Vec<InteractableModel> {
        self.packets()
            .into_iter()
            .filter_map(|packet| match packet {
                Packet::InteractableUpdate(model) => Some(model),
                _ => None,
            })
            .collect()
    }

    pub fn player_moves(&self) -> Vec<PlayerModel> {
        self.packets()
            .into_iter()
            .filter_map(|packet| match packet {
                Packet::PlayerMoved(player) => Some(player),
                _ => None,
            })
            .collect()
    }

    pub fn last_interactable_update(&self) -> Option<InteractableModel> {
        self.interactable_updates().pop()
    }

    pub fn last_player_moved(&self) -> Option<PlayerModel> {
        self.player_moves().pop()
    }
}

impl TownEmitter for RecordingEmitter {
    fn emit(&self, packet: Packet) {
        if let Ok(mut packets) = self.packets.lock() {
            packets.push(packet);
        }
    }
}
