//! Client-side mirror of the town
//!
//! Holds one controller per area and the last known location of every
//! player. Incoming broadcasts are reconciled into the controllers, and
//! local edits are applied optimistically before the matching update
//! request is handed back for sending.

use crate::input::{Command, CommandError};
use crate::listening_area_controller::ListeningAreaController;
use crate::viewing_area_controller::ViewingAreaController;
use log::{debug, warn};
use shared::{InteractableModel, Packet, PlayerModel, TownSnapshot};
use std::collections::BTreeMap;

pub enum AreaController {
    Listening(ListeningAreaController),
    Viewing(ViewingAreaController),
}

impl AreaController {
    pub fn from_model(model: InteractableModel) -> Self {
        match model {
            InteractableModel::Listening(model) => {
                AreaController::Listening(ListeningAreaController::new(model))
            }
            InteractableModel::Viewing(model) => {
                AreaController::Viewing(ViewingAreaController::new(model))
            }
        }
    }

    pub fn id(&self) -> &str {
        match self {
            AreaController::Listening(controller) => controller.id(),
            AreaController::Viewing(controller) => controller.id(),
        }
    }

    pub fn to_model(&self) -> InteractableModel {
        match self {
            AreaController::Listening(controller) => {
                InteractableModel::Listening(controller.to_model())
            }
            AreaController::Viewing(controller) => InteractableModel::Viewing(controller.to_model()),
        }
    }

    /// Reconciles a broadcast; returns false if it is for another area kind
    pub fn update_from(&mut self, model: &InteractableModel) -> bool {
        match (self, model) {
            (AreaController::Listening(controller), InteractableModel::Listening(model)) => {
                controller.update_from(model);
                true
            }
            (AreaController::Viewing(controller), InteractableModel::Viewing(model)) => {
                controller.update_from(model);
                true
            }
            _ => false,
        }
    }

    pub fn set_is_playing(&mut self, is_playing: bool) -> bool {
        match self {
            AreaController::Listening(controller) => controller.set_is_playing(is_playing),
            AreaController::Viewing(controller) => controller.set_is_playing(is_playing),
        }
    }
}

pub struct TownController {
    our_player_id: u32,
    players: BTreeMap<u32, PlayerModel>,
    areas: Vec<AreaController>,
}

impl TownController {
    pub fn from_snapshot(our_player_id: u32, snapshot: TownSnapshot) -> Self {
        Self {
            our_player_id,
            players: snapshot
                .players
                .into_iter()
                .map(|player| (player.id, player))
                .collect(),
            areas: snapshot
                .interactables
                .into_iter()
                .map(AreaController::from_model)
                .collect(),
        }
    }

    pub fn our_player_id(&self) -> u32 {
        self.our_player_id
    }

    pub fn our_player(&self) -> Option<&PlayerModel> {
        self.players.get(&self.our_player_id)
    }

    pub fn players(&self) -> impl Iterator<Item = &PlayerModel> {
        self.players.values()
    }

    pub fn areas(&self) -> &[AreaController] {
        &self.areas
    }

    pub fn area(&self, id: &str) -> Option<&AreaController> {
        self.areas.iter().find(|area| area.id() == id)
    }

    pub fn area_mut(&mut self, id: &str) -> Option<&mut AreaController> {
        self.areas.iter_mut().find(|area| area.id() == id)
    }

    pub fn listening_area_mut(&mut self, id: &str) -> Option<&mut ListeningAreaController> {
        match self.area_mut(id) {
            Some(AreaController::Listening(controller)) => Some(controller),
            _ => None,
        }
    }

    pub fn viewing_area_mut(&mut self, id: &str) -> Option<&mut ViewingAreaController> {
        match self.area_mut(id) {
            Some(AreaController::Viewing(controller)) => Some(controller),
            _ => None,
        }
    }

    /// Applies one server packet to the local mirror
    pub fn apply_packet(&mut self, packet: &Packet) {
        match packet {
            Packet::InteractableUpdate(model) => match self.area_mut(model.id()) {
                Some(area) => {
                    if !area.update_from(model) {
                        warn!("Ignoring {} update for area {}", model.kind_name(), model.id());
                    }
                }
                None => warn!("Update for unknown area {}", model.id()),
            },
            Packet::PlayerJoined(player) | Packet::PlayerMoved(player) => {
                self.players.insert(player.id, player.clone());
            }
            Packet::PlayerDisconnected { player_id } => {
                self.players.remove(player_id);
            }
            Packet::UpdateRejected { area_id, reason } => {
                warn!("Server rejected update to {}: {}", area_id, reason);
            }
            other => debug!("Town mirror ignores {:?}", other),
        }
    }

    /// Applies a command locally and returns the request to send, if any
    ///
    /// Edits that leave the local value unchanged produce no request.
    pub fn apply_command(&mut self, command: &Command) -> Result<Option<Packet>, CommandError> {
        match command {
            Command::Move { x, y } => Ok(Some(Packet::Move { x: *x, y: *y })),
            Command::SetSong { area_id, song } => {
                let controller = match self.area_mut(area_id) {
                    Some(AreaController::Listening(controller)) => controller,
                    Some(_) => return Err(wrong_kind(area_id, "listening area")),
                    None => return Err(CommandError::UnknownArea(area_id.to_string())),
                };
                let changed = controller.set_song(song.clone());
                Ok(changed.then(|| update_request(controller.to_model().into())))
            }
            Command::SetVideo { area_id, video } => {
                let controller = match self.area_mut(area_id) {
                    Some(AreaController::Viewing(controller)) => controller,
                    Some(_) => return Err(wrong_kind(area_id, "viewing area")),
                    None => return Err(CommandError::UnknownArea(area_id.to_string())),
                };
                let changed = controller.set_video(video.clone());
                Ok(changed.then(|| update_request(controller.to_model().into())))
            }
            Command::Seek {
                area_id,
                elapsed_time_sec,
            } => {
                let controller = match self.area_mut(area_id) {
                    Some(AreaController::Viewing(controller)) => controller,
                    Some(_) => return Err(wrong_kind(area_id, "viewing area")),
                    None => return Err(CommandError::UnknownArea(area_id.to_string())),
                };
                let changed = controller.set_elapsed_time_sec(*elapsed_time_sec);
                Ok(changed.then(|| update_request(controller.to_model().into())))
            }
            Command::Play { area_id } => self.set_playing(area_id, true),
            Command::Pause { area_id } => self.set_playing(area_id, false),
            Command::Who | Command::Areas | Command::Help | Command::Quit => Ok(None),
        }
    }

    fn set_playing(&mut self, area_id: &str, is_playing: bool) -> Result<Option<Packet>, CommandError> {
        let area = self
            .area_mut(area_id)
            .ok_or_else(|| CommandError::UnknownArea(area_id.to_string()))?;
        let changed = area.set_is_playing(is_playing);
        Ok(changed.then(|| update_request(area.to_model())))
    }
}

fn update_request(model: InteractableModel) -> Packet {
    Packet::InteractableUpdate(model)
}

fn wrong_kind(area_id: &str, expected: &'static str) -> CommandError {
    CommandError::WrongKind {
        area_id: area_id.to_string(),
        expected,
    }
}
