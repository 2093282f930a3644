//! Authoritative town session: players, areas and movement-driven membership

use crate::emitter::TownEmitter;
use crate::error::AreaError;
use crate::layout::{MapLayout, LISTENING_AREA_CLASS, VIEWING_AREA_CLASS};
use crate::listening_area::ListeningArea;
use crate::player::Player;
use crate::viewing_area::ViewingArea;
use log::{debug, info, warn};
use shared::{BoundingBox, InteractableModel, Packet, PlayerLocation, PlayerModel, TownSnapshot};
use std::collections::HashMap;
use std::sync::Arc;

/// Any area kind the town can host
pub enum Area {
    Listening(ListeningArea),
    Viewing(ViewingArea),
}

impl Area {
    pub fn id(&self) -> &str {
        match self {
            Area::Listening(area) => area.id(),
            Area::Viewing(area) => area.id(),
        }
    }

    pub fn bounding_box(&self) -> BoundingBox {
        match self {
            Area::Listening(area) => area.bounding_box(),
            Area::Viewing(area) => area.bounding_box(),
        }
    }

    pub fn occupants_by_id(&self) -> &[u32] {
        match self {
            Area::Listening(area) => area.occupants_by_id(),
            Area::Viewing(area) => area.occupants_by_id(),
        }
    }

    pub fn contains(&self, location: &PlayerLocation) -> bool {
        self.bounding_box().contains(location.x, location.y)
    }

    fn add(&mut self, player: &mut Player) -> bool {
        match self {
            Area::Listening(area) => area.add(player),
            Area::Viewing(area) => area.add(player),
        }
    }

    fn remove(&mut self, player: &mut Player) -> bool {
        match self {
            Area::Listening(area) => area.remove(player),
            Area::Viewing(area) => area.remove(player),
        }
    }

    fn update_from_interactable(&mut self, model: &InteractableModel) -> Result<(), AreaError> {
        match self {
            Area::Listening(area) => area.update_from_interactable(model),
            Area::Viewing(area) => area.update_from_interactable(model),
        }
    }

    pub fn to_model(&self) -> InteractableModel {
        match self {
            Area::Listening(area) => area.to_interactable(),
            Area::Viewing(area) => area.to_interactable(),
        }
    }
}

impl From<ListeningArea> for Area {
    fn from(area: ListeningArea) -> Self {
        Area::Listening(area)
    }
}

impl From<ViewingArea> for Area {
    fn from(area: ViewingArea) -> Self {
        Area::Viewing(area)
    }
}

pub struct Town {
    players: HashMap<u32, Player>,
    areas: Vec<Area>,
    spawn: (f32, f32),
    emitter: Arc<dyn TownEmitter>,
}

impl Town {
    pub fn new(spawn: (f32, f32), emitter: Arc<dyn TownEmitter>) -> Self {
        Self {
            players: HashMap::new(),
            areas: Vec::new(),
            spawn,
            emitter,
        }
    }

    /// Builds every area declared in the layout
    ///
    /// Fails on the first malformed area, on duplicate area names, and on
    /// overlapping areas. Hidden objects and objects of unknown class are
    /// skipped.
    pub fn from_layout(
        layout: &MapLayout,
        spawn: (f32, f32),
        emitter: Arc<dyn TownEmitter>,
    ) -> Result<Self, AreaError> {
        let mut town = Town::new(spawn, Arc::clone(&emitter));

        for object in &layout.objects {
            if !object.visible {
                debug!("Skipping hidden map object {}", object.name);
                continue;
            }

            let area: Area = match object.class.as_deref() {
                Some(LISTENING_AREA_CLASS) => {
                    ListeningArea::from_map_object(object, Arc::clone(&emitter))?.into()
                }
                Some(VIEWING_AREA_CLASS) => {
                    ViewingArea::from_map_object(object, Arc::clone(&emitter))?.into()
                }
                other => {
                    warn!(
                        "Skipping map object {} with unsupported class {:?}",
                        object.name, other
                    );
                    continue;
                }
            };
            town.add_area(area)?;
        }

        info!("Town built with {} areas", town.areas.len());
        Ok(town)
    }

    pub fn add_area(&mut self, area: Area) -> Result<(), AreaError> {
        if self.area(area.id()).is_some() {
            return Err(AreaError::configuration(area.id(), "duplicate area name"));
        }
        let rect = area.bounding_box();
        if let Some(existing) = self.areas.iter().find(|a| a.bounding_box().overlaps(&rect)) {
            return Err(AreaError::configuration(
                area.id(),
                format!("overlaps area {}", existing.id()),
            ));
        }

        self.areas.push(area);
        Ok(())
    }

    pub fn area(&self, id: &str) -> Option<&Area> {
        self.areas.iter().find(|area| area.id() == id)
    }

    pub fn areas(&self) -> &[Area] {
        &self.areas
    }

    pub fn player(&self, id: u32) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Places a new player at the spawn point and announces them
    pub fn add_player(&mut self, id: u32, user_name: &str) -> PlayerModel {
        let (x, y) = self.spawn;
        let mut player = Player::new(id, user_name, x, y);

        info!("Added player {} ({}) at ({}, {})", id, user_name, x, y);
        self.emitter.emit(Packet::PlayerJoined(player.to_model()));

        // Spawning inside an area makes the player an occupant straight away
        if let Some(index) = self.area_index_at(x, y) {
            self.areas[index].add(&mut player);
        }

        let model = player.to_model();
        self.players.insert(id, player);
        model
    }

    /// Removes a player, draining their area if they were its last occupant
    pub fn remove_player(&mut self, id: &u32) -> bool {
        let Some(mut player) = self.players.remove(id) else {
            return false;
        };

        if let Some(index) = self.current_area_index(&player) {
            self.areas[index].remove(&mut player);
        }

        self.emitter.emit(Packet::PlayerDisconnected { player_id: *id });
        info!("Removed player {}", id);
        true
    }

    /// Moves a player and reconciles area membership
    ///
    /// Leaving an area is resolved before entering the next one. Returns
    /// false for an unknown player.
    pub fn move_player(&mut self, id: u32, x: f32, y: f32) -> bool {
        let Some(player) = self.players.get_mut(&id) else {
            return false;
        };

        player.location.x = x;
        player.location.y = y;

        let current = player
            .location
            .interactable_id
            .as_deref()
            .and_then(|area_id| self.areas.iter().position(|a| a.id() == area_id));
        let target = self.areas.iter().position(|a| a.contains(&player.location));

        if current == target {
            self.emitter.player_moved(player.to_model());
            return true;
        }

        if let Some(index) = current {
            self.areas[index].remove(player);
        }
        if let Some(index) = target {
            self.areas[index].add(player);
        }
        true
    }

    /// Routes an update request to the area it names
    pub fn apply_interactable_update(&mut self, model: &InteractableModel) -> Result<(), AreaError> {
        let area = self
            .areas
            .iter_mut()
            .find(|area| area.id() == model.id())
            .ok_or_else(|| AreaError::invariant(model.id(), "no such area"))?;

        area.update_from_interactable(model)
    }

    pub fn snapshot(&self) -> TownSnapshot {
        let mut players: Vec<PlayerModel> = self.players.values().map(Player::to_model).collect();
        players.sort_by_key(|player| player.id);

        TownSnapshot {
            players,
            interactables: self.areas.iter().map(Area::to_model).collect(),
        }
    }

    fn area_index_at(&self, x: f32, y: f32) -> Option<usize> {
        self.areas
            .iter()
            .position(|area| area.bounding_box().contains(x, y))
    }

    fn current_area_index(&self, player: &Player) -> Option<usize> {
        let area_id = player.location.interactable_id.as_deref()?;
        self.areas.iter().position(|area| area.id() == area_id)
    }
}
