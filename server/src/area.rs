//! Authoritative interactable areas
//!
//! Every area kind shares one base: spatial bounds, an ordered occupant
//! set, and a broadcast emitter. Kind-specific state lives in an
//! [`AreaKind`] payload composed into [`InteractableArea`].
//!
//! Membership and payload changes are broadcast synchronously through the
//! emitter before the mutating call returns.

use crate::emitter::TownEmitter;
use crate::error::AreaError;
use crate::layout::MapObject;
use crate::player::Player;
use log::debug;
use shared::{BoundingBox, InteractableModel, PlayerLocation};
use std::sync::Arc;

/// Kind-specific payload of an interactable area
pub trait AreaKind {
    /// Wire representation of the whole area, id included
    type Model: Clone;

    const KIND_NAME: &'static str;

    fn to_model(&self, id: &str) -> Self::Model;

    /// Copies every mutable field from `model`; the model's id is never read
    fn apply_model(&mut self, model: &Self::Model);

    /// Resets the active content once the last occupant leaves
    fn clear_active_content(&mut self);

    fn wrap(model: Self::Model) -> InteractableModel;

    /// Extracts this kind's model, or `None` for another kind
    fn unwrap(model: &InteractableModel) -> Option<&Self::Model>;
}

pub struct InteractableArea<K: AreaKind> {
    id: String,
    bounding_box: BoundingBox,
    occupants: Vec<u32>,
    kind: K,
    emitter: Arc<dyn TownEmitter>,
}

impl<K: AreaKind> InteractableArea<K> {
    pub fn new(
        id: impl Into<String>,
        kind: K,
        bounding_box: BoundingBox,
        emitter: Arc<dyn TownEmitter>,
    ) -> Self {
        Self {
            id: id.into(),
            bounding_box,
            occupants: Vec::new(),
            kind,
            emitter,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn bounding_box(&self) -> BoundingBox {
        self.bounding_box
    }

    pub fn occupants_by_id(&self) -> &[u32] {
        &self.occupants
    }

    pub fn is_active(&self) -> bool {
        !self.occupants.is_empty()
    }

    pub fn kind(&self) -> &K {
        &self.kind
    }

    pub fn contains(&self, location: &PlayerLocation) -> bool {
        self.bounding_box.contains(location.x, location.y)
    }

    /// Adds a player to the occupant set and points their location at this area
    ///
    /// Adding a player that is already an occupant changes nothing and
    /// broadcasts nothing. Returns whether the player was added.
    pub fn add(&mut self, player: &mut Player) -> bool {
        if self.occupants.contains(&player.id) {
            return false;
        }

        self.occupants.push(player.id);
        player.location.interactable_id = Some(self.id.clone());
        debug!("Player {} entered {} {}", player.id, K::KIND_NAME, self.id);
        self.emitter.player_moved(player.to_model());
        true
    }

    /// Removes a player from the occupant set and clears their area id
    ///
    /// When this drains the area, the active content is cleared and the full
    /// area state is broadcast, even if the content was already empty.
    /// Returns whether the player was an occupant.
    pub fn remove(&mut self, player: &mut Player) -> bool {
        let Some(index) = self.occupants.iter().position(|id| *id == player.id) else {
            return false;
        };

        self.occupants.remove(index);
        player.location.interactable_id = None;
        debug!("Player {} left {} {}", player.id, K::KIND_NAME, self.id);
        self.emitter.player_moved(player.to_model());

        if self.occupants.is_empty() {
            self.kind.clear_active_content();
            self.emit_area_changed();
        }
        true
    }

    /// Overwrites the payload from `model` and broadcasts the result
    ///
    /// The id carried by `model` is ignored.
    pub fn update_model(&mut self, model: &K::Model) {
        self.kind.apply_model(model);
        self.emit_area_changed();
    }

    /// Applies an update addressed through the generic wire type
    pub fn update_from_interactable(&mut self, model: &InteractableModel) -> Result<(), AreaError> {
        match K::unwrap(model) {
            Some(model) => {
                self.update_model(model);
                Ok(())
            }
            None => Err(AreaError::invariant(
                &self.id,
                format!(
                    "{} update sent to a {}",
                    model.kind_name(),
                    K::KIND_NAME
                ),
            )),
        }
    }

    pub fn to_model(&self) -> K::Model {
        self.kind.to_model(&self.id)
    }

    pub fn to_interactable(&self) -> InteractableModel {
        K::wrap(self.to_model())
    }

    fn emit_area_changed(&self) {
        self.emitter.interactable_update(self.to_interactable());
    }
}

/// Builds the bounding box of a layout object, rejecting degenerate ones
pub fn bounding_box_from_map_object(object: &MapObject) -> Result<BoundingBox, AreaError> {
    let width = match object.width {
        Some(width) if width > 0.0 => width,
        Some(_) => return Err(AreaError::configuration(&object.name, "width must be positive")),
        None => return Err(AreaError::configuration(&object.name, "missing width")),
    };
    let height = match object.height {
        Some(height) if height > 0.0 => height,
        Some(_) => return Err(AreaError::configuration(&object.name, "height must be positive")),
        None => return Err(AreaError::configuration(&object.name, "missing height")),
    };

    Ok(BoundingBox::new(object.x, object.y, width, height))
}
