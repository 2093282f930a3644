use crate::area::{bounding_box_from_map_object, AreaKind, InteractableArea};
use crate::emitter::TownEmitter;
use crate::error::AreaError;
use crate::layout::MapObject;
use shared::{BoundingBox, InteractableModel, ListeningAreaModel};
use std::sync::Arc;

/// Shared music playback: a song reference and a playing flag
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Listening {
    pub song: Option<String>,
    pub is_playing: bool,
}

impl AreaKind for Listening {
    type Model = ListeningAreaModel;

    const KIND_NAME: &'static str = "ListeningArea";

    fn to_model(&self, id: &str) -> ListeningAreaModel {
        ListeningAreaModel {
            id: id.to_string(),
            song: self.song.clone(),
            is_playing: self.is_playing,
        }
    }

    fn apply_model(&mut self, model: &ListeningAreaModel) {
        self.song = model.song.clone();
        self.is_playing = model.is_playing;
    }

    fn clear_active_content(&mut self) {
        self.song = None;
    }

    fn wrap(model: ListeningAreaModel) -> InteractableModel {
        InteractableModel::Listening(model)
    }

    fn unwrap(model: &InteractableModel) -> Option<&ListeningAreaModel> {
        match model {
            InteractableModel::Listening(model) => Some(model),
            _ => None,
        }
    }
}

pub type ListeningArea = InteractableArea<Listening>;

impl InteractableArea<Listening> {
    /// Creates a listening area from its starting model
    pub fn from_model(
        model: &ListeningAreaModel,
        bounding_box: BoundingBox,
        emitter: Arc<dyn TownEmitter>,
    ) -> Self {
        let kind = Listening {
            song: model.song.clone(),
            is_playing: model.is_playing,
        };
        InteractableArea::new(model.id.clone(), kind, bounding_box, emitter)
    }

    /// Creates an empty, paused listening area from a layout rectangle
    pub fn from_map_object(
        object: &MapObject,
        emitter: Arc<dyn TownEmitter>,
    ) -> Result<Self, AreaError> {
        let rect = bounding_box_from_map_object(object)?;
        Ok(InteractableArea::new(
            object.name.clone(),
            Listening::default(),
            rect,
            emitter,
        ))
    }

    pub fn song(&self) -> Option<&str> {
        self.kind().song.as_deref()
    }

    pub fn is_playing(&self) -> bool {
        self.kind().is_playing
    }
}
