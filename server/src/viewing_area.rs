use crate::area::{bounding_box_from_map_object, AreaKind, InteractableArea};
use crate::emitter::TownEmitter;
use crate::error::AreaError;
use crate::layout::MapObject;
use shared::{BoundingBox, InteractableModel, ViewingAreaModel};
use std::sync::Arc;

/// Shared video playback with a progress marker
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Viewing {
    pub video: Option<String>,
    pub is_playing: bool,
    pub elapsed_time_sec: f64,
}

impl AreaKind for Viewing {
    type Model = ViewingAreaModel;

    const KIND_NAME: &'static str = "ViewingArea";

    fn to_model(&self, id: &str) -> ViewingAreaModel {
        ViewingAreaModel {
            id: id.to_string(),
            video: self.video.clone(),
            is_playing: self.is_playing,
            elapsed_time_sec: self.elapsed_time_sec,
        }
    }

    fn apply_model(&mut self, model: &ViewingAreaModel) {
        self.video = model.video.clone();
        self.is_playing = model.is_playing;
        self.elapsed_time_sec = model.elapsed_time_sec;
    }

    fn clear_active_content(&mut self) {
        self.video = None;
    }

    fn wrap(model: ViewingAreaModel) -> InteractableModel {
        InteractableModel::Viewing(model)
    }

    fn unwrap(model: &InteractableModel) -> Option<&ViewingAreaModel> {
        match model {
            InteractableModel::Viewing(model) => Some(model),
            _ => None,
        }
    }
}

pub type ViewingArea = InteractableArea<Viewing>;

impl InteractableArea<Viewing> {
    pub fn from_model(
        model: &ViewingAreaModel,
        bounding_box: BoundingBox,
        emitter: Arc<dyn TownEmitter>,
    ) -> Self {
        let kind = Viewing {
            video: model.video.clone(),
            is_playing: model.is_playing,
            elapsed_time_sec: model.elapsed_time_sec,
        };
        InteractableArea::new(model.id.clone(), kind, bounding_box, emitter)
    }

    pub fn from_map_object(
        object: &MapObject,
        emitter: Arc<dyn TownEmitter>,
    ) -> Result<Self, AreaError> {
        let rect = bounding_box_from_map_object(object)?;
        Ok(InteractableArea::new(
            object.name.clone(),
            Viewing::default(),
            rect,
            emitter,
        ))
    }

    pub fn video(&self) -> Option<&str> {
        self.kind().video.as_deref()
    }

    pub fn is_playing(&self) -> bool {
        self.kind().is_playing
    }

    pub fn elapsed_time_sec(&self) -> f64 {
        self.kind().elapsed_time_sec
    }
}
