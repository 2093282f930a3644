use crate::events::{Event, EventEmitter, ListenerId};
use shared::ViewingAreaModel;

#[derive(Debug, Clone, PartialEq)]
pub enum ViewingAreaEvent {
    PlaybackChange(bool),
    /// Playback position in seconds, from scrubbing or natural progress
    ProgressChange(f64),
    VideoChange(Option<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewingAreaEventKind {
    PlaybackChange,
    ProgressChange,
    VideoChange,
}

impl Event for ViewingAreaEvent {
    type Kind = ViewingAreaEventKind;

    fn kind(&self) -> ViewingAreaEventKind {
        match self {
            ViewingAreaEvent::PlaybackChange(_) => ViewingAreaEventKind::PlaybackChange,
            ViewingAreaEvent::ProgressChange(_) => ViewingAreaEventKind::ProgressChange,
            ViewingAreaEvent::VideoChange(_) => ViewingAreaEventKind::VideoChange,
        }
    }
}

/// Client-side mirror of one viewing area
pub struct ViewingAreaController {
    model: ViewingAreaModel,
    events: EventEmitter<ViewingAreaEvent>,
}

impl ViewingAreaController {
    pub fn new(model: ViewingAreaModel) -> Self {
        Self {
            model,
            events: EventEmitter::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.model.id
    }

    pub fn video(&self) -> Option<&str> {
        self.model.video.as_deref()
    }

    pub fn set_video(&mut self, video: Option<String>) -> bool {
        if self.model.video == video {
            return false;
        }
        self.model.video = video.clone();
        self.events.emit(&ViewingAreaEvent::VideoChange(video));
        true
    }

    pub fn is_playing(&self) -> bool {
        self.model.is_playing
    }

    pub fn set_is_playing(&mut self, is_playing: bool) -> bool {
        if self.model.is_playing == is_playing {
            return false;
        }
        self.model.is_playing = is_playing;
        self.events.emit(&ViewingAreaEvent::PlaybackChange(is_playing));
        true
    }

    pub fn elapsed_time_sec(&self) -> f64 {
        self.model.elapsed_time_sec
    }

    pub fn set_elapsed_time_sec(&mut self, elapsed_time_sec: f64) -> bool {
        // Bitwise so that a NaN position compares equal to itself
        if self.model.elapsed_time_sec.to_bits() == elapsed_time_sec.to_bits() {
            return false;
        }
        self.model.elapsed_time_sec = elapsed_time_sec;
        self.events
            .emit(&ViewingAreaEvent::ProgressChange(elapsed_time_sec));
        true
    }

    pub fn to_model(&self) -> ViewingAreaModel {
        self.model.clone()
    }

    /// Applies every mutable field of `model`, leaving the id untouched
    pub fn update_from(&mut self, model: &ViewingAreaModel) {
        self.set_is_playing(model.is_playing);
        self.set_elapsed_time_sec(model.elapsed_time_sec);
        self.set_video(model.video.clone());
    }

    pub fn add_listener(
        &self,
        kind: ViewingAreaEventKind,
        listener: impl FnMut(&ViewingAreaEvent) + 'static,
    ) -> ListenerId {
        self.events.add_listener(kind, listener)
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.events.remove_listener(id)
    }

    pub fn events(&self) -> &EventEmitter<ViewingAreaEvent> {
        &self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn test_model() -> ViewingAreaModel {
        ViewingAreaModel {
            id: "viewing-2".to_string(),
            video: Some("https://youtu.be/aqz-KE-bpKQ".to_string()),
            is_playing: false,
            elapsed_time_sec: 10.0,
        }
    }

    fn recorded(controller: &ViewingAreaController) -> Rc<RefCell<Vec<ViewingAreaEvent>>> {
        let received = Rc::new(RefCell::new(Vec::new()));
        for kind in [
            ViewingAreaEventKind::PlaybackChange,
            ViewingAreaEventKind::ProgressChange,
            ViewingAreaEventKind::VideoChange,
        ] {
            let sink = Rc::clone(&received);
            controller.add_listener(kind, move |event| sink.borrow_mut().push(event.clone()));
        }
        received
    }

    #[test]
    fn test_progress_change() {
        let mut controller = ViewingAreaController::new(test_model());
        let received = recorded(&controller);

        assert!(!controller.set_elapsed_time_sec(10.0));
        assert!(controller.set_elapsed_time_sec(11.5));
        assert_approx_eq!(controller.elapsed_time_sec(), 11.5);
        assert_eq!(
            *received.borrow(),
            vec![ViewingAreaEvent::ProgressChange(11.5)]
        );
    }

    #[test]
    fn test_nan_echo_is_silent() {
        let mut model = test_model();
        model.elapsed_time_sec = f64::NAN;
        let mut controller = ViewingAreaController::new(model);
        let received = recorded(&controller);

        let echo = controller.to_model();
        controller.update_from(&echo);
        controller.update_from(&echo);

        assert!(!controller.set_elapsed_time_sec(f64::NAN));
        assert!(received.borrow().is_empty());
    }

    #[test]
    fn test_update_from_ignores_id_and_emits_changes_only() {
        let mut controller = ViewingAreaController::new(test_model());
        let received = recorded(&controller);

        let mut update = test_model();
        update.id = "other".to_string();
        update.is_playing = true;
        controller.update_from(&update);

        assert_eq!(controller.id(), "viewing-2");
        assert!(controller.is_playing());
        assert_eq!(
            *received.borrow(),
            vec![ViewingAreaEvent::PlaybackChange(true)]
        );
    }

    #[test]
    fn test_video_cleared_by_server() {
        let mut controller = ViewingAreaController::new(test_model());
        let received = recorded(&controller);

        let mut update = test_model();
        update.video = None;
        controller.update_from(&update);

        assert!(controller.video().is_none());
        assert_eq!(*received.borrow(), vec![ViewingAreaEvent::VideoChange(None)]);
    }
}
