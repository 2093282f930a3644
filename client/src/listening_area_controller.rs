use crate::events::{Event, EventEmitter, ListenerId};
use shared::ListeningAreaModel;

/// Notifications raised by a [`ListeningAreaController`]
#[derive(Debug, Clone, PartialEq)]
pub enum ListeningAreaEvent {
    /// The playing/paused state changed; carries the new state
    PlaybackChange(bool),
    /// The selected song changed; carries the new song, if any
    SongChange(Option<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListeningAreaEventKind {
    PlaybackChange,
    SongChange,
}

impl Event for ListeningAreaEvent {
    type Kind = ListeningAreaEventKind;

    fn kind(&self) -> ListeningAreaEventKind {
        match self {
            ListeningAreaEvent::PlaybackChange(_) => ListeningAreaEventKind::PlaybackChange,
            ListeningAreaEvent::SongChange(_) => ListeningAreaEventKind::SongChange,
        }
    }
}

/// Client-side mirror of one listening area
///
/// Setters store a value and notify listeners only when it differs from
/// the current one. Server broadcasts are applied through the same setters
/// with [`update_from`](Self::update_from), so an echo of a local edit is
/// silent. The controller holds no authority: it can be rebuilt at any time
/// from the next broadcast or snapshot.
pub struct ListeningAreaController {
    model: ListeningAreaModel,
    events: EventEmitter<ListeningAreaEvent>,
}

impl ListeningAreaController {
    pub fn new(model: ListeningAreaModel) -> Self {
        Self {
            model,
            events: EventEmitter::new(),
        }
    }

    /// Fixed for the lifetime of the controller
    pub fn id(&self) -> &str {
        &self.model.id
    }

    pub fn song(&self) -> Option<&str> {
        self.model.song.as_deref()
    }

    /// Returns whether the song changed
    pub fn set_song(&mut self, song: Option<String>) -> bool {
        if self.model.song == song {
            return false;
        }
        self.model.song = song.clone();
        self.events.emit(&ListeningAreaEvent::SongChange(song));
        true
    }

    pub fn is_playing(&self) -> bool {
        self.model.is_playing
    }

    /// Returns whether the playback state changed
    pub fn set_is_playing(&mut self, is_playing: bool) -> bool {
        if self.model.is_playing == is_playing {
            return false;
        }
        self.model.is_playing = is_playing;
        self.events
            .emit(&ListeningAreaEvent::PlaybackChange(is_playing));
        true
    }

    pub fn to_model(&self) -> ListeningAreaModel {
        self.model.clone()
    }

    /// Applies every mutable field of `model`, leaving the id untouched
    pub fn update_from(&mut self, model: &ListeningAreaModel) {
        self.set_is_playing(model.is_playing);
        self.set_song(model.song.clone());
    }

    pub fn add_listener(
        &self,
        kind: ListeningAreaEventKind,
        listener: impl FnMut(&ListeningAreaEvent) + 'static,
    ) -> ListenerId {
        self.events.add_listener(kind, listener)
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.events.remove_listener(id)
    }

    pub fn events(&self) -> &EventEmitter<ListeningAreaEvent> {
        &self.events
    }
}
