use serde::{Deserialize, Serialize};

pub const PROTOCOL_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum Packet {
    Connect {
        client_version: u32,
        user_name: String,
    },
    Move {
        x: f32,
        y: f32,
    },
    /// Update request from a client, or the canonical broadcast from the server
    InteractableUpdate(InteractableModel),
    Heartbeat,
    Disconnect,

    Connected {
        player_id: u32,
        snapshot: TownSnapshot,
    },
    PlayerJoined(PlayerModel),
    PlayerMoved(PlayerModel),
    PlayerDisconnected {
        player_id: u32,
    },
    UpdateRejected {
        area_id: String,
        reason: String,
    },
    Disconnected {
        reason: String,
    },
}

/// Axis-aligned rectangle, origin at the top-left corner
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn get_bounds(&self) -> (f32, f32, f32, f32) {
        (self.x, self.y, self.x + self.width, self.y + self.height)
    }

    /// Half-open on the far edges so adjacent areas never share a point
    pub fn contains(&self, x: f32, y: f32) -> bool {
        let (x1, y1, x2, y2) = self.get_bounds();
        x >= x1 && x < x2 && y >= y1 && y < y2
    }

    pub fn overlaps(&self, other: &BoundingBox) -> bool {
        let (x1, y1, x2, y2) = self.get_bounds();
        let (x3, y3, x4, y4) = other.get_bounds();

        !(x2 <= x3 || x4 <= x1 || y2 <= y3 || y4 <= y1)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PlayerLocation {
    pub x: f32,
    pub y: f32,
    /// Id of the area the player currently occupies, if any
    pub interactable_id: Option<String>,
}

impl PlayerLocation {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            interactable_id: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PlayerModel {
    pub id: u32,
    pub user_name: String,
    pub location: PlayerLocation,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ListeningAreaModel {
    pub id: String,
    pub song: Option<String>,
    pub is_playing: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ViewingAreaModel {
    pub id: String,
    pub video: Option<String>,
    pub is_playing: bool,
    pub elapsed_time_sec: f64,
}

/// Canonical wire representation of any area's state
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum InteractableModel {
    Listening(ListeningAreaModel),
    Viewing(ViewingAreaModel),
}

impl InteractableModel {
    pub fn id(&self) -> &str {
        match self {
            InteractableModel::Listening(model) => &model.id,
            InteractableModel::Viewing(model) => &model.id,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            InteractableModel::Listening(_) => "ListeningArea",
            InteractableModel::Viewing(_) => "ViewingArea",
        }
    }
}

impl From<ListeningAreaModel> for InteractableModel {
    fn from(model: ListeningAreaModel) -> Self {
        InteractableModel::Listening(model)
    }
}

impl From<ViewingAreaModel> for InteractableModel {
    fn from(model: ViewingAreaModel) -> Self {
        InteractableModel::Viewing(model)
    }
}

/// Full town state handed to a client when it connects
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct TownSnapshot {
    pub players: Vec<PlayerModel>,
    pub interactables: Vec<InteractableModel>,
}
