use shared::{PlayerLocation, PlayerModel};

/// Server-side participant record
///
/// `location.interactable_id` is owned by the player but written only by
/// area membership changes.
#[derive(Debug, Clone)]
pub struct Player {
    pub id: u32,
    pub user_name: String,
    pub location: PlayerLocation,
}

impl Player {
    pub fn new(id: u32, user_name: impl Into<String>, x: f32, y: f32) -> Self {
        Self {
            id,
            user_name: user_name.into(),
            location: PlayerLocation::new(x, y),
        }
    }

    pub fn to_model(&self) -> PlayerModel {
        PlayerModel {
            id: self.id,
            user_name: self.user_name.clone(),
            location: self.location.clone(),
        }
    }
}
