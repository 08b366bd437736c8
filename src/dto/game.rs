use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{dto::validation::validate_uid, state::Identity};

/// Payload starting (or restarting) a session.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema, Validate)]
#[serde(default)]
pub struct StartGameRequest {
    /// Signed-in player, omitted for guests.
    #[validate(nested)]
    pub player: Option<PlayerInput>,
}

/// Identity of a signed-in player as resolved by the authentication layer.
#[derive(Debug, Serialize, Deserialize, ToSchema, Validate)]
pub struct PlayerInput {
    /// Account identifier, key of the player's score document.
    #[validate(custom(function = "validate_uid"))]
    pub uid: String,
    /// Contact address, shown as the username when present.
    #[validate(email)]
    pub email: Option<String>,
}

impl From<StartGameRequest> for Identity {
    fn from(value: StartGameRequest) -> Self {
        match value.player {
            Some(player) => Identity::Authenticated {
                uid: player.uid,
                email: player.email,
            },
            None => Identity::Guest,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_body_starts_a_guest_session() {
        let request: StartGameRequest = serde_json::from_str("{}").unwrap();
        assert!(request.validate().is_ok());
        assert_eq!(Identity::from(request), Identity::Guest);
    }

    #[test]
    fn player_is_validated() {
        let request: StartGameRequest = serde_json::from_str(
            r#"{ "player": { "uid": "abc123", "email": "not-an-email" } }"#,
        )
        .unwrap();
        assert!(request.validate().is_err());

        let request: StartGameRequest = serde_json::from_str(
            r#"{ "player": { "uid": "abc123", "email": "ana@example.com" } }"#,
        )
        .unwrap();
        assert!(request.validate().is_ok());
        assert_eq!(
            Identity::from(request),
            Identity::Authenticated {
                uid: "abc123".into(),
                email: Some("ana@example.com".into()),
            }
        );
    }
}
