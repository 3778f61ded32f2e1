//! Binds arena rules to a room actor.

use serde::{Deserialize, Serialize};
use skirmish_protocol::{Recipient, SessionId};
use skirmish_room::{Outbox, RoomConfig, RoomLogic};

use crate::config::ArenaOptions;
use crate::error::ArenaError;
use crate::player::{JoinOptions, MoveDelta};
use crate::point::Point;
use crate::resolver::DamageOutcome;
use crate::state::{ArenaSnapshot, ArenaState};

/// Payload of the greeting every joiner receives.
pub const GREETING: &str = "world";

/// A client action, as `{"type": <name>, "data": <payload>}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum Action {
    Move(MoveDelta),
    Weapon { weapon: u32 },
    /// Opaque to the server; relayed to everyone else as-is.
    Shoot(serde_json::Value),
    Damage { id: SessionId, value: i64 },
    Collect { id: u64 },
    GameOver { id: SessionId, parts: Vec<Point> },
}

/// A server notification, same envelope shape as [`Action`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ArenaEvent {
    Hello(String),
    Respawn { x: f32, z: f32, id: SessionId },
    Shoot(serde_json::Value),
}

/// The arena game.
#[derive(Debug)]
pub struct Arena;

impl RoomLogic for Arena {
    type Options = ArenaOptions;
    type JoinOptions = JoinOptions;
    type State = ArenaState;
    type Snapshot = ArenaSnapshot;
    type ClientMessage = Action;
    type ServerMessage = ArenaEvent;
    type Error = ArenaError;

    fn create(options: &ArenaOptions) -> Result<ArenaState, ArenaError> {
        ArenaState::new(options)
    }

    fn on_join(
        state: &mut ArenaState,
        session: SessionId,
        options: JoinOptions,
    ) -> Outbox<ArenaEvent> {
        state.join(session, options);
        vec![(
            Recipient::Session(session),
            ArenaEvent::Hello(GREETING.to_string()),
        )]
    }

    fn on_message(state: &mut ArenaState, sender: SessionId, msg: Action) -> Outbox<ArenaEvent> {
        match msg {
            Action::Move(delta) => {
                state.move_player(sender, &delta);
                Vec::new()
            }
            Action::Weapon { weapon } => {
                state.equip_weapon(sender, weapon);
                Vec::new()
            }
            Action::Shoot(payload) => {
                vec![(Recipient::AllExcept(sender), ArenaEvent::Shoot(payload))]
            }
            Action::Damage { id, value } => match state.apply_damage(id, value) {
                DamageOutcome::Respawned { at } => vec![(
                    Recipient::Session(id),
                    ArenaEvent::Respawn {
                        x: at.x,
                        z: at.z,
                        id,
                    },
                )],
                DamageOutcome::Wounded { .. } | DamageOutcome::Missed => Vec::new(),
            },
            Action::Collect { id } => {
                state.collect_apple(sender, id);
                Vec::new()
            }
            Action::GameOver { id, parts } => {
                state.game_over(id, &parts);
                Vec::new()
            }
        }
    }

    fn on_leave(state: &mut ArenaState, session: SessionId) -> Outbox<ArenaEvent> {
        state.leave(session);
        Vec::new()
    }

    fn snapshot(state: &ArenaState) -> ArenaSnapshot {
        state.snapshot()
    }

    fn validate_message(_state: &ArenaState, _sender: SessionId, msg: &Action) -> Result<(), String> {
        match msg {
            Action::Move(delta) if !delta.is_finite() => Err("move values must be finite".into()),
            Action::GameOver { parts, .. } if parts.iter().any(|p| !p.is_finite()) => {
                Err("drop positions must be finite".into())
            }
            _ => Ok(()),
        }
    }

    fn room_config(options: &ArenaOptions) -> RoomConfig {
        options.room_config()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn state() -> ArenaState {
        Arena::create(&ArenaOptions {
            seed: Some(3),
            ..ArenaOptions::default()
        })
        .unwrap()
    }

    fn join(state: &mut ArenaState, id: u64) -> Outbox<ArenaEvent> {
        Arena::on_join(
            state,
            SessionId(id),
            JoinOptions {
                speed: 2.0,
                ..JoinOptions::default()
            },
        )
    }

    #[test]
    fn test_join_greets_only_joiner() {
        let mut state = state();
        let out = join(&mut state, 1);

        assert_eq!(
            out,
            vec![(
                Recipient::Session(SessionId(1)),
                ArenaEvent::Hello("world".into())
            )]
        );
        assert!(state.players().contains(SessionId(1)));
    }

    #[test]
    fn test_shoot_relays_to_others() {
        let mut state = state();
        join(&mut state, 1);
        let before = state.snapshot();

        let payload = json!({"dir": [0, 1], "weapon": 2});
        let out = Arena::on_message(&mut state, SessionId(1), Action::Shoot(payload.clone()));

        assert_eq!(
            out,
            vec![(
                Recipient::AllExcept(SessionId(1)),
                ArenaEvent::Shoot(payload)
            )]
        );
        assert_eq!(state.snapshot(), before);
    }

    #[test]
    fn test_lethal_damage_notifies_target() {
        let mut state = state();
        join(&mut state, 1);
        join(&mut state, 2);

        let out = Arena::on_message(
            &mut state,
            SessionId(1),
            Action::Damage {
                id: SessionId(2),
                value: 101,
            },
        );

        assert_eq!(out.len(), 1);
        let (recipient, event) = &out[0];
        assert_eq!(recipient, &Recipient::Session(SessionId(2)));
        let ArenaEvent::Respawn { x, z, id } = event else {
            panic!("expected respawn, got {event:?}");
        };
        assert_eq!(*id, SessionId(2));
        let pos = state.players().get(SessionId(2)).unwrap().position();
        assert_eq!((pos.x, pos.z), (*x, *z));
    }

    #[test]
    fn test_wound_sends_nothing() {
        let mut state = state();
        join(&mut state, 1);

        let out = Arena::on_message(
            &mut state,
            SessionId(2),
            Action::Damage {
                id: SessionId(1),
                value: 10,
            },
        );

        assert!(out.is_empty());
        assert_eq!(state.players().get(SessionId(1)).unwrap().current_health(), 90);
    }

    #[test]
    fn test_leave_removes_player() {
        let mut state = state();
        join(&mut state, 1);

        assert!(Arena::on_leave(&mut state, SessionId(1)).is_empty());
        assert!(state.players().is_empty());
    }

    #[test]
    fn test_action_wire_format() {
        let action: Action =
            serde_json::from_value(json!({"type": "damage", "data": {"id": 4, "value": -2}}))
                .unwrap();
        assert_eq!(
            action,
            Action::Damage {
                id: SessionId(4),
                value: -2
            }
        );

        let action: Action = serde_json::from_value(json!({
            "type": "gameOver",
            "data": {"id": 4, "parts": [{"x": 1.0, "z": 2.0}]}
        }))
        .unwrap();
        assert!(matches!(action, Action::GameOver { parts, .. } if parts.len() == 1));

        let action: Action =
            serde_json::from_value(json!({"type": "move", "data": {"pX": 1, "pZ": 2}})).unwrap();
        assert_eq!(action, Action::Move(MoveDelta::to(1.0, 2.0)));
    }

    #[test]
    fn test_unknown_action_rejected() {
        let result: Result<Action, _> =
            serde_json::from_value(json!({"type": "teleport", "data": {}}));
        assert!(result.is_err());
    }

    #[test]
    fn test_event_wire_format() {
        let json = serde_json::to_value(ArenaEvent::Respawn {
            x: 3.0,
            z: -4.0,
            id: SessionId(9),
        })
        .unwrap();
        assert_eq!(json, json!({"type": "respawn", "data": {"x": 3.0, "z": -4.0, "id": 9}}));

        let json = serde_json::to_value(ArenaEvent::Hello(GREETING.into())).unwrap();
        assert_eq!(json, json!({"type": "hello", "data": "world"}));
    }

    #[test]
    fn test_validate_rejects_non_finite_positions() {
        let state = state();
        let bad = Action::Move(MoveDelta::to(f32::NAN, 0.0));
        assert!(Arena::validate_message(&state, SessionId(1), &bad).is_err());

        let ok = Action::Move(MoveDelta::to(1.0, 0.0));
        assert!(Arena::validate_message(&state, SessionId(1), &ok).is_ok());
    }

    #[test]
    fn test_validate_rejects_overflowing_move_fields() {
        let state = state();
        let action: Action = serde_json::from_value(json!({
            "type": "move",
            "data": {"pX": 1, "pZ": 2, "vX": 1e39, "pY": -1e39}
        }))
        .unwrap();

        let Action::Move(delta) = &action else {
            panic!("expected move, got {action:?}");
        };
        assert_eq!(delta.v_x, Some(f32::INFINITY));
        assert!(Arena::validate_message(&state, SessionId(1), &action).is_err());

        for field in ["pY", "vX", "vY", "vZ", "rX", "rY"] {
            let mut data = json!({"pX": 1, "pZ": 2});
            data[field] = json!(1e39);
            let action: Action =
                serde_json::from_value(json!({"type": "move", "data": data})).unwrap();
            assert!(
                Arena::validate_message(&state, SessionId(1), &action).is_err(),
                "{field} accepted"
            );
        }

        let mut ok = MoveDelta::to(1.0, 2.0);
        ok.v_x = Some(-3.5);
        ok.r_y = Some(0.25);
        assert!(Arena::validate_message(&state, SessionId(1), &Action::Move(ok)).is_ok());
    }

    #[test]
    fn test_snapshot_stays_decodable_after_rejected_move() {
        let mut state = state();
        join(&mut state, 1);
        let mut bad = MoveDelta::to(1.0, 2.0);
        bad.v_y = Some(f32::INFINITY);
        let action = Action::Move(bad);

        if Arena::validate_message(&state, SessionId(1), &action).is_ok() {
            Arena::on_message(&mut state, SessionId(1), action);
        }

        let json = serde_json::to_string(&Arena::snapshot(&state)).unwrap();
        let decoded: ArenaSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, state.snapshot());
    }
}
