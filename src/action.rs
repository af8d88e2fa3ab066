//! Action vocabulary and the validating request parser.
//!
//! The wire request is a loose record (`action`, optional `text`, optional
//! `coordinate`). [`Action::parse`] turns it into a closed enum whose
//! variants carry only what their class needs.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use crate::error::{Result, ToolError};

/// How long a WASD `key` action holds the key before releasing it
pub const MOVEMENT_HOLD: Duration = Duration::from_secs(1);

/// Request as received from the agent
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActionRequest {
    pub action: String,
    #[serde(default)]
    pub text: Option<Value>,
    #[serde(default)]
    pub coordinate: Option<Value>,
}

impl ActionRequest {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            ..Default::default()
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(Value::String(text.into()));
        self
    }

    pub fn with_coordinate(mut self, x: u32, y: u32) -> Self {
        self.coordinate = Some(Value::from(vec![x, y]));
        self
    }
}

/// Every action name the tool accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Key,
    Type,
    MouseMove,
    LeftClick,
    LeftClickDrag,
    RightClick,
    MiddleClick,
    DoubleClick,
    Screenshot,
    CursorPosition,
    LeftDown,
    LeftUp,
    HoldArrowUp,
    ReleaseArrowUp,
    HoldArrowDown,
    ReleaseArrowDown,
    HoldArrowLeft,
    ReleaseArrowLeft,
    HoldArrowRight,
    ReleaseArrowRight,
}

impl ActionKind {
    pub const ALL: [ActionKind; 20] = [
        ActionKind::Key,
        ActionKind::Type,
        ActionKind::MouseMove,
        ActionKind::LeftClick,
        ActionKind::LeftClickDrag,
        ActionKind::RightClick,
        ActionKind::MiddleClick,
        ActionKind::DoubleClick,
        ActionKind::Screenshot,
        ActionKind::CursorPosition,
        ActionKind::LeftDown,
        ActionKind::LeftUp,
        ActionKind::HoldArrowUp,
        ActionKind::ReleaseArrowUp,
        ActionKind::HoldArrowDown,
        ActionKind::ReleaseArrowDown,
        ActionKind::HoldArrowLeft,
        ActionKind::ReleaseArrowLeft,
        ActionKind::HoldArrowRight,
        ActionKind::ReleaseArrowRight,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Key => "key",
            ActionKind::Type => "type",
            ActionKind::MouseMove => "mouse_move",
            ActionKind::LeftClick => "left_click",
            ActionKind::LeftClickDrag => "left_click_drag",
            ActionKind::RightClick => "right_click",
            ActionKind::MiddleClick => "middle_click",
            ActionKind::DoubleClick => "double_click",
            ActionKind::Screenshot => "screenshot",
            ActionKind::CursorPosition => "cursor_position",
            ActionKind::LeftDown => "left_down",
            ActionKind::LeftUp => "left_up",
            ActionKind::HoldArrowUp => "hold_arrow_up",
            ActionKind::ReleaseArrowUp => "release_arrow_up",
            ActionKind::HoldArrowDown => "hold_arrow_down",
            ActionKind::ReleaseArrowDown => "release_arrow_down",
            ActionKind::HoldArrowLeft => "hold_arrow_left",
            ActionKind::ReleaseArrowLeft => "release_arrow_left",
            ActionKind::HoldArrowRight => "hold_arrow_right",
            ActionKind::ReleaseArrowRight => "release_arrow_right",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self> {
        ActionKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ToolError::validation(format!("Invalid action: {}", s)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerMotion {
    Move,
    Drag,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextInput {
    Key,
    Type,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Click {
    Left,
    Right,
    Middle,
    Double,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capture {
    Screenshot,
    CursorPosition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arrow {
    Up,
    Down,
    Left,
    Right,
}

impl Arrow {
    pub fn key_name(self) -> &'static str {
        match self {
            Arrow::Up => "up",
            Arrow::Down => "down",
            Arrow::Left => "left",
            Arrow::Right => "right",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameControl {
    LeftDown,
    LeftUp,
    HoldArrow(Arrow),
    ReleaseArrow(Arrow),
}

/// Validated action, one variant per action class
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Pointer { motion: PointerMotion, x: u32, y: u32 },
    Input { input: TextInput, text: String },
    Click(Click),
    Capture(Capture),
    Game(GameControl),
}

impl Action {
    /// Validate a wire request against the parameter rules of its class.
    pub fn parse(request: &ActionRequest) -> Result<Self> {
        let kind: ActionKind = request.action.parse()?;
        let text = request.text.as_ref();
        let coordinate = request.coordinate.as_ref();

        let action = match kind {
            ActionKind::MouseMove | ActionKind::LeftClickDrag => {
                let Some(coordinate) = coordinate else {
                    return Err(ToolError::validation(format!("coordinate is required for {}", kind)));
                };
                if text.is_some() {
                    return Err(ToolError::validation(format!("text is not accepted for {}", kind)));
                }
                let (x, y) = parse_coordinate(coordinate)?;
                let motion = if kind == ActionKind::MouseMove { PointerMotion::Move } else { PointerMotion::Drag };
                Action::Pointer { motion, x, y }
            }
            ActionKind::Key | ActionKind::Type => {
                let Some(text) = text else {
                    return Err(ToolError::validation(format!("text is required for {}", kind)));
                };
                if coordinate.is_some() {
                    return Err(ToolError::validation(format!("coordinate is not accepted for {}", kind)));
                }
                let Value::String(text) = text else {
                    return Err(ToolError::validation(format!("{} must be a string", text)));
                };
                let input = if kind == ActionKind::Key { TextInput::Key } else { TextInput::Type };
                if input == TextInput::Key && text.is_empty() {
                    return Err(ToolError::validation("text must not be empty for key"));
                }
                Action::Input { input, text: text.clone() }
            }
            _ => {
                if text.is_some() {
                    return Err(ToolError::validation(format!("text is not accepted for {}", kind)));
                }
                if coordinate.is_some() {
                    return Err(ToolError::validation(format!("coordinate is not accepted for {}", kind)));
                }
                Self::without_parameters(kind)
                    .ok_or_else(|| ToolError::validation(format!("Invalid action: {}", kind)))?
            }
        };
        Ok(action)
    }

    fn without_parameters(kind: ActionKind) -> Option<Self> {
        let action = match kind {
            ActionKind::LeftClick => Action::Click(Click::Left),
            ActionKind::RightClick => Action::Click(Click::Right),
            ActionKind::MiddleClick => Action::Click(Click::Middle),
            ActionKind::DoubleClick => Action::Click(Click::Double),
            ActionKind::Screenshot => Action::Capture(Capture::Screenshot),
            ActionKind::CursorPosition => Action::Capture(Capture::CursorPosition),
            ActionKind::LeftDown => Action::Game(GameControl::LeftDown),
            ActionKind::LeftUp => Action::Game(GameControl::LeftUp),
            ActionKind::HoldArrowUp => Action::Game(GameControl::HoldArrow(Arrow::Up)),
            ActionKind::ReleaseArrowUp => Action::Game(GameControl::ReleaseArrow(Arrow::Up)),
            ActionKind::HoldArrowDown => Action::Game(GameControl::HoldArrow(Arrow::Down)),
            ActionKind::ReleaseArrowDown => Action::Game(GameControl::ReleaseArrow(Arrow::Down)),
            ActionKind::HoldArrowLeft => Action::Game(GameControl::HoldArrow(Arrow::Left)),
            ActionKind::ReleaseArrowLeft => Action::Game(GameControl::ReleaseArrow(Arrow::Left)),
            ActionKind::HoldArrowRight => Action::Game(GameControl::HoldArrow(Arrow::Right)),
            ActionKind::ReleaseArrowRight => Action::Game(GameControl::ReleaseArrow(Arrow::Right)),
            ActionKind::Key | ActionKind::Type | ActionKind::MouseMove | ActionKind::LeftClickDrag => return None,
        };
        Some(action)
    }

    /// Wire name of the action
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Pointer { motion: PointerMotion::Move, .. } => ActionKind::MouseMove,
            Action::Pointer { motion: PointerMotion::Drag, .. } => ActionKind::LeftClickDrag,
            Action::Input { input: TextInput::Key, .. } => ActionKind::Key,
            Action::Input { input: TextInput::Type, .. } => ActionKind::Type,
            Action::Click(Click::Left) => ActionKind::LeftClick,
            Action::Click(Click::Right) => ActionKind::RightClick,
            Action::Click(Click::Middle) => ActionKind::MiddleClick,
            Action::Click(Click::Double) => ActionKind::DoubleClick,
            Action::Capture(Capture::Screenshot) => ActionKind::Screenshot,
            Action::Capture(Capture::CursorPosition) => ActionKind::CursorPosition,
            Action::Game(GameControl::LeftDown) => ActionKind::LeftDown,
            Action::Game(GameControl::LeftUp) => ActionKind::LeftUp,
            Action::Game(GameControl::HoldArrow(Arrow::Up)) => ActionKind::HoldArrowUp,
            Action::Game(GameControl::ReleaseArrow(Arrow::Up)) => ActionKind::ReleaseArrowUp,
            Action::Game(GameControl::HoldArrow(Arrow::Down)) => ActionKind::HoldArrowDown,
            Action::Game(GameControl::ReleaseArrow(Arrow::Down)) => ActionKind::ReleaseArrowDown,
            Action::Game(GameControl::HoldArrow(Arrow::Left)) => ActionKind::HoldArrowLeft,
            Action::Game(GameControl::ReleaseArrow(Arrow::Left)) => ActionKind::ReleaseArrowLeft,
            Action::Game(GameControl::HoldArrow(Arrow::Right)) => ActionKind::HoldArrowRight,
            Action::Game(GameControl::ReleaseArrow(Arrow::Right)) => ActionKind::ReleaseArrowRight,
        }
    }
}

fn parse_coordinate(value: &Value) -> Result<(u32, u32)> {
    let items = match value {
        Value::Array(items) if items.len() == 2 => items,
        _ => return Err(ToolError::validation(format!("{} must be a tuple of length 2", value))),
    };
    let component = |v: &Value| v.as_u64().and_then(|n| u32::try_from(n).ok());
    match (component(&items[0]), component(&items[1])) {
        (Some(x), Some(y)) => Ok((x, y)),
        _ => Err(ToolError::validation(format!("{} must be a tuple of non-negative ints", value))),
    }
}

/// What a `key` action does with its text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyStroke {
    /// Press, wait, release (legacy WASD movement)
    Hold { key: String, duration: Duration },
    /// Press and release a key name, possibly a `mod+key` combination
    Press(String),
}

/// Resolve the text of a `key` action.
pub fn resolve_key(text: &str) -> KeyStroke {
    let lower = text.to_lowercase();
    let mut chars = lower.chars();
    let single = match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    };

    match single {
        Some(c @ ('w' | 'a' | 's' | 'd')) => {
            return KeyStroke::Hold { key: c.to_string(), duration: MOVEMENT_HOLD };
        }
        Some(c) if c.is_ascii_lowercase() || c.is_ascii_digit() => {
            return KeyStroke::Press(c.to_string());
        }
        _ => {}
    }

    match lower.as_str() {
        "return" => KeyStroke::Press("enter".to_string()),
        "up" | "up-arrow" | "down" | "down-arrow" | "left" | "left-arrow" | "right" | "right-arrow" => {
            let arrow = lower.split('-').next().unwrap_or_default();
            KeyStroke::Press(arrow.to_string())
        }
        _ => KeyStroke::Press(lower),
    }
}

/// Split `text` into chunks of at most `size` characters.
pub fn chunks(text: &str, size: usize) -> Vec<&str> {
    let size = size.max(1);
    let mut out = Vec::new();
    let mut start = 0;
    let mut count = 0;
    for (idx, _) in text.char_indices() {
        if count == size {
            out.push(&text[start..idx]);
            start = idx;
            count = 0;
        }
        count += 1;
    }
    if start < text.len() {
        out.push(&text[start..]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> Result<Action> {
        let request: ActionRequest = serde_json::from_value(value).unwrap();
        Action::parse(&request)
    }

    fn message(result: Result<Action>) -> String {
        match result {
            Err(ToolError::Validation(msg)) => msg,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn every_action_name_round_trips() {
        for kind in ActionKind::ALL {
            assert_eq!(kind.as_str().parse::<ActionKind>().unwrap(), kind);
        }
    }

    #[test]
    fn unknown_action_is_rejected() {
        assert_eq!(message(parse(json!({"action": "scroll"}))), "Invalid action: scroll");
        assert_eq!(message(parse(json!({"action": "Left_Click"}))), "Invalid action: Left_Click");
    }

    #[test]
    fn pointer_motion_parses_coordinate() {
        assert_eq!(
            parse(json!({"action": "mouse_move", "coordinate": [10, 20]})).unwrap(),
            Action::Pointer { motion: PointerMotion::Move, x: 10, y: 20 }
        );
        assert_eq!(
            parse(json!({"action": "left_click_drag", "coordinate": [0, 0]})).unwrap(),
            Action::Pointer { motion: PointerMotion::Drag, x: 0, y: 0 }
        );
    }

    #[test]
    fn pointer_motion_validation() {
        for action in ["mouse_move", "left_click_drag"] {
            assert_eq!(
                message(parse(json!({"action": action}))),
                format!("coordinate is required for {}", action)
            );
            assert_eq!(
                message(parse(json!({"action": action, "coordinate": [1, 2], "text": "x"}))),
                format!("text is not accepted for {}", action)
            );
            assert!(message(parse(json!({"action": action, "coordinate": [1]}))).ends_with("must be a tuple of length 2"));
            assert!(message(parse(json!({"action": action, "coordinate": [1, 2, 3]}))).ends_with("must be a tuple of length 2"));
            assert!(message(parse(json!({"action": action, "coordinate": "1,2"}))).ends_with("must be a tuple of length 2"));
            for bad in [json!([-1, 2]), json!([1, 2.5]), json!([1.0, 2]), json!(["1", 2]), json!([true, 2])] {
                assert!(
                    message(parse(json!({"action": action, "coordinate": bad}))).ends_with("must be a tuple of non-negative ints"),
                    "{} should be rejected",
                    bad
                );
            }
        }
    }

    #[test]
    fn key_and_type_validation() {
        for action in ["key", "type"] {
            assert_eq!(message(parse(json!({"action": action}))), format!("text is required for {}", action));
            assert_eq!(
                message(parse(json!({"action": action, "text": "a", "coordinate": [1, 2]}))),
                format!("coordinate is not accepted for {}", action)
            );
            assert_eq!(message(parse(json!({"action": action, "text": 5}))), "5 must be a string");
        }
        assert!(parse(json!({"action": "key", "text": ""})).is_err());
        assert_eq!(
            parse(json!({"action": "type", "text": ""})).unwrap(),
            Action::Input { input: TextInput::Type, text: String::new() }
        );
    }

    #[test]
    fn parameterless_actions_forbid_text_and_coordinate() {
        for action in ["left_click", "screenshot", "cursor_position", "left_down", "hold_arrow_up"] {
            assert_eq!(
                message(parse(json!({"action": action, "text": "x"}))),
                format!("text is not accepted for {}", action)
            );
            assert_eq!(
                message(parse(json!({"action": action, "coordinate": [1, 2]}))),
                format!("coordinate is not accepted for {}", action)
            );
        }
        assert_eq!(
            parse(json!({"action": "release_arrow_left", "text": null})).unwrap(),
            Action::Game(GameControl::ReleaseArrow(Arrow::Left))
        );
    }

    #[test]
    fn kind_matches_wire_name() {
        for kind in ActionKind::ALL {
            let mut request = ActionRequest::new(kind.as_str());
            match kind {
                ActionKind::MouseMove | ActionKind::LeftClickDrag => request = request.with_coordinate(1, 1),
                ActionKind::Key | ActionKind::Type => request = request.with_text("q"),
                _ => {}
            }
            assert_eq!(Action::parse(&request).unwrap().kind(), kind);
        }
    }

    #[test]
    fn wasd_holds_for_one_second() {
        for text in ["w", "W", "a", "s", "d"] {
            assert_eq!(
                resolve_key(text),
                KeyStroke::Hold { key: text.to_lowercase(), duration: Duration::from_secs(1) }
            );
        }
    }

    #[test]
    fn key_resolution() {
        assert_eq!(resolve_key("Q"), KeyStroke::Press("q".into()));
        assert_eq!(resolve_key("7"), KeyStroke::Press("7".into()));
        assert_eq!(resolve_key("return"), KeyStroke::Press("enter".into()));
        assert_eq!(resolve_key("RETURN"), KeyStroke::Press("enter".into()));
        assert_eq!(resolve_key("up-arrow"), KeyStroke::Press("up".into()));
        assert_eq!(resolve_key("Left"), KeyStroke::Press("left".into()));
        assert_eq!(resolve_key("down-arrow"), KeyStroke::Press("down".into()));
        assert_eq!(resolve_key("Right-Arrow"), KeyStroke::Press("right".into()));
        assert_eq!(resolve_key("Escape"), KeyStroke::Press("escape".into()));
        assert_eq!(resolve_key("ctrl+C"), KeyStroke::Press("ctrl+c".into()));
        assert_eq!(resolve_key("ws"), KeyStroke::Press("ws".into()));
    }

    #[test]
    fn chunks_preserve_text() {
        let text: String = "abcdefghij".repeat(12);
        let parts = chunks(&text, 50);
        assert_eq!(parts.iter().map(|p| p.chars().count()).collect::<Vec<_>>(), vec![50, 50, 20]);
        assert_eq!(parts.concat(), text);

        let exact = "x".repeat(50);
        assert_eq!(chunks(&exact, 50), vec![exact.as_str()]);
        assert!(chunks("", 50).is_empty());
    }

    #[test]
    fn chunks_count_characters_not_bytes() {
        let text = "é".repeat(51);
        let parts = chunks(&text, 50);
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].chars().count(), 50);
        assert_eq!(parts[1], "é");
    }
}
