//! Input primitives driven by the computer tool
//!
//! The dispatcher builds clicks, drags, timed holds and key combinations on
//! top of the low-level primitives in [`InputBackend`]. The X11 XTest
//! implementation lives in [`injector`].

pub mod injector;
pub mod keyboard;

use std::collections::BTreeSet;
use std::fmt;

pub use injector::XInjector;

/// Mouse buttons, numbered as X11 core buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

impl MouseButton {
    pub fn x11_button(self) -> u8 {
        match self {
            MouseButton::Left => 1,
            MouseButton::Middle => 2,
            MouseButton::Right => 3,
        }
    }
}

/// Input backend errors
#[derive(Debug)]
pub enum InputError {
    /// Could not reach the display server
    Connection(String),
    /// Key name has no keysym
    UnknownKey(String),
    /// Keysym has no keycode in the current keyboard mapping
    Unmapped(u32),
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputError::Connection(msg) => write!(f, "X11 connection error: {}", msg),
            InputError::UnknownKey(name) => write!(f, "unknown key: {}", name),
            InputError::Unmapped(sym) => write!(f, "keysym 0x{:x} is not mapped to a keycode", sym),
        }
    }
}

impl std::error::Error for InputError {}

/// Low-level input surface.
///
/// Calls mutate process-wide OS state: a button or key pressed here stays
/// pressed until a matching release.
pub trait InputBackend: Send {
    /// Move the pointer to absolute physical coordinates
    fn move_to(&mut self, x: u32, y: u32) -> Result<(), InputError>;

    /// Press or release a mouse button at the current pointer position
    fn button(&mut self, button: MouseButton, pressed: bool) -> Result<(), InputError>;

    /// Press or release a named key (`enter`, `up`, `w`, `ctrl`, ...)
    fn key(&mut self, name: &str, pressed: bool) -> Result<(), InputError>;

    /// Type one character, applying Shift where the layout needs it
    fn type_char(&mut self, c: char) -> Result<(), InputError>;

    /// Current pointer position in physical coordinates
    fn position(&mut self) -> Result<(u32, u32), InputError>;
}

/// Input left held by a hold action
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum HeldInput {
    Button(MouseButton),
    Key(String),
}

impl fmt::Display for HeldInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeldInput::Button(b) => write!(f, "{:?} mouse button", b),
            HeldInput::Key(k) => write!(f, "key {}", k),
        }
    }
}

/// Session-scoped record of held inputs.
///
/// Bookkeeping only: nothing here releases an input. A session that ends
/// without the matching release actions leaves the inputs physically held.
#[derive(Debug, Default)]
pub struct HeldInputs {
    held: BTreeSet<HeldInput>,
}

impl HeldInputs {
    pub fn hold(&mut self, input: HeldInput) {
        self.held.insert(input);
    }

    pub fn release(&mut self, input: &HeldInput) {
        self.held.remove(input);
    }

    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HeldInput> {
        self.held.iter()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn held_inputs_track_hold_and_release() {
        let mut held = HeldInputs::default();
        held.hold(HeldInput::Button(MouseButton::Left));
        held.hold(HeldInput::Key("up".into()));
        held.hold(HeldInput::Key("up".into()));
        assert_eq!(held.iter().count(), 2);

        held.release(&HeldInput::Key("up".into()));
        assert_eq!(held.iter().collect::<Vec<_>>(), vec![&HeldInput::Button(MouseButton::Left)]);

        held.release(&HeldInput::Button(MouseButton::Left));
        assert!(held.is_empty());
    }

    #[test]
    fn buttons_use_x11_numbering() {
        assert_eq!(MouseButton::Left.x11_button(), 1);
        assert_eq!(MouseButton::Middle.x11_button(), 2);
        assert_eq!(MouseButton::Right.x11_button(), 3);
    }
}
