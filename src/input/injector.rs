//! X11 input injection using XTest
//!
//! Provides keyboard and mouse simulation via the XTest extension.

use std::collections::HashMap;
use std::fmt::Display;

use log::{debug, warn};
use x11rb::connection::Connection;
use x11rb::protocol::xproto::*;
use x11rb::protocol::xtest;
use x11rb::rust_connection::RustConnection;

use super::keyboard;
use super::{InputBackend, InputError, MouseButton};

/// XTest input constants
const INPUT_KEY_PRESS: u8 = 2;
const INPUT_KEY_RELEASE: u8 = 3;
const INPUT_BUTTON_PRESS: u8 = 4;
const INPUT_BUTTON_RELEASE: u8 = 5;

fn x11_err(e: impl Display) -> InputError {
    InputError::Connection(e.to_string())
}

/// Where a keysym lives on the keyboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct KeyBinding {
    pub keycode: u8,
    /// Keysym sits in the shifted column
    pub shift: bool,
}

/// Index the first two columns of a keyboard mapping by keysym.
///
/// Columns past the second need a group switch and are skipped. When a
/// keysym appears in both columns, the unshifted binding wins.
pub(crate) fn build_keymap(min_keycode: u8, keysyms_per_keycode: usize, keysyms: &[u32]) -> HashMap<u32, KeyBinding> {
    let mut keymap = HashMap::new();
    if keysyms_per_keycode == 0 {
        return keymap;
    }
    for column in 0..keysyms_per_keycode.min(2) {
        for (i, row) in keysyms.chunks(keysyms_per_keycode).enumerate() {
            let Some(&sym) = row.get(column) else { continue };
            let Ok(keycode) = u8::try_from(min_keycode as usize + i) else { break };
            if sym != 0 {
                keymap.entry(sym).or_insert(KeyBinding {
                    keycode,
                    shift: column == 1,
                });
            }
        }
    }
    keymap
}

/// X11 input injector using the XTest extension
pub struct XInjector {
    /// X11 connection
    conn: RustConnection,
    /// Root window
    root: Window,
    /// Keysym to keycode cache
    keymap: HashMap<u32, KeyBinding>,
}

impl std::fmt::Debug for XInjector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XInjector")
            .field("root", &self.root)
            .field("cached_keysyms", &self.keymap.len())
            .finish()
    }
}

impl XInjector {
    /// Connect to `display` (for example ":1"), or to `$DISPLAY` when `None`.
    pub fn connect(display: Option<&str>) -> Result<Self, InputError> {
        let (conn, screen_num) = RustConnection::connect(display).map_err(x11_err)?;
        let root = conn
            .setup()
            .roots
            .get(screen_num)
            .map(|screen| screen.root)
            .ok_or_else(|| InputError::Connection(format!("no screen {}", screen_num)))?;

        let min_keycode = conn.setup().min_keycode;
        let max_keycode = conn.setup().max_keycode;
        let mapping = conn
            .get_keyboard_mapping(min_keycode, max_keycode - min_keycode + 1)
            .map_err(x11_err)?
            .reply()
            .map_err(x11_err)?;
        let keymap = build_keymap(min_keycode, mapping.keysyms_per_keycode as usize, &mapping.keysyms);
        debug!(
            "Connected to X11 display {} ({} keysyms cached)",
            display.unwrap_or("$DISPLAY"),
            keymap.len()
        );

        Ok(Self { conn, root, keymap })
    }

    fn fake_input(&self, input_type: u8, detail: u8) -> Result<(), InputError> {
        xtest::fake_input(&self.conn, input_type, detail, 0, self.root, 0, 0, 0).map_err(x11_err)?;
        self.conn.flush().map_err(x11_err)?;
        Ok(())
    }

    fn binding(&self, keysym: u32) -> Result<KeyBinding, InputError> {
        self.keymap.get(&keysym).copied().ok_or(InputError::Unmapped(keysym))
    }

    fn keycode(&self, keycode: u8, pressed: bool) -> Result<(), InputError> {
        let input_type = if pressed { INPUT_KEY_PRESS } else { INPUT_KEY_RELEASE };
        self.fake_input(input_type, keycode)
    }

    /// Press or release `keysym`, with Shift around it when the keysym is
    /// in the shifted column.
    fn keysym(&self, keysym: u32, pressed: bool) -> Result<(), InputError> {
        let binding = self.binding(keysym)?;
        if !binding.shift {
            return self.keycode(binding.keycode, pressed);
        }
        let shift = self.binding(keyboard::shift_keysym())?.keycode;
        if pressed {
            self.keycode(shift, true)?;
            self.keycode(binding.keycode, true)
        } else {
            let released = self.keycode(binding.keycode, false);
            self.keycode(shift, false)?;
            released
        }
    }
}

impl InputBackend for XInjector {
    fn move_to(&mut self, x: u32, y: u32) -> Result<(), InputError> {
        // Clamp to i16 range for X11 protocol
        let wx = x.min(i16::MAX as u32) as i16;
        let wy = y.min(i16::MAX as u32) as i16;
        self.conn
            .warp_pointer(0u32, self.root, 0, 0, 0, 0, wx, wy)
            .map_err(x11_err)?;
        self.conn.flush().map_err(x11_err)?;
        Ok(())
    }

    fn button(&mut self, button: MouseButton, pressed: bool) -> Result<(), InputError> {
        let input_type = if pressed { INPUT_BUTTON_PRESS } else { INPUT_BUTTON_RELEASE };
        self.fake_input(input_type, button.x11_button())
    }

    fn key(&mut self, name: &str, pressed: bool) -> Result<(), InputError> {
        let keysym = keyboard::get_keysym(name).ok_or_else(|| InputError::UnknownKey(name.to_string()))?;
        self.keysym(keysym, pressed)
    }

    fn type_char(&mut self, c: char) -> Result<(), InputError> {
        let sym = keyboard::char_to_keysym(c);
        if !self.keymap.contains_key(&sym) {
            warn!("No keycode for {:?}, skipping", c);
            return Ok(());
        }
        self.keysym(sym, true)?;
        self.keysym(sym, false)
    }

    fn position(&mut self) -> Result<(u32, u32), InputError> {
        let reply = self
            .conn
            .query_pointer(self.root)
            .map_err(x11_err)?
            .reply()
            .map_err(x11_err)?;
        Ok((reply.root_x.max(0) as u32, reply.root_y.max(0) as u32))
    }
}
