//! Key name → X11 keysym mapping and combo key parsing.

const XK_SHIFT_L: u32 = 0xffe1;

/// Split a combination like "ctrl+c" or "ctrl+shift+t" into
/// (modifier names, main key name). A single key yields no modifiers.
pub fn parse_key_combo(key: &str) -> Result<(Vec<&str>, &str), String> {
    if key.is_empty() {
        return Err("empty key string".into());
    }
    // "+" on its own is the plus key, not a combo
    if key == "+" || !key.contains('+') {
        return Ok((Vec::new(), key));
    }

    let parts: Vec<&str> = key.split('+').collect();
    let (main_key, modifiers) = match parts.split_last() {
        Some((main, mods)) if !main.is_empty() => (*main, mods),
        _ => return Err(format!("missing key in combo: {}", key)),
    };

    for m in modifiers {
        if modifier_keysym(m).is_none() {
            return Err(format!("unknown modifier: {}", m));
        }
    }

    Ok((modifiers.to_vec(), main_key))
}

/// Keysym of Shift_L, pressed around shifted characters
pub fn shift_keysym() -> u32 {
    XK_SHIFT_L
}

/// Get keysym for a modifier name (case-insensitive).
fn modifier_keysym(name: &str) -> Option<u32> {
    match name.to_lowercase().as_str() {
        "ctrl" | "control" => Some(0xffe3), // Control_L
        "shift"            => Some(XK_SHIFT_L),
        "alt"              => Some(0xffe9), // Alt_L
        "super" | "meta" | "cmd" | "win" => Some(0xffeb), // Super_L
        _ => None,
    }
}

/// Map a key name to its X11 keysym. Supports:
/// - Single characters (letters, digits, symbols)
/// - Named keys (enter, esc, f1-f24, arrows, keypad digits, ...)
/// - Modifiers on their own
pub fn get_keysym(name: &str) -> Option<u32> {
    let mut chars = name.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Some(char_to_keysym(c));
    }

    let lower = name.to_lowercase();
    if let Some(sym) = modifier_keysym(&lower) {
        return Some(sym);
    }
    if let Some(sym) = function_keysym(&lower) {
        return Some(sym);
    }
    if let Some(digit) = lower.strip_prefix("num-").and_then(|d| d.parse::<u32>().ok()) {
        // KP_0 .. KP_9
        return (digit <= 9).then_some(0xffb0 + digit);
    }

    match lower.as_str() {
        // Whitespace / control
        "return" | "enter"     => Some(0xff0d),
        "tab"                  => Some(0xff09),
        "backspace" | "back"   => Some(0xff08),
        "delete" | "del" | "fwd-delete" => Some(0xffff),
        "escape" | "esc"       => Some(0xff1b),
        "space"                => Some(0x0020),
        // Navigation
        "home"                 => Some(0xff50),
        "end"                  => Some(0xff57),
        "pageup" | "page_up" | "page-up"         => Some(0xff55),
        "pagedown" | "page_down" | "page-down"   => Some(0xff56),
        "insert"               => Some(0xff63),
        // Arrow keys
        "up" | "arrowup" | "arrow-up"          => Some(0xff52),
        "down" | "arrowdown" | "arrow-down"    => Some(0xff54),
        "left" | "arrowleft" | "arrow-left"    => Some(0xff51),
        "right" | "arrowright" | "arrow-right" => Some(0xff53),
        // Keypad
        "num-enter"            => Some(0xff8d),
        "num-plus"             => Some(0xffab),
        "num-minus"            => Some(0xffad),
        "num-multiply"         => Some(0xffaa),
        "num-divide"           => Some(0xffaf),
        "num-equals"           => Some(0xffbd),
        "num-clear"            => Some(0xff0b),
        // Misc
        "capslock" | "caps_lock" => Some(0xffe5),
        "numlock" | "num_lock"   => Some(0xff7f),
        "scrolllock" | "scroll_lock" => Some(0xff14),
        "print" | "printscreen"  => Some(0xff61),
        "pause"                  => Some(0xff13),
        "menu"                   => Some(0xff67),
        _ => None,
    }
}

/// F1 .. F24
fn function_keysym(name: &str) -> Option<u32> {
    let n: u32 = name.strip_prefix('f')?.parse().ok()?;
    (1..=24).contains(&n).then(|| 0xffbe + n - 1)
}

/// Convert a single character to its X11 keysym.
pub fn char_to_keysym(c: char) -> u32 {
    match c {
        // ASCII printable range maps directly
        ' '..='~' => c as u32,
        '\n' => 0xff0d,
        '\t' => 0xff09,
        // For Unicode characters outside ASCII, use Unicode keysym encoding
        _ => 0x01000000 | (c as u32),
    }
}
