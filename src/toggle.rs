// Hotkey chord parsing and the toggle controller.
//
// Chords are written the way they are shown to users ("Ctrl+Alt+F") and
// resolved to a modifier set plus a Win32 virtual-key code.

use crate::error::{FocusDimError, Result};
use crate::lifecycle::{Coordinator, OverlaySurface};
use crate::tracker::ToggleOutcome;
use crate::window_info::WindowInfoProvider;
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

/// Hotkey id used for the toggle registration (unique within the app).
pub const HOTKEY_TOGGLE: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub win: bool,
}

impl Modifiers {
    pub fn is_empty(&self) -> bool {
        !(self.ctrl || self.alt || self.shift || self.win)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HotkeyChord {
    pub modifiers: Modifiers,
    pub virtual_key: u32,
}

impl FromStr for HotkeyChord {
    type Err = FocusDimError;

    fn from_str(s: &str) -> Result<Self> {
        let mut modifiers = Modifiers::default();
        let mut virtual_key = None;

        for part in s.split('+').map(str::trim) {
            match part.to_ascii_lowercase().as_str() {
                "" => return Err(FocusDimError::hotkey(format!("empty key in '{s}'"))),
                "ctrl" | "control" => modifiers.ctrl = true,
                "alt" => modifiers.alt = true,
                "shift" => modifiers.shift = true,
                "win" | "super" => modifiers.win = true,
                _ => {
                    let vk = virtual_key_from_name(part).ok_or_else(|| {
                        FocusDimError::hotkey(format!("unknown key '{part}' in '{s}'"))
                    })?;
                    if virtual_key.replace(vk).is_some() {
                        return Err(FocusDimError::hotkey(format!(
                            "more than one key in '{s}'"
                        )));
                    }
                }
            }
        }

        let virtual_key =
            virtual_key.ok_or_else(|| FocusDimError::hotkey(format!("no key in '{s}'")))?;
        if modifiers.is_empty() {
            return Err(FocusDimError::hotkey(format!(
                "'{s}' needs at least one modifier"
            )));
        }

        Ok(Self {
            modifiers,
            virtual_key,
        })
    }
}

impl fmt::Display for HotkeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = self.modifiers;
        for (on, name) in [
            (m.ctrl, "Ctrl"),
            (m.alt, "Alt"),
            (m.shift, "Shift"),
            (m.win, "Win"),
        ] {
            if on {
                write!(f, "{name}+")?;
            }
        }
        match key_name(self.virtual_key) {
            Some(name) => write!(f, "{name}"),
            None => write!(f, "0x{:02X}", self.virtual_key),
        }
    }
}

const NAMED_KEYS: &[(&str, u32)] = &[
    ("Space", 0x20),
    ("PageUp", 0x21),
    ("PageDown", 0x22),
    ("End", 0x23),
    ("Home", 0x24),
    ("Left", 0x25),
    ("Up", 0x26),
    ("Right", 0x27),
    ("Down", 0x28),
    ("Insert", 0x2D),
    ("Delete", 0x2E),
];

fn virtual_key_from_name(name: &str) -> Option<u32> {
    if let Some((_, vk)) = NAMED_KEYS
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
    {
        return Some(*vk);
    }

    let upper = name.to_ascii_uppercase();
    let mut chars = upper.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if c.is_ascii_uppercase() || c.is_ascii_digit() {
            return Some(c as u32);
        }
    }

    let n: u32 = upper.strip_prefix('F')?.parse().ok()?;
    (1..=24).contains(&n).then(|| 0x70 + n - 1)
}

fn key_name(vk: u32) -> Option<String> {
    if let Some((name, _)) = NAMED_KEYS.iter().find(|(_, code)| *code == vk) {
        return Some((*name).to_string());
    }
    match vk {
        0x30..=0x39 | 0x41..=0x5A => char::from_u32(vk).map(String::from),
        0x70..=0x87 => Some(format!("F{}", vk - 0x70 + 1)),
        _ => None,
    }
}

/// Answers the toggle hotkey by delegating to the tracker's toggle
/// transition through the coordinator. Holds no overlay state itself.
#[derive(Debug, Clone, Copy)]
pub struct ToggleController {
    chord: HotkeyChord,
    hotkey_id: i32,
}

impl ToggleController {
    pub fn new(chord: HotkeyChord) -> Self {
        Self {
            chord,
            hotkey_id: HOTKEY_TOGGLE,
        }
    }

    pub fn chord(&self) -> HotkeyChord {
        self.chord
    }

    pub fn hotkey_id(&self) -> i32 {
        self.hotkey_id
    }

    pub fn handles(&self, hotkey_id: i32) -> bool {
        hotkey_id == self.hotkey_id
    }

    pub fn on_toggle<P, S>(
        &self,
        coordinator: &mut Coordinator<P, S>,
        now: Instant,
    ) -> Option<ToggleOutcome>
    where
        P: WindowInfoProvider,
        S: OverlaySurface,
    {
        coordinator.toggle(now)
    }
}
