// Global toggle hotkey using Win32 RegisterHotKey API.
//
// Registered against the thread (no window), so WM_HOTKEY arrives in the
// main message loop with a null hwnd and the hotkey id in wParam.

use crate::error::{FocusDimError, Result};
use crate::toggle::{HotkeyChord, ToggleController};
use tracing::{debug, info};
use windows::Win32::UI::Input::KeyboardAndMouse::{
    RegisterHotKey, UnregisterHotKey, HOT_KEY_MODIFIERS, MOD_ALT, MOD_CONTROL, MOD_NOREPEAT,
    MOD_SHIFT, MOD_WIN,
};

fn modifiers(chord: &HotkeyChord) -> HOT_KEY_MODIFIERS {
    let m = chord.modifiers;
    let mut mods = MOD_NOREPEAT.0;
    if m.ctrl {
        mods |= MOD_CONTROL.0;
    }
    if m.alt {
        mods |= MOD_ALT.0;
    }
    if m.shift {
        mods |= MOD_SHIFT.0;
    }
    if m.win {
        mods |= MOD_WIN.0;
    }
    HOT_KEY_MODIFIERS(mods)
}

/// A live hotkey registration; unregistered on drop.
pub struct HotkeyRegistration {
    id: i32,
    registered: bool,
}

impl HotkeyRegistration {
    pub fn register(controller: &ToggleController) -> Result<Self> {
        let chord = controller.chord();
        let id = controller.hotkey_id();

        unsafe { RegisterHotKey(None, id, modifiers(&chord), chord.virtual_key) }
            .map_err(|e| FocusDimError::hotkey(format!("could not register {chord}: {e}")))?;

        info!(%chord, id, "toggle hotkey registered");
        Ok(Self {
            id,
            registered: true,
        })
    }

    pub fn unregister(&mut self) {
        if !self.registered {
            return;
        }
        self.registered = false;
        unsafe {
            let _ = UnregisterHotKey(None, self.id);
        }
        debug!(id = self.id, "toggle hotkey unregistered");
    }
}

impl Drop for HotkeyRegistration {
    fn drop(&mut self) {
        self.unregister();
    }
}
