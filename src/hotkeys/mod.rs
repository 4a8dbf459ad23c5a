//! Global hotkey registration: a single configurable start/stop
//! toggle, backed by a listener thread flipping an `AtomicBool`-backed
//! `StopFlag`. Additional toggles that start bounded one-shot flows are
//! out of this core's scope and are represented only as the
//! `HotkeyAction::Custom` placeholder the core never dispatches.

use global_hotkey::hotkey::{Code, HotKey, Modifiers};
use global_hotkey::{GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState};
use uuid::Uuid;

use crate::waiter::StopFlag;

/// What a registered hotkey press means. `StartStop` is the only action the
/// agent loop reacts to; `Custom` exists so a config document can name a
/// future one-shot trigger without the core needing to understand it yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HotkeyAction {
    StartStop,
    Custom(String),
}

/// Parse a `"cmd+shift+k"`-style string into `(Modifiers, Code)`. Returns
/// `None` for an unrecognized key name or an empty string.
pub fn parse_hotkey(spec: &str) -> Option<(Modifiers, Code)> {
    let mut parts: Vec<&str> = spec.split('+').map(str::trim).collect();
    let key_part = parts.pop()?;
    let code = key_to_code(key_part)?;

    let mut modifiers = Modifiers::empty();
    for part in parts {
        match part.to_lowercase().as_str() {
            "cmd" | "meta" | "super" => modifiers |= Modifiers::META,
            "ctrl" | "control" => modifiers |= Modifiers::CONTROL,
            "alt" | "option" => modifiers |= Modifiers::ALT,
            "shift" => modifiers |= Modifiers::SHIFT,
            _ => {}
        }
    }
    Some((modifiers, code))
}

fn key_to_code(key: &str) -> Option<Code> {
    Some(match key.to_uppercase().as_str() {
        "A" => Code::KeyA,
        "B" => Code::KeyB,
        "C" => Code::KeyC,
        "D" => Code::KeyD,
        "E" => Code::KeyE,
        "F" => Code::KeyF,
        "G" => Code::KeyG,
        "H" => Code::KeyH,
        "I" => Code::KeyI,
        "J" => Code::KeyJ,
        "K" => Code::KeyK,
        "L" => Code::KeyL,
        "M" => Code::KeyM,
        "N" => Code::KeyN,
        "O" => Code::KeyO,
        "P" => Code::KeyP,
        "Q" => Code::KeyQ,
        "R" => Code::KeyR,
        "S" => Code::KeyS,
        "T" => Code::KeyT,
        "U" => Code::KeyU,
        "V" => Code::KeyV,
        "W" => Code::KeyW,
        "X" => Code::KeyX,
        "Y" => Code::KeyY,
        "Z" => Code::KeyZ,
        "F1" => Code::F1,
        "F2" => Code::F2,
        "F3" => Code::F3,
        "F4" => Code::F4,
        "F5" => Code::F5,
        "F6" => Code::F6,
        "F7" => Code::F7,
        "F8" => Code::F8,
        "F9" => Code::F9,
        "F10" => Code::F10,
        "F11" => Code::F11,
        "F12" => Code::F12,
        "SPACE" => Code::Space,
        "ESCAPE" | "ESC" => Code::Escape,
        _ => return None,
    })
}

/// Owns the OS-level registration and the listener thread that flips the
/// shared `StopFlag` on each press. Toggling start/stop this way means the
/// agent loop itself never touches `global-hotkey` directly — it only
/// observes `StopFlag`.
pub struct HotkeyMonitor {
    _manager: GlobalHotKeyManager,
}

impl HotkeyMonitor {
    /// Register `hotkey_spec` as the start/stop toggle and spawn the
    /// listener thread. The thread flips `stop_flag` on every press: if it
    /// was stopped it resets (restarting a paused career), otherwise it
    /// stops (pausing the running loop).
    pub fn spawn(hotkey_spec: &str, stop_flag: StopFlag) -> Result<Self, String> {
        let (modifiers, code) =
            parse_hotkey(hotkey_spec).ok_or_else(|| format!("unrecognized hotkey spec: {hotkey_spec}"))?;

        let manager = GlobalHotKeyManager::new().map_err(|e| format!("failed to create hotkey manager: {e}"))?;
        let hotkey = HotKey::new(Some(modifiers), code);
        manager
            .register(hotkey)
            .map_err(|e| format!("failed to register hotkey {hotkey_spec}: {e}"))?;

        tracing::info!(hotkey = hotkey_spec, "start/stop hotkey registered");

        std::thread::spawn(move || {
            let receiver = GlobalHotKeyEvent::receiver();
            loop {
                let Ok(event) = receiver.recv() else {
                    break;
                };
                if event.state != HotKeyState::Pressed {
                    continue;
                }
                let correlation_id = format!("hotkey:{}", Uuid::new_v4());
                let _guard = crate::logging::set_correlation_id(correlation_id);

                if stop_flag.is_stopped() {
                    stop_flag.reset();
                    tracing::info!("start/stop hotkey pressed: resuming");
                } else {
                    stop_flag.stop();
                    tracing::info!("start/stop hotkey pressed: stopping");
                }
            }
        });

        Ok(Self { _manager: manager })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_modifier_and_key() {
        let (mods, code) = parse_hotkey("cmd+shift+p").unwrap();
        assert!(mods.contains(Modifiers::META));
        assert!(mods.contains(Modifiers::SHIFT));
        assert_eq!(code, Code::KeyP);
    }

    #[test]
    fn parses_bare_key_with_no_modifiers() {
        let (mods, code) = parse_hotkey("f9").unwrap();
        assert!(mods.is_empty());
        assert_eq!(code, Code::F9);
    }

    #[test]
    fn rejects_unrecognized_key() {
        assert!(parse_hotkey("cmd+nonsense").is_none());
    }

    #[test]
    fn rejects_empty_spec() {
        assert!(parse_hotkey("").is_none());
    }
}
