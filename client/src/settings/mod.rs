use crate::action::Action;
use bevy::prelude::*;
use leafwing_input_manager::prelude::*;
use serde::{Deserialize, Serialize};

#[cfg(not(target_family = "wasm"))]
mod native;
#[cfg(not(target_family = "wasm"))]
pub use native::*;

#[derive(Default, Deserialize)]
struct PartialClientSettings {
    mouse_sensitivity: Option<f32>,
}
impl PartialClientSettings {
    pub fn is_incomplete(&self) -> bool {
        self.mouse_sensitivity.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Resource)]
#[serde(from = "PartialClientSettings")]
pub struct ClientSettings {
    pub mouse_sensitivity: f32,
}
impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            mouse_sensitivity: 0.01,
        }
    }
}
impl From<PartialClientSettings> for ClientSettings {
    fn from(value: PartialClientSettings) -> Self {
        Self {
            mouse_sensitivity: value.mouse_sensitivity.unwrap_or(0.01),
        }
    }
}

#[derive(Serialize)]
struct SerializeShim<'a> {
    settings: &'a ClientSettings,
    input: &'a InputMap<Action>,
}

#[derive(Deserialize)]
struct DeserializeShim {
    settings: Option<PartialClientSettings>,
    input: Option<InputMap<Action>>,
}

/// Parse the settings file. An error here means the stored bindings are
/// discarded wholesale; the caller logs it and falls back to the default
/// binding layer.
fn parse_settings(data: &str) -> Result<DeserializeShim, toml::de::Error> {
    toml::from_str(data)
}

/// The default binding layer. User bindings from the settings file were
/// applied first and win; this fills whatever they left open. Returns
/// whether anything was added.
pub fn fill_keybinds(map: &mut InputMap<Action>) -> bool {
    let mut needs_write = false;
    if map.get_dual_axislike(&Action::Move).is_none() {
        map.insert_dual_axis(Action::Move, VirtualDPad::wasd());
        needs_write = true;
    }
    if map.get_dual_axislike(&Action::Look).is_none() {
        map.insert_dual_axis(Action::Look, MouseMove::default());
        needs_write = true;
    }
    if map.get_buttonlike(&Action::Jump).is_none() {
        map.insert(Action::Jump, KeyCode::Space);
        needs_write = true;
    }
    if map.get_buttonlike(&Action::Sprint).is_none() {
        map.insert(Action::Sprint, KeyCode::ShiftLeft);
        needs_write = true;
    }
    needs_write
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_every_action_once() {
        let mut map = InputMap::default();
        assert!(fill_keybinds(&mut map));
        assert!(map.get_dual_axislike(&Action::Move).is_some());
        assert!(map.get_dual_axislike(&Action::Look).is_some());
        assert!(map.get_buttonlike(&Action::Jump).is_some());
        assert!(map.get_buttonlike(&Action::Sprint).is_some());
        // already complete, nothing else to add
        assert!(!fill_keybinds(&mut map));
    }

    #[test]
    fn partial_settings_fall_back_to_defaults() {
        let parsed = parse_settings("[settings]\n").unwrap();
        let settings = parsed
            .settings
            .map_or_else(ClientSettings::default, ClientSettings::from);
        assert_eq!(
            settings.mouse_sensitivity,
            ClientSettings::default().mouse_sensitivity
        );
        assert!(parsed.input.is_none());
    }

    #[test]
    fn corrupt_settings_store_zero_bindings() {
        let res = parse_settings("input = \"definitely not an input map\"");
        assert!(res.is_err());
    }
}
