use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::SettingError;
use crate::transform::TransformState;

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Setting {
    Opacity,
    Scale,
    Rotation,
    PositionX,
    PositionY,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SliderSpec {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

pub const ALL_SETTINGS: [Setting; 5] = [
    Setting::Opacity,
    Setting::Scale,
    Setting::Rotation,
    Setting::PositionX,
    Setting::PositionY,
];

impl Setting {
    pub fn name(self) -> &'static str {
        match self {
            Setting::Opacity => "opacity",
            Setting::Scale => "scale",
            Setting::Rotation => "rotation",
            Setting::PositionX => "positionX",
            Setting::PositionY => "positionY",
        }
    }

    pub fn slider(self) -> SliderSpec {
        match self {
            Setting::Opacity => SliderSpec {
                min: 0.1,
                max: 1.0,
                step: 0.1,
            },
            Setting::Scale => SliderSpec {
                min: 0.1,
                max: 3.0,
                step: 0.1,
            },
            Setting::Rotation => SliderSpec {
                min: 0.0,
                max: 360.0,
                step: 5.0,
            },
            Setting::PositionX | Setting::PositionY => SliderSpec {
                min: -300.0,
                max: 300.0,
                step: 10.0,
            },
        }
    }

    pub fn parse_value(self, raw: &str) -> Result<f64, SettingError> {
        raw.trim()
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .ok_or_else(|| SettingError::InvalidValue {
                setting: self.name(),
                value: raw.to_string(),
            })
    }

    pub fn read(self, state: &TransformState) -> f64 {
        match self {
            Setting::Opacity => state.opacity(),
            Setting::Scale => state.scale(),
            Setting::Rotation => state.display_rotation(),
            Setting::PositionX => state.position_x(),
            Setting::PositionY => state.position_y(),
        }
    }

    pub fn apply(self, state: &mut TransformState, value: f64) {
        match self {
            Setting::Opacity => state.set_opacity(value),
            Setting::Scale => state.set_scale(value),
            Setting::Rotation => state.set_rotation(value),
            Setting::PositionX => state.set_position_x(value),
            Setting::PositionY => state.set_position_y(value),
        }
    }

    pub fn label(self, state: &TransformState) -> String {
        let value = self.read(state);
        match self {
            Setting::Opacity => format!("Opacity: {value:.1}"),
            Setting::Scale => format!("Scale: {value:.1}x"),
            Setting::Rotation => format!("Rotation: {}°", whole(whole(value) % 360.0)),
            Setting::PositionX => format!("Position X: {}", whole(value)),
            Setting::PositionY => format!("Position Y: {}", whole(value)),
        }
    }
}

// adding zero turns a rounded -0 into 0
fn whole(value: f64) -> f64 {
    value.round() + 0.0
}

impl fmt::Display for Setting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Setting {
    type Err = SettingError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        ALL_SETTINGS
            .into_iter()
            .find(|setting| setting.name() == name)
            .ok_or_else(|| SettingError::UnknownSetting(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_from_str() {
        for setting in ALL_SETTINGS {
            assert_eq!(setting.name().parse::<Setting>(), Ok(setting));
        }
        assert_eq!(
            "zoom".parse::<Setting>(),
            Err(SettingError::UnknownSetting("zoom".into()))
        );
    }

    #[test]
    fn slider_values_go_through_clamping_setters() {
        let mut state = TransformState::default();
        Setting::Scale.apply(&mut state, 7.0);
        Setting::Opacity.apply(&mut state, -2.0);
        Setting::PositionX.apply(&mut state, 900.0);
        assert_eq!(state.scale(), 3.0);
        assert_eq!(state.opacity(), 0.0);
        assert_eq!(state.position_x(), 900.0);
    }

    #[test]
    fn parse_value_rejects_garbage() {
        assert_eq!(Setting::Rotation.parse_value(" 45 "), Ok(45.0));
        assert!(Setting::Rotation.parse_value("NaN").is_err());
        assert!(Setting::Scale.parse_value("").is_err());
    }

    #[test]
    fn labels_match_panel_format() {
        let mut state = TransformState::default();
        state.set_rotation(-45.0);
        state.set_position_y(-12.4);
        assert_eq!(Setting::Opacity.label(&state), "Opacity: 0.5");
        assert_eq!(Setting::Scale.label(&state), "Scale: 1.0x");
        assert_eq!(Setting::Rotation.label(&state), "Rotation: 315°");
        assert_eq!(Setting::PositionY.label(&state), "Position Y: -12");
    }

    #[test]
    fn labels_never_show_negative_zero_or_full_turn() {
        let mut state = TransformState::default();
        state.set_position_x(-0.4);
        state.set_rotation(359.7);
        assert_eq!(Setting::PositionX.label(&state), "Position X: 0");
        assert_eq!(Setting::Rotation.label(&state), "Rotation: 0°");
        state.set_rotation(-0.3);
        assert_eq!(Setting::Rotation.label(&state), "Rotation: 0°");
    }

    #[test]
    fn serde_uses_dom_names() {
        let json = serde_json::to_string(&Setting::PositionX).unwrap();
        assert_eq!(json, "\"positionX\"");
    }
}
