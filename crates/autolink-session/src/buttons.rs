//! Steering-wheel button mappings.
//!
//! The MCU reports a button as a raw resistor-ladder reading. A mapping
//! matches every reading within `id ± tolerance`; the first matching
//! mapping in the configured order wins.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::actions::Action;

/// How the action string of a mapping is interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
    /// Nothing happens.
    #[default]
    None,
    /// One of the built-in actions, named by [`Action::from_name`].
    #[serde(rename = "Built-In")]
    BuiltIn,
    /// Launch the application named by the action string.
    Application,
    /// Run the automation task named by the action string.
    Tasker,
    /// Switch to the audio source named by the action string.
    #[serde(rename = "Set Audio Source")]
    SetAudioSource,
}

/// Which gesture selected the action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    Click,
    Hold,
}

/// One button entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ButtonMapping {
    /// Nominal reading of the button.
    pub id: i32,
    /// Accepted deviation from `id`.
    pub tolerance: i32,
    /// Scale `tolerance` by ten, for noisy ladders.
    pub tolerance_is_multiplied: bool,
    pub click_action: String,
    pub click_action_type: ActionType,
    pub hold_action: String,
    pub hold_action_type: ActionType,
}

impl ButtonMapping {
    /// Mapping with only a click action.
    pub fn click(id: i32, tolerance: i32, action_type: ActionType, action: &str) -> Self {
        ButtonMapping {
            id,
            tolerance,
            click_action: action.to_string(),
            click_action_type: action_type,
            ..Default::default()
        }
    }

    /// Add a hold action.
    pub fn with_hold(mut self, action_type: ActionType, action: &str) -> Self {
        self.hold_action = action.to_string();
        self.hold_action_type = action_type;
        self
    }

    pub fn effective_tolerance(&self) -> i32 {
        if self.tolerance_is_multiplied {
            self.tolerance.saturating_mul(10)
        } else {
            self.tolerance
        }
    }

    /// Whether `reading` falls inside this button's range.
    pub fn matches(&self, reading: i32) -> bool {
        let tolerance = self.effective_tolerance().abs();
        reading >= self.id.saturating_sub(tolerance) && reading <= self.id.saturating_add(tolerance)
    }

    /// Resolve the action bound to `gesture`.
    pub fn action(&self, gesture: Gesture) -> Option<Action> {
        let (action_type, name) = match gesture {
            Gesture::Click => (self.click_action_type, &self.click_action),
            Gesture::Hold => (self.hold_action_type, &self.hold_action),
        };
        match action_type {
            ActionType::None => None,
            ActionType::Application => Some(Action::Application(name.clone())),
            ActionType::Tasker => Some(Action::Tasker(name.clone())),
            ActionType::SetAudioSource => Some(Action::SetAudioSource(name.clone())),
            ActionType::BuiltIn => {
                let action = Action::from_name(name);
                if action.is_none() {
                    warn!("Unknown built-in action {:?} for button {}", name, self.id);
                }
                action
            }
        }
    }
}

/// First mapping whose range contains `reading`.
pub fn find_mapping(buttons: &[ButtonMapping], reading: i32) -> Option<&ButtonMapping> {
    buttons.iter().find(|b| b.matches(reading))
}
