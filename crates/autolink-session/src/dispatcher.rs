//! Turns decoded MCU events into actions.
//!
//! The dispatcher never blocks: every action is handed to its own thread.
//! Button state follows `idle -> clicked | held -> idle`; a hold only ends
//! when RELEASE arrives.

use std::sync::Arc;

use autolink_mcu_protocol::{McuCommand, McuMessage};
use crossbeam_channel::{Receiver, Sender};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, trace, warn};

use crate::actions::{Action, ActionContext};
use crate::buttons::{find_mapping, ButtonMapping, Gesture};

/// Raw readings reported while learning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LearnEvent {
    Click(i32),
    Dimmer(bool),
    DimmerLevel(i32),
}

pub struct CommandDispatcher {
    name: String,
    buttons: RwLock<Vec<ButtonMapping>>,
    context: Arc<ActionContext>,
    broadcast_custom: bool,
    learn: Mutex<Option<Sender<LearnEvent>>>,
}

impl CommandDispatcher {
    pub fn new(
        name: &str,
        buttons: Vec<ButtonMapping>,
        broadcast_custom: bool,
        context: Arc<ActionContext>,
    ) -> Self {
        CommandDispatcher {
            name: name.to_string(),
            buttons: RwLock::new(buttons),
            context,
            broadcast_custom,
            learn: Mutex::new(None),
        }
    }

    pub fn context(&self) -> &Arc<ActionContext> {
        &self.context
    }

    /// Replace the button mappings.
    pub fn set_buttons(&self, buttons: Vec<ButtonMapping>) {
        *self.buttons.write() = buttons;
    }

    pub fn buttons(&self) -> Vec<ButtonMapping> {
        self.buttons.read().clone()
    }

    /// Forward raw button and dimmer readings instead of running actions.
    pub fn start_learning(&self) -> Receiver<LearnEvent> {
        let (tx, rx) = crossbeam_channel::unbounded();
        *self.learn.lock() = Some(tx);
        info!("Dispatcher[{}]: learning mode on", self.name);
        rx
    }

    pub fn stop_learning(&self) {
        if self.learn.lock().take().is_some() {
            info!("Dispatcher[{}]: learning mode off", self.name);
        }
    }

    pub fn is_learning(&self) -> bool {
        self.learn.lock().is_some()
    }

    /// Send to the learn channel if learning. Returns whether the event was consumed.
    fn learned(&self, event: LearnEvent) -> bool {
        let mut learn = self.learn.lock();
        let Some(tx) = learn.as_ref() else {
            return false;
        };
        if tx.send(event).is_err() {
            debug!("Dispatcher[{}]: learn receiver gone", self.name);
            *learn = None;
            return false;
        }
        true
    }

    /// Action bound to `reading` for `gesture`, if any.
    pub fn resolve(&self, reading: i32, gesture: Gesture) -> Option<Action> {
        let buttons = self.buttons.read();
        match find_mapping(&buttons, reading) {
            Some(button) => button.action(gesture),
            None => {
                info!("Dispatcher[{}]: button is not mapped for value {}", self.name, reading);
                None
            }
        }
    }

    /// Handle one event from the MCU and return the action started for it.
    ///
    /// STARTED, IDENT and the radio events belong to the session and are
    /// ignored here.
    pub fn dispatch(&self, message: &McuMessage) -> Option<Action> {
        let value = &message.value;
        let action = match message.command {
            McuCommand::Click | McuCommand::Hold => {
                let Some(reading) = value.as_int() else {
                    warn!("Dispatcher[{}]: {} without a reading", self.name, message.command);
                    return None;
                };
                let held = message.command == McuCommand::Hold;
                if !held && self.learned(LearnEvent::Click(reading)) {
                    return None;
                }
                self.context.hold().set(held);
                let gesture = if held { Gesture::Hold } else { Gesture::Click };
                self.resolve(reading, gesture)?
            }
            McuCommand::Release => {
                self.context.hold().set(false);
                return None;
            }
            McuCommand::Dimmer => {
                let on = value.as_bool()?;
                if self.learned(LearnEvent::Dimmer(on)) {
                    return None;
                }
                Action::Dimmer(on)
            }
            McuCommand::DimmerLevel => {
                let reading = value.as_int()?;
                if self.learned(LearnEvent::DimmerLevel(reading)) {
                    return None;
                }
                Action::DimmerLevel(reading)
            }
            McuCommand::Reverse => Action::Reverse(value.as_bool()?),
            McuCommand::Custom => {
                let data = value.as_bytes()?;
                if !self.broadcast_custom {
                    trace!("Dispatcher[{}]: custom broadcast disabled", self.name);
                    return None;
                }
                let (&command, rest) = data.split_first()?;
                Action::Custom {
                    command,
                    data: rest.to_vec(),
                }
            }
            McuCommand::Log => {
                info!(target: "mcu", "{}", value);
                return None;
            }
            other => {
                trace!("Dispatcher[{}]: ignoring {}", self.name, other);
                return None;
            }
        };

        debug!("Dispatcher[{}]: {} -> {}", self.name, message.command, action);
        self.context.spawn(action.clone());
        Some(action)
    }
}
