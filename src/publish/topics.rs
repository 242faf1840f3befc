use serde::Serialize;

use crate::readings::ReadingKey;
use crate::reconciler::OutboundEvent;

const DEFAULT_PREFIX: &str = "ws";

/// Station availability, published under `<prefix>/$state`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    Init,
    Ready,
    /// Sent as the broker's last will.
    Lost,
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Init => "init",
            LifecycleState::Ready => "ready",
            LifecycleState::Lost => "lost",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicMessage {
    pub topic: String,
    pub payload: String,
    pub retain: bool,
}

impl TopicMessage {
    fn retained(topic: String, payload: impl Into<String>) -> Self {
        Self {
            topic,
            payload: payload.into(),
            retain: true,
        }
    }
}

/// Maps station output onto topic names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topics {
    prefix: String,
}

impl Default for Topics {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

impl Topics {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn state(&self, state: LifecycleState) -> TopicMessage {
        TopicMessage::retained(format!("{}/$state", self.prefix), state.as_str())
    }

    pub fn units(&self, units: &[(ReadingKey, &'static str)]) -> Vec<TopicMessage> {
        units
            .iter()
            .map(|(key, unit)| TopicMessage::retained(format!("{}/{key}/$unit", self.prefix), *unit))
            .collect()
    }

    pub fn event(&self, event: &OutboundEvent) -> TopicMessage {
        match event {
            OutboundEvent::Reading { key, value, .. } => TopicMessage::retained(
                format!("{}/{key}", self.prefix),
                value.map(|v| v.to_string()).unwrap_or_default(),
            ),
            OutboundEvent::Clock { epoch_seconds } => {
                TopicMessage::retained(format!("{}/dt", self.prefix), epoch_seconds.to_string())
            }
        }
    }
}
