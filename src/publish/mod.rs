//! Topic layout for broadcasting readings, and a publisher that only logs.
//!
//! A broker client would implement [`DownstreamListener`] the same way
//! [`LoggingPublisher`] does and send each [`TopicMessage`] retained.

mod topics;

pub use topics::{LifecycleState, TopicMessage, Topics};

use crate::readings::ReadingKey;
use crate::reconciler::{DownstreamListener, OutboundEvent};

const ENABLE_LOGS: bool = true;

use crate::log_info;

pub struct LoggingPublisher {
    topics: Topics,
}

impl LoggingPublisher {
    pub fn new(topics: Topics) -> Self {
        Self { topics }
    }

    pub fn topics(&self) -> &Topics {
        &self.topics
    }

    pub fn announce(&self, state: LifecycleState) {
        emit(&self.topics.state(state));
    }

    pub fn announce_units(&self, units: &[(ReadingKey, &'static str)]) {
        for message in self.topics.units(units) {
            emit(&message);
        }
    }
}

impl DownstreamListener for LoggingPublisher {
    fn publish(&self, events: &[OutboundEvent]) {
        for event in events {
            emit(&self.topics.event(event));
        }
    }
}

fn emit(message: &TopicMessage) {
    log_info!(
        "publish {} = {}{}",
        message.topic,
        message.payload,
        if message.retain { " (retained)" } else { "" }
    );
}
