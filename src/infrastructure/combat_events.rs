//! Broadcast hub fanning combat events out to WebSocket subscribers

use tokio::sync::broadcast;
use tracing::trace;

use crate::application::ports::outbound::CombatEventPort;
use crate::domain::events::CombatEvent;

const CHANNEL_CAPACITY: usize = 256;

pub struct CombatEventHub {
    sender: broadcast::Sender<CombatEvent>,
}

impl CombatEventHub {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CombatEvent> {
        self.sender.subscribe()
    }
}

impl Default for CombatEventHub {
    fn default() -> Self {
        Self::new()
    }
}

impl CombatEventPort for CombatEventHub {
    fn publish(&self, event: CombatEvent) {
        // No subscribers is not an error
        if let Ok(receivers) = self.sender.send(event) {
            trace!(receivers, "Published combat event");
        }
    }
}
