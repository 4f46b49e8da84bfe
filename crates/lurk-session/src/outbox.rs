//! Deferred deliveries.
//!
//! World actions run under the world lock and must not touch sockets. They
//! collect what to send, and to whom, in an [`Outbox`]. Dispatching only
//! queues on unbounded channels, so the caller does it before releasing
//! the lock and every player sees frames in the order the world changed.

use lurk_protocol::Message;

use crate::{Player, PlayerSender};

/// Frames waiting to be handed to player writer tasks, in order.
#[derive(Debug, Default)]
pub struct Outbox {
    deliveries: Vec<(PlayerSender, Message)>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `msg` for one player.
    pub fn push(&mut self, to: &Player, msg: Message) {
        self.deliveries.push((to.sender.clone(), msg));
    }

    /// Queues a copy of `msg` for every player yielded by `to`.
    pub fn broadcast<'a>(
        &mut self,
        to: impl IntoIterator<Item = &'a Player>,
        msg: &Message,
    ) {
        for player in to {
            self.push(player, msg.clone());
        }
    }

    /// Appends everything queued in `other`, keeping its order.
    pub fn append(&mut self, mut other: Outbox) {
        self.deliveries.append(&mut other.deliveries);
    }

    pub fn len(&self) -> usize {
        self.deliveries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deliveries.is_empty()
    }

    /// Hands every frame to its writer task.
    ///
    /// Frames for players whose writer has already gone are dropped.
    /// Returns how many were handed over.
    pub fn dispatch(self) -> usize {
        let mut delivered = 0;
        for (sender, msg) in self.deliveries {
            if sender.send(msg).is_ok() {
                delivered += 1;
            }
        }
        delivered
    }
}
