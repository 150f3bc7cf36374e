use super::types::Message;
use parking_lot::RwLock;
use std::sync::Arc;
use uuid::Uuid;

/// In-memory conversation for the current session, in display order
#[derive(Debug, Clone)]
pub struct MessageStorage {
    messages: Arc<RwLock<Vec<Message>>>,
}

impl MessageStorage {
    pub fn new() -> Self {
        Self {
            messages: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn add(&self, message: Message) {
        self.messages.write().push(message);
    }

    /// Append a user message and its reply as one step
    pub fn add_exchange(&self, user: Message, reply: Message) {
        let mut messages = self.messages.write();
        messages.push(user);
        messages.push(reply);
    }

    pub fn get_all(&self) -> Vec<Message> {
        self.messages.read().clone()
    }

    pub fn get(&self, id: Uuid) -> Option<Message> {
        self.messages.read().iter().find(|m| m.id == id).cloned()
    }

    /// Remove the message with `id`, keeping the order of the rest.
    /// Returns false when no such message exists.
    pub fn remove(&self, id: Uuid) -> bool {
        let mut messages = self.messages.write();
        match messages.iter().position(|m| m.id == id) {
            Some(index) => {
                messages.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn clear(&self) {
        self.messages.write().clear();
    }

    pub fn len(&self) -> usize {
        self.messages.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.read().is_empty()
    }
}

impl Default for MessageStorage {
    fn default() -> Self {
        Self::new()
    }
}
