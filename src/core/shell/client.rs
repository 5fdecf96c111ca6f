//! Client bindings and key bindings.

use crate::core::errors::{Result, ShellError};

use super::{ShellEngine, ShellEvent};

/// A global key binding registered by a shell client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyBinding {
    pub client_id: u32,
    /// Client-chosen identity, scoped to the client.
    pub id: u32,
    pub key: u32,
    pub modifiers: u32,
    /// Global registration order; later wins on lookup.
    pub serial: u64,
}

impl KeyBinding {
    pub fn matches(&self, key: u32, modifiers: u32) -> bool {
        self.key == key && self.modifiers == modifiers
    }
}

/// One per client bound to the shell global.
#[derive(Debug, Clone)]
pub struct ClientBinding {
    pub id: u32,
    pub key_bindings: Vec<KeyBinding>,
}

impl ClientBinding {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            key_bindings: Vec::new(),
        }
    }
}

impl ShellEngine {
    pub(crate) fn bind_client(&mut self, client: u32) {
        self.clients
            .entry(client)
            .or_insert_with(|| ClientBinding::new(client));
        tracing::info!("Client {} bound the shell", client);
        self.emit(ShellEvent::Loaded { client });
    }

    /// Release everything a client owned. The lock state is left alone: a
    /// lock outlives the clients that come and go under it.
    pub(crate) fn disconnect_client(&mut self, client: u32) {
        let Some(binding) = self.clients.remove(&client) else {
            return;
        };

        if self.prepare_sent_to.contains(&client) {
            self.prepare_sent_to.retain(|&id| id != client);
            if self.prepare_sent_to.is_empty() {
                tracing::debug!("Last prepare_lock_surface recipient {} left", client);
            }
        }

        for surface in self.registry.surfaces_of_client(client) {
            self.surface_destroyed(surface);
        }

        tracing::info!(
            "Client {} disconnected, released {} key binding(s)",
            client,
            binding.key_bindings.len()
        );
    }

    pub(crate) fn add_key_binding(
        &mut self,
        client: u32,
        id: u32,
        key: u32,
        modifiers: u32,
    ) -> Result<()> {
        self.key_binding_serial += 1;
        let serial = self.key_binding_serial;
        let Some(binding) = self.clients.get_mut(&client) else {
            return Err(ShellError::UnknownClient(client));
        };

        binding.key_bindings.retain(|kb| kb.id != id);
        binding.key_bindings.push(KeyBinding {
            client_id: client,
            id,
            key,
            modifiers,
            serial,
        });
        tracing::debug!(
            "Client {} bound key {} (modifiers {:#x}) as {}",
            client, key, modifiers, id
        );
        Ok(())
    }

    pub(crate) fn remove_key_binding(&mut self, client: u32, id: u32) -> Result<()> {
        let Some(binding) = self.clients.get_mut(&client) else {
            return Err(ShellError::UnknownClient(client));
        };
        binding.key_bindings.retain(|kb| kb.id != id);
        Ok(())
    }

    /// The binding that should fire for a key press: the most recently
    /// registered match across all clients.
    pub fn key_binding_for(&self, key: u32, modifiers: u32) -> Option<KeyBinding> {
        self.clients
            .values()
            .flat_map(|binding| binding.key_bindings.iter())
            .filter(|kb| kb.matches(key, modifiers))
            .max_by_key(|kb| kb.serial)
            .copied()
    }

    pub fn key_bindings(&self) -> Vec<KeyBinding> {
        let mut all: Vec<KeyBinding> = self
            .clients
            .values()
            .flat_map(|binding| binding.key_bindings.iter().copied())
            .collect();
        all.sort_by_key(|kb| kb.serial);
        all
    }
}
