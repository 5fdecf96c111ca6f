//! Popup grab coordination.
//!
//! A grabber gives one popup surface (and its descendants) pointer and
//! keyboard input until it is dismissed or the popup goes away. Grabs are
//! scoped to a chain: the non-popup surface at the root of the popup's
//! parent links. Each chain holds at most one grabber.
//!
//! Surfaces never own their grabber. The popup → grabber relation is an
//! index keyed by surface id, cleared whenever either side goes away.

use std::collections::HashMap;

use crate::core::errors::{Result, ShellError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopupGrabber {
    pub popup: u32,
    pub parent: u32,
    /// Root surface of the grab chain.
    pub chain: u32,
}

#[derive(Debug, Default)]
pub struct PopupGrabCoordinator {
    /// Active grabbers keyed by chain root.
    grabbers: HashMap<u32, PopupGrabber>,
    /// popup surface -> chain root
    by_popup: HashMap<u32, u32>,
}

impl PopupGrabCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the chain root for a surface by following active popups up
    /// to their parents.
    pub fn chain_root(&self, surface_id: u32) -> u32 {
        self.by_popup.get(&surface_id).copied().unwrap_or(surface_id)
    }

    /// Start a grab for `popup`, parented to `parent`.
    ///
    /// Refused with [`ShellError::GrabConflict`] when the chain already has an
    /// active grabber. A refused popup must not be shown.
    pub fn attach(&mut self, popup: u32, parent: u32) -> Result<PopupGrabber> {
        let chain = self.chain_root(parent);

        if let Some(active) = self.grabbers.get(&chain) {
            tracing::warn!(
                "Popup {} refused: chain {} already grabbed by popup {}",
                popup, chain, active.popup
            );
            return Err(ShellError::GrabConflict {
                chain,
                active: active.popup,
                requested: popup,
            });
        }

        let grabber = PopupGrabber { popup, parent, chain };
        self.grabbers.insert(chain, grabber);
        self.by_popup.insert(popup, chain);
        tracing::debug!("Popup {} grabbed chain {}", popup, chain);
        Ok(grabber)
    }

    /// Release the grab held by `popup`. Safe to call repeatedly.
    pub fn dismiss(&mut self, popup: u32) -> Option<PopupGrabber> {
        let chain = self.by_popup.remove(&popup)?;
        let grabber = self.grabbers.remove(&chain);
        if grabber.is_some() {
            tracing::debug!("Popup {} released chain {}", popup, chain);
        }
        grabber
    }

    /// Drop whatever grab involves a destroyed surface, either as the popup
    /// or as the root of its chain.
    pub fn surface_destroyed(&mut self, surface_id: u32) -> Option<PopupGrabber> {
        if let Some(grabber) = self.dismiss(surface_id) {
            return Some(grabber);
        }
        let grabber = self.grabbers.remove(&surface_id)?;
        self.by_popup.remove(&grabber.popup);
        tracing::debug!(
            "Chain {} destroyed, releasing popup {}",
            surface_id, grabber.popup
        );
        Some(grabber)
    }

    /// The grabber a popup surface holds, if any.
    pub fn grabber_for(&self, popup: u32) -> Option<&PopupGrabber> {
        self.by_popup
            .get(&popup)
            .and_then(|chain| self.grabbers.get(chain))
    }

    /// The grabber active on the chain containing `surface_id`.
    pub fn active_grab(&self, surface_id: u32) -> Option<&PopupGrabber> {
        self.grabbers.get(&self.chain_root(surface_id))
    }

    /// Popups holding a grab, in ascending id order.
    pub fn popups(&self) -> Vec<u32> {
        let mut popups: Vec<u32> = self.by_popup.keys().copied().collect();
        popups.sort_unstable();
        popups
    }

    pub fn is_grabbing(&self, popup: u32) -> bool {
        self.by_popup.contains_key(&popup)
    }

    pub fn len(&self) -> usize {
        self.grabbers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grabbers.is_empty()
    }
}
