use std::fmt::Display;

use log::trace;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::transport::Transport;

/// Opaque identifier of a transfer handle, minted by a [`Transport`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HandleId(Uuid);

impl HandleId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for HandleId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for HandleId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Display for HandleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Scoped ownership of an open handle. The handle is closed on the
/// transport when the guard goes out of scope, on every exit path.
pub struct HandleGuard<'t> {
    transport: &'t dyn Transport,
    id: HandleId,
}

impl<'t> HandleGuard<'t> {
    /// Opens a handle for `url`. Returns `None` when the transport reports
    /// the init failure sentinel.
    pub fn open(transport: &'t dyn Transport, url: Option<&str>) -> Option<Self> {
        let id = transport.init(url)?;
        trace!("opened handle {id}");
        Some(Self { transport, id })
    }

    pub fn id(&self) -> HandleId {
        self.id
    }
}

impl Drop for HandleGuard<'_> {
    fn drop(&mut self) {
        trace!("closing handle {}", self.id);
        self.transport.close(self.id);
    }
}
