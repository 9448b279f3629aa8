//! Note catalog built on top of the remote call client.

use std::fmt;

use tracing::debug;

use crate::config::Config;
use crate::remote::{BusConnection, Connector, RemoteCallClient, RemoteError, SessionBus};

/// Opaque note identifier handed out by the note service.
///
/// Usually a URI such as `note://tomboy/<uuid>`, never parsed locally.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NoteId(String);

impl NoteId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for NoteId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for NoteId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A note as presented in the menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteEntry {
    pub id: NoteId,
    pub title: String,
}

impl NoteEntry {
    pub fn new(id: impl Into<NoteId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }
}

/// Translates note actions into remote calls.
///
/// Holds no state of its own besides the client; every call goes to the
/// service and failures degrade to safe defaults.
pub struct NoteCatalog<C: Connector> {
    client: RemoteCallClient<C>,
}

impl NoteCatalog<SessionBus> {
    /// Catalog talking to the configured service on the session bus.
    pub fn session(config: &Config) -> Self {
        let connection = BusConnection::new(SessionBus, config.service_address());
        let client =
            RemoteCallClient::new(connection).with_reconnect_after(config.reconnect_after_failures);
        Self::new(client)
    }
}

impl<C: Connector> NoteCatalog<C> {
    pub fn new(client: RemoteCallClient<C>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &RemoteCallClient<C> {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut RemoteCallClient<C> {
        &mut self.client
    }

    /// Lists note identifiers, keeping the error so callers can tell an
    /// absent service from an empty notebook.
    pub fn try_list_notes(&mut self) -> Result<Vec<NoteId>, RemoteError> {
        let ids = self.client.list_all_notes()?;
        Ok(ids.into_iter().map(NoteId::from).collect())
    }

    /// Lists note identifiers in service order; empty on any failure.
    pub fn list_notes(&mut self) -> Vec<NoteId> {
        self.try_list_notes().unwrap_or_default()
    }

    /// Returns the note title, or the identifier if the title is unavailable.
    pub fn title_for(&mut self, id: &NoteId) -> String {
        match self.client.get_note_title(id.as_str()) {
            Ok(title) if !title.is_empty() => title,
            Ok(_) => {
                debug!(%id, "Note has an empty title, using its identifier");
                id.to_string()
            }
            Err(_) => id.to_string(),
        }
    }

    /// Resolves titles for `ids`, preserving order.
    pub fn entries_for(&mut self, ids: Vec<NoteId>) -> Vec<NoteEntry> {
        ids.into_iter()
            .map(|id| {
                let title = self.title_for(&id);
                NoteEntry { id, title }
            })
            .collect()
    }

    pub fn entries(&mut self) -> Vec<NoteEntry> {
        let ids = self.list_notes();
        self.entries_for(ids)
    }

    pub fn open_note(&mut self, id: &NoteId) {
        if let Ok(false) = self.client.display_note(id.as_str()) {
            debug!(%id, "Note service does not know this note");
        }
    }

    pub fn run_search(&mut self) {
        let _ = self.client.display_search();
    }

    /// Placeholder for the "New note" action. Issues no remote call.
    pub fn create_note(&mut self) {
        debug!("Create note requested, not supported yet");
    }
}
