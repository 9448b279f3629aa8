//! Plain-data menu model consumed by the host panel.
//!
//! The host renders [`NotesMenu::items`] however it likes and forwards
//! activations back through [`NotesMenu::activate`], [`NotesMenu::search`]
//! and [`NotesMenu::new_note`].

use tracing::{debug, info};

use crate::catalog::{NoteCatalog, NoteEntry, NoteId};
use crate::remote::Connector;

pub const NEW_NOTE_LABEL: &str = "New note";
pub const SEARCH_LABEL: &str = "Search notes";

/// One row of the notes menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuItem {
    NewNote,
    Separator,
    Note(NoteEntry),
    Search,
}

impl MenuItem {
    pub fn label(&self) -> Option<&str> {
        match self {
            MenuItem::NewNote => Some(NEW_NOTE_LABEL),
            MenuItem::Separator => None,
            MenuItem::Note(entry) => Some(&entry.title),
            MenuItem::Search => Some(SEARCH_LABEL),
        }
    }
}

pub struct NotesMenu<C: Connector> {
    catalog: NoteCatalog<C>,
    entries: Vec<NoteEntry>,
    visible: bool,
}

impl<C: Connector> NotesMenu<C> {
    pub fn new(catalog: NoteCatalog<C>) -> Self {
        Self {
            catalog,
            entries: Vec::new(),
            visible: false,
        }
    }

    pub fn catalog(&self) -> &NoteCatalog<C> {
        &self.catalog
    }

    /// Called when the extension is switched on. Returns whether the menu
    /// should be shown.
    ///
    /// A service that was unavailable before gets one new connection attempt.
    pub fn on_enable(&mut self) -> bool {
        let connection = self.catalog.client_mut().connection_mut();
        if !connection.is_available() {
            connection.reset();
        }
        self.refresh();
        self.visible
    }

    /// Forgets the presentation state. The service connection is kept.
    pub fn on_disable(&mut self) {
        self.entries.clear();
        self.visible = false;
    }

    /// Reloads the notes from the service.
    pub fn refresh(&mut self) -> Vec<NoteEntry> {
        self.entries.clear();

        match self.catalog.try_list_notes() {
            Ok(ids) => {
                self.visible = true;
                self.entries = self.catalog.entries_for(ids);
                debug!(count = self.entries.len(), "Notes menu refreshed");
            }
            Err(err) if err.is_unavailable() => {
                if self.visible {
                    info!("Note service not available, hiding notes menu");
                }
                self.visible = false;
            }
            // Already logged by the call client; show the menu without notes.
            Err(_) => self.visible = true,
        }

        self.entries.clone()
    }

    pub fn activate(&mut self, id: &NoteId) {
        self.catalog.open_note(id);
    }

    pub fn search(&mut self) {
        self.catalog.run_search();
    }

    pub fn new_note(&mut self) {
        self.catalog.create_note();
    }

    pub fn entries(&self) -> &[NoteEntry] {
        &self.entries
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    /// Menu rows in display order. Empty while the menu is hidden.
    pub fn items(&self) -> Vec<MenuItem> {
        if !self.visible {
            return Vec::new();
        }

        let mut items = Vec::with_capacity(self.entries.len() + 4);
        items.push(MenuItem::NewNote);
        items.push(MenuItem::Separator);
        items.extend(self.entries.iter().cloned().map(MenuItem::Note));
        items.push(MenuItem::Separator);
        items.push(MenuItem::Search);
        items
    }
}
