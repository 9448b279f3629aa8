//! Client proxy for the note application's `RemoteControl` interface.
//!
//! Tomboy and Gnote expose the same interface under different bus names, so
//! the defaults declared here are replaced at build time with the configured
//! [`ServiceAddress`](super::ServiceAddress).

use zbus::{proxy, Result};

pub const LIST_ALL_NOTES: &str = "ListAllNotes";
pub const GET_NOTE_TITLE: &str = "GetNoteTitle";
pub const DISPLAY_NOTE: &str = "DisplayNote";
pub const DISPLAY_SEARCH: &str = "DisplaySearch";

/// D-Bus proxy for `org.gnome.Tomboy.RemoteControl`.
#[proxy(
    interface = "org.gnome.Tomboy.RemoteControl",
    default_service = "org.gnome.Tomboy",
    default_path = "/org/gnome/Tomboy/RemoteControl"
)]
pub trait RemoteControl {
    /// Returns the URIs of every note, in the application's order.
    async fn list_all_notes(&self) -> Result<Vec<String>>;

    async fn get_note_title(&self, uri: &str) -> Result<String>;

    /// Opens the note window. Returns `false` if the note does not exist.
    async fn display_note(&self, uri: &str) -> Result<bool>;

    async fn display_search(&self) -> Result<()>;

    /// Creates an empty note and returns its URI.
    ///
    /// Declared for completeness; the menu's "New note" action never calls it.
    async fn create_note(&self) -> Result<String>;
}

/// Typed, synchronous view of the remote control surface.
///
/// Every method maps one-to-one to a remote method. Implemented by the
/// blocking zbus proxy and by in-process fakes.
pub trait NoteRemote {
    fn list_all_notes(&self) -> Result<Vec<String>>;
    fn get_note_title(&self, uri: &str) -> Result<String>;
    fn display_note(&self, uri: &str) -> Result<bool>;
    fn display_search(&self) -> Result<()>;
}

impl NoteRemote for RemoteControlProxyBlocking<'_> {
    fn list_all_notes(&self) -> Result<Vec<String>> {
        RemoteControlProxyBlocking::list_all_notes(self)
    }

    fn get_note_title(&self, uri: &str) -> Result<String> {
        RemoteControlProxyBlocking::get_note_title(self, uri)
    }

    fn display_note(&self, uri: &str) -> Result<bool> {
        RemoteControlProxyBlocking::display_note(self, uri)
    }

    fn display_search(&self) -> Result<()> {
        RemoteControlProxyBlocking::display_search(self)
    }
}
