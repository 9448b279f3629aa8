//! Notes menu core for Tomboy and Gnote.
//!
//! Talks to the note application's `RemoteControl` D-Bus interface and turns
//! its notes into plain menu data for a desktop panel.

pub mod catalog;
pub mod config;
pub mod menu;
pub mod remote;

pub use catalog::{NoteCatalog, NoteEntry, NoteId};
pub use config::Config;
pub use menu::{MenuItem, NotesMenu};
pub use remote::{RemoteCallClient, RemoteError};
