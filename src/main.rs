//! Command-line front end for the notes menu.
//!
//! Drives the same code path the panel uses, without a shell.

use anyhow::{bail, Result};
use tracing::error;

use tomboy_menu::{Config, NoteCatalog, NoteId, NotesMenu};

static COMMANDS: &[&str] = &[
    "list : Print every note as <id>\\t<title>.",
    "open <id> : Display a note.",
    "search : Open the search window.",
    "new : Create a new note (not supported yet).",
];

fn main() -> Result<()> {
    init_tracing();

    let config = Config::load();
    let address = config.service_address();
    let mut menu = NotesMenu::new(NoteCatalog::session(&config));

    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        Some("list") => {
            if !menu.on_enable() {
                bail!("note service {} is not available", address.service);
            }
            #[allow(clippy::disallowed_macros)]
            {
                for entry in menu.entries() {
                    println!("{}\t{}", entry.id, entry.title);
                }
            }
        }
        Some("open") => {
            let Some(id) = args.next() else {
                bail!("USAGE: tomboy-menu open <id>");
            };
            menu.activate(&NoteId::from(id));
        }
        Some("search") => menu.search(),
        Some("new") => menu.new_note(),
        Some(other) => {
            error!("Unknown command: {}", other);
        }
        None => {
            #[allow(clippy::disallowed_macros)]
            {
                println!("USAGE: tomboy-menu <command>");
                println!();
                println!("Possible commands are:");
                for c in COMMANDS {
                    println!("\t{}", c);
                }
            }
        }
    }

    menu.on_disable();
    Ok(())
}

fn init_tracing() {
    if let Ok(env_filter) = tracing_subscriber::EnvFilter::try_from_default_env() {
        tracing_subscriber::fmt()
            .compact()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter("info")
            .compact()
            .with_writer(std::io::stderr)
            .init();
    }
}
