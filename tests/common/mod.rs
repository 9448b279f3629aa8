#![allow(dead_code)]

//! Scripted in-process stand-in for the note service.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use tomboy_menu::config::ServicePreset;
use tomboy_menu::remote::{BusConnection, Connector, NoteRemote, ServiceAddress};
use tomboy_menu::{NoteCatalog, NotesMenu, RemoteCallClient};

#[derive(Default)]
struct FakeState {
    reachable: bool,
    notes: Vec<(String, String)>,
    failing: HashSet<&'static str>,
    malformed: HashSet<&'static str>,
    raised: HashMap<&'static str, &'static str>,
    connects: usize,
    calls: Vec<String>,
}

/// Shared handle to a fake service; clones observe the same state.
#[derive(Clone, Default)]
pub struct FakeService {
    state: Rc<RefCell<FakeState>>,
}

impl FakeService {
    pub fn with_notes(notes: &[(&str, &str)]) -> Self {
        let service = Self::default();
        {
            let mut state = service.state.borrow_mut();
            state.reachable = true;
            state.notes = notes
                .iter()
                .map(|(id, title)| (id.to_string(), title.to_string()))
                .collect();
        }
        service
    }

    pub fn absent() -> Self {
        Self::default()
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.state.borrow_mut().reachable = reachable;
    }

    pub fn fail(&self, method: &'static str) {
        self.state.borrow_mut().failing.insert(method);
    }

    pub fn malform(&self, method: &'static str) {
        self.state.borrow_mut().malformed.insert(method);
    }

    /// Makes `method` answer with the D-Bus error reply `error_name`.
    pub fn raise(&self, method: &'static str, error_name: &'static str) {
        self.state.borrow_mut().raised.insert(method, error_name);
    }

    pub fn recover(&self, method: &'static str) {
        let mut state = self.state.borrow_mut();
        state.failing.remove(method);
        state.malformed.remove(method);
        state.raised.remove(method);
    }

    pub fn connects(&self) -> usize {
        self.state.borrow().connects
    }

    /// Remote calls received so far, as `Method` or `Method(arg)`.
    pub fn calls(&self) -> Vec<String> {
        self.state.borrow().calls.clone()
    }

    pub fn connector(&self) -> FakeConnector {
        FakeConnector {
            service: self.clone(),
        }
    }

    pub fn connection(&self) -> BusConnection<FakeConnector> {
        BusConnection::new(self.connector(), address())
    }

    pub fn client(&self, reconnect_after: u32) -> RemoteCallClient<FakeConnector> {
        RemoteCallClient::new(self.connection()).with_reconnect_after(reconnect_after)
    }

    pub fn catalog(&self) -> NoteCatalog<FakeConnector> {
        NoteCatalog::new(self.client(3))
    }

    pub fn menu(&self) -> NotesMenu<FakeConnector> {
        NotesMenu::new(self.catalog())
    }

    fn record(&self, method: &'static str, arg: Option<&str>) -> zbus::Result<()> {
        let mut state = self.state.borrow_mut();
        state.calls.push(match arg {
            Some(arg) => format!("{method}({arg})"),
            None => method.to_string(),
        });

        if state.failing.contains(method) {
            return Err(zbus::Error::Failure(format!("{method} failed")));
        }
        if state.malformed.contains(method) {
            return Err(zbus::Error::Variant(zbus::zvariant::Error::IncorrectType));
        }
        if let Some(error_name) = state.raised.get(method) {
            return Err(error_reply(method, error_name));
        }
        Ok(())
    }
}

fn error_reply(method: &'static str, error_name: &str) -> zbus::Error {
    let call = zbus::Message::method("/org/gnome/Tomboy/RemoteControl", method)
        .and_then(|builder| builder.build(&()))
        .expect("method call message should build");
    let name = zbus::names::ErrorName::try_from(error_name).expect("valid error name");
    zbus::Error::MethodError(name.into(), Some(format!("{method} refused")), call)
}

pub fn address() -> ServiceAddress {
    ServicePreset::Tomboy.address()
}

pub struct FakeConnector {
    service: FakeService,
}

impl Connector for FakeConnector {
    type Handle = FakeRemote;

    fn connect(&self, _address: &ServiceAddress) -> zbus::Result<FakeRemote> {
        let mut state = self.service.state.borrow_mut();
        state.connects += 1;
        if !state.reachable {
            return Err(zbus::Error::Failure(
                "org.gnome.Tomboy is not registered on the session bus".into(),
            ));
        }
        Ok(FakeRemote {
            service: self.service.clone(),
        })
    }
}

pub struct FakeRemote {
    service: FakeService,
}

impl NoteRemote for FakeRemote {
    fn list_all_notes(&self) -> zbus::Result<Vec<String>> {
        self.service.record("ListAllNotes", None)?;
        let state = self.service.state.borrow();
        Ok(state.notes.iter().map(|(id, _)| id.clone()).collect())
    }

    fn get_note_title(&self, uri: &str) -> zbus::Result<String> {
        self.service.record("GetNoteTitle", Some(uri))?;
        let state = self.service.state.borrow();
        state
            .notes
            .iter()
            .find(|(id, _)| id == uri)
            .map(|(_, title)| title.clone())
            .ok_or_else(|| zbus::Error::Failure(format!("no note {uri}")))
    }

    fn display_note(&self, uri: &str) -> zbus::Result<bool> {
        self.service.record("DisplayNote", Some(uri))?;
        let state = self.service.state.borrow();
        Ok(state.notes.iter().any(|(id, _)| id == uri))
    }

    fn display_search(&self) -> zbus::Result<()> {
        self.service.record("DisplaySearch", None)
    }
}
