//! Lazily resolved handle to the note service on the session bus.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use zbus::blocking::fdo::DBusProxy;
use zbus::blocking::Connection;
use zbus::names::BusName;
use zbus::CacheProperties;

use super::proxy::{NoteRemote, RemoteControlProxyBlocking};

/// Bus name, object path and interface name of a remote control service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceAddress {
    pub service: String,
    pub path: String,
    pub interface: String,
}

impl ServiceAddress {
    pub fn new(
        service: impl Into<String>,
        path: impl Into<String>,
        interface: impl Into<String>,
    ) -> Self {
        Self {
            service: service.into(),
            path: path.into(),
            interface: interface.into(),
        }
    }
}

/// Produces a service handle for an address.
pub trait Connector {
    type Handle: NoteRemote;

    fn connect(&self, address: &ServiceAddress) -> zbus::Result<Self::Handle>;
}

/// Connects to the real session bus.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionBus;

impl Connector for SessionBus {
    type Handle = RemoteControlProxyBlocking<'static>;

    fn connect(&self, address: &ServiceAddress) -> zbus::Result<Self::Handle> {
        let connection = Connection::session()?;
        ensure_registered(&connection, &address.service)?;

        // No property cache means no PropertiesChanged match rule: this
        // client only issues calls.
        RemoteControlProxyBlocking::builder(&connection)
            .destination(address.service.clone())?
            .path(address.path.clone())?
            .interface(address.interface.clone())?
            .cache_properties(CacheProperties::No)
            .build()
    }
}

/// Fails unless the name is owned or can be activated by the bus.
fn ensure_registered(connection: &Connection, service: &str) -> zbus::Result<()> {
    let dbus = DBusProxy::new(connection)?;
    let name = BusName::try_from(service)?;

    if dbus.name_has_owner(name)? {
        return Ok(());
    }

    let activatable = dbus.list_activatable_names()?;
    if activatable.iter().any(|owned| owned.as_str() == service) {
        debug!(service, "Note service is not running but can be activated");
        return Ok(());
    }

    Err(zbus::Error::Failure(format!(
        "{service} is not registered on the session bus"
    )))
}

enum HandleState<H> {
    Unresolved,
    Ready(H),
    /// First connection attempt failed; sticky until `reset()`.
    Unavailable,
    /// A handle existed before and the service went away; every `handle()`
    /// tries to reconnect.
    Lost,
}

/// Owns the single handle to the note service.
///
/// The first [`handle`](Self::handle) call connects. A success is cached for
/// the lifetime of the value. A failure on first use is remembered too, and
/// later calls short-circuit without reconnecting until [`reset`](Self::reset).
/// Once a handle has been obtained, [`invalidate`](Self::invalidate) drops it
/// and reconnection is attempted on every later call until one succeeds.
pub struct BusConnection<C: Connector> {
    connector: C,
    address: ServiceAddress,
    state: HandleState<C::Handle>,
    resolved_once: bool,
}

impl<C: Connector> BusConnection<C> {
    pub fn new(connector: C, address: ServiceAddress) -> Self {
        Self {
            connector,
            address,
            state: HandleState::Unresolved,
            resolved_once: false,
        }
    }

    pub fn address(&self) -> &ServiceAddress {
        &self.address
    }

    /// Returns the cached handle, connecting on first use.
    pub fn handle(&mut self) -> Option<&C::Handle> {
        if matches!(self.state, HandleState::Unresolved | HandleState::Lost) {
            self.connect();
        }

        match &self.state {
            HandleState::Ready(handle) => Some(handle),
            _ => None,
        }
    }

    fn connect(&mut self) {
        let was_lost = matches!(self.state, HandleState::Lost);
        self.state = match self.connector.connect(&self.address) {
            Ok(handle) => {
                info!(
                    service = %self.address.service,
                    path = %self.address.path,
                    "Connected to note service"
                );
                self.resolved_once = true;
                HandleState::Ready(handle)
            }
            Err(err) if was_lost => {
                debug!(service = %self.address.service, %err, "Note service still gone");
                HandleState::Lost
            }
            Err(err) => {
                warn!(
                    service = %self.address.service,
                    %err,
                    "Note service RemoteControl interface not available"
                );
                if self.resolved_once {
                    HandleState::Lost
                } else {
                    HandleState::Unavailable
                }
            }
        };
    }

    /// False once a first connection attempt has failed and no reset
    /// happened since.
    pub fn is_available(&self) -> bool {
        !matches!(self.state, HandleState::Unavailable)
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.state, HandleState::Ready(_))
    }

    /// Drops a handle that stopped answering. If a handle was ever obtained,
    /// failed reconnects keep retrying instead of becoming sticky.
    pub fn invalidate(&mut self) {
        debug!(service = %self.address.service, "Dropping note service handle");
        self.state = if self.resolved_once {
            HandleState::Lost
        } else {
            HandleState::Unresolved
        };
    }

    /// Forgets the cached handle or failure; the next `handle()` reconnects.
    pub fn reset(&mut self) {
        if !matches!(self.state, HandleState::Unresolved) {
            debug!(service = %self.address.service, "Resetting note service handle");
        }
        self.state = HandleState::Unresolved;
    }
}
