//! Interface layer towards the note application's D-Bus API.
//!
//! [`BusConnection`] owns the proxy, [`RemoteCallClient`] is the single
//! chokepoint every remote call goes through.

use thiserror::Error;
use tracing::{debug, info, warn};

mod connection;
pub mod proxy;

pub use connection::{BusConnection, Connector, ServiceAddress, SessionBus};
pub use proxy::{NoteRemote, RemoteControlProxyBlocking};

/// Consecutive call failures after which the cached handle is dropped.
pub const DEFAULT_RECONNECT_AFTER_FAILURES: u32 = 3;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("note service {service} is not available")]
    ServiceUnavailable { service: String },
    #[error("{method} failed: {source}")]
    CallFailed {
        method: &'static str,
        #[source]
        source: zbus::Error,
    },
    #[error("{method} returned a malformed reply: {detail}")]
    MalformedReply { method: &'static str, detail: String },
    #[error("{method} raised {name}: {}", .detail.as_deref().unwrap_or("no detail"))]
    Remote {
        method: &'static str,
        name: String,
        detail: Option<String>,
    },
}

/// Error replies meaning the service itself is gone rather than refusing
/// the request.
const TRANSPORT_ERRORS: &[&str] = &[
    "org.freedesktop.DBus.Error.ServiceUnknown",
    "org.freedesktop.DBus.Error.NameHasNoOwner",
    "org.freedesktop.DBus.Error.NoReply",
    "org.freedesktop.DBus.Error.Disconnected",
];

pub fn is_transport_error(name: &str) -> bool {
    TRANSPORT_ERRORS.contains(&name)
}

impl RemoteError {
    /// Classifies a zbus error raised while calling `method`.
    pub fn from_call(method: &'static str, err: zbus::Error) -> Self {
        match err {
            zbus::Error::Variant(err) => RemoteError::MalformedReply {
                method,
                detail: err.to_string(),
            },
            zbus::Error::InvalidReply => RemoteError::MalformedReply {
                method,
                detail: "reply does not match the method signature".to_string(),
            },
            zbus::Error::MethodError(name, detail, _) if !is_transport_error(name.as_str()) => {
                RemoteError::Remote {
                    method,
                    name: name.to_string(),
                    detail,
                }
            }
            source => RemoteError::CallFailed { method, source },
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, RemoteError::ServiceUnavailable { .. })
    }
}

/// Issues synchronous calls to the note service.
///
/// Calls block with no timeout. Errors are logged here and handed back as
/// [`RemoteError`]; nothing is retried. After `reconnect_after_failures`
/// consecutive [`RemoteError::CallFailed`] results the handle is invalidated
/// so later calls resolve a fresh one.
pub struct RemoteCallClient<C: Connector> {
    connection: BusConnection<C>,
    reconnect_after_failures: u32,
    consecutive_failures: u32,
}

impl<C: Connector> RemoteCallClient<C> {
    pub fn new(connection: BusConnection<C>) -> Self {
        Self {
            connection,
            reconnect_after_failures: DEFAULT_RECONNECT_AFTER_FAILURES,
            consecutive_failures: 0,
        }
    }

    /// Sets the stale-handle threshold. `0` keeps the handle forever.
    pub fn with_reconnect_after(mut self, failures: u32) -> Self {
        self.reconnect_after_failures = failures;
        self
    }

    pub fn connection(&self) -> &BusConnection<C> {
        &self.connection
    }

    pub fn connection_mut(&mut self) -> &mut BusConnection<C> {
        &mut self.connection
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn list_all_notes(&mut self) -> Result<Vec<String>, RemoteError> {
        self.call(proxy::LIST_ALL_NOTES, |remote| remote.list_all_notes())
    }

    pub fn get_note_title(&mut self, uri: &str) -> Result<String, RemoteError> {
        self.call(proxy::GET_NOTE_TITLE, |remote| remote.get_note_title(uri))
    }

    pub fn display_note(&mut self, uri: &str) -> Result<bool, RemoteError> {
        self.call(proxy::DISPLAY_NOTE, |remote| remote.display_note(uri))
    }

    pub fn display_search(&mut self) -> Result<(), RemoteError> {
        self.call(proxy::DISPLAY_SEARCH, |remote| remote.display_search())
    }

    /// Runs `op` against the service handle as remote method `method`.
    fn call<T, F>(&mut self, method: &'static str, op: F) -> Result<T, RemoteError>
    where
        F: FnOnce(&C::Handle) -> zbus::Result<T>,
    {
        let result = match self.connection.handle() {
            Some(handle) => op(handle),
            None => {
                debug!(method, "Skipping call, note service unavailable");
                return Err(RemoteError::ServiceUnavailable {
                    service: self.connection.address().service.clone(),
                });
            }
        };

        match result {
            Ok(value) => {
                self.consecutive_failures = 0;
                Ok(value)
            }
            Err(err) => {
                let err = RemoteError::from_call(method, err);
                warn!(method, %err, "Remote call failed");
                if let RemoteError::CallFailed { .. } = err {
                    self.record_failure();
                } else {
                    // The service answered, so the handle is still good.
                    self.consecutive_failures = 0;
                }
                Err(err)
            }
        }
    }

    fn record_failure(&mut self) {
        self.consecutive_failures += 1;
        if self.reconnect_after_failures > 0
            && self.consecutive_failures >= self.reconnect_after_failures
        {
            info!(
                failures = self.consecutive_failures,
                service = %self.connection.address().service,
                "Dropping stale note service handle"
            );
            self.connection.invalidate();
            self.consecutive_failures = 0;
        }
    }
}
