//! Session lifecycle state machine.
//!
//! A session moves from `uninitialized` through `initialized` and
//! `shutting_down` to `exited`. [`Session::admit`] decides whether a command
//! is legal without changing anything; the dispatcher applies the returned
//! [`Transition`] with [`Session::commit`] once the command has been handled.

use strum::Display;

use crate::command::Command;
use crate::errors::LifecycleError;

/// Lifecycle states of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Lifecycle {
    /// Waiting for `initialize`.
    #[default]
    Uninitialized,
    /// Serving document and text commands.
    Initialized,
    /// `shutdown` has been answered; only `exit` is expected.
    ShuttingDown,
    /// `exit` has been received.
    Exited,
}

/// State change produced by an admitted command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Enter [`Lifecycle::Initialized`] and remember the workspace.
    Initialize {
        /// Workspace root announced by the client.
        workspace_root: Option<String>,
        /// Client name, for diagnostics.
        client_name: Option<String>,
    },
    /// Keep the current state.
    Remain,
    /// Enter [`Lifecycle::ShuttingDown`] and allow a clean exit.
    Shutdown,
    /// Enter [`Lifecycle::Exited`].
    Exit,
}

/// How the session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionExit {
    /// `exit` followed a `shutdown`.
    Clean,
    /// `exit` arrived without `shutdown`, or the input ended first.
    Unclean,
}

impl SessionExit {
    /// Process exit code for this outcome.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Clean => 0,
            Self::Unclean => 1,
        }
    }
}

/// Per-connection lifecycle state.
#[derive(Debug, Clone, Default)]
pub struct Session {
    lifecycle: Lifecycle,
    can_exit: bool,
    workspace_root: Option<String>,
    client_name: Option<String>,
}

impl Session {
    /// Creates a session awaiting `initialize`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// Whether `exit` would end the session cleanly.
    #[must_use]
    pub const fn can_exit(&self) -> bool {
        self.can_exit
    }

    /// Workspace root announced during `initialize`.
    #[must_use]
    pub fn workspace_root(&self) -> Option<&str> {
        self.workspace_root.as_deref()
    }

    /// Client name announced during `initialize`.
    #[must_use]
    pub fn client_name(&self) -> Option<&str> {
        self.client_name.as_deref()
    }

    /// Checks whether `command` is legal in the current state.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::ServerNotInitialized`] for anything but
    /// `initialize` or `exit` before initialisation, and
    /// [`LifecycleError::InvalidTransition`] for commands that are illegal in
    /// the current state.
    pub fn admit(&self, command: &Command) -> Result<Transition, LifecycleError> {
        let method = command.method();
        let invalid = || LifecycleError::InvalidTransition {
            method,
            state: self.lifecycle,
        };

        match (self.lifecycle, command) {
            (_, Command::Exit) => Ok(Transition::Exit),
            (Lifecycle::Exited, _) => Err(invalid()),
            (Lifecycle::Uninitialized, Command::Initialize { params, .. }) => {
                Ok(Transition::Initialize {
                    workspace_root: params.root_uri.clone().or_else(|| params.root_path.clone()),
                    client_name: params.client_info.as_ref().map(|info| info.name.clone()),
                })
            }
            (Lifecycle::Uninitialized, _) => {
                Err(LifecycleError::ServerNotInitialized { method })
            }
            (Lifecycle::Initialized | Lifecycle::ShuttingDown, Command::Shutdown { .. }) => {
                Ok(Transition::Shutdown)
            }
            (Lifecycle::Initialized, Command::Initialize { .. }) | (Lifecycle::ShuttingDown, _) => {
                Err(invalid())
            }
            (Lifecycle::Initialized, _) => Ok(Transition::Remain),
        }
    }

    /// Applies an admitted transition.
    ///
    /// Returns the session outcome once the transition ends the session.
    pub fn commit(&mut self, transition: Transition) -> Option<SessionExit> {
        match transition {
            Transition::Initialize {
                workspace_root,
                client_name,
            } => {
                self.lifecycle = Lifecycle::Initialized;
                self.workspace_root = workspace_root;
                self.client_name = client_name;
                None
            }
            Transition::Remain => None,
            Transition::Shutdown => {
                self.lifecycle = Lifecycle::ShuttingDown;
                self.can_exit = true;
                None
            }
            Transition::Exit => {
                self.lifecycle = Lifecycle::Exited;
                Some(if self.can_exit {
                    SessionExit::Clean
                } else {
                    SessionExit::Unclean
                })
            }
        }
    }
}
