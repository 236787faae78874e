use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StartupError {
    #[error("startup registration unavailable: {0}")]
    Unavailable(String),
    #[error("failed to update startup registration: {0}")]
    Update(String),
}

/// OS "run at startup" integration. Only the observed state matters to the core; how
/// the registration is stored belongs to the implementation.
pub trait StartupRegistry: Send {
    fn is_registered(&self) -> Result<bool, StartupError>;
    fn set_registered(&mut self, enabled: bool) -> Result<(), StartupError>;
}

/// Registry held in memory. Used when no OS integration is wired in.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStartup {
    registered: bool,
    updates: u32,
}

impl InMemoryStartup {
    pub fn new(registered: bool) -> Self {
        Self {
            registered,
            updates: 0,
        }
    }

    /// Number of times the registration was actually changed.
    pub fn updates(&self) -> u32 {
        self.updates
    }
}

impl StartupRegistry for InMemoryStartup {
    fn is_registered(&self) -> Result<bool, StartupError> {
        Ok(self.registered)
    }

    fn set_registered(&mut self, enabled: bool) -> Result<(), StartupError> {
        self.registered = enabled;
        self.updates += 1;
        tracing::debug!(enabled, "startup registration updated");
        Ok(())
    }
}
