use serde::Serialize;

/// Reachability of the backing services.
#[must_use]
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Readiness {
    pub postgres: bool,
    pub nats: bool,
}

impl Readiness {
    /// Returns `true` if every backing service answered.
    #[inline]
    pub fn is_ready(&self) -> bool {
        self.postgres && self.nats
    }
}
