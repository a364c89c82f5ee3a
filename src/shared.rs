use std::fmt;

use thiserror::Error;

/// The receiver's view of the link an announcement arrived on.
/// `Origin` means the announcement was created by the AS itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Relationships {
    Providers = 0,
    Peers = 1,
    Customers = 2,
    Origin = 3,
}

impl Relationships {
    /// Gao-Rexford preference score: Origin > Customers > Peers > Providers.
    pub fn preference(&self) -> u8 {
        *self as u8
    }

    /// The other end's view of the same link: my customer sees me as a
    /// provider, peers see each other as peers.
    pub fn invert(&self) -> Self {
        match self {
            Relationships::Providers => Relationships::Customers,
            Relationships::Customers => Relationships::Providers,
            Relationships::Peers => Relationships::Peers,
            Relationships::Origin => Relationships::Origin,
        }
    }
}

impl fmt::Display for Relationships {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Relationships::Providers => "PROVIDERS",
            Relationships::Peers => "PEERS",
            Relationships::Customers => "CUSTOMERS",
            Relationships::Origin => "ORIGIN",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Error)]
pub enum SimulatorError {
    #[error("provider cycle detected in AS relationships")]
    ProviderCycle,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("download failed: {0}")]
    Download(#[from] reqwest::Error),

    #[error("no as-rel2 snapshot found at {0}")]
    SnapshotNotFound(String),
}
