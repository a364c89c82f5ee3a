use std::sync::Arc;

use crate::as_graph::ASN;
use crate::shared::Relationships;

/// Prefixes are opaque text keys ("10.0.0.0/24"). Two announcements share a
/// prefix iff the strings are equal; there is no longest-match logic.
/// `Arc<str>` so the many copies made during propagation share one buffer.
pub type Prefix = Arc<str>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announcement {
    pub prefix: Prefix,
    /// Leftmost entry is the most recent hop, rightmost is the origin.
    pub as_path: Vec<ASN>,
    /// The ASN this announcement was obtained from. Equals the origin ASN
    /// for origin announcements.
    pub next_hop_asn: ASN,
    pub recv_relationship: Relationships,
    /// Set by the seeding layer, carried verbatim across all hops.
    pub rov_invalid: bool,
}

impl Announcement {
    /// An announcement originated by `origin_asn` itself.
    pub fn origin(prefix: impl Into<Prefix>, origin_asn: ASN) -> Self {
        Announcement {
            prefix: prefix.into(),
            as_path: vec![origin_asn],
            next_hop_asn: origin_asn,
            recv_relationship: Relationships::Origin,
            rov_invalid: false,
        }
    }

    /// An announcement as received from a neighbor. The receiver's own ASN
    /// is prepended at process time, not here, so the queued form stays
    /// neutral of who will consume it.
    pub fn received(
        prefix: impl Into<Prefix>,
        next_hop_asn: ASN,
        recv_relationship: Relationships,
        as_path: Vec<ASN>,
        rov_invalid: bool,
    ) -> Self {
        Announcement {
            prefix: prefix.into(),
            as_path,
            next_hop_asn,
            recv_relationship,
            rov_invalid,
        }
    }

    pub fn with_rov_invalid(mut self, rov_invalid: bool) -> Self {
        self.rov_invalid = rov_invalid;
        self
    }

    pub fn origin_asn(&self) -> ASN {
        self.as_path.last().copied().unwrap_or(self.next_hop_asn)
    }
}
