use std::collections::HashMap;

use crate::as_graph::ASN;
use crate::shared::Relationships;
use crate::simulation_engine::announcement::{Announcement, Prefix};

pub type LocalRib = HashMap<Prefix, Announcement>;
pub type ReceivedQueue = HashMap<Prefix, Vec<Announcement>>;

/// State shared by every policy variant: the staging queue of announcements
/// seen since the last process step, and the installed best route per prefix.
#[derive(Debug, Clone, Default)]
pub struct PolicyState {
    pub received_queue: ReceivedQueue,
    pub local_rib: LocalRib,
}

/// Per-AS decision module. `Rov` is plain BGP with an input filter on
/// receive; the process and RIB semantics are identical across variants.
#[derive(Debug, Clone)]
pub enum Policy {
    Bgp(PolicyState),
    Rov(PolicyState),
}

impl Policy {
    pub fn bgp() -> Self {
        Policy::Bgp(PolicyState::default())
    }

    pub fn rov() -> Self {
        Policy::Rov(PolicyState::default())
    }

    pub fn is_rov(&self) -> bool {
        matches!(self, Policy::Rov(_))
    }

    fn state(&self) -> &PolicyState {
        match self {
            Policy::Bgp(state) | Policy::Rov(state) => state,
        }
    }

    fn state_mut(&mut self) -> &mut PolicyState {
        match self {
            Policy::Bgp(state) | Policy::Rov(state) => state,
        }
    }

    pub fn local_rib(&self) -> &LocalRib {
        &self.state().local_rib
    }

    /// Stage an incoming announcement. An ROV deployer drops announcements
    /// that failed route origin validation; everything else is queued
    /// unfiltered until the next process step.
    pub fn receive_announcement(&mut self, ann: Announcement) {
        if let Policy::Rov(_) = self {
            if ann.rov_invalid {
                return;
            }
        }
        self.state_mut()
            .received_queue
            .entry(ann.prefix.clone())
            .or_default()
            .push(ann);
    }

    /// Process the staged announcements for the AS `my_asn`, prepending
    /// `my_asn` to the winning path before installing it.
    ///
    /// Per prefix: candidates whose path already contains `my_asn` are
    /// rejected (they would loop on prepend), the best survivor is chosen by
    /// relationship preference, then stored path length, then lowest next
    /// hop, and it replaces the installed route only when strictly
    /// preferred. The queue is cleared wholesale afterwards.
    pub fn process_announcements_for(&mut self, my_asn: ASN) {
        let PolicyState {
            received_queue,
            local_rib,
        } = self.state_mut();

        for (prefix, announcements) in received_queue.iter() {
            let mut best: Option<&Announcement> = None;
            for ann in announcements {
                if ann.as_path.contains(&my_asn) {
                    continue;
                }
                match best {
                    // Candidates are all in received form, so the prepend
                    // that process adds to the path length cancels out here.
                    Some(current) if !prefer(ann, current) => {}
                    _ => best = Some(ann),
                }
            }
            let Some(chosen) = best else { continue };

            let mut as_path = Vec::with_capacity(chosen.as_path.len() + 1);
            as_path.push(my_asn);
            as_path.extend_from_slice(&chosen.as_path);
            let stored = Announcement {
                prefix: prefix.clone(),
                as_path,
                next_hop_asn: chosen.next_hop_asn,
                recv_relationship: chosen.recv_relationship,
                rov_invalid: chosen.rov_invalid,
            };

            // Stored vs. incumbent are both in stored form; path lengths
            // compare directly.
            match local_rib.get(prefix) {
                Some(incumbent) if !prefer(&stored, incumbent) => {}
                _ => {
                    local_rib.insert(prefix.clone(), stored);
                }
            }
        }

        received_queue.clear();
    }

    /// Process the staged announcements without prepending, installing the
    /// winner as-is. Used only when seeding origin announcements, whose
    /// paths already start at the seeded AS.
    pub fn process_announcements(&mut self) {
        let PolicyState {
            received_queue,
            local_rib,
        } = self.state_mut();

        for (prefix, announcements) in received_queue.iter() {
            let mut iter = announcements.iter();
            let Some(mut chosen) = iter.next() else { continue };
            for ann in iter {
                if prefer(ann, chosen) {
                    chosen = ann;
                }
            }

            match local_rib.get(prefix) {
                Some(incumbent) if !prefer(chosen, incumbent) => {}
                _ => {
                    local_rib.insert(prefix.clone(), chosen.clone());
                }
            }
        }

        received_queue.clear();
    }
}

/// True when `a` is strictly preferred to `b`: higher relationship
/// preference, then shorter AS path, then lower next hop ASN.
fn prefer(a: &Announcement, b: &Announcement) -> bool {
    let pref_a = a.recv_relationship.preference();
    let pref_b = b.recv_relationship.preference();
    if pref_a != pref_b {
        return pref_a > pref_b;
    }
    if a.as_path.len() != b.as_path.len() {
        return a.as_path.len() < b.as_path.len();
    }
    a.next_hop_asn < b.next_hop_asn
}
