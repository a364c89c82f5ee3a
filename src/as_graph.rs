use std::collections::HashMap;
use std::io::BufRead;

use log::warn;

use crate::shared::{Relationships, SimulatorError};
use crate::simulation_engine::announcement::Announcement;
use crate::simulation_engine::policy::Policy;

pub type ASN = u32;

/// A single AS: its identity, neighbor lists, and the policy that holds its
/// routing state. Neighbor lists store ASNs only; lookups go through the
/// graph's map, which is the sole owner of every node.
#[derive(Debug, Clone)]
pub struct AS {
    pub asn: ASN,
    pub providers: Vec<ASN>,
    pub customers: Vec<ASN>,
    pub peers: Vec<ASN>,
    /// Longest customer-chain distance down to a customerless AS. Assigned
    /// by `flatten_by_providers`.
    pub propagation_rank: Option<u32>,
    pub policy: Policy,
}

impl AS {
    pub fn new(asn: ASN) -> Self {
        AS {
            asn,
            providers: Vec::new(),
            customers: Vec::new(),
            peers: Vec::new(),
            propagation_rank: None,
            policy: Policy::bgp(),
        }
    }

    pub fn get_neighbors(&self, rel: Relationships) -> &[ASN] {
        match rel {
            Relationships::Providers => &self.providers,
            Relationships::Peers => &self.peers,
            Relationships::Customers => &self.customers,
            Relationships::Origin => &[],
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ASGraph {
    pub as_dict: HashMap<ASN, AS>,
}

impl ASGraph {
    pub fn new() -> Self {
        ASGraph {
            as_dict: HashMap::new(),
        }
    }

    pub fn get(&self, asn: &ASN) -> Option<&AS> {
        self.as_dict.get(asn)
    }

    pub fn get_mut(&mut self, asn: &ASN) -> Option<&mut AS> {
        self.as_dict.get_mut(asn)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AS> {
        self.as_dict.values()
    }

    /// Create the node with a default BGP policy if it is not present yet.
    pub fn add_node(&mut self, asn: ASN) {
        self.as_dict.entry(asn).or_insert_with(|| AS::new(asn));
    }

    /// Record `provider_asn` as a provider of `customer_asn`, creating both
    /// nodes as needed. Duplicate edges are kept; they do not change
    /// routing outcomes.
    pub fn add_provider(&mut self, provider_asn: ASN, customer_asn: ASN) {
        self.add_node(provider_asn);
        self.add_node(customer_asn);

        if let Some(provider) = self.as_dict.get_mut(&provider_asn) {
            provider.customers.push(customer_asn);
        }
        if let Some(customer) = self.as_dict.get_mut(&customer_asn) {
            customer.providers.push(provider_asn);
        }
    }

    pub fn add_peer(&mut self, asn_a: ASN, asn_b: ASN) {
        self.add_node(asn_a);
        self.add_node(asn_b);

        if let Some(a) = self.as_dict.get_mut(&asn_a) {
            a.peers.push(asn_b);
        }
        if let Some(b) = self.as_dict.get_mut(&asn_b) {
            b.peers.push(asn_a);
        }
    }

    /// Populate the graph from CAIDA AS-rel2 lines: `X|Y|R[|extra]`, where
    /// `-1` makes X a provider of Y and `0` makes them peers. Comment and
    /// blank lines are skipped, as are malformed lines and the hybrid
    /// relationship codes (`-2`) that appear in real dumps.
    pub fn build_from_relationships<R: BufRead>(&mut self, reader: R) {
        for line in reader.lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    warn!("relationship stream ended early: {}", e);
                    break;
                }
            };
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut fields = line.split('|');
            let (Some(a), Some(b), Some(rel)) = (fields.next(), fields.next(), fields.next())
            else {
                warn!("skipping relationship line with too few fields: {}", line);
                continue;
            };
            let (Ok(a), Ok(b), Ok(rel)) = (a.parse::<ASN>(), b.parse::<ASN>(), rel.parse::<i32>())
            else {
                warn!("skipping malformed relationship line: {}", line);
                continue;
            };

            match rel {
                -1 => self.add_provider(a, b),
                0 => self.add_peer(a, b),
                _ => {}
            }
        }
    }

    /// Seed an announcement directly at `asn`, creating the node if absent.
    /// Delivery goes through the policy's receive step, so an ROV deployer
    /// refuses an invalid seed the same way it refuses one from a neighbor.
    pub fn seed_announcement(&mut self, asn: ASN, ann: Announcement) {
        self.add_node(asn);
        if let Some(node) = self.as_dict.get_mut(&asn) {
            node.policy.receive_announcement(ann);
            node.policy.process_announcements();
        }
    }

    /// Replace the policy at `asn` with a fresh ROV instance, discarding any
    /// state the old policy held. Must run before seeding and propagation.
    pub fn set_rov(&mut self, asn: ASN) {
        self.add_node(asn);
        if let Some(node) = self.as_dict.get_mut(&asn) {
            node.policy = Policy::rov();
        }
    }

    /// Directed cycle detection on provider -> customer edges, three-color
    /// DFS with an explicit stack (real CAIDA graphs are deep enough that
    /// recursion risks stack exhaustion).
    pub fn has_provider_cycle(&self) -> bool {
        #[derive(Clone, Copy)]
        enum Color {
            White,
            Gray,
            Black,
        }

        let mut color: HashMap<ASN, Color> = self
            .as_dict
            .keys()
            .map(|&asn| (asn, Color::White))
            .collect();

        for &start in self.as_dict.keys() {
            if !matches!(color.get(&start), Some(Color::White)) {
                continue;
            }

            // (asn, leaving): a node is pushed once to enter and once more
            // to turn black after its whole subtree is done.
            let mut stack = vec![(start, false)];
            while let Some((asn, leaving)) = stack.pop() {
                if leaving {
                    color.insert(asn, Color::Black);
                    continue;
                }
                if !matches!(color.get(&asn), Some(Color::White)) {
                    continue;
                }
                color.insert(asn, Color::Gray);
                stack.push((asn, true));

                if let Some(node) = self.as_dict.get(&asn) {
                    for &customer in &node.customers {
                        match color.get(&customer) {
                            // Gray descendant: back-edge, so a cycle.
                            Some(Color::Gray) => return true,
                            Some(Color::White) => stack.push((customer, false)),
                            _ => {}
                        }
                    }
                }
            }
        }

        false
    }

    /// Assign propagation ranks and bucket the ASNs by rank: `buckets[0]`
    /// holds the customerless ASes, `buckets[r]` the ASes whose longest
    /// customer chain has length `r`. Customer ASNs with no node in the
    /// graph count as rank 0 and appear in no bucket.
    pub fn flatten_by_providers(&mut self) -> Result<Vec<Vec<ASN>>, SimulatorError> {
        if self.has_provider_cycle() {
            return Err(SimulatorError::ProviderCycle);
        }
        if self.as_dict.is_empty() {
            return Ok(Vec::new());
        }

        let asns: Vec<ASN> = self.as_dict.keys().copied().collect();
        let mut memo: HashMap<ASN, u32> = HashMap::with_capacity(asns.len());

        for &start in &asns {
            if memo.contains_key(&start) {
                continue;
            }
            // Post-order over customer edges, explicit stack again.
            let mut stack = vec![(start, false)];
            while let Some((asn, expanded)) = stack.pop() {
                if expanded {
                    let rank = self.as_dict[&asn]
                        .customers
                        .iter()
                        .map(|c| memo.get(c).copied().unwrap_or(0) + 1)
                        .max()
                        .unwrap_or(0);
                    memo.insert(asn, rank);
                    continue;
                }
                if memo.contains_key(&asn) {
                    continue;
                }
                match self.as_dict.get(&asn) {
                    Some(node) => {
                        stack.push((asn, true));
                        for &customer in &node.customers {
                            if !memo.contains_key(&customer) {
                                stack.push((customer, false));
                            }
                        }
                    }
                    None => {
                        memo.insert(asn, 0);
                    }
                }
            }
        }

        let maxrank = asns.iter().map(|asn| memo[asn]).max().unwrap_or(0);
        let mut buckets: Vec<Vec<ASN>> = vec![Vec::new(); maxrank as usize + 1];
        for &asn in &asns {
            let rank = memo[&asn];
            if let Some(node) = self.as_dict.get_mut(&asn) {
                node.propagation_rank = Some(rank);
            }
            buckets[rank as usize].push(asn);
        }

        Ok(buckets)
    }

    /// Run the three-phase Gao-Rexford propagation to a fixed point for the
    /// currently seeded announcements: up the provider chains, one hop
    /// across peers, then down to customers. Fails without propagating if
    /// the provider graph has a cycle.
    pub fn propagate_announcements(&mut self) -> Result<(), SimulatorError> {
        let buckets = self.flatten_by_providers()?;
        if buckets.is_empty() {
            return Ok(());
        }
        let maxrank = buckets.len() - 1;

        // Upward: each rank sends to its providers, then the rank above
        // processes, so a provider integrates every customer route before
        // it sends upward itself.
        for r in 0..=maxrank {
            self.send_step(&buckets[r], Relationships::Customers);
            if r + 1 <= maxrank {
                self.process_step(&buckets[r + 1]);
            }
        }

        // Across: a single peer hop. The send step reads every RIB before
        // any peer processes, so peer-learned routes travel exactly one
        // peer link.
        let all_asns: Vec<ASN> = self.as_dict.keys().copied().collect();
        self.send_step(&all_asns, Relationships::Peers);
        self.process_step(&all_asns);

        // Downward: mirror of the upward phase.
        for r in (0..=maxrank).rev() {
            self.send_step(&buckets[r], Relationships::Providers);
            if r >= 1 {
                self.process_step(&buckets[r - 1]);
            }
        }

        Ok(())
    }

    /// Send every local RIB entry of every AS in `senders` to the neighbors
    /// that will see it as `recv_relationship`: providers for Customers,
    /// peers for Peers, customers for Providers. Sends are buffered and
    /// delivered after the read pass so each queue has a single writer.
    fn send_step(&mut self, senders: &[ASN], recv_relationship: Relationships) {
        let mut outbox: Vec<(ASN, Announcement)> = Vec::new();

        for &asn in senders {
            let Some(node) = self.as_dict.get(&asn) else {
                continue;
            };
            // A route the receiver sees as a customer route goes to the
            // sender's providers, and so on: the inverted relationship
            // names the sender-side neighbor list.
            let neighbors = node.get_neighbors(recv_relationship.invert());
            for ann in node.policy.local_rib().values() {
                for &neighbor in neighbors {
                    // The receiver prepends itself at process time; the
                    // stored path and the invalid flag travel verbatim.
                    outbox.push((
                        neighbor,
                        Announcement::received(
                            ann.prefix.clone(),
                            asn,
                            recv_relationship,
                            ann.as_path.clone(),
                            ann.rov_invalid,
                        ),
                    ));
                }
            }
        }

        for (neighbor, ann) in outbox {
            if let Some(node) = self.as_dict.get_mut(&neighbor) {
                node.policy.receive_announcement(ann);
            }
        }
    }

    fn process_step(&mut self, asns: &[ASN]) {
        for &asn in asns {
            if let Some(node) = self.as_dict.get_mut(&asn) {
                node.policy.process_announcements_for(asn);
            }
        }
    }
}
