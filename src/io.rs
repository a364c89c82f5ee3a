use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::as_graph::{ASGraph, ASN};
use crate::shared::{Relationships, SimulatorError};
use crate::simulation_engine::announcement::{Announcement, Prefix};

/// One row of the announcements file: `seed_asn,prefix,rov_invalid`.
#[derive(Debug, Deserialize)]
pub struct SeedRecord {
    pub seed_asn: ASN,
    pub prefix: String,
    pub rov_invalid: String,
}

/// One row of the RIB dump: `asn,prefix,as_path`.
#[derive(Debug, Serialize, Deserialize)]
pub struct RibRow {
    pub asn: ASN,
    pub prefix: String,
    pub as_path: String,
}

/// Populate `graph` from a CAIDA AS-rel2 relationship file. An unreadable
/// file is logged and treated as empty, never fatal.
pub fn load_relationships(graph: &mut ASGraph, path: &Path) {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) => {
            warn!(
                "could not open relationship file {}: {}; treating as empty",
                path.display(),
                e
            );
            return;
        }
    };
    graph.build_from_relationships(BufReader::new(file));
}

/// Seed one origin announcement per row of the announcements CSV. Returns
/// the number of announcements seeded. Rows naming an ASN absent from the
/// relationship graph still seed (the node is created isolated); the route
/// simply has nowhere to propagate.
pub fn load_announcements(graph: &mut ASGraph, path: &Path) -> usize {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) => {
            warn!(
                "could not open announcements file {}: {}; treating as empty",
                path.display(),
                e
            );
            return 0;
        }
    };

    let mut reader = csv::Reader::from_reader(BufReader::new(file));
    let mut seeded = 0;
    for result in reader.deserialize::<SeedRecord>() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                warn!("skipping malformed announcement row: {}", e);
                continue;
            }
        };

        // Only the literal "True" marks an invalid announcement.
        let rov_invalid = match record.rov_invalid.as_str() {
            "True" => true,
            "False" => false,
            other => {
                warn!(
                    "unrecognized rov_invalid token {:?} for ASN {}; defaulting to False",
                    other, record.seed_asn
                );
                false
            }
        };

        if !graph.as_dict.contains_key(&record.seed_asn) {
            warn!(
                "seed ASN {} not in relationship graph; creating isolated node",
                record.seed_asn
            );
        }
        let ann =
            Announcement::origin(record.prefix.as_str(), record.seed_asn).with_rov_invalid(rov_invalid);
        graph.seed_announcement(record.seed_asn, ann);
        seeded += 1;
    }
    seeded
}

/// Switch every ASN listed in the file (one per line) to the ROV policy.
/// Returns the number of ASes switched.
pub fn load_rov_asns(graph: &mut ASGraph, path: &Path) -> usize {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) => {
            warn!(
                "could not open ROV ASN file {}: {}; treating as empty",
                path.display(),
                e
            );
            return 0;
        }
    };

    let mut switched = 0;
    for line in BufReader::new(file).lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!("ROV ASN stream ended early: {}", e);
                break;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match line.parse::<ASN>() {
            Ok(asn) => {
                if !graph.as_dict.contains_key(&asn) {
                    warn!("ROV ASN {} not in relationship graph; creating isolated node", asn);
                }
                graph.set_rov(asn);
                switched += 1;
            }
            Err(_) => warn!("skipping malformed ROV ASN line: {}", line),
        }
    }
    switched
}

/// Write every installed route as `asn,prefix,as_path` with ASNs ascending.
/// Prefixes are sorted within an ASN so identical inputs always produce a
/// byte-identical file. Failure to open or write the output is fatal.
pub fn dump_ribs_to_csv(graph: &ASGraph, path: &Path) -> Result<(), SimulatorError> {
    // Header written by hand so an empty graph still dumps a header-only
    // file; `serialize` would emit one only before the first record.
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_path(path)?;
    writer.write_record(["asn", "prefix", "as_path"])?;

    let mut asns: Vec<ASN> = graph.as_dict.keys().copied().collect();
    asns.sort_unstable();

    for asn in asns {
        let Some(node) = graph.get(&asn) else { continue };
        let rib = node.policy.local_rib();
        let mut prefixes: Vec<&Prefix> = rib.keys().collect();
        prefixes.sort();
        for prefix in prefixes {
            let Some(ann) = rib.get(prefix) else { continue };
            writer.serialize(RibRow {
                asn,
                prefix: prefix.to_string(),
                as_path: format_as_path(&ann.as_path),
            })?;
        }
    }

    writer.flush()?;
    Ok(())
}

/// Read a RIB dump back into `(asn, announcement)` pairs, e.g. to reseed a
/// graph from a previous run. Malformed rows are logged and skipped.
pub fn read_ribs_csv(path: &Path) -> Result<Vec<(ASN, Announcement)>, SimulatorError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut entries = Vec::new();
    for result in reader.deserialize::<RibRow>() {
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                warn!("skipping malformed RIB row: {}", e);
                continue;
            }
        };
        let Some(as_path) = parse_as_path(&row.as_path) else {
            warn!("skipping RIB row with unparseable path: {}", row.as_path);
            continue;
        };
        let next_hop_asn = as_path.first().copied().unwrap_or(row.asn);
        entries.push((
            row.asn,
            Announcement::received(
                row.prefix.as_str(),
                next_hop_asn,
                Relationships::Origin,
                as_path,
                false,
            ),
        ));
    }
    Ok(entries)
}

/// Python-tuple formatting for AS paths: `(1, 2, 3)`, with the one-element
/// form `(1,)`. Consumed by external verification tooling, so the comma and
/// space placement is load-bearing.
pub fn format_as_path(as_path: &[ASN]) -> String {
    match as_path {
        [] => "()".to_string(),
        [only] => format!("({},)", only),
        _ => {
            let joined = as_path
                .iter()
                .map(|asn| asn.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            format!("({})", joined)
        }
    }
}

/// Inverse of `format_as_path`. Returns `None` when the field is not a
/// well-formed tuple of ASNs.
pub fn parse_as_path(field: &str) -> Option<Vec<ASN>> {
    let inner = field.trim().strip_prefix('(')?.strip_suffix(')')?;
    let mut path = Vec::new();
    for part in inner.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        path.push(part.parse::<ASN>().ok()?);
    }
    Some(path)
}
