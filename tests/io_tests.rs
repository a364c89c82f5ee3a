use std::fs;
use std::path::PathBuf;

use pretty_assertions::assert_eq;

use rovsim::as_graph::ASGraph;
use rovsim::io;
use rovsim::simulation_engine::Announcement;

fn scratch_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("rovsim_{}_{}", std::process::id(), name))
}

#[test]
fn test_dump_single_as_golden() {
    let mut graph = ASGraph::new();
    graph.seed_announcement(1, Announcement::origin("10.0.0.0/24", 1));
    graph.propagate_announcements().unwrap();

    let out = scratch_path("single.csv");
    io::dump_ribs_to_csv(&graph, &out).unwrap();
    let written = fs::read_to_string(&out).unwrap();
    fs::remove_file(&out).unwrap();

    assert_eq!(written, "asn,prefix,as_path\n1,10.0.0.0/24,\"(1,)\"\n");
}

#[test]
fn test_dump_chain_golden() {
    let mut graph = ASGraph::new();
    graph.add_provider(1, 2);
    graph.add_provider(2, 3);
    graph.seed_announcement(3, Announcement::origin("192.0.2.0/24", 3));
    graph.propagate_announcements().unwrap();

    let out = scratch_path("chain.csv");
    io::dump_ribs_to_csv(&graph, &out).unwrap();
    let written = fs::read_to_string(&out).unwrap();
    fs::remove_file(&out).unwrap();

    assert_eq!(
        written,
        "asn,prefix,as_path\n\
         1,192.0.2.0/24,\"(1, 2, 3)\"\n\
         2,192.0.2.0/24,\"(2, 3)\"\n\
         3,192.0.2.0/24,\"(3,)\"\n"
    );
}

#[test]
fn test_dump_empty_graph_is_header_only() {
    let graph = ASGraph::new();

    let out = scratch_path("empty.csv");
    io::dump_ribs_to_csv(&graph, &out).unwrap();
    let written = fs::read_to_string(&out).unwrap();
    fs::remove_file(&out).unwrap();

    assert_eq!(written, "asn,prefix,as_path\n");
}

#[test]
fn test_dump_orders_asns_numerically_and_prefixes_lexicographically() {
    let mut graph = ASGraph::new();
    graph.seed_announcement(10, Announcement::origin("9.9.0.0/16", 10));
    graph.seed_announcement(2, Announcement::origin("10.0.0.0/24", 2));
    graph.seed_announcement(2, Announcement::origin("1.1.1.0/24", 2));

    let out = scratch_path("order.csv");
    io::dump_ribs_to_csv(&graph, &out).unwrap();
    let written = fs::read_to_string(&out).unwrap();
    fs::remove_file(&out).unwrap();

    assert_eq!(
        written,
        "asn,prefix,as_path\n\
         2,1.1.1.0/24,\"(2,)\"\n\
         2,10.0.0.0/24,\"(2,)\"\n\
         10,9.9.0.0/16,\"(10,)\"\n"
    );
}

#[test]
fn test_format_as_path() {
    assert_eq!(io::format_as_path(&[1, 2, 3]), "(1, 2, 3)");
    assert_eq!(io::format_as_path(&[3]), "(3,)");
    assert_eq!(io::format_as_path(&[]), "()");
}

#[test]
fn test_parse_as_path() {
    assert_eq!(io::parse_as_path("(1, 2, 3)"), Some(vec![1, 2, 3]));
    assert_eq!(io::parse_as_path("(3,)"), Some(vec![3]));
    assert_eq!(io::parse_as_path("()"), Some(vec![]));
    assert_eq!(io::parse_as_path("1, 2, 3"), None);
    assert_eq!(io::parse_as_path("(one, two)"), None);
}

#[test]
fn test_load_announcements() {
    let path = scratch_path("anns.csv");
    fs::write(
        &path,
        "seed_asn,prefix,rov_invalid\n\
         1,10.0.0.0/24,False\n\
         2,192.0.2.0/24,True\n\
         3,198.51.100.0/24,maybe\n\
         4,short\n\
         notanasn,1.1.1.0/24,False\n",
    )
    .unwrap();

    let mut graph = ASGraph::new();
    graph.add_provider(1, 2);
    let seeded = io::load_announcements(&mut graph, &path);
    fs::remove_file(&path).unwrap();

    assert_eq!(seeded, 3, "malformed rows are skipped");

    let rib1 = graph.get(&1).unwrap().policy.local_rib();
    assert!(!rib1.get("10.0.0.0/24").unwrap().rov_invalid);

    let rib2 = graph.get(&2).unwrap().policy.local_rib();
    assert!(rib2.get("192.0.2.0/24").unwrap().rov_invalid);

    // Unknown token defaults to False; unknown ASN seeds an isolated node.
    let rib3 = graph.get(&3).unwrap().policy.local_rib();
    assert!(!rib3.get("198.51.100.0/24").unwrap().rov_invalid);
    assert!(graph.get(&4).is_none());
}

#[test]
fn test_load_announcements_missing_file_is_empty() {
    let mut graph = ASGraph::new();
    let seeded = io::load_announcements(&mut graph, &scratch_path("no_such_anns.csv"));
    assert_eq!(seeded, 0);
    assert!(graph.as_dict.is_empty());
}

#[test]
fn test_load_rov_asns() {
    let path = scratch_path("rov.txt");
    fs::write(&path, "2\n\nxyz\n7\n").unwrap();

    let mut graph = ASGraph::new();
    graph.add_provider(2, 1);
    let switched = io::load_rov_asns(&mut graph, &path);
    fs::remove_file(&path).unwrap();

    assert_eq!(switched, 2);
    assert!(graph.get(&2).unwrap().policy.is_rov());
    assert!(!graph.get(&1).unwrap().policy.is_rov());
    // Listed but unknown ASN gets created with ROV.
    assert!(graph.get(&7).unwrap().policy.is_rov());
}

#[test]
fn test_load_rov_asns_missing_file_is_empty() {
    let mut graph = ASGraph::new();
    let switched = io::load_rov_asns(&mut graph, &scratch_path("no_such_rov.txt"));
    assert_eq!(switched, 0);
}

#[test]
fn test_load_relationships_from_file() {
    let path = scratch_path("rel.txt");
    fs::write(&path, "# serial-2\n1|2|-1\n2|3|0\n").unwrap();

    let mut graph = ASGraph::new();
    io::load_relationships(&mut graph, &path);
    fs::remove_file(&path).unwrap();

    assert_eq!(graph.get(&1).unwrap().customers, vec![2]);
    assert_eq!(graph.get(&2).unwrap().peers, vec![3]);
}

#[test]
fn test_load_relationships_missing_file_is_empty() {
    let mut graph = ASGraph::new();
    io::load_relationships(&mut graph, &scratch_path("no_such_rel.txt"));
    assert!(graph.as_dict.is_empty());
}

#[test]
fn test_rib_dump_reseeds_to_identical_dump() {
    let mut graph = ASGraph::new();
    graph.add_provider(1, 2);
    graph.add_provider(2, 3);
    graph.seed_announcement(3, Announcement::origin("192.0.2.0/24", 3));
    graph.propagate_announcements().unwrap();

    let first_out = scratch_path("roundtrip_a.csv");
    io::dump_ribs_to_csv(&graph, &first_out).unwrap();

    // Reseed a fresh graph over the same topology from the dump.
    let mut reseeded = ASGraph::new();
    reseeded.add_provider(1, 2);
    reseeded.add_provider(2, 3);
    for (asn, ann) in io::read_ribs_csv(&first_out).unwrap() {
        reseeded.seed_announcement(asn, ann);
    }
    reseeded.propagate_announcements().unwrap();

    let second_out = scratch_path("roundtrip_b.csv");
    io::dump_ribs_to_csv(&reseeded, &second_out).unwrap();

    let first = fs::read_to_string(&first_out).unwrap();
    let second = fs::read_to_string(&second_out).unwrap();
    fs::remove_file(&first_out).unwrap();
    fs::remove_file(&second_out).unwrap();

    assert_eq!(first, second);
}
