use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::Parser;
use log::error;

use rovsim::as_graph::ASGraph;
use rovsim::io;

/// AS-level BGP route propagation simulator with ROV policies.
#[derive(Debug, Parser)]
#[command(name = "rovsim", version, about)]
struct Args {
    /// CAIDA AS-rel2 relationship file
    #[arg(long, value_name = "PATH")]
    relationships: PathBuf,

    /// Origin announcements to seed (CSV: seed_asn,prefix,rov_invalid)
    #[arg(long, value_name = "PATH")]
    announcements: PathBuf,

    /// ASNs deploying route origin validation, one per line
    #[arg(long, value_name = "PATH")]
    rov_asns: PathBuf,
}

fn main() -> ExitCode {
    pretty_env_logger::init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            // Usage errors exit 1; clap's own default would be 2.
            return if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            };
        }
    };

    println!("Relationships: {}", args.relationships.display());
    println!("Announcements: {}", args.announcements.display());
    println!("ROV ASNs: {}", args.rov_asns.display());

    let mut graph = ASGraph::new();

    println!("Building graph from file...");
    io::load_relationships(&mut graph, &args.relationships);
    println!("Built graph with {} ASes.", graph.as_dict.len());

    println!("Checking for cycles in graph...");
    if graph.has_provider_cycle() {
        error!(
            "provider/customer relationship cycle detected in {}",
            args.relationships.display()
        );
        return ExitCode::from(1);
    }

    println!("Loading ROV ASNs from file...");
    let rov_count = io::load_rov_asns(&mut graph, &args.rov_asns);
    println!("Loaded {} ROV-deploying ASes.", rov_count);

    println!("Seeding announcements from file...");
    let seeded = io::load_announcements(&mut graph, &args.announcements);
    println!("Seeded {} announcements.", seeded);

    println!("Propagating announcements...");
    if let Err(e) = graph.propagate_announcements() {
        error!("{}", e);
        return ExitCode::from(1);
    }
    println!("Propagated announcements.");

    let out = Path::new("ribs.csv");
    if let Err(e) = io::dump_ribs_to_csv(&graph, out) {
        error!("could not write {}: {}", out.display(), e);
        return ExitCode::from(1);
    }
    println!("Wrote {}", out.display());

    ExitCode::SUCCESS
}
