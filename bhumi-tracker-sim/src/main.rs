mod script;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use data_encoding::{HEXLOWER, HEXLOWER_PERMISSIVE};
use tracing_subscriber::EnvFilter;

use bhumi_proto::{Frame, MSG_MESH_PROFILE_LOCATION, MSG_REGISTER_RESULT, MeshProfileLocation, Status};
use bhumi_tracker::{Inbound, TrackerConfig};

use script::{Mesh, Outcome};

#[derive(Parser)]
#[command(name = "bhumi-tracker-sim")]
#[command(about = "Replay tracked-device events against simulated mesh nodes")]
struct Cli {
    /// Config file (default: $BHUMI_HOME/tracker.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an event script
    Run {
        /// JSON array of steps
        script: PathBuf,
        /// Number of mesh nodes
        #[arg(short, long, default_value = "2")]
        nodes: usize,
        /// Events handled per delivery before giving up
        #[arg(short, long, default_value = "256")]
        budget: usize,
    },
    /// Write the default config if there is none, and print it
    InitConfig,
    /// Decode a hex encoded frame
    Decode {
        /// Frame bytes, header included
        hex: String,
    },
}

fn bhumi_home() -> anyhow::Result<PathBuf> {
    match std::env::var("BHUMI_HOME") {
        Ok(home) => Ok(PathBuf::from(home)),
        Err(_) => Ok(dirs::home_dir()
            .context("could not determine home directory")?
            .join(".bhumi")),
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config_path = match cli.config {
        Some(path) => path,
        None => bhumi_home()?.join("tracker.json"),
    };

    match cli.command {
        Commands::Run { script, nodes, budget } => {
            let config = TrackerConfig::load_or_create(&config_path, TrackerConfig::default())?;
            cmd_run(&config, &script, nodes, budget)?
        }
        Commands::InitConfig => {
            let config = TrackerConfig::load_or_create(&config_path, TrackerConfig::default())?;
            println!("{}", config_path.display());
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Commands::Decode { hex } => cmd_decode(&hex)?,
    }

    Ok(())
}

fn cmd_run(config: &TrackerConfig, path: &Path, nodes: usize, budget: usize) -> anyhow::Result<()> {
    if nodes == 0 {
        anyhow::bail!("need at least one node");
    }
    let steps = script::load(path)?;
    let mut mesh = Mesh::new(config, nodes, budget);

    for (n, step) in steps.iter().enumerate() {
        for outcome in mesh.play(step).with_context(|| format!("step {n}"))? {
            print_outcome(&outcome)?;
        }
    }

    for (idx, node) in mesh.nodes().iter().enumerate() {
        let devices: Vec<_> = node.tracker().store().iter().collect();
        println!();
        println!(
            "node {} ({}/{} entries, {} dropped):",
            idx,
            devices.len(),
            node.tracker().store().capacity(),
            node.dropped()
        );
        println!("{}", serde_json::to_string_pretty(&devices)?);
    }
    Ok(())
}

fn print_outcome(outcome: &Outcome) -> anyhow::Result<()> {
    let processed = &outcome.processed;
    if processed.inbound == Inbound::Tick && processed.events.is_empty() {
        return Ok(());
    }
    let inbound = serde_json::to_string(&processed.inbound)?;
    match processed.status {
        Some(status) => println!("[node {}] {} -> {:?}", outcome.node, inbound, status),
        None => println!("[node {}] {}", outcome.node, inbound),
    }
    for event in &processed.events {
        match event.to_frame() {
            Some(frame) => println!("    mesh  {:?} ({})", event, HEXLOWER.encode(&frame.to_bytes()?)),
            None => println!("    local {:?}", event),
        }
    }
    Ok(())
}

fn cmd_decode(hex: &str) -> anyhow::Result<()> {
    let bytes = HEXLOWER_PERMISSIVE
        .decode(hex.trim().as_bytes())
        .context("invalid hex")?;
    let frame = Frame::read_from(&mut bytes.as_slice())?;

    let json = match frame.msg_type {
        MSG_REGISTER_RESULT => {
            let code = frame.payload.first().copied().context("empty register result")?;
            serde_json::to_string_pretty(&Status::from_code(code)?)?
        }
        MSG_MESH_PROFILE_LOCATION => {
            serde_json::to_string_pretty(&MeshProfileLocation::from_bytes(&frame.payload)?)?
        }
        _ => serde_json::to_string_pretty(&Inbound::from_frame(&frame)?)?,
    };
    println!("{json}");
    Ok(())
}
