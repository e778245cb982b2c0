// epfinder/src/main.rs
//
// epfinder: event-plane hit extraction for forward and barrel detectors.
//
// Reads one event snapshot per JSONL line, extracts hits for the chosen
// detector, accumulates Q-vectors per subgroup and appends the EpInfo
// slots the event updated to <output>/epinfo.jsonl.
//
// Usage:
//   epfinder --detector epd --calib calib.json --path events.jsonl
//   epfinder --detector cemc --calib calib.json --path events.jsonl --follow
//
// Exit status 1 when a detector collaborator the mode needs is missing
// (geometry, truncation table, tower container, centrality or track map).

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use epfinder::calib::CalibContext;
use epfinder::engine::qvector::QVectorAccumulator;
use epfinder::engine::reco::{EventPlaneReco, EventStatus};
use epfinder::engine::sink::ResultSink;
use epfinder::events::{Calorimeter, DetectorMode, EventSnapshot};
use epfinder::registry::Registry;

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name    = "epfinder",
    about   = "Event-plane hit extraction and Q-vector bookkeeping",
    version = env!("CARGO_PKG_VERSION"),
)]
struct Cli {
    #[arg(long, value_enum, default_value = "epd")]
    detector: Detector,

    #[arg(long, default_value = "EVENT_PLANE", help = "Registry node holding the EpInfo slots")]
    algo_node: String,

    #[arg(long, help = "JSON calibration bundle (geometry + truncation)")]
    calib: PathBuf,

    #[arg(long, default_value = "/tmp/epfinder_events.jsonl",
          help = "JSONL event snapshots")]
    path: PathBuf,

    #[arg(long, default_value = "/tmp/epfinder_output",
          help = "Result output directory")]
    output: PathBuf,

    #[arg(long, help = "Keep waiting for appended events")]
    follow: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Detector {
    Epd,      // sEPD wheels, south + north
    Cemc,
    Hcalin,
    Hcalout,
    Tracking, // soft tracks
    Bbc,      // slots only
}

impl From<Detector> for DetectorMode {
    fn from(d: Detector) -> Self {
        match d {
            Detector::Epd      => DetectorMode::Wheel,
            Detector::Cemc     => DetectorMode::Barrel(Calorimeter::Cemc),
            Detector::Hcalin   => DetectorMode::Barrel(Calorimeter::HcalIn),
            Detector::Hcalout  => DetectorMode::Barrel(Calorimeter::HcalOut),
            Detector::Tracking => DetectorMode::Tracking,
            Detector::Bbc      => DetectorMode::BeamCounter,
        }
    }
}

// ── Run ───────────────────────────────────────────────────────────────────────

struct Run {
    reco:     EventPlaneReco<QVectorAccumulator>,
    registry: Arc<Registry>,
    sink:     ResultSink,
}

impl Run {
    async fn handle(&mut self, event: EventSnapshot) -> Result<()> {
        let status = match self.reco.process_event(&event) {
            Ok(s) => s,
            Err(e) => {
                error!("event={}: {}", event.event_id, e);
                self.reco.end();
                std::process::exit(1);
            }
        };

        if status == EventStatus::Ok {
            self.sink.write_event(event.event_id, &self.registry, self.reco.updated_slots()).await?;
        }
        self.reco.reset_event();
        Ok(())
    }
}

async fn read_events(run: &mut Run, path: PathBuf, follow: bool) -> Result<()> {
    let file = tokio::fs::File::open(&path)
        .await
        .with_context(|| format!("opening {}", path.display()))?;
    let mut lines = BufReader::new(file).lines();

    info!("Reading events from {}", path.display());
    loop {
        match lines.next_line().await? {
            Some(line) => {
                let line = line.trim();
                if line.is_empty() { continue; }
                match serde_json::from_str::<EventSnapshot>(line) {
                    Ok(ev) => run.handle(ev).await?,
                    Err(e) => warn!("Parse error: {}", e),
                }
            }
            None if follow => tokio::time::sleep(tokio::time::Duration::from_millis(50)).await,
            None => break,
        }
    }
    Ok(())
}

// ── Main ──────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env()
            .add_directive("epfinder=info".parse()?))
        .compact().init();

    let cli   = Cli::parse();
    let mode  = DetectorMode::from(cli.detector);
    let calib = CalibContext::load(&cli.calib)?;

    let registry = Arc::new(Registry::new(cli.algo_node.clone()));
    let reco     = EventPlaneReco::new(mode, Arc::clone(&registry), calib, QVectorAccumulator::default());
    reco.init();
    let sink     = ResultSink::new(cli.output.clone())?;
    info!("Writing results to {}", sink.path().display());

    let mut run = Run { reco, registry, sink };
    read_events(&mut run, cli.path.clone(), cli.follow).await?;

    run.reco.end();
    Ok(())
}
