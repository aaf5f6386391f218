use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use origami::persist::PersistenceRecord;
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing_subscriber::fmt::SubscriberBuilder;

mod provenance;
mod script;

#[derive(Parser)]
#[command(name = "cli")]
#[command(about = "Replay fold scripts against a paper store")]
struct Cmd {
    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand)]
enum Action {
    /// Replay a JSON fold script and write every step report
    Run {
        #[arg(long)]
        script: PathBuf,
        #[arg(long)]
        out: PathBuf,
    },
    /// Print a small provenance JSON block
    Report,
}

fn main() -> Result<()> {
    SubscriberBuilder::default().with_target(false).init();
    let cmd = Cmd::parse();
    match cmd.action {
        Action::Run { script, out } => run(&script, &out),
        Action::Report => report(),
    }
}

fn run(script_path: &Path, out: &Path) -> Result<()> {
    tracing::info!(script = %script_path.display(), out = %out.display(), "run");
    let script = script::load(script_path)?;
    let mut store = script.store();
    let outcomes = script::replay(&mut store, &script.steps)?;

    let mut records: Vec<PersistenceRecord> = Vec::new();
    let flushed = store.flush(&mut records)?;
    let faces: Vec<_> = store
        .face_ids()
        .into_iter()
        .map(|id| {
            let twin = store.face(id)?;
            Ok(json!({
                "face": id,
                "planar": twin.planar.vertex_coords().iter().map(|v| [v.x, v.y]).collect::<Vec<_>>(),
                "folded": twin.folded.vertex_coords().iter().map(|v| [v.x, v.y, v.z]).collect::<Vec<_>>(),
            }))
        })
        .collect::<origami::Result<_>>()?;
    let doc = json!({
        "steps": &outcomes,
        "faces": &faces,
        "offsets": store.state().lug().normal_offsets(store.cfg()),
        "records": &records,
    });

    if let Some(parent) = out.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating output dir {}", parent.display()))?;
        }
    }
    std::fs::write(out, serde_json::to_vec_pretty(&doc)?)
        .with_context(|| format!("writing {}", out.display()))?;
    tracing::info!(steps = outcomes.len(), records = flushed, faces = faces.len(), "wrote report");

    let payload = provenance::Payload::new(json!({
        "steps": script.steps.len(),
        "cfg": store.cfg(),
    }))
    .with_input(script_path.to_string_lossy());
    provenance::write_sidecar(out, payload)?;
    Ok(())
}

fn report() -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&provenance::build_block())?);
    Ok(())
}
