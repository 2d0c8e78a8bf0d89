use anyhow::Result;
use clap::Parser;
use clinic::cli::{self, Args, Context};
use clinic::config::Config;
use clinic::store;
use clinic::transcript::Transcript;
use rustyline::DefaultEditor;
use std::cell::RefCell;

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let cfg = if let Some(config_path) = &args.config {
        Config::load_from(config_path)?
    } else {
        Config::load()?
    };

    if let Err(errors) = cfg.validate() {
        for err in &errors {
            eprintln!("Config error {}", err);
        }
        return Err(anyhow::anyhow!(
            "Configuration has {} validation error(s)",
            errors.len()
        ));
    }

    let data_path = args.data.clone().unwrap_or_else(|| cfg.data_path());
    let years = cfg.years();

    if args.debug {
        eprintln!("[DEBUG] Data file: {}", data_path.display());
        eprintln!("[DEBUG] Bookable years: {}-{}", years.min, years.max);
    }

    let seeded = !data_path.is_file();
    let roster = store::load_or_init(&data_path)?;

    let session_id = uuid::Uuid::new_v4().to_string();
    let mut transcript = if args.no_transcript || !cfg.transcripts {
        Transcript::disabled(&session_id, &data_path)
    } else {
        let dir = args
            .transcripts_dir
            .clone()
            .unwrap_or_else(|| cfg.transcripts_path());
        std::fs::create_dir_all(&dir)?;
        let path = dir.join(format!("{}.jsonl", session_id));
        Transcript::new(&path, &session_id, &data_path)?
    };
    if args.debug {
        if let Some(path) = transcript.path() {
            eprintln!("[DEBUG] Transcript: {}", path.display());
        }
    }
    let _ = transcript.session_start(seeded);

    let ctx = Context {
        args,
        data_path,
        years,
        session_id,
        roster: RefCell::new(roster),
        transcript: RefCell::new(transcript),
    };

    let mut rl = DefaultEditor::new()?;
    let history_file = cli::history_path();
    let _ = rl.load_history(&history_file);

    let result = cli::run(&ctx, &mut rl);

    let _ = ctx.transcript.borrow_mut().session_end();

    // Save command history (create parent directory if needed)
    if let Some(parent) = history_file.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let _ = rl.save_history(&history_file);

    result
}
