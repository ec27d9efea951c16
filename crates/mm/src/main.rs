//! Mouse macro CLI.
//!
//! Thin front end over the `mousemacro` engine: list, inspect and delete
//! saved macros, and replay them against a console output sink that
//! prints each synthetic action instead of injecting it. Wiring a real
//! OS injection backend means swapping that sink for a platform
//! `PointerOutput`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use mousemacro::prelude::*;

#[derive(Parser)]
#[command(name = "mm")]
#[command(about = "Mouse macro recorder - inspect and replay saved macros")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List saved macros
    List,

    /// Show macro info
    Show {
        /// Macro file
        file: String,

        /// Show all events
        #[arg(long)]
        all: bool,
    },

    /// Delete a macro
    Delete {
        /// Macro file
        file: String,
    },

    /// Replay a macro, printing each action
    Play {
        /// Macro file
        file: String,

        /// Repeat until Ctrl+C
        #[arg(short, long)]
        r#loop: bool,

        /// Playback speed (1.0 = realtime, 2.0 = 2x)
        #[arg(short, long, default_value = "1.0")]
        speed: f64,

        /// Seconds to wait before playback starts
        #[arg(short, long, default_value = "0")]
        delay: f64,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::List => list(),
        Commands::Show { file, all } => show(&file, all),
        Commands::Delete { file } => delete(&file),
        Commands::Play {
            file,
            r#loop,
            speed,
            delay,
        } => play(&file, r#loop, speed, delay),
    }
}

fn list() -> Result<()> {
    let store = MacroStore::new()?;
    let files = store.list()?;
    if files.is_empty() {
        println!("No macros saved in {}", store.path().display());
    } else {
        for f in files {
            println!("{}", f);
        }
    }
    Ok(())
}

fn show(file: &str, all: bool) -> Result<()> {
    let store = MacroStore::new()?;
    let mac = store.load(file)?;

    println!("Name: {}", mac.name);
    if !mac.description.is_empty() {
        println!("Description: {}", mac.description);
    }
    println!("Version: {}", mac.version);
    println!("Events: {}", mac.event_count());
    println!("Duration: {:.2}s", mac.duration());

    let mut moves = 0;
    let mut clicks = 0;
    let mut scrolls = 0;
    for e in &mac.events {
        match e.kind {
            EventKind::Move { .. } => moves += 1,
            EventKind::Click { .. } => clicks += 1,
            EventKind::Scroll { .. } => scrolls += 1,
        }
    }
    println!("\nSummary:");
    println!("  Moves: {}", moves);
    println!("  Clicks: {}", clicks);
    println!("  Scrolls: {}", scrolls);

    if all {
        println!("\nEvents:");
        for (i, e) in mac.events.iter().enumerate() {
            println!("{}: {:?}", i, e);
        }
    }
    Ok(())
}

fn delete(file: &str) -> Result<()> {
    let store = MacroStore::new()?;
    store.delete(file)?;
    println!("Deleted: {}", file);
    Ok(())
}

fn play(file: &str, looping: bool, speed: f64, delay: f64) -> Result<()> {
    let store = MacroStore::new()?;
    let mac = store.load(file)?;
    println!(
        "Playing {} ({} events, {:.2}s) at {}x speed (Ctrl+C to stop)",
        mac.name,
        mac.event_count(),
        mac.duration(),
        speed
    );

    let mut player = Player::new(Box::new(ConsoleOutput));
    player.set_speed(speed);
    player.set_complete_callback(|| println!("Completed."));
    player.set_stopped_callback(|| println!("Stopped."));
    player.load(mac)?;

    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = interrupted.clone();
    ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
    })?;

    player.start(looping, Duration::from_secs_f64(delay.max(0.0)))?;
    while player.is_active() {
        if interrupted.load(Ordering::SeqCst) {
            player.stop();
            break;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    Ok(())
}

/// Output sink that narrates actions instead of injecting them.
struct ConsoleOutput;

impl PointerOutput for ConsoleOutput {
    fn set_position(&mut self, x: i32, y: i32) -> mousemacro::Result<()> {
        println!("  move -> ({}, {})", x, y);
        Ok(())
    }

    fn press(&mut self, button: MouseButton) -> mousemacro::Result<()> {
        println!("  press {:?}", button);
        Ok(())
    }

    fn release(&mut self, button: MouseButton) -> mousemacro::Result<()> {
        println!("  release {:?}", button);
        Ok(())
    }

    fn scroll(&mut self, dx: i32, dy: i32) -> mousemacro::Result<()> {
        println!("  scroll ({}, {})", dx, dy);
        Ok(())
    }
}
