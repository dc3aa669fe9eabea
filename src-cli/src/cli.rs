use bingen_ports::instrument::InstrumentName;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Ear-training drills and melodic dictation")]
pub struct Args {
    /// SoundFont (.sf2) to play through; overrides the saved setting for this run
    #[arg(long, global = true)]
    pub soundfont: Option<PathBuf>,

    /// Instrument outside the mastery phase (e.g. violin, lead_1_square)
    #[arg(long, global = true)]
    pub instrument: Option<InstrumentName>,

    /// Master volume between 0 and 1
    #[arg(long, global = true)]
    pub volume: Option<f32>,

    /// Output device id as printed by `bingen devices`
    #[arg(long, global = true)]
    pub device: Option<String>,

    /// Seed for reproducible drills
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Name the quality of a block chord (`m7`, or with root: `Ebm7`)
    Chord,
    /// Name the interval between two notes (`3M`, `5P`, `7m` ...)
    Interval,
    /// Name a single note from the curriculum (`C`, `F#`, `Bb3` ...)
    Note,
    /// Take down a piece block by block from a score library
    Dictation(DictationArgs),
    /// List audio output devices
    Devices,
}

#[derive(clap::Args, Debug, Clone)]
pub struct DictationArgs {
    /// Library root holding one folder per piece length
    #[arg(long)]
    pub library: PathBuf,

    /// Piece length in measures (selects the library folder)
    #[arg(long, default_value_t = 8)]
    pub measures: u32,

    /// Piece id from directory.json; random when omitted
    #[arg(long)]
    pub piece: Option<String>,

    /// Measures played per block
    #[arg(long, default_value_t = 2)]
    pub block: u32,

    /// Replays allowed per block
    #[arg(long, default_value_t = 3)]
    pub repeats: u32,

    /// Metronome measures before each block
    #[arg(long, default_value_t = 1)]
    pub count_in: u32,
}
