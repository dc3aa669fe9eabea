use crate::cli::DictationArgs;
use crate::terminal::Prompt;
use crate::CliError;
use bingen_core::{PlaybackEngine, SectionRequest};
use bingen_domain_score::{
    load_directory, load_score, section_window, slice_section, BlockCursor, DictationScore,
    LibraryEntry,
};
use bingen_domain_theory::{spell_midi, SpellingPreference, TheoryPitchArithmetic};
use bingen_ports::pitch::{Note, PitchArithmeticPort};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::io::BufRead;
use std::thread;
use std::time::Duration;

/// Breath between the tonal reference and the first block.
const REFERENCE_PAUSE_SECONDS: f64 = 0.5;

fn pick_entry(
    entries: Vec<LibraryEntry>,
    piece: Option<&str>,
    rng: &mut StdRng,
) -> Result<LibraryEntry, CliError> {
    match piece {
        Some(id) => entries
            .into_iter()
            .find(|entry| entry.id == id)
            .ok_or_else(|| CliError::Library(format!("no piece with id {id}"))),
        None => entries
            .choose(rng)
            .cloned()
            .ok_or_else(|| CliError::Library("library folder is empty".to_string())),
    }
}

/// Flat keys read black keys as flats; everything else uses the common spelling.
fn spell(score: &DictationScore, midi: i32) -> Note {
    if score.key.accidental.alter() < 0 {
        TheoryPitchArithmetic::new().note_from_midi(midi)
    } else {
        spell_midi(midi, SpellingPreference::Mixed)
    }
}

/// Note names of the block, in playing order.
fn block_solution(score: &DictationScore, cursor: &BlockCursor) -> String {
    let window = section_window(
        cursor.start_measure(),
        cursor.measures_in_block(),
        score.time_signature,
        score.bpm,
    );
    slice_section(&score.events, window, 0)
        .iter()
        .map(|event| spell(score, event.pitch as i32).to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

fn play_block(
    engine: &PlaybackEngine,
    score: &DictationScore,
    cursor: &mut BlockCursor,
    count_in: u32,
) -> Result<(), CliError> {
    let Some(with_reference) = cursor.take_play() else {
        println!("No replays left for this block (n = next, b = back).");
        return Ok(());
    };
    if with_reference {
        let reference = engine.play_tonal_reference(score.key, score.mode)?;
        thread::sleep(Duration::from_secs_f64(
            reference.duration_seconds + REFERENCE_PAUSE_SECONDS,
        ));
    }
    let request =
        SectionRequest::for_score(score, cursor.start_measure(), cursor.measures_in_block())
            .with_count_in(count_in);
    let summary = engine.play_score_section(&score.events, &request)?;
    if summary.voices == 0 {
        println!("(this block is silent)");
    }
    println!("{} replay(s) left", cursor.repeats_left());
    Ok(())
}

pub fn run<R: BufRead>(
    args: &DictationArgs,
    engine: &PlaybackEngine,
    prompt: &mut Prompt<R>,
    rng: &mut StdRng,
) -> Result<(), CliError> {
    let entries = load_directory(&args.library, args.measures)?;
    let entry = pick_entry(entries, args.piece.as_deref(), rng)?;
    let score = load_score(&args.library, args.measures, &entry)?;
    let mut cursor = BlockCursor::new(score.total_measures, args.block, args.repeats);

    println!(
        "{}: {} {:?}, {}, {} bpm, {} measures",
        score.title, score.key, score.mode, score.time_signature, score.bpm, score.total_measures
    );
    println!("p = play block, k = key, m = one measure of metronome, s = show notes,");
    println!("n / b = next / previous block, q = quit");

    loop {
        let header = format!("[block {}/{}]", cursor.block(), cursor.block_count());
        let Some(command) = prompt.ask(&header)? else {
            return Ok(());
        };
        match command.as_str() {
            "" | "p" => play_block(engine, &score, &mut cursor, args.count_in)?,
            "k" => {
                engine.play_tonal_reference(score.key, score.mode)?;
            }
            "m" => {
                engine.play_metronome_click(1, score.time_signature, score.bpm, engine.now())?;
            }
            "s" => println!("{}", block_solution(&score, &cursor)),
            "n" => {
                if !cursor.step(1) {
                    println!("That was the last block.");
                }
            }
            "b" => {
                if !cursor.step(-1) {
                    println!("Already at the first block.");
                }
            }
            "q" | "quit" => return Ok(()),
            other => println!("unknown command: {other}"),
        }
    }
}
