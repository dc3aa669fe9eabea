use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PitchError {
    #[error("invalid note name: {0}")]
    InvalidNote(String),
    #[error("invalid pitch class: {0}")]
    InvalidPitchClass(String),
    #[error("invalid interval: {0}")]
    InvalidInterval(String),
    #[error("unknown chord quality: {0}")]
    UnknownQuality(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Letter {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl Letter {
    pub const ALL: [Letter; 7] = [
        Letter::C,
        Letter::D,
        Letter::E,
        Letter::F,
        Letter::G,
        Letter::A,
        Letter::B,
    ];

    /// Position of the letter inside an octave, C = 0 .. B = 6.
    pub fn index(self) -> i32 {
        match self {
            Letter::C => 0,
            Letter::D => 1,
            Letter::E => 2,
            Letter::F => 3,
            Letter::G => 4,
            Letter::A => 5,
            Letter::B => 6,
        }
    }

    pub fn from_index(index: i32) -> Self {
        Self::ALL[index.rem_euclid(7) as usize]
    }

    pub fn natural_semitone(self) -> i32 {
        match self {
            Letter::C => 0,
            Letter::D => 2,
            Letter::E => 4,
            Letter::F => 5,
            Letter::G => 7,
            Letter::A => 9,
            Letter::B => 11,
        }
    }

    fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'C' => Some(Letter::C),
            'D' => Some(Letter::D),
            'E' => Some(Letter::E),
            'F' => Some(Letter::F),
            'G' => Some(Letter::G),
            'A' => Some(Letter::A),
            'B' => Some(Letter::B),
            _ => None,
        }
    }
}

impl fmt::Display for Letter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Alteration in semitones: -2 = double flat, +1 = sharp.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Accidental(pub i8);

impl Accidental {
    pub const DOUBLE_FLAT: Accidental = Accidental(-2);
    pub const FLAT: Accidental = Accidental(-1);
    pub const NATURAL: Accidental = Accidental(0);
    pub const SHARP: Accidental = Accidental(1);
    pub const DOUBLE_SHARP: Accidental = Accidental(2);

    pub fn alter(self) -> i32 {
        self.0 as i32
    }

    pub fn is_natural(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Accidental {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = if self.0 > 0 { "#" } else { "b" };
        for _ in 0..self.0.unsigned_abs() {
            f.write_str(symbol)?;
        }
        Ok(())
    }
}

/// Splits `"C#4"` into letter, accidental and the unparsed remainder (`"4"`).
fn parse_spelling(text: &str) -> Option<(Letter, Accidental, &str)> {
    let mut chars = text.char_indices();
    let (_, first) = chars.next()?;
    let letter = Letter::from_char(first)?;

    let mut alter = 0i32;
    let mut rest_start = text.len();
    for (idx, c) in chars {
        match c {
            '#' | '♯' => alter += 1,
            'x' | '𝄪' => alter += 2,
            'b' | '♭' => alter -= 1,
            _ => {
                rest_start = idx;
                break;
            }
        }
    }
    if !(-4..=4).contains(&alter) {
        return None;
    }

    Some((letter, Accidental(alter as i8), &text[rest_start..]))
}

/// Letter + accidental, no octave.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PitchClass {
    pub letter: Letter,
    pub accidental: Accidental,
}

impl PitchClass {
    pub const fn new(letter: Letter, accidental: Accidental) -> Self {
        Self { letter, accidental }
    }

    pub const fn natural(letter: Letter) -> Self {
        Self::new(letter, Accidental::NATURAL)
    }

    /// Semitone class 0..12 (enharmonics share a chroma).
    pub fn chroma(self) -> i32 {
        (self.letter.natural_semitone() + self.accidental.alter()).rem_euclid(12)
    }

    pub fn at_octave(self, octave: i32) -> Note {
        Note::new(self.letter, self.accidental, octave)
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.letter, self.accidental)
    }
}

impl FromStr for PitchClass {
    type Err = PitchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        match parse_spelling(text) {
            Some((letter, accidental, "")) => Ok(Self::new(letter, accidental)),
            _ => Err(PitchError::InvalidPitchClass(text.to_string())),
        }
    }
}

impl TryFrom<String> for PitchClass {
    type Error = PitchError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PitchClass> for String {
    fn from(value: PitchClass) -> Self {
        value.to_string()
    }
}

/// A spelled pitch in scientific pitch notation. The octave belongs to the letter,
/// so `Cb4` sounds a semitone below `C4` and `B#3` sounds like `C4`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Note {
    pub letter: Letter,
    pub accidental: Accidental,
    pub octave: i32,
}

impl Note {
    pub const fn new(letter: Letter, accidental: Accidental, octave: i32) -> Self {
        Self {
            letter,
            accidental,
            octave,
        }
    }

    pub fn pitch_class(self) -> PitchClass {
        PitchClass::new(self.letter, self.accidental)
    }

    pub fn midi(self) -> i32 {
        (self.octave + 1) * 12 + self.letter.natural_semitone() + self.accidental.alter()
    }

    pub fn with_octave(self, octave: i32) -> Self {
        Self { octave, ..self }
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.letter, self.accidental, self.octave)
    }
}

impl FromStr for Note {
    type Err = PitchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let invalid = || PitchError::InvalidNote(text.to_string());
        let (letter, accidental, rest) = parse_spelling(text).ok_or_else(invalid)?;
        let octave = rest.parse::<i32>().map_err(|_| invalid())?;
        Ok(Self::new(letter, accidental, octave))
    }
}

impl TryFrom<String> for Note {
    type Error = PitchError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Note> for String {
    fn from(value: Note) -> Self {
        value.to_string()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntervalQuality {
    Diminished,
    Minor,
    Perfect,
    Major,
    Augmented,
}

impl IntervalQuality {
    fn symbol(self) -> char {
        match self {
            IntervalQuality::Diminished => 'd',
            IntervalQuality::Minor => 'm',
            IntervalQuality::Perfect => 'P',
            IntervalQuality::Major => 'M',
            IntervalQuality::Augmented => 'A',
        }
    }

    fn from_symbol(c: char) -> Option<Self> {
        match c {
            'd' => Some(IntervalQuality::Diminished),
            'm' => Some(IntervalQuality::Minor),
            'P' => Some(IntervalQuality::Perfect),
            'M' => Some(IntervalQuality::Major),
            'A' => Some(IntervalQuality::Augmented),
            _ => None,
        }
    }

    fn word(self) -> &'static str {
        match self {
            IntervalQuality::Diminished => "diminished",
            IntervalQuality::Minor => "minor",
            IntervalQuality::Perfect => "perfect",
            IntervalQuality::Major => "major",
            IntervalQuality::Augmented => "augmented",
        }
    }
}

/// Diatonic interval: a letter distance (`number`, 1 = unison) plus a quality.
/// Labels follow the short `3m` / `5P` / `4A` form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Interval {
    number: u8,
    quality: IntervalQuality,
}

impl Interval {
    pub const UNISON: Interval = Interval::raw(1, IntervalQuality::Perfect);
    pub const MINOR_SECOND: Interval = Interval::raw(2, IntervalQuality::Minor);
    pub const MAJOR_SECOND: Interval = Interval::raw(2, IntervalQuality::Major);
    pub const MINOR_THIRD: Interval = Interval::raw(3, IntervalQuality::Minor);
    pub const MAJOR_THIRD: Interval = Interval::raw(3, IntervalQuality::Major);
    pub const PERFECT_FOURTH: Interval = Interval::raw(4, IntervalQuality::Perfect);
    pub const AUGMENTED_FOURTH: Interval = Interval::raw(4, IntervalQuality::Augmented);
    pub const DIMINISHED_FIFTH: Interval = Interval::raw(5, IntervalQuality::Diminished);
    pub const PERFECT_FIFTH: Interval = Interval::raw(5, IntervalQuality::Perfect);
    pub const AUGMENTED_FIFTH: Interval = Interval::raw(5, IntervalQuality::Augmented);
    pub const MINOR_SIXTH: Interval = Interval::raw(6, IntervalQuality::Minor);
    pub const MAJOR_SIXTH: Interval = Interval::raw(6, IntervalQuality::Major);
    pub const DIMINISHED_SEVENTH: Interval = Interval::raw(7, IntervalQuality::Diminished);
    pub const MINOR_SEVENTH: Interval = Interval::raw(7, IntervalQuality::Minor);
    pub const MAJOR_SEVENTH: Interval = Interval::raw(7, IntervalQuality::Major);
    pub const OCTAVE: Interval = Interval::raw(8, IntervalQuality::Perfect);

    const fn raw(number: u8, quality: IntervalQuality) -> Self {
        Self { number, quality }
    }

    pub fn new(number: u8, quality: IntervalQuality) -> Result<Self, PitchError> {
        let candidate = Self::raw(number, quality);
        if !(1..=15).contains(&number) {
            return Err(PitchError::InvalidInterval(candidate.label()));
        }
        let valid = if candidate.is_perfect_type() {
            !matches!(quality, IntervalQuality::Minor | IntervalQuality::Major)
        } else {
            quality != IntervalQuality::Perfect
        };
        if !valid {
            return Err(PitchError::InvalidInterval(candidate.label()));
        }
        Ok(candidate)
    }

    pub fn number(self) -> u8 {
        self.number
    }

    pub fn quality(self) -> IntervalQuality {
        self.quality
    }

    /// Letter steps spanned by the interval (unison = 0, octave = 7).
    pub fn steps(self) -> i32 {
        self.number as i32 - 1
    }

    pub fn simple_number(self) -> u8 {
        (self.number - 1) % 7 + 1
    }

    fn is_perfect_type(self) -> bool {
        matches!(self.simple_number(), 1 | 4 | 5)
    }

    pub fn semitones(self) -> i32 {
        let base = match self.simple_number() {
            1 => 0,
            2 => 2,
            3 => 4,
            4 => 5,
            5 => 7,
            6 => 9,
            _ => 11,
        };
        let offset = match (self.is_perfect_type(), self.quality) {
            (true, IntervalQuality::Diminished) => -1,
            (true, IntervalQuality::Augmented) => 1,
            (true, _) => 0,
            (false, IntervalQuality::Diminished) => -2,
            (false, IntervalQuality::Minor) => -1,
            (false, IntervalQuality::Augmented) => 1,
            (false, _) => 0,
        };
        let octaves = (self.number as i32 - 1) / 7;
        base + offset + 12 * octaves
    }

    pub fn label(self) -> String {
        format!("{}{}", self.number, self.quality.symbol())
    }

    /// Human readable name such as `minor-third` or `perfect-fifth`.
    pub fn name(self) -> String {
        let ordinal = match self.number {
            1 => "unison",
            2 => "second",
            3 => "third",
            4 => "fourth",
            5 => "fifth",
            6 => "sixth",
            7 => "seventh",
            8 => "octave",
            9 => "ninth",
            10 => "tenth",
            11 => "eleventh",
            12 => "twelfth",
            13 => "thirteenth",
            14 => "fourteenth",
            _ => "fifteenth",
        };
        format!("{}-{}", self.quality.word(), ordinal)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.number, self.quality.symbol())
    }
}

impl FromStr for Interval {
    type Err = PitchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let invalid = || PitchError::InvalidInterval(text.to_string());
        let split = text
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(invalid)?;
        let (digits, quality) = text.split_at(split);
        let number = digits.parse::<u8>().map_err(|_| invalid())?;
        let mut quality_chars = quality.chars();
        let quality = quality_chars
            .next()
            .and_then(IntervalQuality::from_symbol)
            .ok_or_else(invalid)?;
        if quality_chars.next().is_some() {
            return Err(invalid());
        }
        Self::new(number, quality).map_err(|_| invalid())
    }
}

impl TryFrom<String> for Interval {
    type Error = PitchError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Interval> for String {
    fn from(value: Interval) -> Self {
        value.label()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn sign(self) -> i32 {
        match self {
            Direction::Up => 1,
            Direction::Down => -1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChordQuality {
    #[serde(rename = "M")]
    Major,
    #[serde(rename = "m")]
    Minor,
    #[serde(rename = "aug")]
    Augmented,
    #[serde(rename = "dim")]
    Diminished,
    #[serde(rename = "7")]
    DominantSeventh,
    #[serde(rename = "maj7")]
    MajorSeventh,
    #[serde(rename = "m7")]
    MinorSeventh,
    #[serde(rename = "m7b5")]
    HalfDiminished,
    #[serde(rename = "dim7")]
    DiminishedSeventh,
}

impl ChordQuality {
    pub const ALL: [ChordQuality; 9] = [
        ChordQuality::Major,
        ChordQuality::Minor,
        ChordQuality::Augmented,
        ChordQuality::Diminished,
        ChordQuality::DominantSeventh,
        ChordQuality::MajorSeventh,
        ChordQuality::MinorSeventh,
        ChordQuality::HalfDiminished,
        ChordQuality::DiminishedSeventh,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            ChordQuality::Major => "M",
            ChordQuality::Minor => "m",
            ChordQuality::Augmented => "aug",
            ChordQuality::Diminished => "dim",
            ChordQuality::DominantSeventh => "7",
            ChordQuality::MajorSeventh => "maj7",
            ChordQuality::MinorSeventh => "m7",
            ChordQuality::HalfDiminished => "m7b5",
            ChordQuality::DiminishedSeventh => "dim7",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ChordQuality::Major => "Major",
            ChordQuality::Minor => "Minor",
            ChordQuality::Augmented => "Augmented",
            ChordQuality::Diminished => "Diminished",
            ChordQuality::DominantSeventh => "Dominant 7",
            ChordQuality::MajorSeventh => "Major 7",
            ChordQuality::MinorSeventh => "Minor 7",
            ChordQuality::HalfDiminished => "Half-Diminished",
            ChordQuality::DiminishedSeventh => "Diminished 7",
        }
    }
}

impl fmt::Display for ChordQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for ChordQuality {
    type Err = PitchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        Self::ALL
            .into_iter()
            .find(|quality| quality.symbol() == text)
            .ok_or_else(|| PitchError::UnknownQuality(text.to_string()))
    }
}

/// Narrow pitch-arithmetic capability the generators depend on.
pub trait PitchArithmeticPort: Send + Sync {
    fn midi_of(&self, note: &Note) -> i32;

    /// Moves `note` by `interval`, choosing the letter the interval implies so the
    /// result is spelled correctly, not merely at the right MIDI number.
    fn transpose(&self, note: &Note, interval: Interval, direction: Direction) -> Note;

    /// Ordered intervals from the root, unison first.
    fn chord_formula(&self, quality: ChordQuality) -> Vec<Interval>;

    fn note_from_midi(&self, midi: i32) -> Note;
}
