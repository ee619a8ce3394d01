use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;

// @module: Subtitle cue handling and SRT serialization

// @const: SRT timestamp regex
static TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{2}):(\d{2}):(\d{2}),(\d{3}) --> (\d{2}):(\d{2}):(\d{2}),(\d{3})").unwrap()
});

// @struct: Single subtitle cue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleEntry {
    // @field: Sequence number, 1-based
    pub seq_num: usize,

    // @field: Start time in ms
    pub start_time_ms: u64,

    // @field: End time in ms
    pub end_time_ms: u64,

    // @field: Cue text, may span multiple lines
    pub text: String,
}

impl SubtitleEntry {
    pub fn new(seq_num: usize, start_time_ms: u64, end_time_ms: u64, text: String) -> Self {
        SubtitleEntry {
            seq_num,
            start_time_ms,
            end_time_ms,
            text,
        }
    }

    // @creates: Validated subtitle entry
    // @validates: Time range and non-empty text
    pub fn new_validated(
        seq_num: usize,
        start_time_ms: u64,
        end_time_ms: u64,
        text: String,
    ) -> Result<Self> {
        if end_time_ms <= start_time_ms {
            return Err(anyhow!(
                "Invalid time range: end time {} <= start time {}",
                end_time_ms,
                start_time_ms
            ));
        }

        let trimmed_text = text.trim();
        if trimmed_text.is_empty() {
            return Err(anyhow!("Empty subtitle text for entry {}", seq_num));
        }

        Ok(SubtitleEntry {
            seq_num,
            start_time_ms,
            end_time_ms,
            text: trimmed_text.to_string(),
        })
    }

    /// Convert start time to formatted SRT timestamp
    pub fn format_start_time(&self) -> String {
        Self::format_timestamp(self.start_time_ms)
    }

    /// Convert end time to formatted SRT timestamp
    pub fn format_end_time(&self) -> String {
        Self::format_timestamp(self.end_time_ms)
    }

    /// Format a timestamp in milliseconds to SRT format (HH:MM:SS,mmm)
    pub fn format_timestamp(ms: u64) -> String {
        let hours = ms / 3_600_000;
        let minutes = (ms % 3_600_000) / 60_000;
        let seconds = (ms % 60_000) / 1_000;
        let millis = ms % 1_000;

        format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
    }
}

impl fmt::Display for SubtitleEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.seq_num)?;
        writeln!(f, "{} --> {}", self.format_start_time(), self.format_end_time())?;
        writeln!(f, "{}", self.text)?;
        writeln!(f)
    }
}

/// Collection of subtitle cues with their origin
#[derive(Debug)]
pub struct SubtitleCollection {
    /// Source file the cues were fetched for
    pub source_file: PathBuf,

    /// List of subtitle cues
    pub entries: Vec<SubtitleEntry>,

    /// Language of the cues
    pub language: String,
}

impl SubtitleCollection {
    /// Create a new subtitle collection
    pub fn new(source_file: PathBuf, language: String) -> Self {
        SubtitleCollection {
            source_file,
            entries: Vec::new(),
            language,
        }
    }

    /// Write the cues to an SRT file, renumbering them 1..N first.
    ///
    /// One blank-line-separated block per cue; any partial file from a
    /// previous attempt is overwritten.
    pub fn write_to_srt<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();

        self.renumber();

        let mut file = File::create(path)
            .with_context(|| format!("Failed to create subtitle file: {}", path.display()))?;

        for entry in &self.entries {
            write!(file, "{}", entry)?;
        }

        Ok(())
    }

    /// Renumber entries so that seq_num runs 1..N in order
    pub fn renumber(&mut self) {
        for (i, entry) in self.entries.iter_mut().enumerate() {
            entry.seq_num = i + 1;
        }
    }

    /// Parse SRT format text into subtitle cues.
    ///
    /// Tolerant of stray text and invalid entries (skipped with a warning);
    /// fails only when no valid cue at all can be recovered. Entries are
    /// sorted by start time and renumbered sequentially.
    pub fn parse_srt_string(content: &str) -> Result<Vec<SubtitleEntry>> {
        let mut entries = Vec::new();

        let mut current_seq_num: Option<usize> = None;
        let mut current_start_ms: Option<u64> = None;
        let mut current_end_ms: Option<u64> = None;
        let mut current_text = String::new();

        let mut finalize = |seq_num: usize, start_ms: u64, end_ms: u64, text: &str| {
            match SubtitleEntry::new_validated(seq_num, start_ms, end_ms, text.to_string()) {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!("Skipping invalid subtitle entry {}: {}", seq_num, e),
            }
        };

        for line in content.lines() {
            let trimmed = line.trim();

            if trimmed.is_empty() {
                if let (Some(seq), Some(start), Some(end)) =
                    (current_seq_num, current_start_ms, current_end_ms)
                {
                    if !current_text.is_empty() {
                        finalize(seq, start, end, &current_text);
                    }
                    current_seq_num = None;
                    current_start_ms = None;
                    current_end_ms = None;
                    current_text.clear();
                }
                continue;
            }

            // Sequence number opens a new cue
            if current_seq_num.is_none() && current_text.is_empty() {
                if let Ok(num) = trimmed.parse::<usize>() {
                    current_seq_num = Some(num);
                    continue;
                }
            }

            // Timestamp line follows the sequence number
            if current_seq_num.is_some() && current_start_ms.is_none() {
                if let Some(caps) = TIMESTAMP_REGEX.captures(trimmed) {
                    current_start_ms = Some(Self::captured_timestamp_ms(&caps, 1));
                    current_end_ms = Some(Self::captured_timestamp_ms(&caps, 5));
                    continue;
                }
            }

            // Anything else inside a cue is text
            if current_seq_num.is_some() && current_start_ms.is_some() {
                if !current_text.is_empty() {
                    current_text.push('\n');
                }
                current_text.push_str(trimmed);
            } else {
                warn!("Unexpected text before cue header: {}", trimmed);
            }
        }

        // Final cue without a trailing blank line
        if let (Some(seq), Some(start), Some(end)) =
            (current_seq_num, current_start_ms, current_end_ms)
        {
            if !current_text.is_empty() {
                finalize(seq, start, end, &current_text);
            }
        }

        if entries.is_empty() {
            return Err(anyhow!("No valid subtitle entries were found in the SRT content"));
        }

        entries.sort_by_key(|entry| entry.start_time_ms);
        for (i, entry) in entries.iter_mut().enumerate() {
            entry.seq_num = i + 1;
        }

        Ok(entries)
    }

    /// Extract one timestamp from a TIMESTAMP_REGEX capture set
    fn captured_timestamp_ms(caps: &regex::Captures, start_idx: usize) -> u64 {
        let field = |idx: usize| -> u64 {
            caps.get(idx).map_or(0, |m| m.as_str().parse().unwrap_or(0))
        };

        let hours = field(start_idx);
        let minutes = field(start_idx + 1);
        let seconds = field(start_idx + 2);
        let millis = field(start_idx + 3);

        (hours * 3600 + minutes * 60 + seconds) * 1000 + millis
    }
}

impl fmt::Display for SubtitleCollection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Subtitle Collection")?;
        writeln!(f, "Source: {:?}", self.source_file)?;
        writeln!(f, "Language: {}", self.language)?;
        writeln!(f, "Entries: {}", self.entries.len())?;
        Ok(())
    }
}
