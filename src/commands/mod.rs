use anyhow::Result;
use colored::Colorize;
use pulsefit::{
    WorkoutTemplate,
    config::Config,
    notify::{NotificationSink, SpeechSink},
};
use serde::Serialize;

pub mod calendar;
pub mod config;
pub mod exercise;
pub mod meal;
pub mod measure;
pub mod session;
pub mod stats;
pub mod template;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFmt {
    Pretty,
    Json,
}

/// Prints `value` as JSON, or runs `pretty` for the colorful form.
pub fn emit<T: Serialize>(fmt: OutputFmt, value: &T, pretty: impl FnOnce()) -> Result<()> {
    match fmt {
        OutputFmt::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFmt::Pretty => pretty(),
    }
    Ok(())
}

/// Printable width of `s`, ignoring ANSI color sequences.
pub fn plain_len(s: &str) -> usize {
    let bytes = s.as_bytes();
    let mut i = 0;
    let mut count = 0;
    while i < bytes.len() {
        if bytes[i] == 0x1B {
            // Skip \x1b[... m
            while i < bytes.len() && bytes[i] != b'm' {
                i += 1;
            }
            i += 1;
        } else if bytes[i] & 0xC0 != 0x80 {
            // Count chars, not UTF-8 continuation bytes.
            count += 1;
            i += 1;
        } else {
            i += 1;
        }
    }

    count
}

/// Prints `left | right` rows with the bars lined up.
pub fn print_columns(left: Vec<String>, right: Vec<String>) {
    let pad_plain = left.iter().map(|s| plain_len(s)).max().unwrap_or(0);
    for (l, r) in left.into_iter().zip(right) {
        // Width formatting counts chars, escape codes included.
        let pad = pad_plain + (l.chars().count() - plain_len(&l));
        if r.is_empty() {
            println!("{}", l);
        } else {
            println!("{:<pad$} {} {}", l, "|".blue(), r, pad = pad);
        }
    }
}

/// Announcements shown in the terminal.
pub struct ConsoleSink;

impl NotificationSink for ConsoleSink {
    fn announce(&self, text: &str) {
        println!("{} {}", "»".magenta().bold(), text.magenta());
    }
}

/// Console plus speech when a `voice` command is configured.
pub fn announcer(cfg: &Config) -> (ConsoleSink, Option<SpeechSink>) {
    (ConsoleSink, cfg.voice().and_then(SpeechSink::new))
}

/// Looks a template up by 1-based index (as shown by `template list`) or exact name.
pub fn find_template<'a>(templates: &'a [WorkoutTemplate], key: &str) -> Option<(usize, &'a WorkoutTemplate)> {
    let key = key.trim();
    if let Ok(idx) = key.parse::<usize>() {
        return idx
            .checked_sub(1)
            .and_then(|i| templates.get(i).map(|t| (i, t)));
    }

    templates.iter().enumerate().find(|(_, t)| t.name == key)
}
