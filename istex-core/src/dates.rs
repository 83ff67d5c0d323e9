//! Dates formatted with `dateformat`-style masks (`dd-mm-yyyy`, `yyyy-mm-dd'T'HH:MM:ss`, …)

use chrono::{Datelike, Local, Timelike};
use std::fmt::Write;

pub const DEFAULT_MASK: &str = "dd-mm-yyyy";

const DAY_NAMES: [&str; 7] = ["Sunday", "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday"];
const MONTH_NAMES: [&str; 12] = [
    "January", "February", "March", "April", "May", "June",
    "July", "August", "September", "October", "November", "December",
];

/// Current local date, `dd-mm-yyyy` unless another mask is given
pub fn now(mask: Option<&str>) -> String {
    format(&Local::now(), mask.unwrap_or(DEFAULT_MASK))
}

/// Longest token of `letter` that fits in a run of `run` repeats
fn token_len(letter: char, run: usize) -> usize {
    let max = match letter {
        'd' | 'm' => 4,
        'h' | 'H' | 'M' | 's' | 't' | 'T' => 2,
        'l' | 'L' => 1,
        'y' => {
            return match run {
                0 | 1 => 0,
                2 | 3 => 2,
                _ => 4,
            }
        }
        _ => 0,
    };
    run.min(max)
}

fn write_token<T: Datelike + Timelike>(out: &mut String, date: &T, letter: char, len: usize) {
    let hour12 = match date.hour() % 12 {
        0 => 12,
        h => h,
    };
    let pm = date.hour() >= 12;
    let weekday = date.weekday().num_days_from_sunday() as usize;
    let month = date.month0() as usize;

    // writing to a String cannot fail
    let _ = match (letter, len) {
        ('d', 1) => write!(out, "{}", date.day()),
        ('d', 2) => write!(out, "{:02}", date.day()),
        ('d', 3) => write!(out, "{}", &DAY_NAMES[weekday][..3]),
        ('d', _) => write!(out, "{}", DAY_NAMES[weekday]),
        ('m', 1) => write!(out, "{}", month + 1),
        ('m', 2) => write!(out, "{:02}", month + 1),
        ('m', 3) => write!(out, "{}", &MONTH_NAMES[month][..3]),
        ('m', _) => write!(out, "{}", MONTH_NAMES[month]),
        ('y', 2) => write!(out, "{:02}", date.year().rem_euclid(100)),
        ('y', _) => write!(out, "{}", date.year()),
        ('h', 1) => write!(out, "{hour12}"),
        ('h', _) => write!(out, "{hour12:02}"),
        ('H', 1) => write!(out, "{}", date.hour()),
        ('H', _) => write!(out, "{:02}", date.hour()),
        ('M', 1) => write!(out, "{}", date.minute()),
        ('M', _) => write!(out, "{:02}", date.minute()),
        ('s', 1) => write!(out, "{}", date.second()),
        ('s', _) => write!(out, "{:02}", date.second()),
        ('l', _) => write!(out, "{:03}", date.nanosecond() / 1_000_000 % 1000),
        ('L', _) => write!(out, "{:02}", date.nanosecond() / 10_000_000 % 100),
        ('t', 1) => out.write_str(if pm { "p" } else { "a" }),
        ('t', _) => out.write_str(if pm { "pm" } else { "am" }),
        ('T', 1) => out.write_str(if pm { "P" } else { "A" }),
        ('T', _) => out.write_str(if pm { "PM" } else { "AM" }),
        _ => Ok(()),
    };
}

/// Format `date` with a mask. Quoted text is copied as-is, unknown
/// characters pass through.
pub fn format<T: Datelike + Timelike>(date: &T, mask: &str) -> String {
    let chars: Vec<char> = mask.chars().collect();
    let mut out = String::with_capacity(mask.len() + 8);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '\'' || c == '"' {
            match chars[i + 1..].iter().position(|&q| q == c) {
                Some(end) => {
                    out.extend(&chars[i + 1..i + 1 + end]);
                    i += end + 2;
                }
                None => {
                    out.push(c);
                    i += 1;
                }
            }
            continue;
        }

        let run = chars[i..].iter().take_while(|&&r| r == c).count();
        match token_len(c, run) {
            0 => {
                out.push(c);
                i += 1;
            }
            len => {
                write_token(&mut out, date, c, len);
                i += len;
            }
        }
    }

    out
}
