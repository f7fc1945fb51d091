//! Run-length code used for level rows and move histories.
//!
//! A single digit sets the repeat count for the next symbol. A later digit
//! replaces an earlier one, so `29R` is nine `R`s, and `0` suppresses the
//! symbol that follows it.

use log::debug;

use crate::error::{Error, Result};

/// Longest run a single count can express.
const MAX_RUN: usize = 9;

/// Expand a run-length code, dropping a dangling count at the end.
pub fn decompress(code: &str) -> String {
    let (out, dangling) = expand(code);
    if dangling {
        debug!("ignoring dangling run-length count in {:?}", code);
    }
    out
}

/// Expand a run-length code, failing on a dangling count at the end.
pub fn decompress_strict(code: &str) -> Result<String> {
    match expand(code) {
        (out, false) => Ok(out),
        (_, true) => Err(Error::MalformedCode),
    }
}

/// Returns the expansion and whether the code ended on a count.
fn expand(code: &str) -> (String, bool) {
    let mut out = String::with_capacity(code.len());
    let mut count: Option<usize> = None;

    for ch in code.chars() {
        if let Some(digit) = ch.to_digit(10) {
            count = Some(digit as usize);
        } else {
            for _ in 0..count.unwrap_or(1) {
                out.push(ch);
            }
            count = None;
        }
    }

    (out, count.is_some())
}

/// Compress a digit-free string so that `decompress(compress(s)) == s`.
pub fn compress(plain: &str) -> String {
    let mut out = String::with_capacity(plain.len());
    let mut chars = plain.chars().peekable();

    while let Some(ch) = chars.next() {
        let mut run = 1;
        while chars.peek() == Some(&ch) {
            chars.next();
            run += 1;
        }
        while run > 0 {
            let chunk = run.min(MAX_RUN);
            if chunk > 1 {
                out.push(char::from(b'0' + chunk as u8));
            }
            out.push(ch);
            run -= chunk;
        }
    }

    out
}
