//! Scala (`.scl`) scale parsing.
//!
//! Parsing is best effort: every problem is recorded on the returned
//! [`Scale`] and bad pitch lines become [`Step::INVALID`], so the step list
//! lines up with the file and the fret engine can still place every other fret.

use miette::SourceSpan;
use pest::Parser;
use pest_derive::Parser;

use crate::errors::ScaleError;
use crate::scale::{Scale, Step};

#[derive(Parser)]
#[grammar = "scala.pest"]
pub struct ScalaParser;

/// A non-comment line and its byte offset in the source.
#[derive(Debug, Clone, Copy)]
struct Line<'a> {
    text: &'a str,
    offset: usize,
}

/// First whitespace-delimited word of a line.
#[derive(Debug, Clone, Copy)]
struct Token<'a> {
    text: &'a str,
    span: SourceSpan,
}

impl<'a> Line<'a> {
    fn first_token(self) -> Option<Token<'a>> {
        let rest = self.text.trim_start();
        let lead = self.text.len() - rest.len();
        let word = rest.split_whitespace().next()?;
        Some(Token {
            text: word,
            span: SourceSpan::from((self.offset + lead, word.len())),
        })
    }
}

/// Split `source` into content lines, dropping comments.
fn content_lines(source: &str) -> Result<Vec<Line<'_>>, Box<pest::error::Error<Rule>>> {
    let body = source.strip_prefix('\u{feff}').unwrap_or(source);
    let bom = source.len() - body.len();
    let pairs = ScalaParser::parse(Rule::scl, body).map_err(Box::new)?;
    let mut lines = Vec::new();
    for pair in pairs {
        if pair.as_rule() != Rule::scl {
            continue;
        }
        for inner in pair.into_inner() {
            if inner.as_rule() == Rule::text {
                lines.push(Line {
                    text: inner.as_str(),
                    offset: bom + inner.as_span().start(),
                });
            }
        }
    }
    Ok(lines)
}

fn full_match(rule: Rule, text: &str) -> bool {
    ScalaParser::parse(rule, text).is_ok()
}

/// Parse Scala text into a scale.
pub fn parse(source: &str) -> Scale {
    let mut scale = Scale::new();

    let Ok(lines) = content_lines(source) else {
        crate::log::warn!(bytes = source.len(), "scala source did not match the line grammar");
        scale.add_error(ScaleError::TooShort);
        return scale;
    };
    let mut lines = lines.into_iter();

    let (Some(title), Some(count_line)) = (lines.next(), lines.next()) else {
        scale.add_error(ScaleError::TooShort);
        return scale;
    };
    scale.title = title.text.trim().to_string();

    let Some(count) = count_line.first_token() else {
        scale.add_error(ScaleError::InvalidToneCount {
            found: String::new(),
            span: Some(SourceSpan::from((count_line.offset, count_line.text.len()))),
        });
        return scale;
    };
    let expected = match parse_count(count.text) {
        Some(n) => n,
        None => {
            scale.add_error(ScaleError::InvalidToneCount {
                found: count.text.to_string(),
                span: Some(count.span),
            });
            return scale;
        }
    };

    let pitches: Vec<Token<'_>> = lines.filter_map(Line::first_token).collect();
    if pitches.len() != expected {
        scale.add_error(ScaleError::ToneCountMismatch {
            expected,
            found: pitches.len(),
            span: Some(count.span),
        });
    }

    for token in pitches {
        parse_pitch(&mut scale, token);
    }

    crate::log::debug!(
        title = %scale.title,
        tones = scale.tones(),
        errors = scale.errors.len(),
        "parsed scala scale"
    );
    scale
}

fn parse_count(text: &str) -> Option<usize> {
    if !full_match(Rule::integer_token, text) {
        return None;
    }
    text.parse::<usize>().ok()
}

fn parse_pitch(scale: &mut Scale, token: Token<'_>) {
    let span = Some(token.span);
    let text = token.text;

    if text.contains('.') {
        match parse_cents(text) {
            Some(cents) => {
                scale.add_step(2f64.powf(cents / 1200.0), 1.0);
            }
            None => reject(
                scale,
                ScaleError::InvalidCents {
                    token: text.to_string(),
                    span,
                },
            ),
        }
        return;
    }

    let parsed = if text.contains('/') {
        parse_ratio(text).ok_or_else(|| ScaleError::InvalidRatio {
            token: text.to_string(),
            span,
        })
    } else {
        parse_integer(text)
            .map(|n| (n, 1.0))
            .ok_or_else(|| ScaleError::InvalidInteger {
                token: text.to_string(),
                span,
            })
    };

    match parsed {
        Ok((num, denom)) if num <= 0.0 || denom <= 0.0 => reject(
            scale,
            ScaleError::NonPositiveRatio {
                token: text.to_string(),
                span,
            },
        ),
        Ok((num, denom)) => {
            scale.add_step(num, denom);
        }
        Err(error) => reject(scale, error),
    }
}

fn parse_cents(text: &str) -> Option<f64> {
    if !full_match(Rule::cents_token, text) {
        return None;
    }
    text.parse::<f64>().ok()
}

fn parse_ratio(text: &str) -> Option<(f64, f64)> {
    if !full_match(Rule::ratio_token, text) {
        return None;
    }
    let (num, denom) = text.split_once('/')?;
    Some((num.parse().ok()?, denom.parse().ok()?))
}

fn parse_integer(text: &str) -> Option<f64> {
    if !full_match(Rule::integer_token, text) {
        return None;
    }
    text.parse().ok()
}

/// Record `error` and keep the step count aligned with the file.
fn reject(scale: &mut Scale, error: ScaleError) {
    scale.add_error(error);
    scale.steps.push(Step::INVALID);
}

impl Scale {
    /// Parse Scala text. See the [module docs](crate::scala).
    pub fn from_scala(source: &str) -> Scale {
        parse(source)
    }
}
