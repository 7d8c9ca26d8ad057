//! The path data mini-language.
//!
//! A subset of SVG path syntax: `M/m L/l H/h V/v C/c Q/q Z/z`, uppercase
//! absolute, lowercase relative to the last resolved point. `Z` emits a
//! line back to the current subpath's first point. Parsing is strict —
//! wrong coordinate counts and unknown command letters are hard errors.
//!
//! Serialization emits the shortest representation that round-trips at
//! display precision: accumulated arithmetic noise showing up as long
//! trailing runs of `0`s or `9`s is snapped away.

use crate::error::PathParseError;
use crate::path::{Path, PathCmd};
use crate::vec::Vec2;
use std::fmt;
use std::str::FromStr;
use winnow::ascii::float;
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;

/// Parse path data text into a `Path`.
pub fn parse_path(input: &str) -> Result<Path, PathParseError> {
    let mut rest = input;
    skip_separators(&mut rest);
    if rest.is_empty() {
        return Err(PathParseError::Empty);
    }

    let mut start: Option<Vec2> = None;
    let mut commands: Vec<PathCmd> = Vec::new();
    let mut cursor = Vec2::ZERO;
    let mut subpath_start = Vec2::ZERO;
    let mut op: Option<char> = None;

    while !rest.is_empty() {
        let next = rest.chars().next().unwrap_or_default();
        if next.is_ascii_alphabetic() {
            if !matches!(
                next.to_ascii_uppercase(),
                'M' | 'L' | 'H' | 'V' | 'C' | 'Q' | 'Z'
            ) {
                return Err(PathParseError::UnknownCommand(next));
            }
            rest = &rest[1..];
            op = Some(next);
        } else if op.is_none() {
            return Err(PathParseError::UnknownCommand(next));
        }
        let cmd = op.ok_or(PathParseError::UnknownCommand(next))?;

        let relative = cmd.is_ascii_lowercase();
        let upper = cmd.to_ascii_uppercase();
        let arity = match upper {
            'M' | 'L' => 2,
            'H' | 'V' => 1,
            'Q' => 4,
            'C' => 6,
            'Z' => 0,
            _ => unreachable!("validated above"),
        };
        let args = take_numbers(&mut rest, cmd, arity)?;

        // Resolve a coordinate pair against the cursor for relative forms.
        let point = |x: f64, y: f64| {
            if relative {
                cursor + Vec2::new(x, y)
            } else {
                Vec2::new(x, y)
            }
        };

        match upper {
            'M' => {
                let p = point(args[0], args[1]);
                if start.is_none() {
                    start = Some(p);
                } else {
                    commands.push(PathCmd::MoveTo(p));
                }
                cursor = p;
                subpath_start = p;
                // Subsequent implicit coordinate pairs are line-tos.
                op = Some(if relative { 'l' } else { 'L' });
            }
            'L' => {
                let p = point(args[0], args[1]);
                push_drawable(&mut commands, &mut start, cursor, PathCmd::LineTo(p));
                cursor = p;
            }
            'H' => {
                let x = if relative { cursor.x + args[0] } else { args[0] };
                let p = Vec2::new(x, cursor.y);
                push_drawable(&mut commands, &mut start, cursor, PathCmd::LineTo(p));
                cursor = p;
            }
            'V' => {
                let y = if relative { cursor.y + args[0] } else { args[0] };
                let p = Vec2::new(cursor.x, y);
                push_drawable(&mut commands, &mut start, cursor, PathCmd::LineTo(p));
                cursor = p;
            }
            'Q' => {
                let ctrl = point(args[0], args[1]);
                let end = point(args[2], args[3]);
                push_drawable(&mut commands, &mut start, cursor, PathCmd::QuadTo { ctrl, end });
                cursor = end;
            }
            'C' => {
                let c1 = point(args[0], args[1]);
                let c2 = point(args[2], args[3]);
                let end = point(args[4], args[5]);
                push_drawable(&mut commands, &mut start, cursor, PathCmd::CubicTo { c1, c2, end });
                cursor = end;
            }
            'Z' => {
                push_drawable(&mut commands, &mut start, cursor, PathCmd::LineTo(subpath_start));
                cursor = subpath_start;
                op = None;
            }
            _ => unreachable!(),
        }

        skip_separators(&mut rest);
    }

    match start {
        Some(start) => Ok(Path::new(start, commands)),
        None => Err(PathParseError::Empty),
    }
}

/// Record a drawable command, establishing the implicit start point for
/// paths that do not open with `M`.
fn push_drawable(commands: &mut Vec<PathCmd>, start: &mut Option<Vec2>, cursor: Vec2, cmd: PathCmd) {
    if start.is_none() {
        *start = Some(cursor);
    }
    commands.push(cmd);
}

fn skip_separators(input: &mut &str) {
    *input = input.trim_start_matches(|c: char| c.is_ascii_whitespace() || c == ',');
}

/// Read exactly `arity` numbers for command `cmd`.
fn take_numbers(input: &mut &str, cmd: char, arity: usize) -> Result<Vec<f64>, PathParseError> {
    let mut args = Vec::with_capacity(arity);
    for found in 0..arity {
        skip_separators(input);
        let parsed: Result<f64, ErrMode<ContextError>> = float.parse_next(input);
        match parsed {
            Ok(n) if n.is_finite() => args.push(n),
            _ => {
                return Err(PathParseError::WrongArgCount { cmd, expected: arity, found });
            }
        }
    }
    Ok(args)
}

// ─── Serialization ───────────────────────────────────────────────────────

/// Format a coordinate, snapping display-precision noise.
///
/// Rust's `Display` for `f64` is already the shortest round-tripping
/// decimal; what remains is arithmetic noise like `1.2999999999999998`,
/// recognized as a long trailing run of `0`s or `9`s followed by a few
/// junk digits, and rounded away.
pub fn format_coord(v: f64) -> String {
    if !v.is_finite() {
        return "0".to_string();
    }
    let s = format!("{v}");
    let Some(dot) = s.find('.') else {
        return s;
    };
    let frac = &s[dot + 1..];
    let bytes = frac.as_bytes();

    let mut snap_precision = None;
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        if c == b'0' || c == b'9' {
            let mut run = i;
            while run < bytes.len() && bytes[run] == c {
                run += 1;
            }
            if run - i >= 4 && bytes.len() - run <= 3 && run - i + (bytes.len() - run) > 4 {
                snap_precision = Some(i);
                break;
            }
            i = run;
        } else {
            i += 1;
        }
    }

    let Some(precision) = snap_precision else {
        return s;
    };
    let rounded = format!("{v:.precision$}");
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" || trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = |point: Vec2| format!("{},{}", format_coord(point.x), format_coord(point.y));
        write!(f, "M{}", p(self.start()))?;
        for cmd in self.commands() {
            match *cmd {
                PathCmd::MoveTo(to) => write!(f, " M{}", p(to))?,
                PathCmd::LineTo(to) => write!(f, " L{}", p(to))?,
                PathCmd::QuadTo { ctrl, end } => write!(f, " Q{} {}", p(ctrl), p(end))?,
                PathCmd::CubicTo { c1, c2, end } => {
                    write!(f, " C{} {} {}", p(c1), p(c2), p(end))?;
                }
            }
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = PathParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_path(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_absolute_commands() {
        let path: Path = "M1,2 L3,4 Q5,6 7,8 C9,10 11,12 13,14".parse().unwrap();
        assert_eq!(path.start(), Vec2::new(1.0, 2.0));
        assert_eq!(
            path.commands(),
            &[
                PathCmd::LineTo(Vec2::new(3.0, 4.0)),
                PathCmd::QuadTo { ctrl: Vec2::new(5.0, 6.0), end: Vec2::new(7.0, 8.0) },
                PathCmd::CubicTo {
                    c1: Vec2::new(9.0, 10.0),
                    c2: Vec2::new(11.0, 12.0),
                    end: Vec2::new(13.0, 14.0)
                },
            ]
        );
    }

    #[test]
    fn relative_commands_resolve_against_cursor() {
        let path: Path = "m1,1 l2,0 v3 h-2".parse().unwrap();
        assert_eq!(
            path.commands(),
            &[
                PathCmd::LineTo(Vec2::new(3.0, 1.0)),
                PathCmd::LineTo(Vec2::new(3.0, 4.0)),
                PathCmd::LineTo(Vec2::new(1.0, 4.0)),
            ]
        );
    }

    #[test]
    fn close_returns_to_subpath_start() {
        let path: Path = "M1,1 L5,1 L5,5 Z".parse().unwrap();
        assert_eq!(path.commands().last(), Some(&PathCmd::LineTo(Vec2::new(1.0, 1.0))));
    }

    #[test]
    fn implicit_lineto_after_moveto() {
        let path: Path = "M0,0 1,1 2,0".parse().unwrap();
        assert_eq!(
            path.commands(),
            &[
                PathCmd::LineTo(Vec2::new(1.0, 1.0)),
                PathCmd::LineTo(Vec2::new(2.0, 0.0)),
            ]
        );
    }

    #[test]
    fn wrong_arg_count_is_fatal() {
        let err = "M1,2 L3".parse::<Path>().unwrap_err();
        assert_eq!(err, PathParseError::WrongArgCount { cmd: 'L', expected: 2, found: 1 });
    }

    #[test]
    fn unknown_command_is_fatal() {
        let err = "M0,0 A1,1".parse::<Path>().unwrap_err();
        assert_eq!(err, PathParseError::UnknownCommand('A'));
    }

    #[test]
    fn empty_input_is_fatal() {
        assert_eq!("".parse::<Path>().unwrap_err(), PathParseError::Empty);
        assert_eq!("  ,".parse::<Path>().unwrap_err(), PathParseError::Empty);
    }

    #[test]
    fn negative_numbers_need_no_separator() {
        let path: Path = "M1-2L-3-4".parse().unwrap();
        assert_eq!(path.start(), Vec2::new(1.0, -2.0));
        assert_eq!(path.commands(), &[PathCmd::LineTo(Vec2::new(-3.0, -4.0))]);
    }

    #[test]
    fn coord_snapping() {
        assert_eq!(format_coord(1.2999999999999998), "1.3");
        assert_eq!(format_coord(0.10000000000000003), "0.1");
        assert_eq!(format_coord(-2.9999999999999996), "-3");
        assert_eq!(format_coord(1.5), "1.5");
        assert_eq!(format_coord(2.0), "2");
        // A deliberate, short value is left alone.
        assert_eq!(format_coord(1.25), "1.25");
        assert_eq!(format_coord(0.1009), "0.1009");
    }

    #[test]
    fn to_string_roundtrip() {
        let original: Path = "M0.5,0.5 L10,0 Q15,5 10,10 C5,15 0,10 0.5,0.5".parse().unwrap();
        let reparsed: Path = original.to_string().parse().unwrap();
        assert_eq!(original.start(), reparsed.start());
        assert_eq!(original.commands(), reparsed.commands());
    }

    #[test]
    fn roundtrip_survives_accumulated_noise() {
        // 0.1 + 0.2 is the canonical display-noise example.
        let noisy = Path::new(Vec2::new(0.1_f64 + 0.2_f64, 0.0), vec![PathCmd::LineTo(Vec2::new(1.0, 1.0))]);
        let text = noisy.to_string();
        assert!(text.starts_with("M0.3,"), "got {text}");
        let reparsed: Path = text.parse().unwrap();
        assert!(reparsed.start().eq_approx(noisy.start(), 1e-10));
    }
}
