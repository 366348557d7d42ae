//! `printf`-style formatting over traced values.

use std::iter::Peekable;
use std::str::Chars;

use serde_json::Value;

use crate::protocol::TraceError;
use crate::view::format::number_text;
use crate::view::text_of;

/// Largest accepted width or precision.
const MAX_FIELD: usize = 1024;

#[derive(Debug, Default, Clone, Copy)]
struct Spec {
    position: Option<usize>,
    left: bool,
    plus: bool,
    space: bool,
    zero: bool,
    width: Option<usize>,
    precision: Option<usize>,
    conversion: char,
}

/// Expand `format` against `args`. Placeholders without an explicit
/// `N$` position consume arguments left to right.
pub fn sprintf(format: &str, args: &[Value]) -> Result<String, TraceError> {
    let mut out = String::with_capacity(format.len());
    let mut chars = format.chars().peekable();
    let mut next_arg = 0;
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        if chars.peek() == Some(&'%') {
            chars.next();
            out.push('%');
            continue;
        }
        let spec = parse_spec(&mut chars)?;
        let index = match spec.position {
            Some(position) => position - 1,
            None => {
                next_arg += 1;
                next_arg - 1
            }
        };
        let value = args.get(index).ok_or_else(|| {
            TraceError::argument("printf", format!("missing argument {}", index + 1))
        })?;
        out.push_str(&render(&spec, value)?);
    }
    Ok(out)
}

/// Consume a digit run as a width or precision, `None` when there is none.
fn field(chars: &mut Peekable<Chars<'_>>, what: &str) -> Result<Option<usize>, TraceError> {
    let mut text = String::new();
    while let Some(c) = chars.peek().copied().filter(char::is_ascii_digit) {
        text.push(c);
        chars.next();
    }
    if text.is_empty() {
        return Ok(None);
    }
    match text.parse::<usize>() {
        Ok(n) if n <= MAX_FIELD => Ok(Some(n)),
        _ => Err(TraceError::argument(
            "printf",
            format!("{what} {text} exceeds {MAX_FIELD}"),
        )),
    }
}

fn parse_spec(chars: &mut Peekable<Chars<'_>>) -> Result<Spec, TraceError> {
    let mut spec = Spec::default();

    // A leading digit run is either `N$` or a width.
    let lookahead: String = chars.clone().take_while(char::is_ascii_digit).collect();
    if !lookahead.is_empty() && !lookahead.starts_with('0') {
        let mut probe = chars.clone();
        for _ in 0..lookahead.len() {
            probe.next();
        }
        if probe.peek() == Some(&'$') {
            let position = lookahead.parse().map_err(|_| {
                TraceError::argument(
                    "printf",
                    format!("argument position {lookahead} is too large"),
                )
            })?;
            spec.position = Some(position);
            *chars = probe;
            chars.next();
        }
    }

    while let Some(&c) = chars.peek() {
        match c {
            '-' => spec.left = true,
            '+' => spec.plus = true,
            ' ' => spec.space = true,
            '0' => spec.zero = true,
            _ => break,
        }
        chars.next();
    }
    spec.width = field(chars, "width")?;
    if chars.peek() == Some(&'.') {
        chars.next();
        spec.precision = Some(field(chars, "precision")?.unwrap_or(0));
    }
    spec.conversion = match chars.next() {
        Some(c @ ('s' | 'd' | 'i' | 'f' | 'e' | 'x' | 'X' | 'o' | 'b' | 'c' | 'j')) => c,
        Some(other) => {
            return Err(TraceError::argument(
                "printf",
                format!("unsupported conversion '%{other}'"),
            ))
        }
        None => return Err(TraceError::argument("printf", "format ends inside a placeholder")),
    };
    Ok(spec)
}

fn number(spec: &Spec, value: &Value) -> Result<f64, TraceError> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };
    parsed.filter(|f| !f.is_nan()).ok_or_else(|| {
        TraceError::argument(
            "printf",
            format!("%{} expects a number, got {value}", spec.conversion),
        )
    })
}

/// Unsigned 32-bit view used by the radix conversions.
fn as_u32(value: f64) -> u32 {
    value.trunc() as i64 as u32
}

/// Exponent notation with an explicit exponent sign (`1.5e+2`).
fn exponential(value: f64, precision: Option<usize>) -> String {
    let text = match precision {
        Some(p) => format!("{value:.p$e}"),
        None => format!("{value:e}"),
    };
    match text.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
        _ => text,
    }
}

fn render(spec: &Spec, value: &Value) -> Result<String, TraceError> {
    let mut negative = false;
    let body = match spec.conversion {
        's' => {
            let text = text_of(value);
            match spec.precision {
                Some(p) => text.chars().take(p).collect(),
                None => text,
            }
        }
        // Compact JSON, same text as `serde_json::to_string`.
        'j' => value.to_string(),
        'c' => {
            let code = number(spec, value)?;
            char::from_u32(code.trunc() as u32)
                .map(String::from)
                .unwrap_or_default()
        }
        'd' | 'i' => {
            let n = number(spec, value)?.trunc();
            negative = n < 0.0;
            number_text(n.abs())
        }
        'f' => {
            let n = number(spec, value)?;
            negative = n < 0.0;
            match spec.precision {
                Some(p) => format!("{:.p$}", n.abs()),
                None => number_text(n.abs()),
            }
        }
        'e' => {
            let n = number(spec, value)?;
            negative = n < 0.0;
            exponential(n.abs(), spec.precision)
        }
        'x' => format!("{:x}", as_u32(number(spec, value)?)),
        'X' => format!("{:X}", as_u32(number(spec, value)?)),
        'o' => format!("{:o}", as_u32(number(spec, value)?)),
        // 'b'
        _ => format!("{:b}", as_u32(number(spec, value)?)),
    };

    let signed = matches!(spec.conversion, 'd' | 'i' | 'f' | 'e');
    let sign = if negative {
        "-"
    } else if signed && spec.plus {
        "+"
    } else if signed && spec.space {
        " "
    } else {
        ""
    };

    let len = sign.chars().count() + body.chars().count();
    let pad = spec.width.unwrap_or(0).saturating_sub(len);
    Ok(if spec.left {
        format!("{sign}{body}{}", " ".repeat(pad))
    } else if spec.zero {
        format!("{sign}{}{body}", "0".repeat(pad))
    } else {
        format!("{}{sign}{body}", " ".repeat(pad))
    })
}
