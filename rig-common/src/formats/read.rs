//! nom combinators shared by the `.skel` and `.skin` readers
//!
//! Both formats are whitespace separated keywords, numbers and braces. Every parser
//! here skips leading whitespace itself, so they chain without explicit separators.

use nom::{
    bytes::complete::{take_till, take_while1},
    character::complete::{multispace0, u32 as parse_u32},
    combinator::verify,
    error::{context, VerboseError, VerboseErrorKind},
    multi::fold_many_m_n,
    number::complete::float,
    sequence::preceded,
    IResult,
};

use super::FormatError;

pub(crate) type Res<'a, O> = IResult<&'a str, O, VerboseError<&'a str>>;

/// Run `parser` over a whole file and map any failure to a [`FormatError`]
pub(crate) fn run<'a, O>(
    src: &'a str,
    mut parser: impl FnMut(&'a str) -> Res<'a, O>,
) -> Result<O, FormatError> {
    match parser(src) {
        Ok((_, value)) => Ok(value),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(to_format_error(src, e)),
        Err(nom::Err::Incomplete(_)) => Err(FormatError::UnexpectedEof("input")),
    }
}

fn to_format_error(src: &str, error: VerboseError<&str>) -> FormatError {
    // Innermost entry first; the nearest context names what was expected
    let expected = error
        .errors
        .iter()
        .find_map(|(_, kind)| match kind {
            VerboseErrorKind::Context(label) => Some(*label),
            _ => None,
        })
        .unwrap_or("input");

    let Some((at, _)) = error.errors.first() else {
        return FormatError::Invalid("parser reported no position".to_string());
    };
    let rest = at.trim_start();
    if rest.is_empty() {
        return FormatError::UnexpectedEof(expected);
    }

    let line = line_of(src, rest);
    let found = rest.split_whitespace().next().unwrap_or_default().to_string();
    match expected {
        "number" | "integer" => FormatError::InvalidNumber { line, token: found },
        _ => FormatError::UnexpectedToken {
            line,
            expected: expected.to_string(),
            found,
        },
    }
}

/// 1-based line of `rest`, which must be a suffix of `src`
fn line_of(src: &str, rest: &str) -> usize {
    let offset = src.len().saturating_sub(rest.len());
    src[..offset].matches('\n').count() + 1
}

/// Next whitespace-delimited word
pub(crate) fn token(input: &str) -> Res<'_, &str> {
    preceded(multispace0, take_while1(|c: char| !c.is_whitespace()))(input)
}

/// A word that must equal `kw` exactly
pub(crate) fn keyword<'a>(kw: &'static str) -> impl FnMut(&'a str) -> Res<'a, &'a str> {
    context(kw, verify(token, move |t: &str| t == kw))
}

/// Rest of the current line, for keys the reader does not know
pub(crate) fn skip_line(input: &str) -> Res<'_, &str> {
    take_till(|c| c == '\n')(input)
}

pub(crate) fn number(input: &str) -> Res<'_, f32> {
    context("number", preceded(multispace0, float))(input)
}

pub(crate) fn index(input: &str) -> Res<'_, u32> {
    context("integer", preceded(multispace0, parse_u32))(input)
}

/// Exactly `N` floats
pub(crate) fn floats<const N: usize>(mut input: &str) -> Res<'_, [f32; N]> {
    let mut values = [0.0; N];
    for value in values.iter_mut() {
        let (rest, v) = number(input)?;
        *value = v;
        input = rest;
    }
    Ok((input, values))
}

/// `<count> { item* }` with exactly `count` items.
///
/// The vector grows as items parse, so a bogus count fails on the first missing item
/// instead of reserving memory for it.
pub(crate) fn counted<'a, O, F>(mut item: F) -> impl FnMut(&'a str) -> Res<'a, Vec<O>>
where
    F: FnMut(&'a str) -> Res<'a, O>,
{
    move |input: &'a str| {
        let (input, count) = index(input)?;
        let (input, _) = keyword("{")(input)?;
        let (input, values) = exactly(count as usize, &mut item)(input)?;
        let (input, _) = keyword("}")(input)?;
        Ok((input, values))
    }
}

/// Exactly `count` repetitions of `item`, collected without pre-sizing
pub(crate) fn exactly<'a, O, F>(count: usize, item: F) -> impl FnMut(&'a str) -> Res<'a, Vec<O>>
where
    F: FnMut(&'a str) -> Res<'a, O>,
{
    fold_many_m_n(count, count, item, Vec::new, |mut values: Vec<O>, value| {
        values.push(value);
        values
    })
}
