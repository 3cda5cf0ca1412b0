//! Parser for the textual LTL surface syntax
//!
//! Accepts the conventional ASCII spellings (`!`, `&`, `|`, `->`, `<->`,
//! `X`, `G`, `F`, `U`) together with their unicode forms. Atoms start with a
//! lowercase letter or underscore, so the uppercase operator letters never
//! collide with them.
//!
//! Binding, loosest to tightest: `<->`, `->` (right-associative), `|`, `&`,
//! `U` (right-associative), prefix operators, atoms.

use crate::ltl::{Formula, FormulaRef};
use nom::{
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{char, multispace0, satisfy},
    combinator::{all_consuming, map, opt, recognize, value},
    multi::many0,
    sequence::{delimited, pair, preceded, terminated},
    IResult,
};
use thiserror::Error;

/// Error from parsing a surface-syntax formula
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("syntax error near `{rest}`")]
    Syntax { rest: String },
    #[error("empty input")]
    Empty,
}

/// Parse a complete formula, requiring all input to be consumed.
pub fn parse_formula(input: &str) -> Result<FormulaRef, ParseError> {
    if input.trim().is_empty() {
        return Err(ParseError::Empty);
    }
    match all_consuming(terminated(formula, multispace0))(input) {
        Ok((_, f)) => Ok(f),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(ParseError::Syntax {
            rest: e.input.chars().take(24).collect(),
        }),
        Err(nom::Err::Incomplete(_)) => Err(ParseError::Empty),
    }
}

/// Wrap a parser so it skips surrounding whitespace
fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

fn formula(input: &str) -> IResult<&str, FormulaRef> {
    biconditional(input)
}

fn biconditional(input: &str) -> IResult<&str, FormulaRef> {
    let (input, first) = implication(input)?;
    let (input, rest) = many0(preceded(ws(alt((tag("<->"), tag("↔")))), implication))(input)?;
    Ok((input, rest.into_iter().fold(first, Formula::iff)))
}

fn implication(input: &str) -> IResult<&str, FormulaRef> {
    let (input, lhs) = disjunction(input)?;
    let (input, rhs) = opt(preceded(ws(alt((tag("->"), tag("→")))), implication))(input)?;
    Ok((
        input,
        match rhs {
            Some(rhs) => Formula::implies(lhs, rhs),
            None => lhs,
        },
    ))
}

fn disjunction(input: &str) -> IResult<&str, FormulaRef> {
    let (input, first) = conjunction(input)?;
    let (input, rest) = many0(preceded(
        ws(alt((tag("||"), tag("|"), tag("∨")))),
        conjunction,
    ))(input)?;
    Ok((input, rest.into_iter().fold(first, Formula::or)))
}

fn conjunction(input: &str) -> IResult<&str, FormulaRef> {
    let (input, first) = until(input)?;
    let (input, rest) = many0(preceded(ws(alt((tag("&&"), tag("&"), tag("∧")))), until))(input)?;
    Ok((input, rest.into_iter().fold(first, Formula::and)))
}

fn until(input: &str) -> IResult<&str, FormulaRef> {
    let (input, lhs) = unary(input)?;
    let (input, rhs) = opt(preceded(ws(char('U')), until))(input)?;
    Ok((
        input,
        match rhs {
            Some(rhs) => Formula::until(lhs, rhs),
            None => lhs,
        },
    ))
}

fn unary(input: &str) -> IResult<&str, FormulaRef> {
    preceded(
        multispace0,
        alt((
            map(
                preceded(alt((tag("!"), tag("~"), tag("¬"))), unary),
                Formula::not,
            ),
            map(preceded(char('X'), unary), Formula::next),
            map(preceded(char('G'), unary), Formula::always),
            map(preceded(char('F'), unary), Formula::eventually),
            primary,
        )),
    )(input)
}

fn primary(input: &str) -> IResult<&str, FormulaRef> {
    alt((
        value(Formula::top(), tag("⊤")),
        value(Formula::bottom(), tag("⊥")),
        delimited(ws(char('(')), formula, preceded(multispace0, char(')'))),
        atom,
    ))(input)
}

fn atom(input: &str) -> IResult<&str, FormulaRef> {
    let (rest, name) = recognize(pair(
        satisfy(|c| c.is_ascii_lowercase() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))(input)?;
    let f = match name {
        "true" => Formula::top(),
        "false" => Formula::bottom(),
        _ => Formula::atom(name),
    };
    Ok((rest, f))
}
