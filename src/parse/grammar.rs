use winnow::ascii::dec_int;
use winnow::combinator::{alt, cut_err, delimited, not, opt, preceded, repeat, separated};
use winnow::error::{ErrMode, ModalResult, StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::token::{any, one_of, take_while};

use crate::{CompareOp, Expr, Value};

// -- Whitespace -------------------------------------------------------------

fn ws(input: &mut &str) -> ModalResult<()> {
    take_while(0.., |c: char| c.is_ascii_whitespace())
        .void()
        .parse_next(input)
}

// Succeeds only when the next char cannot continue an identifier, so the
// keywords NOT/AND/OR/IN never swallow a path prefix ("notes" is a path,
// not NOT es).
fn ident_boundary(input: &mut &str) -> ModalResult<()> {
    not(one_of(|c: char| {
        c.is_ascii_alphanumeric() || c == '_' || c == '-'
    }))
    .parse_next(input)
}

// -- Paths ------------------------------------------------------------------

// One dotted-path segment: an identifier, optionally prefixed with `$` for
// payload substitution. `-` is allowed after the first character so slugged
// rule ids stay addressable (`state.royal-fog.$tile`).
fn path_segment<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    (
        opt('$'),
        take_while(1.., |c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(0.., |c: char| {
            c.is_ascii_alphanumeric() || c == '_' || c == '-'
        }),
    )
        .take()
        .parse_next(input)
}

fn path<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    (
        path_segment,
        repeat(0.., preceded('.', path_segment)).map(|_: Vec<&str>| ()),
    )
        .take()
        .parse_next(input)
}

// -- Values -----------------------------------------------------------------

fn string_literal(input: &mut &str) -> ModalResult<String> {
    '"'.parse_next(input)?;
    let mut s = String::new();
    loop {
        let ch = any.parse_next(input)?;
        match ch {
            '"' => return Ok(s),
            '\\' => {
                let esc = any.parse_next(input)?;
                match esc {
                    '"' => s.push('"'),
                    '\\' => s.push('\\'),
                    'n' => s.push('\n'),
                    't' => s.push('\t'),
                    other => {
                        s.push('\\');
                        s.push(other);
                    }
                }
            }
            c => s.push(c),
        }
    }
}

fn negative_number(input: &mut &str) -> ModalResult<Value> {
    let neg_str = (
        '-',
        take_while(1.., |c: char| c.is_ascii_digit() || c == '.'),
    )
        .take()
        .parse_next(input)?;
    if neg_str.contains('.') {
        let f: f64 = neg_str
            .parse()
            .map_err(|_| ErrMode::from_input(input).cut())?;
        Ok(Value::Float(f))
    } else {
        let i: i64 = neg_str
            .parse()
            .map_err(|_| ErrMode::from_input(input).cut())?;
        Ok(Value::Int(i))
    }
}

fn float_literal(input: &mut &str) -> ModalResult<f64> {
    // Only match floats that contain a decimal point
    (
        take_while(1.., |c: char| c.is_ascii_digit()),
        '.',
        take_while(1.., |c: char| c.is_ascii_digit()),
    )
        .take()
        .try_map(|s: &str| s.parse::<f64>())
        .parse_next(input)
}

fn value(input: &mut &str) -> ModalResult<Value> {
    ws.parse_next(input)?;
    alt((
        string_literal.map(Value::String),
        "true".value(Value::Bool(true)),
        "false".value(Value::Bool(false)),
        negative_number,
        float_literal.map(Value::Float),
        dec_int::<_, i64, _>.map(Value::Int),
    ))
    .context(StrContext::Expected(StrContextValue::Description("value")))
    .parse_next(input)
}

fn value_list(input: &mut &str) -> ModalResult<Vec<Value>> {
    delimited(
        '[',
        cut_err(separated(1.., value, (ws, ','))),
        (ws, cut_err(']')),
    )
    .parse_next(input)
}

// -- Comparison operators ---------------------------------------------------

fn compare_op(input: &mut &str) -> ModalResult<CompareOp> {
    ws.parse_next(input)?;
    alt((
        ">=".value(CompareOp::Gte),
        ">".value(CompareOp::Gt),
        "<=".value(CompareOp::Lte),
        "<".value(CompareOp::Lt),
        "==".value(CompareOp::Eq),
        "!=".value(CompareOp::Neq),
    ))
    .parse_next(input)
}

// -- Expressions (precedence: OR < AND < NOT < primary) ---------------------

fn primary(input: &mut &str) -> ModalResult<Expr> {
    ws.parse_next(input)?;
    alt((delimited('(', expr, (ws, cut_err(')'))), comparison))
        .context(StrContext::Expected(StrContextValue::Description(
            "expression",
        )))
        .parse_next(input)
}

fn comparison(input: &mut &str) -> ModalResult<Expr> {
    let p = path.parse_next(input)?;
    let checkpoint = input.checkpoint();
    if let Ok(op) = compare_op.parse_next(input) {
        let val = cut_err(value).parse_next(input)?;
        return Ok(Expr::Compare {
            path: p.to_owned(),
            op,
            value: val,
        });
    }
    input.reset(&checkpoint);
    ws.parse_next(input)?;
    if opt((alt(("IN", "in")), ident_boundary))
        .parse_next(input)?
        .is_some()
    {
        ws.parse_next(input)?;
        let values = cut_err(value_list).parse_next(input)?;
        return Ok(Expr::In {
            path: p.to_owned(),
            values,
        });
    }
    input.reset(&checkpoint);
    // Bare path: truthiness test
    Ok(Expr::Path(p.to_owned()))
}

fn unary(input: &mut &str) -> ModalResult<Expr> {
    ws.parse_next(input)?;
    if opt((alt(("NOT", "not")), ident_boundary))
        .parse_next(input)?
        .is_some()
    {
        let inner = cut_err(unary).parse_next(input)?;
        Ok(Expr::Not(Box::new(inner)))
    } else {
        primary(input)
    }
}

fn and_expr(input: &mut &str) -> ModalResult<Expr> {
    let first = unary(input)?;
    let rest: Vec<Expr> =
        repeat(
            0..,
            preceded((ws, alt(("AND", "and")), ident_boundary), cut_err(unary)),
        )
        .parse_next(input)?;
    Ok(rest
        .into_iter()
        .fold(first, |acc, r| Expr::And(Box::new(acc), Box::new(r))))
}

fn or_expr(input: &mut &str) -> ModalResult<Expr> {
    let first = and_expr(input)?;
    let rest: Vec<Expr> =
        repeat(
            0..,
            preceded((ws, alt(("OR", "or")), ident_boundary), cut_err(and_expr)),
        )
        .parse_next(input)?;
    Ok(rest
        .into_iter()
        .fold(first, |acc, r| Expr::Or(Box::new(acc), Box::new(r))))
}

pub fn expr(input: &mut &str) -> ModalResult<Expr> {
    ws.parse_next(input)?;
    let parsed = or_expr(input)?;
    ws.parse_next(input)?;
    Ok(parsed)
}
