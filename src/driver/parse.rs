use nom::{
    branch::alt,
    character::complete::{alpha1, anychar, char, i32 as parse_i32, multispace0},
    combinator::{all_consuming, map},
    multi::many0,
    sequence::{delimited, separated_pair},
    IResult,
};

// the controller pads its replies with line terminators, sometimes with
// blanks too. a sign is allowed, a '+' included
pub(super) fn parse_integer(s: &str) -> Option<i32> {
    let res: IResult<&str, i32> =
        all_consuming(delimited(multispace0, parse_i32, multispace0))(s);
    res.ok().map(|(_, n)| n)
}

fn status_field(s: &str) -> IResult<&str, (&str, i32)> {
    separated_pair(alpha1, char('='), parse_i32)(s)
}

// collects every KEY=value pair found in a status reply, skipping whatever
// is in between. garbage yields an empty list, never an error
pub(super) fn parse_status_fields(s: &str) -> Vec<(&str, i32)> {
    let scan: IResult<&str, Vec<Option<(&str, i32)>>> =
        many0(alt((map(status_field, Some), map(anychar, |_| None))))(s);
    match scan {
        Ok((_, fields)) => fields.into_iter().flatten().collect(),
        Err(_) => Vec::new(),
    }
}
