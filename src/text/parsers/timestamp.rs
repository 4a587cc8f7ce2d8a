use nom::bytes::streaming::take_while_m_n;
use nom::character::streaming::{char, one_of};

use crate::text::parse_result::{fatal_parse_error, IonParseResult};
use crate::text::parsers::numeric_support::stop_character;
use crate::text::text_value::TextValue;
use crate::types::coefficient::{Coefficient, Sign};
use crate::types::decimal::Decimal;
use crate::types::integer::Int;
use crate::types::timestamp::TimestampBuilder;
use crate::types::Timestamp;

fn four_digits(input: &str) -> IonParseResult<'_, &str> {
    take_while_m_n(4, 4, |c: char| c.is_ascii_digit())(input)
}

fn two_digits(input: &str) -> IonParseResult<'_, &str> {
    take_while_m_n(2, 2, |c: char| c.is_ascii_digit())(input)
}

fn fraction_digits(input: &str) -> IonParseResult<'_, &str> {
    nom::bytes::streaming::take_while1(|c: char| c.is_ascii_digit())(input)
}

fn literal_t(input: &str) -> IonParseResult<'_, char> {
    char('T')(input)
}

fn literal_dash(input: &str) -> IonParseResult<'_, char> {
    char('-')(input)
}

fn literal_colon(input: &str) -> IonParseResult<'_, char> {
    char(':')(input)
}

// The matched fields are all at most four digits, so this cannot actually fail.
fn digits_value(
    digits: &str,
) -> Result<u32, nom::Err<crate::text::parse_result::IonParseError<'static>>> {
    digits.parse::<u32>().map_err(|_| {
        nom::Err::Failure(
            crate::text::parse_result::IonParseError::new("")
                .with_description("invalid timestamp field"),
        )
    })
}

// Completes a date-only (year, month, or day precision) timestamp: the next character must
// be a stop character, and the offset is always unknown.
fn finish_date<'a>(
    original_input: &'a str,
    builder: TimestampBuilder,
    rest: &'a str,
) -> IonParseResult<'a, TextValue> {
    let (rest, _) = match stop_character(rest) {
        Ok(matched) => matched,
        Err(nom::Err::Incomplete(needed)) => return Err(nom::Err::Incomplete(needed)),
        Err(_) => return fatal_parse_error(original_input, "invalid character after timestamp"),
    };
    match builder.build() {
        Ok(timestamp) => Ok((rest, TextValue::Timestamp(timestamp))),
        Err(error) => fatal_parse_error(original_input, error),
    }
}

fn finish_with_offset<'a>(
    original_input: &'a str,
    builder: TimestampBuilder,
    offset_minutes: Option<i32>,
    rest: &'a str,
) -> IonParseResult<'a, TextValue> {
    let (rest, _) = match stop_character(rest) {
        Ok(matched) => matched,
        Err(nom::Err::Incomplete(needed)) => return Err(nom::Err::Incomplete(needed)),
        Err(_) => return fatal_parse_error(original_input, "invalid character after timestamp"),
    };
    let result = match offset_minutes {
        Some(minutes) => builder.build_at_offset(minutes),
        None => builder.build_at_unknown_offset(),
    };
    match result {
        Ok(timestamp) => Ok((rest, TextValue::Timestamp(timestamp))),
        Err(error) => fatal_parse_error(original_input, error),
    }
}

// `Z`, `+hh:mm`, or `-hh:mm`; `-00:00` means the local offset is unknown.
fn offset<'a>(original_input: &'a str, input: &'a str) -> IonParseResult<'a, Option<i32>> {
    match char::<_, crate::text::parse_result::IonParseError>('Z')(input) {
        Ok((rest, _)) => return Ok((rest, Some(0))),
        Err(nom::Err::Incomplete(needed)) => return Err(nom::Err::Incomplete(needed)),
        Err(_) => {}
    }
    let (rest, sign) = match one_of::<_, _, crate::text::parse_result::IonParseError>("+-")(input) {
        Ok(matched) => matched,
        Err(nom::Err::Incomplete(needed)) => return Err(nom::Err::Incomplete(needed)),
        Err(_) => {
            return fatal_parse_error(
                original_input,
                "a timestamp with a time component requires an offset",
            )
        }
    };
    let (rest, hours_digits) = two_digits(rest)?;
    let (rest, _) = literal_colon(rest)?;
    let (rest, minutes_digits) = two_digits(rest)?;
    let hours = digits_value(hours_digits)?;
    let minutes = digits_value(minutes_digits)?;
    if hours >= 24 || minutes >= 60 {
        return fatal_parse_error(original_input, "timestamp offset is out of range");
    }
    let total_minutes = (hours * 60 + minutes) as i32;
    let offset_minutes = match (sign, total_minutes) {
        ('-', 0) => None, // -00:00: unknown local offset
        ('-', minutes) => Some(-minutes),
        (_, minutes) => Some(minutes),
    };
    Ok((rest, offset_minutes))
}

/// Matches a timestamp literal at any of its legal precisions: `2007T`, `2007-12T`,
/// `2007-12-28`, `2007-12-28T12:34Z`, `2007-12-28T12:34:56.789-07:00`, and so on.
pub(crate) fn parse_timestamp(input: &str) -> IonParseResult<'_, TextValue> {
    let (rest, year_digits) = four_digits(input)?;
    let year = digits_value(year_digits)?;
    let builder = Timestamp::with_year(year);

    // Year precision: "2007T"
    match literal_t(rest) {
        Ok((rest, _)) => return finish_date(input, builder, rest),
        Err(nom::Err::Incomplete(needed)) => return Err(nom::Err::Incomplete(needed)),
        Err(_) => {}
    }

    let (rest, _) = literal_dash(rest)?;
    let (rest, month_digits) = two_digits(rest)?;
    let builder = builder.with_month(digits_value(month_digits)?);

    // Month precision requires its trailing T: "2007-12T"
    match literal_t(rest) {
        Ok((rest, _)) => return finish_date(input, builder, rest),
        Err(nom::Err::Incomplete(needed)) => return Err(nom::Err::Incomplete(needed)),
        Err(_) => {}
    }

    let (rest, _) = literal_dash(rest)?;
    let (rest, day_digits) = two_digits(rest)?;
    let builder = builder.with_day(digits_value(day_digits)?);

    // Day precision, with or without a trailing T: "2007-12-28" / "2007-12-28T"
    let (rest, _) = match literal_t(rest) {
        Ok(matched) => matched,
        Err(nom::Err::Incomplete(needed)) => return Err(nom::Err::Incomplete(needed)),
        Err(_) => return finish_date(input, builder, rest),
    };
    let (rest, hour_digits) = match two_digits(rest) {
        Ok(matched) => matched,
        Err(nom::Err::Incomplete(needed)) => return Err(nom::Err::Incomplete(needed)),
        Err(_) => return finish_date(input, builder, rest),
    };

    // From here on the input is unambiguously a timestamp with a time component; problems
    // are fatal rather than retryable.
    let (rest, _) = match literal_colon(rest) {
        Ok(matched) => matched,
        Err(nom::Err::Incomplete(needed)) => return Err(nom::Err::Incomplete(needed)),
        Err(_) => return fatal_parse_error(input, "a timestamp hour requires a minute"),
    };
    let (rest, minute_digits) = two_digits(rest)?;
    let mut builder = builder.with_hour_and_minute(
        digits_value(hour_digits)?,
        digits_value(minute_digits)?,
    );

    // Optional seconds and fraction
    let mut rest = rest;
    match literal_colon(rest) {
        Ok((after_colon, _)) => {
            let (after_seconds, second_digits) = two_digits(after_colon)?;
            builder = builder.with_second(digits_value(second_digits)?);
            rest = after_seconds;
            if let Ok((after_dot, _)) =
                char::<_, crate::text::parse_result::IonParseError>('.')(rest)
            {
                let (after_fraction, digits) = fraction_digits(after_dot)?;
                let magnitude = match Int::from_decimal_str(digits) {
                    Ok(value) => value.magnitude(),
                    Err(_) => return fatal_parse_error(input, "invalid timestamp fraction"),
                };
                let coefficient = Coefficient::new(Sign::Positive, magnitude);
                let fraction = Decimal::new(coefficient, -(digits.len() as i64));
                builder = builder.with_fractional_seconds(fraction);
                rest = after_fraction;
            }
        }
        Err(nom::Err::Incomplete(needed)) => return Err(nom::Err::Incomplete(needed)),
        Err(_) => {}
    }

    let (rest, offset_minutes) = offset(input, rest)?;
    finish_with_offset(input, builder, offset_minutes, rest)
}
