//! Duration strings such as `3d`, `1w2d` or `12h30m`, lexed with logos.

use chrono::Duration;
use logos::{Lexer, Logos};

/// One `<number><unit>` component of a duration string.
#[derive(Logos, Debug, Clone, PartialEq)]
enum DurationToken {
    #[regex(r"[0-9]+[sS]", |lex| part_seconds(lex, 1))]
    Seconds(i64),
    #[regex(r"[0-9]+[mM]", |lex| part_seconds(lex, 60))]
    Minutes(i64),
    #[regex(r"[0-9]+[hH]", |lex| part_seconds(lex, 3_600))]
    Hours(i64),
    #[regex(r"[0-9]+[dD]", |lex| part_seconds(lex, 86_400))]
    Days(i64),
    #[regex(r"[0-9]+[wW]", |lex| part_seconds(lex, 604_800))]
    Weeks(i64),
}

fn part_seconds(lex: &mut Lexer<DurationToken>, unit: i64) -> Option<i64> {
    let slice = lex.slice();
    let amount: i64 = slice[..slice.len() - 1].parse().ok()?;
    amount.checked_mul(unit)
}

/// Parse a duration string into a positive [`Duration`].
///
/// Returns `None` for empty input, unknown units, overflow, or a total of
/// zero.
pub fn parse_duration(text: &str) -> Option<Duration> {
    let mut total: i64 = 0;
    let mut parts = 0usize;

    for token in DurationToken::lexer(text) {
        let seconds = match token.ok()? {
            DurationToken::Seconds(s)
            | DurationToken::Minutes(s)
            | DurationToken::Hours(s)
            | DurationToken::Days(s)
            | DurationToken::Weeks(s) => s,
        };
        total = total.checked_add(seconds)?;
        parts += 1;
    }

    if parts == 0 || total <= 0 {
        return None;
    }
    Duration::try_seconds(total)
}
