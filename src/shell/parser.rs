use chumsky::{prelude::*, regex::regex, text::ascii::ident};

use crate::filter::Criterion;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    // INSERT 'Country' ISO3 ( v1, v2, ... )
    Insert {
        name: String,
        code: String,
        measurements: Vec<f64>,
    },

    // DELETE key
    Delete(f64),

    // SEARCH key
    Search(f64),

    // INFO key
    Info(f64),

    // LIST
    List,

    // LEVELS [CODES]
    Levels { codes: bool },

    // STATS
    Stats,

    // CLEAR
    Clear,

    // LOAD 'file_path'
    Load(String),

    // FILTER criterion
    Filter(Criterion),

    Comment(String),
    Empty,
}

pub fn parser<'a>() -> impl Parser<'a, &'a str, Vec<Command>, extra::Err<Rich<'a, char>>> {
    fn number<'a>() -> impl Parser<'a, &'a str, f64, extra::Err<Rich<'a, char>>> {
        regex(r"-?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?")
            .try_map(|s: &str, span| match s.parse::<f64>() {
                Ok(value) if value.is_finite() => Ok(value),
                Ok(_) => Err(Rich::custom(span, format!("number out of range: {s}"))),
                Err(e) => Err(Rich::custom(span, format!("invalid number {s:?}: {e}"))),
            })
            .padded()
    }

    fn year<'a>() -> impl Parser<'a, &'a str, i32, extra::Err<Rich<'a, char>>> {
        regex(r"-?\d+")
            .try_map(|s: &str, span| {
                s.parse::<i32>()
                    .map_err(|e| Rich::custom(span, format!("invalid year {s:?}: {e}")))
            })
            .padded()
    }

    fn string<'a>() -> impl Parser<'a, &'a str, String, extra::Err<Rich<'a, char>>> {
        regex(r#"'([^'\\]|\\.)*'"#)
            .map(|s: &str| s[1..s.len() - 1].replace("\\'", "'"))
            .padded()
    }

    fn keyword<'a>(
        word: &'static str,
    ) -> impl Parser<'a, &'a str, (), extra::Err<Rich<'a, char>>> {
        just(word).ignored().padded()
    }

    fn tree_command<'a>() -> impl Parser<'a, &'a str, Command, extra::Err<Rich<'a, char>>> {
        let insert = keyword("INSERT")
            // 'Country'
            .ignore_then(string())
            // ISO3
            .then(ident().map(|s: &str| s.to_string()).padded())
            // ( measurement_list )
            .then(
                number()
                    .separated_by(just(',').padded())
                    .collect::<Vec<f64>>()
                    .delimited_by(just('(').padded(), just(')').padded()),
            )
            .map(|((name, code), measurements)| Command::Insert {
                name,
                code,
                measurements,
            });

        let delete = keyword("DELETE").ignore_then(number()).map(Command::Delete);
        let search = keyword("SEARCH").ignore_then(number()).map(Command::Search);
        let info = keyword("INFO").ignore_then(number()).map(Command::Info);

        let list = keyword("LIST").to(Command::List);

        let levels = keyword("LEVELS")
            .ignore_then(keyword("CODES").or_not())
            .map(|codes| Command::Levels {
                codes: codes.is_some(),
            });

        let stats = keyword("STATS").to(Command::Stats);
        let clear = keyword("CLEAR").to(Command::Clear);
        let load = keyword("LOAD").ignore_then(string()).map(Command::Load);

        choice((insert, delete, search, info, list, levels, stats, clear, load))
    }

    fn filter_command<'a>() -> impl Parser<'a, &'a str, Command, extra::Err<Rich<'a, char>>> {
        let above_mean = keyword("ABOVE")
            .then(keyword("MEAN"))
            .to(Criterion::AboveMean);

        let below_mean = keyword("BELOW")
            .then(keyword("MEAN"))
            .to(Criterion::BelowMean);

        let at_least = keyword("AT")
            .then(keyword("LEAST"))
            .ignore_then(number())
            .map(Criterion::AtLeast);

        // YEAR y ABOVE MEAN | YEAR y BELOW GLOBAL
        let by_year = keyword("YEAR")
            .ignore_then(year())
            .then(choice((
                keyword("ABOVE").then(keyword("MEAN")).to(false),
                keyword("BELOW").then(keyword("GLOBAL")).to(true),
            )))
            .map(|(year, below_global)| {
                if below_global {
                    Criterion::YearBelowGlobalMean(year)
                } else {
                    Criterion::YearAboveYearMean(year)
                }
            });

        keyword("FILTER")
            .ignore_then(choice((above_mean, below_mean, at_least, by_year)))
            .map(Command::Filter)
    }

    // Runs to the end of the line; no ';' needed
    fn comment<'a>() -> impl Parser<'a, &'a str, Command, extra::Err<Rich<'a, char>>> {
        just("--")
            .ignore_then(none_of("\n").repeated().to_slice())
            .map(|s: &str| Command::Comment(s.trim().to_string()))
    }

    fn empty_statement<'a>() -> impl Parser<'a, &'a str, Command, extra::Err<Rich<'a, char>>> {
        just(';').to(Command::Empty)
    }

    choice((
        tree_command().then_ignore(just(';')),
        filter_command().then_ignore(just(';')),
        comment(),
        empty_statement(),
    ))
    .padded()
    .repeated()
    .collect::<Vec<_>>()
    .padded()
}
