//! Command parsing.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::store::account::MAX_NAME_LEN;

/// A single client request.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Create(String),
    Serve(String),
    Deposit(f64),
    Withdraw(f64),
    Query,
    End,
    Quit,
}

/// Reasons a request line is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty command")]
    Empty,

    #[error("request is not ASCII")]
    NotAscii,

    #[error("unknown command `{0}`")]
    Unknown(String),

    #[error("`{0}` requires an argument")]
    MissingArgument(&'static str),

    #[error("`{0}` takes no argument")]
    UnexpectedArgument(&'static str),

    #[error("account name is {0} bytes, limit is {max}", max = MAX_NAME_LEN)]
    NameTooLong(usize),

    #[error("invalid amount `{0}`")]
    InvalidAmount(String),
}

impl Command {
    /// Parse one request line. Surrounding whitespace is ignored.
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ParseError::Empty);
        }
        if !input.is_ascii() {
            return Err(ParseError::NotAscii);
        }

        let (keyword, arg) = match input.split_once(char::is_whitespace) {
            Some((keyword, rest)) => (keyword, Some(rest.trim()).filter(|r| !r.is_empty())),
            None => (input, None),
        };

        match keyword {
            "create" => parse_name("create", arg).map(Command::Create),
            "serve" => parse_name("serve", arg).map(Command::Serve),
            "deposit" => parse_amount("deposit", arg).map(Command::Deposit),
            "withdraw" => parse_amount("withdraw", arg).map(Command::Withdraw),
            "query" => no_argument("query", arg).map(|_| Command::Query),
            "end" => no_argument("end", arg).map(|_| Command::End),
            "quit" => no_argument("quit", arg).map(|_| Command::Quit),
            other => Err(ParseError::Unknown(other.to_string())),
        }
    }

    /// Command keyword, used as a log field and metric label.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Create(_) => "create",
            Command::Serve(_) => "serve",
            Command::Deposit(_) => "deposit",
            Command::Withdraw(_) => "withdraw",
            Command::Query => "query",
            Command::End => "end",
            Command::Quit => "quit",
        }
    }
}

fn parse_name(keyword: &'static str, arg: Option<&str>) -> Result<String, ParseError> {
    let name = arg.ok_or(ParseError::MissingArgument(keyword))?;
    if name.len() > MAX_NAME_LEN {
        return Err(ParseError::NameTooLong(name.len()));
    }
    Ok(name.to_string())
}

fn parse_amount(keyword: &'static str, arg: Option<&str>) -> Result<f64, ParseError> {
    let raw = arg.ok_or(ParseError::MissingArgument(keyword))?;
    match raw.parse::<f64>() {
        Ok(amount) if amount.is_finite() && amount >= 0.0 => Ok(amount),
        _ => Err(ParseError::InvalidAmount(raw.to_string())),
    }
}

fn no_argument(keyword: &'static str, arg: Option<&str>) -> Result<(), ParseError> {
    match arg {
        Some(_) => Err(ParseError::UnexpectedArgument(keyword)),
        None => Ok(()),
    }
}

impl FromStr for Command {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Command::parse(s)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Create(name) | Command::Serve(name) => write!(f, "{} {}", self.name(), name),
            Command::Deposit(amount) | Command::Withdraw(amount) => {
                write!(f, "{} {}", self.name(), amount)
            }
            Command::Query | Command::End | Command::Quit => f.write_str(self.name()),
        }
    }
}
