//! Line-oriented operator console.

use witness_proto::{DataKey, DataValue, DataWrapper};

/// Usage text printed by `help`.
pub const HELP: &str = "\
commands:
  search <parameters>             search records, e.g. `search a:break c:tnt -ng`
  record <event> [key=value ...]  queue a record, e.g. `record break cause=tnt`
  flush                           write queued records now
  purge                           remove expired records
  help                            show this message
  quit                            flush and exit";

/// A parsed console line.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    Search(String),
    Record { event: String, data: DataWrapper },
    Flush,
    Purge,
    Help,
    Quit,
}

/// Parse one console line. Blank lines yield `None`.
pub fn parse_line(line: &str) -> Result<Option<ConsoleCommand>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (command, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();

    let command = match command.to_ascii_lowercase().as_str() {
        "search" | "s" | "lookup" | "l" => ConsoleCommand::Search(rest.to_string()),
        "record" => parse_record(rest)?,
        "flush" => ConsoleCommand::Flush,
        "purge" => ConsoleCommand::Purge,
        "help" | "?" => ConsoleCommand::Help,
        "quit" | "exit" | "stop" => ConsoleCommand::Quit,
        other => return Err(format!("Unknown command '{other}'. Type 'help' for usage.")),
    };
    Ok(Some(command))
}

fn parse_record(rest: &str) -> Result<ConsoleCommand, String> {
    let mut tokens = rest.split_whitespace();
    let event = tokens
        .next()
        .ok_or_else(|| "Usage: record <event> [key=value ...]".to_string())?;

    let mut data = DataWrapper::new();
    for token in tokens {
        let (key, value) = token
            .split_once('=')
            .filter(|(k, v)| !k.is_empty() && !v.is_empty())
            .ok_or_else(|| format!("Expected key=value, got '{token}'"))?;
        data.set(&DataKey::parse(key), parse_value(value));
    }

    Ok(ConsoleCommand::Record {
        event: event.to_ascii_lowercase(),
        data,
    })
}

fn parse_value(value: &str) -> DataValue {
    if let Ok(i) = value.parse::<i64>() {
        return DataValue::Int(i);
    }
    if let Some(f) = value.parse::<f64>().ok().filter(|f| f.is_finite()) {
        return DataValue::Float(f);
    }
    match value {
        "true" => DataValue::Bool(true),
        "false" => DataValue::Bool(false),
        _ => DataValue::String(value.replace('_', " ")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_search_keeps_arguments() {
        assert_eq!(
            parse_line("  search a:break  c:tnt -ng ").unwrap(),
            Some(ConsoleCommand::Search("a:break  c:tnt -ng".to_string()))
        );
        assert_eq!(parse_line("s").unwrap(), Some(ConsoleCommand::Search(String::new())));
    }

    #[test]
    fn test_record_fields() {
        let Some(ConsoleCommand::Record { event, data }) =
            parse_line("record BREAK cause=tnt location.x=10 location.y=64.5 message=hi_there")
                .unwrap()
        else {
            panic!("expected a record command");
        };
        assert_eq!(event, "break");
        assert_eq!(data.get_str(&DataKey::of("cause")), Some("tnt"));
        assert_eq!(data.get(&DataKey::parse("location.x")), Some(&DataValue::Int(10)));
        assert_eq!(data.get(&DataKey::parse("location.y")), Some(&DataValue::Float(64.5)));
        assert_eq!(data.get_str(&DataKey::of("message")), Some("hi there"));
    }

    #[test]
    fn test_non_finite_numbers_stay_text() {
        assert_eq!(parse_value("1.5"), DataValue::Float(1.5));
        assert_eq!(parse_value("inf"), DataValue::String("inf".into()));
        assert_eq!(parse_value("NaN"), DataValue::String("NaN".into()));
    }

    #[test]
    fn test_errors() {
        assert_eq!(parse_line("").unwrap(), None);
        assert!(parse_line("record").is_err());
        assert!(parse_line("record break cause").is_err());
        assert!(parse_line("rollback").unwrap_err().contains("Unknown command"));
    }
}
