use platepick_core::models::{CoreError, CoreErrorKind, CoreResult, Location};

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Here(Location),
    Where(String),
    Tiers(Vec<String>),
    Go,
    Reroll,
    Status,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  here <lat> <lng>    use these coordinates as your location
  where <address>     look up an address and search around it
  tiers <values...>   choose price ranges, e.g. `tiers 0,1 2`
  go                  search, or cancel a running search
  reroll              pick again from the last results
  status              show location, price ranges and search state
  help                show this help
  quit                exit";

pub fn parse_command(line: &str) -> CoreResult<Option<Command>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let command = match verb.to_ascii_lowercase().as_str() {
        "here" => Command::Here(parse_coordinates(rest)?),
        "where" => Command::Where(rest.to_string()),
        "tiers" => Command::Tiers(rest.split_whitespace().map(str::to_string).collect()),
        "go" => Command::Go,
        "reroll" => Command::Reroll,
        "status" => Command::Status,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => {
            return Err(CoreError::new(
                CoreErrorKind::InvalidInput,
                format!("unknown command '{other}', type `help`"),
            ));
        }
    };

    Ok(Some(command))
}

fn parse_coordinates(rest: &str) -> CoreResult<Location> {
    let mut parts = rest.split(|c: char| c == ',' || c.is_whitespace()).filter(|part| !part.is_empty());
    let (Some(lat), Some(lng), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(CoreError::new(
            CoreErrorKind::InvalidInput,
            "usage: here <lat> <lng>",
        ));
    };

    let lat = parse_degrees(lat, 90.0)?;
    let lng = parse_degrees(lng, 180.0)?;
    Ok(Location::new(lat, lng))
}

fn parse_degrees(raw: &str, limit: f64) -> CoreResult<f64> {
    let value: f64 = raw.parse().map_err(|_| {
        CoreError::new(
            CoreErrorKind::InvalidInput,
            format!("'{raw}' is not a coordinate"),
        )
    })?;
    if !value.is_finite() || value.abs() > limit {
        return Err(CoreError::new(
            CoreErrorKind::InvalidInput,
            format!("'{raw}' is out of range"),
        ));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use platepick_core::models::{CoreErrorKind, Location};

    use super::{Command, parse_command};

    #[test]
    fn blank_line_is_ignored() {
        assert_eq!(parse_command("   ").unwrap(), None);
    }

    #[test]
    fn here_accepts_space_or_comma_separated_coordinates() {
        let expected = Some(Command::Here(Location::new(25.033, 121.5654)));
        assert_eq!(parse_command("here 25.033 121.5654").unwrap(), expected);
        assert_eq!(parse_command("here 25.033,121.5654").unwrap(), expected);
    }

    #[test]
    fn here_rejects_out_of_range_latitude() {
        let error = parse_command("here 95 10").unwrap_err();
        assert_eq!(error.kind, CoreErrorKind::InvalidInput);
    }

    #[test]
    fn where_keeps_the_full_address() {
        assert_eq!(
            parse_command("where  Taipei 101, Xinyi ").unwrap(),
            Some(Command::Where("Taipei 101, Xinyi".to_string()))
        );
    }

    #[test]
    fn tiers_collects_each_selection() {
        assert_eq!(
            parse_command("tiers 0,1 2").unwrap(),
            Some(Command::Tiers(vec!["0,1".to_string(), "2".to_string()]))
        );
    }

    #[test]
    fn verbs_are_case_insensitive() {
        assert_eq!(parse_command("GO").unwrap(), Some(Command::Go));
        assert_eq!(parse_command("exit").unwrap(), Some(Command::Quit));
    }

    #[test]
    fn unknown_verb_is_rejected() {
        let error = parse_command("dance").unwrap_err();
        assert_eq!(error.kind, CoreErrorKind::InvalidInput);
    }
}
