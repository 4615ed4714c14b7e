use load_balancer_net::{
    contracts::{LIST_LONG, LIST_SHORT},
    data_types::{CommandLine, GlobalId, ListFlag, SignalNumber, NO_GLOBAL_ID},
};

/// Signal sent by `kill` when none is given
pub const DEFAULT_SIGNAL: SignalNumber = 15;

#[derive(Debug, PartialEq)]
pub enum Command {
    Place(CommandLine),
    List(ListFlag),
    Signal { signal: SignalNumber, global_id: GlobalId },
    Nodes,
    Help,
    Quit,
}

#[derive(Debug, PartialEq)]
pub enum CommandError {
    Empty,
    Unknown { word: String },
    Usage { msg: &'static str },
}

pub type CommandResult = Result<Command, CommandError>;

pub const HELP: &str = "\
place <program> [args...]   run a program on the least loaded node
ps [-l]                     list every task, -l includes host and uid
kill [-<signal>] <gpid>     signal a task, default signal is 15
nodes                       list the participating nodes
quit                        terminate the network and exit";

pub fn parse(line: &str) -> CommandResult {
    let words: Vec<&str> = line.split_whitespace().collect();
    let (first, rest) = match words.split_first() {
        Some(split) => split,
        None => return Err(CommandError::Empty),
    };

    match *first {
        "place" | "run" => {
            if rest.is_empty() {
                return Err(CommandError::Usage { msg: "place <program> [args...]" });
            }
            Ok(Command::Place(rest.iter().map(|word| String::from(*word)).collect()))
        }
        "ps" | "list" => match rest {
            [] => Ok(Command::List(LIST_SHORT)),
            ["-l"] => Ok(Command::List(LIST_LONG)),
            _ => Err(CommandError::Usage { msg: "ps [-l]" }),
        },
        "kill" | "signal" => parse_kill(rest),
        "nodes" => Ok(Command::Nodes),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        word => Err(CommandError::Unknown { word: word.to_owned() }),
    }
}

fn parse_kill(args: &[&str]) -> CommandResult {
    const USAGE: CommandError = CommandError::Usage { msg: "kill [-<signal>] <gpid>" };

    let (signal, global_id) = match args {
        [global_id] => (DEFAULT_SIGNAL, *global_id),
        [signal, global_id] => match signal.trim_start_matches('-').parse::<SignalNumber>() {
            Ok(signal) => (signal, *global_id),
            Err(_) => return Err(USAGE),
        },
        _ => return Err(USAGE),
    };

    match global_id.parse::<GlobalId>() {
        Ok(global_id) if global_id != NO_GLOBAL_ID => Ok(Command::Signal { signal, global_id }),
        _ => Err(USAGE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_place_with_arguments() {
        assert_eq!(
            Ok(Command::Place(vec![String::from("sleep"), String::from("30")])),
            parse("place sleep 30")
        );
        assert!(parse("place").is_err());
    }

    #[test]
    fn parses_listing_formats() {
        assert_eq!(Ok(Command::List(LIST_SHORT)), parse("ps"));
        assert_eq!(Ok(Command::List(LIST_LONG)), parse("ps -l"));
        assert!(parse("ps -x").is_err());
    }

    #[test]
    fn parses_kill_with_and_without_signal() {
        assert_eq!(
            Ok(Command::Signal { signal: DEFAULT_SIGNAL, global_id: 2001 }),
            parse("kill 2001")
        );
        assert_eq!(
            Ok(Command::Signal { signal: 9, global_id: 2001 }),
            parse("kill -9 2001")
        );
        assert!(parse("kill -9 0").is_err());
        assert!(parse("kill nine 2001").is_err());
    }

    #[test]
    fn rejects_blank_and_unknown_lines() {
        assert_eq!(Err(CommandError::Empty), parse("   "));
        assert_eq!(
            Err(CommandError::Unknown { word: String::from("launch") }),
            parse("launch rockets")
        );
        assert_eq!(Ok(Command::Quit), parse("quit"));
    }
}
