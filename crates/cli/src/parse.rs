//! Parse clap matches into catalog actions.
//!
//! Converts `clap::ArgMatches` into a [`CliAction`], and recognizes the
//! line-mode meta commands.

use clap::ArgMatches;

/// A catalog operation requested on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliAction {
    Add { name: String },
    Get { id: String },
    Sku { sku: i64 },
    List,
    Skus,
    Update { id: String, name: String },
    Delete { id: String },
}

/// Line-mode commands handled without touching the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaCommand {
    Quit,
    Help,
}

/// Check whether a line is a meta command.
pub fn check_meta_command(line: &str) -> Option<MetaCommand> {
    match line.trim() {
        "quit" | "exit" | "\\q" => Some(MetaCommand::Quit),
        "help" | "?" => Some(MetaCommand::Help),
        _ => None,
    }
}

/// Convert matches (top-level or line mode) into an action.
///
/// Returns `Ok(None)` when no subcommand was given.
pub fn matches_to_action(matches: &ArgMatches) -> Result<Option<CliAction>, String> {
    let (name, sub) = match matches.subcommand() {
        Some(pair) => pair,
        None => return Ok(None),
    };
    let action = match name {
        "add" => CliAction::Add {
            name: joined_name(sub)?,
        },
        "get" => CliAction::Get {
            id: required_string(sub, "id")?,
        },
        "sku" => CliAction::Sku {
            sku: sub
                .get_one::<i64>("sku")
                .copied()
                .ok_or_else(|| "missing sku".to_string())?,
        },
        "list" => CliAction::List,
        "skus" => CliAction::Skus,
        "update" => CliAction::Update {
            id: required_string(sub, "id")?,
            name: joined_name(sub)?,
        },
        "delete" => CliAction::Delete {
            id: required_string(sub, "id")?,
        },
        other => return Err(format!("unknown command: {}", other)),
    };
    Ok(Some(action))
}

fn required_string(m: &ArgMatches, name: &str) -> Result<String, String> {
    m.get_one::<String>(name)
        .cloned()
        .ok_or_else(|| format!("missing {}", name))
}

fn joined_name(m: &ArgMatches) -> Result<String, String> {
    let words: Vec<&str> = m
        .get_many::<String>("name")
        .map(|vals| vals.map(String::as_str).collect())
        .unwrap_or_default();
    if words.is_empty() {
        return Err("missing name".to_string());
    }
    Ok(words.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{build_cli, build_line_cmd};

    fn line(input: &str) -> Option<CliAction> {
        let m = build_line_cmd()
            .try_get_matches_from(shlex::split(input).unwrap())
            .unwrap();
        matches_to_action(&m).unwrap()
    }

    #[test]
    fn test_parse_every_command() {
        assert_eq!(line("add spoon"), Some(CliAction::Add { name: "spoon".into() }));
        assert_eq!(line("get abc"), Some(CliAction::Get { id: "abc".into() }));
        assert_eq!(line("sku 1001"), Some(CliAction::Sku { sku: 1001 }));
        assert_eq!(line("list"), Some(CliAction::List));
        assert_eq!(line("skus"), Some(CliAction::Skus));
        assert_eq!(
            line("update abc ladle"),
            Some(CliAction::Update {
                id: "abc".into(),
                name: "ladle".into()
            })
        );
        assert_eq!(line("delete abc"), Some(CliAction::Delete { id: "abc".into() }));
    }

    #[test]
    fn test_multi_word_names_are_joined() {
        assert_eq!(
            line("add big soup spoon"),
            Some(CliAction::Add {
                name: "big soup spoon".into()
            })
        );
    }

    #[test]
    fn test_quoted_name_is_one_word() {
        assert_eq!(
            line("update abc 'soup  ladle'"),
            Some(CliAction::Update {
                id: "abc".into(),
                name: "soup  ladle".into()
            })
        );
    }

    #[test]
    fn test_bad_sku_is_a_clap_error() {
        assert!(build_line_cmd()
            .try_get_matches_from(["sku", "lots"])
            .is_err());
    }

    #[test]
    fn test_no_subcommand() {
        let m = build_cli().try_get_matches_from(["skudb", "--json"]).unwrap();
        assert_eq!(matches_to_action(&m).unwrap(), None);
    }

    #[test]
    fn test_meta_commands() {
        assert_eq!(check_meta_command("quit"), Some(MetaCommand::Quit));
        assert_eq!(check_meta_command(" exit "), Some(MetaCommand::Quit));
        assert_eq!(check_meta_command("help"), Some(MetaCommand::Help));
        assert_eq!(check_meta_command("list"), None);
    }
}
