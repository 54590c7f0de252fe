//! Clap command tree definition.
//!
//! Builds the `clap::Command` tree used by both single-command mode
//! (directly) and line mode (via `try_get_matches_from`).

use clap::{Arg, ArgAction, Command};

/// Build the complete CLI command tree.
pub fn build_cli() -> Command {
    let cli = Command::new("skudb")
        .about("Item catalog with unique ids and monotonic SKUs")
        .subcommand_required(false)
        .arg(
            Arg::new("db")
                .long("db")
                .value_name("DIR")
                .help("Data directory (default: in-memory, nothing persists)")
                .global(true),
        )
        .arg(
            Arg::new("data")
                .long("data")
                .value_name("COLLECTION")
                .help("Item collection (default: items)")
                .global(true),
        )
        .arg(
            Arg::new("util")
                .long("util")
                .value_name("COLLECTION")
                .help("Collection holding the SKU counter (default: util)")
                .global(true),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .value_name("MS")
                .help("Per-command deadline in milliseconds")
                .value_parser(clap::value_parser!(u64))
                .global(true),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("JSON output mode")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("debug")
                .long("debug")
                .help("Log at DEBUG level to stderr")
                .action(ArgAction::SetTrue)
                .global(true),
        );
    with_item_commands(cli)
}

/// Build a command tree for line mode (no global flags).
pub fn build_line_cmd() -> Command {
    with_item_commands(
        Command::new("line")
            .multicall(true)
            .subcommand_required(true),
    )
}

fn with_item_commands(cmd: Command) -> Command {
    cmd.subcommand(
        Command::new("add")
            .about("Add an item; prints it with its new id and SKU")
            .arg(name_arg()),
    )
    .subcommand(
        Command::new("get")
            .about("Show an item by id")
            .arg(Arg::new("id").required(true)),
    )
    .subcommand(
        Command::new("sku")
            .about("Show the item holding a SKU")
            .arg(
                Arg::new("sku")
                    .required(true)
                    .allow_negative_numbers(true)
                    .value_parser(clap::value_parser!(i64)),
            ),
    )
    .subcommand(Command::new("list").about("List all items by id"))
    .subcommand(Command::new("skus").about("Map every SKU to its item id"))
    .subcommand(
        Command::new("update")
            .about("Rename an item (id and SKU never change)")
            .arg(Arg::new("id").required(true))
            .arg(name_arg()),
    )
    .subcommand(
        Command::new("delete")
            .about("Delete an item (deleting a missing item succeeds)")
            .arg(Arg::new("id").required(true)),
    )
}

fn name_arg() -> Arg {
    Arg::new("name")
        .required(true)
        .num_args(1..)
        .help("Item name (remaining words are joined with spaces)")
}
