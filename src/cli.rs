// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{value_parser, Arg, ArgAction, Command};

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print as pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print as JSON lines"),
    )
}

fn required(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name).long(name).required(true).help(help)
}

fn id_arg(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .required(true)
        .value_parser(value_parser!(i64))
        .help(help)
}

fn positional_id() -> Arg {
    Arg::new("id").required(true).value_parser(value_parser!(i64))
}

fn category_cmd() -> Command {
    Command::new("category")
        .about("Manage transaction categories")
        .subcommand_required(true)
        .subcommand(Command::new("add").arg(Arg::new("name").required(true)))
        .subcommand(json_flags(Command::new("list")))
}

fn tx_cmd() -> Command {
    Command::new("tx")
        .about("Planned transactions")
        .subcommand_required(true)
        .subcommand(
            Command::new("add")
                .arg(required("name", "Display name"))
                .arg(
                    Arg::new("amount")
                        .long("amount")
                        .required(true)
                        .allow_hyphen_values(true)
                        .help("Signed amount, e.g. 1200.00 or -99.90"),
                )
                .arg(required("currency", "ISO currency code"))
                .arg(required("category", "Category name, created if missing"))
                .arg(required("start", "Start date YYYY-MM-DD"))
                .arg(Arg::new("end").long("end").help("End date YYYY-MM-DD"))
                .arg(
                    Arg::new("type")
                        .long("type")
                        .default_value("single")
                        .value_parser(["single", "repeating"]),
                )
                .arg(Arg::new("cycle").long("cycle").help(
                    "once|daily|weekly|monthly|quarterly|biannually|yearly",
                ))
                .arg(
                    Arg::new("vat-rate")
                        .long("vat-rate")
                        .help("VAT rate in percent, e.g. 8.1"),
                )
                .arg(
                    Arg::new("vat-included")
                        .long("vat-included")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(json_flags(Command::new("list")))
        .subcommand(Command::new("disable").arg(positional_id()))
        .subcommand(Command::new("enable").arg(positional_id()))
}

fn employee_cmd() -> Command {
    Command::new("employee")
        .about("Employees")
        .subcommand_required(true)
        .subcommand(Command::new("add").arg(Arg::new("name").required(true)))
        .subcommand(json_flags(Command::new("list")))
        .subcommand(Command::new("disable").arg(positional_id()))
        .subcommand(Command::new("enable").arg(positional_id()))
}

fn salary_cmd() -> Command {
    Command::new("salary")
        .about("Salaries of employees")
        .subcommand_required(true)
        .subcommand(
            Command::new("add")
                .arg(id_arg("employee", "Employee id"))
                .arg(required("amount", "Gross amount per cycle"))
                .arg(required("currency", "ISO currency code"))
                .arg(
                    Arg::new("cycle")
                        .long("cycle")
                        .default_value("monthly")
                        .value_parser(["monthly", "quarterly", "biannually", "yearly"]),
                )
                .arg(required("from", "First day YYYY-MM-DD"))
                .arg(Arg::new("to").long("to").help("Last day YYYY-MM-DD"))
                .arg(
                    Arg::new("termination")
                        .long("termination")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(json_flags(
            Command::new("list").arg(id_arg("employee", "Employee id")),
        ))
}

fn cost_cmd() -> Command {
    Command::new("cost")
        .about("Salary costs such as social insurance or pension")
        .subcommand_required(true)
        .subcommand(
            Command::new("add")
                .arg(id_arg("salary", "Salary id"))
                .arg(Arg::new("label").long("label"))
                .arg(
                    Arg::new("cycle")
                        .long("cycle")
                        .default_value("monthly")
                        .value_parser(["once", "monthly", "quarterly", "biannually", "yearly"]),
                )
                .arg(
                    Arg::new("amount-type")
                        .long("amount-type")
                        .default_value("fixed")
                        .value_parser(["fixed", "percentage"]),
                )
                .arg(required(
                    "amount",
                    "Amount per cycle, or percent when --amount-type percentage",
                ))
                .arg(
                    Arg::new("distribution")
                        .long("distribution")
                        .default_value("employer")
                        .value_parser(["employee", "employer", "both"]),
                )
                .arg(
                    Arg::new("offset")
                        .long("offset")
                        .default_value("1")
                        .value_parser(value_parser!(i64))
                        .help("Cycle steps between postings"),
                )
                .arg(Arg::new("target").long("target").help("Target date YYYY-MM-DD"))
                .arg(
                    Arg::new("base")
                        .long("base")
                        .action(ArgAction::Append)
                        .value_parser(value_parser!(i64))
                        .help("Base cost id for percentage costs (repeatable)"),
                ),
        )
        .subcommand(json_flags(
            Command::new("list").arg(id_arg("salary", "Salary id")),
        ))
        .subcommand(json_flags(
            Command::new("details").arg(id_arg("cost", "Salary cost id")),
        ))
}

fn fx_cmd() -> Command {
    Command::new("fx")
        .about("Organisation base currency and fiat rates")
        .subcommand_required(true)
        .subcommand(Command::new("set-base").arg(Arg::new("currency").required(true)))
        .subcommand(
            Command::new("set-rate")
                .arg(required("target", "Currency quoted against the base"))
                .arg(required("rate", "Units of target per one base unit")),
        )
        .subcommand(Command::new("fetch").about("Fetch latest rates via Frankfurter (ECB)"))
        .subcommand(json_flags(Command::new("list")))
        .subcommand(
            Command::new("convert")
                .arg(required("amount", "Amount in the source currency"))
                .arg(required("from", "Source currency")),
        )
}

fn vat_cmd() -> Command {
    Command::new("vat")
        .about("VAT settlement settings")
        .subcommand_required(true)
        .subcommand(
            Command::new("set")
                .arg(required("billing-date", "End of the first settlement period"))
                .arg(
                    Arg::new("interval")
                        .long("interval")
                        .default_value("quarterly")
                        .value_parser(["monthly", "quarterly", "biannually", "yearly"]),
                )
                .arg(
                    Arg::new("offset")
                        .long("offset")
                        .default_value("0")
                        .value_parser(value_parser!(i32).range(0..=12))
                        .help("Months between billing and payment"),
                )
                .arg(
                    Arg::new("disabled")
                        .long("disabled")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(json_flags(Command::new("show")))
}

fn forecast_cmd() -> Command {
    Command::new("forecast")
        .about("Monthly cash-flow forecast")
        .subcommand_required(true)
        .subcommand(json_flags(
            Command::new("run").about("Recalculate and store the forecast"),
        ))
        .subcommand(json_flags(
            Command::new("list").arg(
                Arg::new("limit")
                    .long("limit")
                    .value_parser(value_parser!(usize)),
            ),
        ))
        .subcommand(
            Command::new("detail")
                .arg(required("month", "YYYY-MM"))
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("exclude")
                .about("Exclude a source from the forecast for some months")
                .arg(
                    Arg::new("table")
                        .long("table")
                        .required(true)
                        .value_parser(["transactions", "salaries", "salary_costs"]),
                )
                .arg(id_arg("id", "Source id"))
                .arg(
                    Arg::new("month")
                        .long("month")
                        .required(true)
                        .action(ArgAction::Append)
                        .help("YYYY-MM (repeatable)"),
                )
                .arg(
                    Arg::new("include")
                        .long("include")
                        .action(ArgAction::SetTrue)
                        .help("Remove the exclusion instead"),
                ),
        )
        .subcommand(
            Command::new("horizon")
                .about("Show or set the forecast horizon in years")
                .arg(Arg::new("years").value_parser(value_parser!(i64))),
        )
}

fn export_cmd() -> Command {
    Command::new("export")
        .about("Export stored data")
        .subcommand_required(true)
        .subcommand(
            Command::new("forecast")
                .arg(
                    Arg::new("format")
                        .long("format")
                        .required(true)
                        .help("csv|json"),
                )
                .arg(required("out", "Output path")),
        )
}

pub fn build_cli() -> Command {
    Command::new("cashcast")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Multi-currency cash-flow forecasting")
        .arg(
            Arg::new("user")
                .long("user")
                .global(true)
                .default_value("1")
                .value_parser(value_parser!(i64))
                .help("Acting user id"),
        )
        .arg(
            Arg::new("today")
                .long("today")
                .global(true)
                .help("Reference date YYYY-MM-DD (defaults to today, UTC)"),
        )
        .subcommand(Command::new("init").about("Create the database"))
        .subcommand(category_cmd())
        .subcommand(tx_cmd())
        .subcommand(employee_cmd())
        .subcommand(salary_cmd())
        .subcommand(cost_cmd())
        .subcommand(fx_cmd())
        .subcommand(vat_cmd())
        .subcommand(forecast_cmd())
        .subcommand(export_cmd())
        .subcommand(Command::new("doctor").about("Check data for forecast blockers"))
}
