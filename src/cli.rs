// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, command, value_parser};

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

fn opt(id: &'static str) -> Arg {
    Arg::new(id).long(id)
}

fn req(id: &'static str) -> Arg {
    Arg::new(id).long(id).required(true)
}

fn id_arg() -> Arg {
    req("id").help("Row id")
}

pub fn build_cli() -> Command {
    command!()
        .name("budgetiq")
        .about("Personal budgeting: transactions, budgets, goals, currencies and shared expenses")
        .arg(
            Arg::new("db")
                .long("db")
                .global(true)
                .help("Database file (overrides config and BUDGETIQ_DB)"),
        )
        .subcommand(
            Command::new("init").about("Initialize the database").arg(
                Arg::new("sample")
                    .long("sample")
                    .action(ArgAction::SetTrue)
                    .help("Load the demo dataset into an empty database"),
            ),
        )
        .subcommand(transactions_cmd())
        .subcommand(budget_cmd())
        .subcommand(recurring_cmd())
        .subcommand(goal_cmd())
        .subcommand(fx_cmd())
        .subcommand(split_cmd())
        .subcommand(receipt_cmd())
        .subcommand(rules_cmd())
        .subcommand(report_cmd())
        .subcommand(json_flags(
            Command::new("predict")
                .about("Forecast next month's spending per category")
                .arg(
                    opt("months")
                        .value_parser(value_parser!(usize))
                        .default_value("3")
                        .help("Complete months of history to average"),
                ),
        ))
        .subcommand(settings_cmd())
        .subcommand(auth_cmd())
}

fn transactions_cmd() -> Command {
    Command::new("tx")
        .about("Income and expense transactions")
        .subcommand(
            Command::new("add")
                .about("Record an expense or income")
                .arg(req("title"))
                .arg(req("amount"))
                .arg(opt("category").help("Category; rules are consulted when omitted"))
                .arg(opt("type").default_value("expense").help("expense|income"))
                .arg(opt("date").help("YYYY-MM-DD, defaults to today"))
                .arg(opt("payment-method"))
                .arg(opt("notes")),
        )
        .subcommand(json_flags(
            Command::new("list")
                .about("List recent transactions")
                .arg(opt("limit").value_parser(value_parser!(usize))),
        ))
        .subcommand(json_flags(
            Command::new("search")
                .about("Search, filter and sort transactions")
                .arg(opt("query").help("Text in title or notes"))
                .arg(opt("category").default_value("All Categories"))
                .arg(opt("from").help("YYYY-MM-DD inclusive"))
                .arg(opt("to").help("YYYY-MM-DD inclusive"))
                .arg(
                    opt("amount-range")
                        .default_value("any")
                        .help("any|0-50|50-100|100-500|500-1000|1000+"),
                )
                .arg(opt("type").default_value("all").help("all|income|expense"))
                .arg(
                    opt("sort")
                        .default_value("date")
                        .help("title|amount|date|category"),
                )
                .arg(opt("dir").default_value("desc").help("asc|desc"))
                .arg(opt("page").value_parser(value_parser!(usize)))
                .arg(
                    opt("per-page")
                        .value_parser(value_parser!(usize))
                        .default_value("10"),
                ),
        ))
        .subcommand(json_flags(
            Command::new("history")
                .about("Transaction history with relative period filter")
                .arg(opt("query").help("Text in title or category"))
                .arg(opt("category"))
                .arg(opt("type").default_value("all"))
                .arg(opt("period").default_value("all").help("all|30days|90days")),
        ))
        .subcommand(
            Command::new("edit")
                .about("Change fields of a transaction")
                .arg(id_arg())
                .arg(opt("title"))
                .arg(opt("amount"))
                .arg(opt("category"))
                .arg(opt("type"))
                .arg(opt("date"))
                .arg(opt("notes")),
        )
        .subcommand(Command::new("rm").about("Delete a transaction").arg(id_arg()))
        .subcommand(
            Command::new("export")
                .about("Export transactions")
                .arg(opt("format").default_value("csv").help("csv|json"))
                .arg(req("out")),
        )
}

fn budget_cmd() -> Command {
    Command::new("budget")
        .about("Monthly category budgets")
        .subcommand(
            Command::new("set")
                .about("Create or update a category budget")
                .arg(req("category"))
                .arg(req("limit")),
        )
        .subcommand(json_flags(
            Command::new("list")
                .about("Budgets with spent and percentage")
                .arg(opt("month").help("YYYY-MM, defaults to the current month")),
        ))
        .subcommand(
            Command::new("rm")
                .about("Remove a category budget")
                .arg(req("category")),
        )
}

fn recurring_cmd() -> Command {
    Command::new("recurring")
        .about("Recurring transactions")
        .subcommand(
            Command::new("add")
                .arg(req("title"))
                .arg(req("amount"))
                .arg(req("category"))
                .arg(
                    opt("frequency")
                        .default_value("monthly")
                        .help("daily|weekly|monthly|yearly"),
                ),
        )
        .subcommand(json_flags(Command::new("list")))
        .subcommand(
            Command::new("toggle")
                .about("Pause or resume")
                .arg(id_arg()),
        )
        .subcommand(Command::new("rm").arg(id_arg()))
}

fn goal_cmd() -> Command {
    Command::new("goal")
        .about("Savings goals")
        .subcommand(
            Command::new("add")
                .arg(req("title"))
                .arg(req("target"))
                .arg(req("deadline"))
                .arg(opt("category")),
        )
        .subcommand(json_flags(Command::new("list")))
        .subcommand(
            Command::new("deposit")
                .about("Add money to a goal")
                .arg(id_arg())
                .arg(req("amount")),
        )
        .subcommand(Command::new("rm").arg(id_arg()))
}

fn fx_cmd() -> Command {
    Command::new("fx")
        .about("Currencies and foreign transactions")
        .subcommand(json_flags(Command::new("currencies").about("Rate table")))
        .subcommand(
            Command::new("convert")
                .arg(req("amount"))
                .arg(opt("from").default_value("INR"))
                .arg(opt("to").default_value("USD")),
        )
        .subcommand(
            Command::new("set-rate")
                .about("Override units per USD for a currency")
                .arg(req("currency"))
                .arg(req("rate")),
        )
        .subcommand(Command::new("fetch").about("Refresh rates from Frankfurter (ECB)"))
        .subcommand(
            Command::new("add")
                .about("Record a foreign-currency transaction")
                .arg(req("description"))
                .arg(req("amount"))
                .arg(opt("currency").default_value("USD"))
                .arg(req("category"))
                .arg(opt("date")),
        )
        .subcommand(json_flags(Command::new("list")))
        .subcommand(json_flags(
            Command::new("balances")
                .about("Per-currency balances")
                .arg(opt("base")),
        ))
        .subcommand(
            Command::new("quick")
                .about("Saved quick conversions")
                .subcommand(
                    Command::new("add")
                        .arg(req("from"))
                        .arg(req("to"))
                        .arg(opt("amount").help("Defaults to 1")),
                )
                .subcommand(json_flags(Command::new("list"))),
        )
}

fn split_cmd() -> Command {
    Command::new("split")
        .about("Shared expenses")
        .subcommand(
            Command::new("group-add")
                .about("Create a group; 'Me' is always the first member")
                .arg(req("name"))
                .arg(opt("member").action(ArgAction::Append)),
        )
        .subcommand(json_flags(Command::new("groups")))
        .subcommand(
            Command::new("expense-add")
                .arg(req("group"))
                .arg(req("title"))
                .arg(req("amount"))
                .arg(opt("paid-by").default_value("Me"))
                .arg(opt("split").default_value("equal").help("equal|custom"))
                .arg(
                    opt("share")
                        .action(ArgAction::Append)
                        .help("MEMBER=AMOUNT, repeat for custom splits"),
                ),
        )
        .subcommand(json_flags(
            Command::new("show")
                .about("Expenses and balances of a group")
                .arg(req("group")),
        ))
        .subcommand(json_flags(
            Command::new("settle")
                .about("Suggested transfers to settle a group")
                .arg(req("group")),
        ))
}

fn receipt_cmd() -> Command {
    Command::new("receipt")
        .about("Receipts")
        .subcommand(Command::new("upload").arg(req("path")))
        .subcommand(json_flags(Command::new("list")))
        .subcommand(json_flags(Command::new("show").arg(id_arg())))
        .subcommand(Command::new("rm").arg(id_arg()))
}

fn rules_cmd() -> Command {
    Command::new("rules")
        .about("Keyword categorization rules")
        .subcommand(
            Command::new("add")
                .arg(req("keyword"))
                .arg(req("category")),
        )
        .subcommand(json_flags(Command::new("list")))
        .subcommand(Command::new("toggle").arg(id_arg()))
        .subcommand(Command::new("rm").arg(id_arg()))
        .subcommand(Command::new("apply").about("Categorize uncategorized transactions"))
}

fn report_cmd() -> Command {
    Command::new("report")
        .about("Reports")
        .subcommand(json_flags(
            Command::new("monthly").about("Income and expenses per month").arg(
                opt("months")
                    .value_parser(value_parser!(usize))
                    .default_value("6"),
            ),
        ))
        .subcommand(json_flags(
            Command::new("categories")
                .about("Expenses per category for a month")
                .arg(req("month")),
        ))
        .subcommand(
            Command::new("export")
                .arg(opt("kind").default_value("monthly").help("monthly|categories"))
                .arg(opt("month"))
                .arg(
                    opt("months")
                        .value_parser(value_parser!(usize))
                        .default_value("6"),
                )
                .arg(opt("format").default_value("csv").help("csv|json"))
                .arg(req("out")),
        )
}

fn settings_cmd() -> Command {
    Command::new("settings")
        .about("Preferences")
        .subcommand(
            Command::new("language")
                .about("Display language (en|hi|ml|kn)")
                .subcommand(Command::new("show"))
                .subcommand(Command::new("set").arg(req("code"))),
        )
        .subcommand(
            Command::new("base-currency")
                .subcommand(Command::new("show"))
                .subcommand(Command::new("set").arg(req("currency"))),
        )
        .subcommand(
            Command::new("password")
                .arg(req("current"))
                .arg(req("new"))
                .arg(req("confirm")),
        )
}

fn auth_cmd() -> Command {
    Command::new("auth")
        .about("Sign in and sign up")
        .subcommand(
            Command::new("login")
                .arg(req("email"))
                .arg(req("password")),
        )
        .subcommand(
            Command::new("signup")
                .arg(req("name"))
                .arg(req("email"))
                .arg(req("password"))
                .arg(
                    Arg::new("accept-terms")
                        .long("accept-terms")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(Command::new("logout"))
        .subcommand(Command::new("whoami"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_consistent() {
        build_cli().debug_assert();
    }
}
