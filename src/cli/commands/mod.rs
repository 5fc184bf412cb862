pub mod logging;

use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ArgAction, ColorChoice, Command,
};

pub const ARG_PORT: &str = "port";
pub const ARG_ALLOW_LIST: &str = "allow-list";
pub const ARG_FRONTEND_URL: &str = "frontend-url";
pub const ARG_HANDLER_BUDGET_MS: &str = "handler-budget-ms";
pub const ARG_DEV: &str = "dev";

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("piscina")
        .about("Pool service management - authentication and session gateway")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new(ARG_PORT)
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8080")
                .env("PISCINA_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new(ARG_ALLOW_LIST)
                .short('a')
                .long("allow-list")
                .help("Path to the allow-list JSON file (email to role mapping)")
                .long_help(
                    "Path to a JSON object mapping email addresses to roles \
                     (admin, tester, user). Only listed emails are authorized; \
                     the role is orthogonal metadata, not itself a grant.",
                )
                .env("PISCINA_ALLOW_LIST")
                .required(true),
        )
        .arg(
            Arg::new(ARG_FRONTEND_URL)
                .long("frontend-url")
                .help("Base URL the product frontend is served from")
                .default_value("http://localhost:3000")
                .env("PISCINA_FRONTEND_URL"),
        )
        .arg(
            Arg::new(ARG_HANDLER_BUDGET_MS)
                .long("handler-budget-ms")
                .help("Wall-clock budget for privileged handlers, in milliseconds")
                .default_value("9500")
                .env("PISCINA_HANDLER_BUDGET_MS")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new(ARG_DEV)
                .long("dev")
                .help("Development mode: include failure details in error responses")
                .env("PISCINA_DEV")
                .action(ArgAction::SetTrue),
        );

    logging::with_args(command)
}
