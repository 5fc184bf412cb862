use crate::cli::{actions::Action, commands};
use anyhow::Result;

pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    Ok(Action::Server {
        port: matches
            .get_one::<u16>(commands::ARG_PORT)
            .copied()
            .unwrap_or(8080),
        allow_list: matches
            .get_one(commands::ARG_ALLOW_LIST)
            .map(|s: &String| s.to_string())
            .ok_or_else(|| anyhow::anyhow!("missing required argument: --allow-list"))?,
        frontend_url: matches
            .get_one(commands::ARG_FRONTEND_URL)
            .map(|s: &String| s.to_string())
            .unwrap_or_else(|| "http://localhost:3000".to_string()),
        handler_budget_ms: matches
            .get_one::<u64>(commands::ARG_HANDLER_BUDGET_MS)
            .copied()
            .unwrap_or(9500),
        dev: matches.get_flag(commands::ARG_DEV),
    })
}
