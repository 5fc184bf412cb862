pub mod server;

#[derive(Debug)]
pub enum Action {
    Server {
        port: u16,
        allow_list: String,
        frontend_url: String,
        handler_budget_ms: u64,
        dev: bool,
    },
}
