use crate::cli::actions::Action;
use crate::piscina::{
    self,
    policy::{AllowList, Role},
    state::GatewayConfig,
};
use anyhow::{Context, Result};
use std::collections::HashMap;

/// Handle the server action
pub async fn handle(action: Action) -> Result<()> {
    match action {
        Action::Server {
            port,
            allow_list,
            frontend_url,
            handler_budget_ms,
            dev,
        } => {
            let allow_list = load_allow_list(&allow_list)?;

            let config = GatewayConfig::new(frontend_url)
                .with_handler_budget_ms(handler_budget_ms)
                .with_dev_mode(dev);

            piscina::new(port, config, allow_list).await?;
        }
    }

    Ok(())
}

/// Load the email to role mapping from a JSON file.
fn load_allow_list(path: &str) -> Result<AllowList> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read allow-list file: {path}"))?;

    let roles: HashMap<String, Role> = serde_json::from_str(&contents)
        .with_context(|| format!("Invalid allow-list file: {path}"))?;

    Ok(AllowList::new(roles))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn load_allow_list_parses_roles() -> Result<()> {
        let mut file = tempfile();
        write!(file.file, r#"{{"a@x.com": "admin", "t@x.com": "tester"}}"#)?;

        let allow = load_allow_list(&file.path)?;
        assert!(allow.is_authorized("a@x.com"));
        assert_eq!(allow.role_of("t@x.com"), Role::Tester);
        Ok(())
    }

    #[test]
    fn load_allow_list_rejects_unknown_role() -> Result<()> {
        let mut file = tempfile();
        write!(file.file, r#"{{"a@x.com": "owner"}}"#)?;

        assert!(load_allow_list(&file.path).is_err());
        Ok(())
    }

    struct TempFile {
        file: std::fs::File,
        path: String,
    }

    impl Drop for TempFile {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.path);
        }
    }

    fn tempfile() -> TempFile {
        let path = std::env::temp_dir()
            .join(format!("piscina-allow-{}.json", ulid::Ulid::new()))
            .to_string_lossy()
            .into_owned();
        let file = std::fs::File::create(&path).expect("create temp file");
        TempFile { file, path }
    }
}
