use std::convert::Infallible;

use clap::Args;

use depot_daemon::state::AppState;

#[derive(Args, Debug, Clone)]
pub struct Health;

#[async_trait::async_trait]
impl crate::cli::op::Op for Health {
    type Error = Infallible;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut lines = vec!["Config:".to_string()];
        match AppState::load(ctx.config_path.clone()) {
            Ok(state) => {
                lines.push(format!("  directory:   {}", state.depot_dir.display()));
                lines.push(format!("  config.toml: {}", presence(state.config_path.is_file())));
                lines.push(format!("  db.sqlite:   {}", presence(state.db_path.is_file())));
                lines.push(format!("  uploads/:    {}", presence(state.uploads_path.is_dir())));
                lines.push(format!("  port:        {}", state.config.port));
                lines.push(format!("  table:       {}", state.config.table_name));
            }
            Err(e) => lines.push(format!("  error: {}", e)),
        }

        let base = ctx.client.base_url();
        lines.push(String::new());
        lines.push(format!("Daemon ({}):", base));

        for probe in ["livez", "readyz"] {
            let url = format!("{}/_status/{}", base.as_str().trim_end_matches('/'), probe);
            let status = match ctx.client.http_client().get(&url).send().await {
                Ok(resp) if resp.status().is_success() => "OK".to_string(),
                Ok(resp) => format!("UNHEALTHY ({})", resp.status()),
                Err(_) => "NOT REACHABLE".to_string(),
            };
            lines.push(format!("  {:<7} {}", format!("{}:", probe), status));
        }

        Ok(lines.join("\n"))
    }
}

fn presence(ok: bool) -> &'static str {
    if ok {
        "OK"
    } else {
        "missing"
    }
}
