use crate::config::{load_panel_config, PanelConfig};
use crate::server::routes;
use std::net::SocketAddr;

pub fn cmd_serve(args: &[String]) -> Result<String, String> {
    let mut config = load_panel_config().map_err(|err| err.to_string())?;
    if let Some(bind) = parse_bind_flag(args)? {
        config.bind = bind;
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| format!("failed to start async runtime: {err}"))?;
    runtime
        .block_on(routes::serve(&config))
        .map_err(|err| format!("panel server failed on {}: {err}", config.bind))?;
    Ok("panel server stopped".to_string())
}

pub fn cmd_config() -> Result<String, String> {
    let config = load_panel_config().map_err(|err| err.to_string())?;
    Ok(render_config(&config))
}

fn render_config(config: &PanelConfig) -> String {
    [
        format!("bind={}", config.bind),
        format!("state_root={}", config.state_root.display()),
        format!("antfarm_db={}", config.antfarm_db.display()),
    ]
    .join("\n")
}

fn parse_bind_flag(args: &[String]) -> Result<Option<SocketAddr>, String> {
    match args {
        [] => Ok(None),
        [flag, value] if flag == "--bind" => value
            .parse::<SocketAddr>()
            .map(Some)
            .map_err(|_| format!("invalid --bind address `{value}`")),
        _ => Err("usage: serve [--bind <addr>]".to_string()),
    }
}
