use std::path::PathBuf;

use anyhow::Context;
use axum::http::{header, HeaderValue};
use axum::routing::{get, MethodRouter};
use axum::Router;
use clap::Parser;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tracing_subscriber::EnvFilter;

mod handlers;

use crate::handlers::{ping_handler, spa_handler, SpaState};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Directory holding `index.html` and the built `pkg/` bundle.
    #[arg(long)]
    public_dir: Option<PathBuf>,
    #[arg(long, env = "PORT", default_value_t = 3000)]
    port: u16,
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,
}

impl Args {
    fn public_dir(&self) -> PathBuf {
        self.public_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../public"))
    }

    fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn router(public_dir: PathBuf) -> Router {
    let shell = SpaState {
        index_file: public_dir.join("index.html"),
    };
    let shell_route: MethodRouter = get(spa_handler).with_state(shell);
    let assets = ServeDir::new(public_dir)
        .append_index_html_on_directories(true)
        .fallback(shell_route);

    Router::new()
        .route("/healthz", get(ping_handler))
        .fallback_service(assets)
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-cache"),
        ))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let public_dir = args.public_dir();
    if !public_dir.join("index.html").is_file() {
        tracing::warn!(dir = %public_dir.display(), "public dir has no index.html");
    }
    let addr = args.addr();
    let app = router(public_dir);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("Traceboard running at http://localhost:{}", args.port);
    axum::serve(listener, app).await.context("server crashed")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_flags_override_defaults() {
        let args = Args::try_parse_from([
            "traceboard_server",
            "--public-dir",
            "/srv/traceboard",
            "--port",
            "8080",
            "--host",
            "127.0.0.1",
        ])
        .unwrap();
        assert_eq!(args.public_dir(), PathBuf::from("/srv/traceboard"));
        assert_eq!(args.addr(), "127.0.0.1:8080");
    }

    #[test]
    fn public_dir_defaults_next_to_the_workspace() {
        let args = Args::try_parse_from(["traceboard_server", "--port", "1"]).unwrap();
        assert!(args.public_dir().ends_with("public"));
    }

    #[test]
    fn rejects_invalid_port() {
        assert!(Args::try_parse_from(["traceboard_server", "--port", "70000"]).is_err());
    }
}
