//! Preview server implementation

use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue},
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::info;
use uuid::Uuid;

use crate::assembler::{DocumentAssembler, PreviewTarget};
use crate::config::PreviewConfig;
use crate::handlers;
use crate::manifest::{load_manifest, AssetBundle, Manifest};
use crate::session::SessionState;
use crate::styles::{SassCommand, StyleCompiler};

/// Largest request body accepted by the data endpoint.
const BODY_LIMIT: usize = 10 * 1024 * 1024;

/// Shared application state
pub struct AppState {
    pub config: PreviewConfig,
    pub manifest: Manifest,
    pub session: SessionState,
    pub assembler: DocumentAssembler,
    pub compiler: Arc<dyn StyleCompiler>,
    /// Unique token of this running preview instance.
    pub session_token: Uuid,
    /// Identifier shared by the build and interface previews.
    pub instance_id: i64,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("manifest", &self.manifest)
            .field("session", &self.session)
            .field("assembler", &self.assembler)
            .field("session_token", &self.session_token)
            .field("instance_id", &self.instance_id)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Build state around an already loaded manifest.
    pub fn new(
        config: PreviewConfig,
        manifest: Manifest,
        compiler: Arc<dyn StyleCompiler>,
    ) -> Self {
        let assembler = DocumentAssembler::new(config.libraries.clone());
        Self {
            config,
            manifest,
            session: SessionState::new(),
            assembler,
            compiler,
            session_token: Uuid::new_v4(),
            instance_id: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Load the component manifest from `config.root` and build state.
    ///
    /// # Errors
    ///
    /// Fails when the manifest is missing or invalid, or a theme has no
    /// templates. The server must not start in that case.
    pub fn load(config: PreviewConfig) -> crate::Result<Self> {
        let manifest = load_manifest(&config.root)?;
        let compiler = Arc::new(SassCommand::from_command_line(&config.style_compiler));
        Ok(Self::new(config, manifest, compiler))
    }

    /// A target bound to this instance: stable id, session token and saved data.
    pub fn bound_target(&self, markup: String, bundle: &AssetBundle) -> PreviewTarget {
        PreviewTarget {
            id: self.instance_id,
            session_token: Some(self.session_token),
            markup,
            dependencies: bundle.dependencies.clone(),
            assets: bundle.assets.clone(),
            data: self.session.current_data(),
        }
    }
}

/// Component Preview Server
pub struct PreviewServer;

impl PreviewServer {
    /// Build the router for the given state.
    pub fn router(state: Arc<AppState>) -> Router {
        let static_files = ServeDir::new(&state.config.root);

        Router::new()
            // Preview pages
            .route("/", get(handlers::page::index))
            .route("/build", get(handlers::page::build))
            .route("/interface", get(handlers::page::interface))
            .route("/templates/{name}", get(handlers::page::template))
            // Session data
            .route("/save-widget-data", post(handlers::session::save))
            // Compiled theme styles
            .route("/__scss.css", get(handlers::styles::compiled))
            // Embedded client runtime
            .route("/__preview/{*path}", get(handlers::assets::runtime))
            // Component files
            .fallback_service(static_files)
            .layer(DefaultBodyLimit::max(BODY_LIMIT))
            .layer(SetResponseHeaderLayer::overriding(
                header::CACHE_CONTROL,
                HeaderValue::from_static("no-cache"),
            ))
            .with_state(state)
    }

    /// Bind the listener on the configured local port.
    pub async fn bind(config: &PreviewConfig) -> Result<TcpListener> {
        let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
        TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind preview server on {addr}"))
    }

    /// Serve requests until Ctrl+C.
    pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> Result<()> {
        let addr = listener.local_addr()?;
        let app = Self::router(state);

        info!("Preview server listening on http://{}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Preview server stopped");
        Ok(())
    }

    /// Print the startup banner.
    pub fn print_banner(state: &AppState) {
        let manifest = &state.manifest;
        let label = format!("{} ({})", manifest.name, manifest.package);

        println!();
        println!("\x1b[1;36m╔══════════════════════════════════════════════════╗\x1b[0m");
        println!("\x1b[1;36m║          Component Preview Server                ║\x1b[0m");
        println!("\x1b[1;36m╠══════════════════════════════════════════════════╣\x1b[0m");
        println!(
            "\x1b[1;36m║\x1b[0m  Package:  \x1b[1;32m{:<36}\x1b[0m  \x1b[1;36m║\x1b[0m",
            truncate(&label, 36)
        );
        println!(
            "\x1b[1;36m║\x1b[0m  Kind:     \x1b[1;35m{:<36}\x1b[0m  \x1b[1;36m║\x1b[0m",
            if manifest.is_theme() { "theme" } else { "widget" }
        );
        println!(
            "\x1b[1;36m║\x1b[0m  Preview:  \x1b[1;33m{:<36}\x1b[0m  \x1b[1;36m║\x1b[0m",
            state.config.host_url()
        );
        println!("\x1b[1;36m╠══════════════════════════════════════════════════╣\x1b[0m");
        println!("\x1b[1;36m║\x1b[0m  Restart after changing package dependencies     \x1b[1;36m║\x1b[0m");
        println!("\x1b[1;36m║\x1b[0m  Press Ctrl+C to stop                            \x1b[1;36m║\x1b[0m");
        println!("\x1b[1;36m╚══════════════════════════════════════════════════╝\x1b[0m");
        println!();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}

fn truncate(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        text.to_string()
    } else {
        let head: String = text.chars().take(max_len - 3).collect();
        format!("{head}...")
    }
}
