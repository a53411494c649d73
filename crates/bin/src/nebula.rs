//! Nebula - unified game server with static file hosting.

use axum::{
    Router,
    extract::{
        ConnectInfo, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
    routing::get,
};
use futures_util::{SinkExt, StreamExt};
use server::GameHandle;
use server::server::Outbound;
use std::net::SocketAddr;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Nebula v{}", env!("CARGO_PKG_VERSION"));

    let config = server::Config::load()?;
    info!("Loaded configuration");
    info!("  Port: {}", config.server.port);
    info!("  World: {}x{}", config.world.width, config.world.height);
    info!("  Static files: {}", config.server.static_dir);

    let game = server::start(&config);

    let app = Router::new()
        // WebSocket game endpoint
        .route("/socket", get(websocket_handler))
        .fallback_service(ServeDir::new(&config.server.static_dir))
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
        .with_state(game);

    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Game WebSocket endpoint: ws://{}/socket", addr);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;

    Ok(())
}

/// Upgrade a request on the game endpoint.
async fn websocket_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(game): State<GameHandle>,
) -> impl IntoResponse {
    ws.max_message_size(protocol::MAX_FRAME_LEN)
        .on_upgrade(move |socket| handle_websocket(socket, addr, game))
}

/// Pump frames between one socket and the game task.
async fn handle_websocket(socket: WebSocket, addr: SocketAddr, game: GameHandle) {
    info!("New game connection from {}", addr);

    let (mut write, mut read) = socket.split();
    let (session, mut outbound) = game.connect(addr);

    loop {
        tokio::select! {
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => game.submit_text(session, text.as_str()),
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        warn!("WebSocket error from {}: {}", addr, e);
                        break;
                    }
                    _ => {}
                }
            }
            out = outbound.recv() => {
                match out {
                    Some(Outbound::Text(text)) => {
                        if let Err(e) = write.send(Message::Text(text.to_string().into())).await {
                            warn!("Failed to send to {}: {}", addr, e);
                            break;
                        }
                    }
                    Some(Outbound::Close) | None => {
                        let _ = write.send(Message::Close(None)).await;
                        break;
                    }
                }
            }
        }
    }

    game.disconnect(session);
    info!("Client {} disconnected", addr);
}
