use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    serve, Json, Router,
};
use futures::{sink::SinkExt, stream::StreamExt, Sink};
use minijinja::{path_loader, Environment};
use minijinja_autoreload::AutoReloader;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{error, info, warn};

use crate::conversation::{ChatEngine, PendingAction, Session, TurnOutcome};
use crate::lookup::{self, LookupFailure, LookupResult};

// Messages sent to the browser over the chat WebSocket
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    Info {
        message: String,
    },
    Reply {
        content: String,
        sentiment: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        pending: Option<PendingAction>,
        #[serde(skip_serializing_if = "Option::is_none")]
        warning: Option<String>,
    },
    NotFound {
        query: String,
        message: String,
    },
    Error {
        message: String,
    },
}

// Browsers may send either a bare text frame or {"message": "..."}
#[derive(Debug, Deserialize)]
struct ClientMessage {
    message: String,
}

#[derive(Clone)]
pub struct AppState {
    templates: Arc<AutoReloader>,
    static_dir: String,
    engine: Arc<ChatEngine>,
    seed: Option<u64>,
    // chat sessions and lookups draw consecutive seeds from this
    seeds_issued: Arc<AtomicU64>,
}

impl AppState {
    pub fn new(engine: Arc<ChatEngine>, templates_dir: &str, static_dir: &str, seed: Option<u64>) -> Self {
        Self {
            templates: Arc::new(create_minijinja_env(templates_dir)),
            static_dir: static_dir.to_string(),
            engine,
            seed,
            seeds_issued: Arc::new(AtomicU64::new(0)),
        }
    }

    fn next_seed(&self) -> Option<u64> {
        let n = self.seeds_issued.fetch_add(1, Ordering::Relaxed);
        self.seed.map(|seed| seed.wrapping_add(n))
    }

    fn new_session(&self) -> Session {
        Session::new(self.next_seed())
    }

    fn request_rng(&self) -> StdRng {
        match self.next_seed() {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

// Minijinja Environment setup
fn create_minijinja_env(templates_dir: &str) -> AutoReloader {
    let dir = templates_dir.to_string();
    AutoReloader::new(move |notifier| {
        let mut env = Environment::new();
        env.set_loader(path_loader(&dir));
        notifier.watch_path(&dir, true);
        Ok(env)
    })
}

async fn index_handler(State(state): State<AppState>) -> Result<Html<String>, (StatusCode, Html<String>)> {
    state
        .templates
        .acquire_env()
        .and_then(|env| {
            env.get_template("index.html").and_then(|tmpl| {
                let context = minijinja::context! {
                    title => "📱 Smart Mobile Chatbot",
                    provider => state.engine.provider().name(),
                };
                tmpl.render(context)
            })
        })
        .map(Html)
        .map_err(|e| {
            error!("Failed to get or render template: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(format!("Internal Server Error: {}", e)),
            )
        })
}

#[derive(Debug, Deserialize)]
pub struct LookupRequest {
    pub model: String,
    #[serde(default)]
    pub review: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SentimentRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct SentimentResponse {
    pub label: &'static str,
    pub polarity: f64,
}

pub struct ApiError(LookupFailure);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            LookupFailure::EmptyQuery => StatusCode::BAD_REQUEST,
            LookupFailure::NotFound => StatusCode::NOT_FOUND,
        };
        (status, Json(serde_json::json!({ "error": self.0.to_string() }))).into_response()
    }
}

async fn lookup_handler(
    State(state): State<AppState>,
    Json(request): Json<LookupRequest>,
) -> Result<Json<LookupResult>, ApiError> {
    let mut rng = state.request_rng();
    lookup::lookup(
        state.engine.provider().as_ref(),
        state.engine.classifier(),
        &request.model,
        request.review.as_deref(),
        &mut rng,
    )
    .map(Json)
    .map_err(|e| {
        info!(model = %request.model, error = %e, "Lookup failed");
        ApiError(e)
    })
}

async fn sentiment_handler(
    State(state): State<AppState>,
    Json(request): Json<SentimentRequest>,
) -> Json<SentimentResponse> {
    let classifier = state.engine.classifier();
    let polarity = classifier.polarity(&request.text);
    Json(SentimentResponse {
        label: classifier.classify(&request.text).label(),
        polarity,
    })
}

// WebSocket upgrade handler
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    info!("WebSocket connection upgrade requested");
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// One chat session per connection. Turns are handled one at a time, so the
/// session needs no locking.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let mut session = state.new_session();
    info!(session = %session.id(), "New chat session");
    let (mut sender, mut receiver) = socket.split();

    let welcome = ServerEvent::Info {
        message: "Chat about mobile phones, now with realistic follow-up questions!".to_string(),
    };
    if send_event(&mut sender, &welcome).await.is_err() {
        warn!("Failed to send welcome message to new WebSocket client");
        return;
    }

    while let Some(Ok(msg)) = receiver.next().await {
        let text = match msg {
            Message::Text(text) => text,
            Message::Close(_) => {
                info!("Client requested WebSocket close");
                break;
            }
            Message::Binary(_) => {
                warn!("Received unexpected binary message from client");
                continue;
            }
            // Axum answers pings itself
            Message::Ping(_) | Message::Pong(_) => continue,
        };

        let input = parse_client_message(&text);
        let event = if input.trim().is_empty() {
            ServerEvent::Error {
                message: "Ask about a mobile phone...".to_string(),
            }
        } else {
            event_for(state.engine.handle_turn(&mut session, input.trim()).await, &session)
        };

        if send_event(&mut sender, &event).await.is_err() {
            warn!("WebSocket client disconnected or send error. Closing connection.");
            break;
        }
    }
    info!(session = %session.id(), "Chat session closed");
}

fn parse_client_message(text: &str) -> String {
    serde_json::from_str::<ClientMessage>(text)
        .map(|m| m.message)
        .unwrap_or_else(|_| text.to_string())
}

fn event_for(outcome: TurnOutcome, session: &Session) -> ServerEvent {
    match outcome {
        TurnOutcome::Replied(reply) => ServerEvent::Reply {
            content: reply.text,
            sentiment: reply.sentiment.label().to_string(),
            pending: session.pending(),
            warning: reply.gateway_fault,
        },
        TurnOutcome::NotFound { query } => ServerEvent::NotFound {
            message: LookupFailure::NotFound.to_string(),
            query,
        },
    }
}

async fn send_event<S>(sender: &mut S, event: &ServerEvent) -> Result<()>
where
    S: Sink<Message> + Unpin,
    S::Error: std::error::Error + Send + Sync + 'static,
{
    let json = serde_json::to_string(event).context("Failed to serialize event")?;
    sender.send(Message::Text(json)).await.context("Failed to send event")?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    // Serve static files from the configured static directory
    let static_files_service = ServeDir::new(&state.static_dir);

    Router::new()
        .route("/", get(index_handler))
        .route("/ws", get(ws_handler))
        .route("/api/lookup", post(lookup_handler))
        .route("/api/sentiment", post(sentiment_handler))
        .nest_service("/static", static_files_service)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

pub async fn start_web_server(port: u16, state: AppState) -> Result<()> {
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Web server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context(format!("Failed to bind to address {}", addr))?;

    serve(listener, app.into_make_service())
        .await
        .context("Web server failed")?;

    Ok(())
}
