//! Live notification channel.
//!
//! One WebSocket session per connection, registered under the
//! authenticated user id. The session only pushes server events; inbound
//! frames are limited to pings/pongs and close.

use actix::{Actor, ActorContext, AsyncContext, Handler, Message as ActixMessage, StreamHandler};
use actix_web::{web, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::app_state::AppState;
use crate::error::AppError;
use crate::security::jwt::validate_token;
use crate::ws::{ConnectionRegistry, SubscriberId};

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
const CLIENT_TIMEOUT: Duration = Duration::from_secs(30);

/// Server-pushed text frame.
#[derive(ActixMessage)]
#[rtype(result = "()")]
struct PushText(String);

struct NotificationSession {
    user_id: Uuid,
    subscriber_id: SubscriberId,
    registry: ConnectionRegistry,
    hb: Instant,
}

impl NotificationSession {
    fn new(user_id: Uuid, subscriber_id: SubscriberId, registry: ConnectionRegistry) -> Self {
        Self {
            user_id,
            subscriber_id,
            registry,
            hb: Instant::now(),
        }
    }

    fn hb(&self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_interval(HEARTBEAT_INTERVAL, |act, ctx| {
            if Instant::now().duration_since(act.hb) > CLIENT_TIMEOUT {
                tracing::warn!(user_id = %act.user_id, "websocket heartbeat failed, disconnecting");
                ctx.stop();
                return;
            }
            ctx.ping(b"");
        });
    }
}

impl Actor for NotificationSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        tracing::debug!(user_id = %self.user_id, "notification session started");
        self.hb(ctx);
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        let registry = self.registry.clone();
        let user_id = self.user_id;
        let subscriber_id = self.subscriber_id;
        tokio::spawn(async move {
            registry.detach(user_id, subscriber_id).await;
        });
        tracing::debug!(user_id = %self.user_id, "notification session closed");
    }
}

impl Handler<PushText> for NotificationSession {
    type Result = ();

    fn handle(&mut self, msg: PushText, ctx: &mut Self::Context) {
        ctx.text(msg.0);
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for NotificationSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(payload)) => {
                self.hb = Instant::now();
                ctx.pong(&payload);
            }
            Ok(ws::Message::Pong(_)) => {
                self.hb = Instant::now();
            }
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            Ok(ws::Message::Text(_)) | Ok(ws::Message::Binary(_)) => {
                // Push-only channel; client frames are ignored.
            }
            _ => {}
        }
    }
}

#[derive(Debug, serde::Deserialize)]
pub struct WsParams {
    pub token: Option<String>,
}

/// Browsers cannot set headers on WebSocket upgrades, so the token may
/// arrive as a query parameter instead.
fn authenticate(params: &WsParams, req: &HttpRequest) -> Result<Uuid, AppError> {
    let token = params.token.clone().or_else(|| {
        req.headers()
            .get(actix_web::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.strip_prefix("Bearer "))
            .map(|s| s.to_string())
    });

    let token =
        token.ok_or_else(|| AppError::Unauthorized("Missing token".to_string()))?;
    let data = validate_token(&token)
        .map_err(|_| AppError::Unauthorized("Invalid or expired token".to_string()))?;
    Uuid::parse_str(&data.claims.sub)
        .map_err(|_| AppError::Unauthorized("Invalid token subject".to_string()))
}

/// GET /ws
pub async fn notification_ws(
    req: HttpRequest,
    stream: web::Payload,
    state: web::Data<AppState>,
    params: web::Query<WsParams>,
) -> Result<HttpResponse, actix_web::Error> {
    let user_id = authenticate(&params, &req)?;

    let (subscriber_id, mut rx) = state.registry.attach(user_id).await;
    let session = NotificationSession::new(user_id, subscriber_id, state.registry.clone());

    let (addr, resp) = ws::WsResponseBuilder::new(session, &req, stream).start_with_addr()?;

    // Bridge the registry's channel to the session actor. The forwarder
    // ends when the registry drops the sender or the session stops.
    tokio::spawn(async move {
        while let Some(payload) = rx.recv().await {
            addr.do_send(PushText(payload));
        }
    });

    Ok(resp)
}
