//! WebSocket handshake with auth header injection.

use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use astral_shared::Identity;

use crate::error::SessionError;

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Open the WebSocket to `endpoint`, carrying the user's token in the
/// `Authorization` header (the server validates it during the handshake).
pub async fn open(endpoint: &str, identity: &Identity) -> Result<WsStream, SessionError> {
    let mut request = endpoint.into_client_request()?;
    let token = HeaderValue::from_str(&identity.token).map_err(|_| SessionError::InvalidToken)?;
    request.headers_mut().insert(AUTHORIZATION, token);

    let (stream, _response) = connect_async(request).await?;
    Ok(stream)
}
