// ABOUTME: russh-backed implementation of the Connector, Transport and RemoteChannel traits.
// ABOUTME: Captures the host key during the handshake and maps channel messages to byte reads.

use super::error::{Error, Result};
use super::transport::{Connector, Endpoint, InteractiveReply, RemoteChannel, Transport};
use async_trait::async_trait;
use bytes::{Buf, BytesMut};
use parking_lot::Mutex;
use russh::client::{self, Config, Handle, KeyboardInteractiveAuthResponse, Msg};
use russh::keys::ssh_key;
use russh::{Channel, ChannelMsg, Disconnect};
use std::sync::Arc;
use std::time::Duration;

/// How long to wait for an exit status once the remote has sent EOF.
const EXIT_STATUS_GRACE: Duration = Duration::from_millis(500);

type HostKeySlot = Arc<Mutex<Option<ssh_key::PublicKey>>>;

/// SSH client handler for russh.
///
/// The key is only recorded here; the trust decision is made after the
/// handshake, before any authentication request is sent.
pub(crate) struct SshHandler {
    host_key: HostKeySlot,
}

impl client::Handler for SshHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &ssh_key::PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        *self.host_key.lock() = Some(server_public_key.clone());
        Ok(true)
    }
}

/// Opens russh transports.
///
/// No idle timeout is set on the russh session: the trust prompt may keep
/// the session quiet for as long as the operator takes to answer. Each
/// stage is bounded by the caller's own timeouts instead.
#[derive(Debug, Clone, Default)]
pub struct SshConnector {
    config: Arc<Config>,
}

impl SshConnector {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Connector for SshConnector {
    type Transport = SshTransport;

    async fn connect(&self, endpoint: &Endpoint) -> Result<SshTransport> {
        let host_key: HostKeySlot = Arc::new(Mutex::new(None));
        let handler = SshHandler {
            host_key: Arc::clone(&host_key),
        };

        let handle = client::connect(
            Arc::clone(&self.config),
            (endpoint.host.as_str(), endpoint.port),
            handler,
        )
        .await
        .map_err(|e| {
            if e.to_string().contains("Connection refused") {
                Error::Connection(format!("connection refused to {}", endpoint))
            } else {
                Error::Connection(e.to_string())
            }
        })?;

        tracing::debug!("transport established to {}", endpoint);

        Ok(SshTransport {
            endpoint: endpoint.clone(),
            handle: Arc::new(tokio::sync::Mutex::new(handle)),
            host_key,
        })
    }
}

/// An established russh session.
pub struct SshTransport {
    endpoint: Endpoint,
    handle: Arc<tokio::sync::Mutex<Handle<SshHandler>>>,
    host_key: HostKeySlot,
}

impl std::fmt::Debug for SshTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SshTransport")
            .field("endpoint", &self.endpoint)
            .field("handle", &"<russh::Handle>")
            .finish()
    }
}

fn interactive_reply(response: KeyboardInteractiveAuthResponse) -> InteractiveReply {
    match response {
        KeyboardInteractiveAuthResponse::Success => InteractiveReply::Success,
        KeyboardInteractiveAuthResponse::Failure { .. } => InteractiveReply::Denied,
        KeyboardInteractiveAuthResponse::InfoRequest { prompts, .. } => {
            InteractiveReply::Prompts(prompts.into_iter().map(|p| p.prompt).collect())
        }
    }
}

#[async_trait]
impl Transport for SshTransport {
    type Channel = SshChannel;

    fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    fn host_key(&self) -> Result<ssh_key::PublicKey> {
        self.host_key.lock().clone().ok_or_else(|| {
            Error::HostKeyUnavailable("server did not present a host key".to_string())
        })
    }

    async fn auth_password(&mut self, user: &str, password: &str) -> Result<bool> {
        let mut handle = self.handle.lock().await;
        let result = handle.authenticate_password(user, password).await?;
        Ok(result.success())
    }

    async fn auth_interactive_start(&mut self, user: &str) -> Result<InteractiveReply> {
        let mut handle = self.handle.lock().await;
        let response = handle
            .authenticate_keyboard_interactive_start(user, None::<String>)
            .await?;
        Ok(interactive_reply(response))
    }

    async fn auth_interactive_respond(
        &mut self,
        answers: Vec<String>,
    ) -> Result<InteractiveReply> {
        let mut handle = self.handle.lock().await;
        let response = handle
            .authenticate_keyboard_interactive_respond(answers)
            .await?;
        Ok(interactive_reply(response))
    }

    async fn create_channel(&self) -> Result<SshChannel> {
        if self.handle.lock().await.is_closed() {
            return Err(Error::ChannelCreate("session is closed".to_string()));
        }
        Ok(SshChannel {
            handle: Arc::clone(&self.handle),
            channel: None,
            pending: BytesMut::new(),
            got_eof: false,
            finished: false,
            exit_status: None,
        })
    }

    async fn disconnect(self) -> Result<()> {
        self.handle
            .lock()
            .await
            .disconnect(Disconnect::ByApplication, "", "en")
            .await
            .map_err(Error::Protocol)?;
        Ok(())
    }
}

/// A russh session channel with a byte-oriented read side.
pub struct SshChannel {
    handle: Arc<tokio::sync::Mutex<Handle<SshHandler>>>,
    channel: Option<Channel<Msg>>,
    /// Data received but not yet handed to `read`.
    pending: BytesMut,
    got_eof: bool,
    finished: bool,
    exit_status: Option<u32>,
}

impl SshChannel {
    fn channel_mut(&mut self) -> Result<&mut Channel<Msg>> {
        self.channel.as_mut().ok_or(Error::ChannelNotOpen)
    }

    fn absorb(&mut self, msg: ChannelMsg) {
        match msg {
            ChannelMsg::Data { data } => self.pending.extend_from_slice(&data),
            ChannelMsg::ExtendedData { data, ext } => {
                tracing::debug!(ext, len = data.len(), "ignoring extended data");
            }
            ChannelMsg::ExitStatus { exit_status } => self.exit_status = Some(exit_status),
            ChannelMsg::Eof => self.got_eof = true,
            ChannelMsg::Close => self.finished = true,
            _ => {}
        }
    }

    fn output_done(&self) -> bool {
        self.finished || (self.got_eof && self.exit_status.is_some())
    }
}

#[async_trait]
impl RemoteChannel for SshChannel {
    async fn open_session(&mut self) -> Result<()> {
        let channel = self
            .handle
            .lock()
            .await
            .channel_open_session()
            .await
            .map_err(|e| Error::ChannelOpen(e.to_string()))?;
        self.channel = Some(channel);
        Ok(())
    }

    async fn exec(&mut self, command: &str) -> Result<()> {
        self.channel_mut()?
            .exec(true, command)
            .await
            .map_err(|e| Error::ExecRejected(e.to_string()))?;

        // Data may arrive before the reply; it is kept for `read`.
        loop {
            let msg = self.channel_mut()?.wait().await;
            match msg {
                Some(ChannelMsg::Success) => return Ok(()),
                Some(ChannelMsg::Failure) => {
                    return Err(Error::ExecRejected(
                        "remote refused the exec request".to_string(),
                    ));
                }
                Some(ChannelMsg::Close) | None => {
                    self.finished = true;
                    return Err(Error::ExecRejected(
                        "channel closed before the remote replied".to_string(),
                    ));
                }
                Some(other) => self.absorb(other),
            }
        }
    }

    async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        loop {
            if !self.pending.is_empty() {
                let n = buf.len().min(self.pending.len());
                buf[..n].copy_from_slice(&self.pending[..n]);
                self.pending.advance(n);
                return Ok(n);
            }

            if self.output_done() {
                return Ok(0);
            }

            let msg = if self.got_eof {
                match tokio::time::timeout(EXIT_STATUS_GRACE, self.channel_mut()?.wait()).await {
                    Ok(msg) => msg,
                    Err(_) => {
                        self.finished = true;
                        continue;
                    }
                }
            } else {
                self.channel_mut()?.wait().await
            };

            match msg {
                Some(msg) => self.absorb(msg),
                None => self.finished = true,
            }
        }
    }

    fn exit_status(&self) -> Option<u32> {
        self.exit_status
    }

    async fn close(mut self) -> Result<()> {
        let Some(channel) = self.channel.take() else {
            return Ok(());
        };

        let eof = channel.eof().await;
        let close = channel.close().await;
        if self.finished {
            // The remote already tore the channel down; send errors are expected.
            return Ok(());
        }
        eof.and(close).map_err(Error::Protocol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_has_no_idle_timeout() {
        let connector = SshConnector::new();
        assert_eq!(connector.config.inactivity_timeout, None);
        assert_eq!(connector.config.keepalive_interval, None);
    }
}
