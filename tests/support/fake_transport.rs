// ABOUTME: Scripted in-memory implementation of the SSH transport traits.
// ABOUTME: Records every protocol step so tests can assert what reached the remote.

use async_trait::async_trait;
use parking_lot::Mutex;
use russh::keys::ssh_key::PublicKey;
use sshprobe::ssh::{
    Connector, Endpoint, Error, InteractiveReply, RemoteChannel, Result, Transport,
};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// How the fake remote answers a password attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordReply {
    Accept,
    Deny,
    Fail,
}

/// Where a scripted command goes wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    Create,
    Open,
    Exec,
    /// Read errors after the scripted chunks were delivered.
    Read,
    /// Read never completes after the scripted chunks were delivered.
    Hang,
}

/// Behavior of the channel created for one command.
#[derive(Debug, Clone, Default)]
pub struct FakeCommand {
    pub chunks: Vec<Vec<u8>>,
    pub exit_status: Option<u32>,
    pub fault: Option<Fault>,
}

impl FakeCommand {
    pub fn output(text: impl AsRef<[u8]>) -> Self {
        Self {
            chunks: vec![text.as_ref().to_vec()],
            exit_status: Some(0),
            fault: None,
        }
    }

    pub fn silent(exit_status: u32) -> Self {
        Self {
            chunks: Vec::new(),
            exit_status: Some(exit_status),
            fault: None,
        }
    }

    pub fn fault(fault: Fault) -> Self {
        Self {
            fault: Some(fault),
            ..Default::default()
        }
    }

    pub fn then(mut self, fault: Fault) -> Self {
        self.fault = Some(fault);
        self
    }
}

/// Everything the fake remote will do during one connection.
#[derive(Debug, Clone)]
pub struct Script {
    /// `None` makes the host key unavailable.
    pub host_key: Option<PublicKey>,
    pub refuse_connect: bool,
    pub password: PasswordReply,
    /// Reply to the interactive start, then to each response. Denied once exhausted.
    pub interactive: Vec<InteractiveReply>,
    /// Channel behavior in creation order; unscripted channels succeed silently.
    pub commands: Vec<FakeCommand>,
    pub fail_disconnect: bool,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            host_key: Some(super::host_key()),
            refuse_connect: false,
            password: PasswordReply::Accept,
            interactive: Vec::new(),
            commands: Vec::new(),
            fail_disconnect: false,
        }
    }
}

/// What the fake remote observed.
#[derive(Debug, Default)]
pub struct Activity {
    pub connects: AtomicUsize,
    pub password_attempts: AtomicUsize,
    pub interactive_starts: AtomicUsize,
    pub interactive_answers: Mutex<Vec<Vec<String>>>,
    pub create_attempts: AtomicUsize,
    pub channels_created: AtomicUsize,
    pub channels_closed: AtomicUsize,
    pub executed: Mutex<Vec<String>>,
    pub disconnects: AtomicUsize,
}

impl Activity {
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn password_attempts(&self) -> usize {
        self.password_attempts.load(Ordering::SeqCst)
    }

    pub fn interactive_starts(&self) -> usize {
        self.interactive_starts.load(Ordering::SeqCst)
    }

    /// Any authentication traffic at all.
    pub fn auth_attempts(&self) -> usize {
        self.password_attempts() + self.interactive_starts()
    }

    pub fn interactive_answers(&self) -> Vec<Vec<String>> {
        self.interactive_answers.lock().clone()
    }

    pub fn create_attempts(&self) -> usize {
        self.create_attempts.load(Ordering::SeqCst)
    }

    pub fn channels_created(&self) -> usize {
        self.channels_created.load(Ordering::SeqCst)
    }

    pub fn channels_closed(&self) -> usize {
        self.channels_closed.load(Ordering::SeqCst)
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().clone()
    }

    pub fn disconnects(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub struct FakeConnector {
    script: Script,
    activity: Arc<Activity>,
}

impl FakeConnector {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            activity: Arc::new(Activity::default()),
        }
    }

    pub fn activity(&self) -> Arc<Activity> {
        Arc::clone(&self.activity)
    }

    /// Connect directly, for tests that drive a transport without the orchestrator.
    pub async fn transport(&self, endpoint: &Endpoint) -> FakeTransport {
        match self.connect(endpoint).await {
            Ok(transport) => transport,
            Err(e) => panic!("scripted connect failed: {e}"),
        }
    }
}

#[async_trait]
impl Connector for FakeConnector {
    type Transport = FakeTransport;

    async fn connect(&self, endpoint: &Endpoint) -> Result<FakeTransport> {
        self.activity.connects.fetch_add(1, Ordering::SeqCst);
        if self.script.refuse_connect {
            return Err(Error::Connection("connection refused".to_string()));
        }

        Ok(FakeTransport {
            endpoint: endpoint.clone(),
            interactive: self.script.interactive.iter().cloned().collect(),
            script: Arc::new(self.script.clone()),
            activity: Arc::clone(&self.activity),
        })
    }
}

#[derive(Debug)]
pub struct FakeTransport {
    endpoint: Endpoint,
    script: Arc<Script>,
    interactive: VecDeque<InteractiveReply>,
    activity: Arc<Activity>,
}

impl FakeTransport {
    fn next_interactive(&mut self) -> InteractiveReply {
        self.interactive
            .pop_front()
            .unwrap_or(InteractiveReply::Denied)
    }
}

#[async_trait]
impl Transport for FakeTransport {
    type Channel = FakeChannel;

    fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    fn host_key(&self) -> Result<PublicKey> {
        self.script
            .host_key
            .clone()
            .ok_or_else(|| Error::HostKeyUnavailable("handshake presented no key".to_string()))
    }

    async fn auth_password(&mut self, _user: &str, _password: &str) -> Result<bool> {
        self.activity.password_attempts.fetch_add(1, Ordering::SeqCst);
        match self.script.password {
            PasswordReply::Accept => Ok(true),
            PasswordReply::Deny => Ok(false),
            PasswordReply::Fail => Err(Error::Connection(
                "connection reset during authentication".to_string(),
            )),
        }
    }

    async fn auth_interactive_start(&mut self, _user: &str) -> Result<InteractiveReply> {
        self.activity
            .interactive_starts
            .fetch_add(1, Ordering::SeqCst);
        Ok(self.next_interactive())
    }

    async fn auth_interactive_respond(
        &mut self,
        answers: Vec<String>,
    ) -> Result<InteractiveReply> {
        self.activity.interactive_answers.lock().push(answers);
        Ok(self.next_interactive())
    }

    async fn create_channel(&self) -> Result<FakeChannel> {
        let index = self.activity.create_attempts.fetch_add(1, Ordering::SeqCst);
        let command = self.script.commands.get(index).cloned().unwrap_or_default();
        if command.fault == Some(Fault::Create) {
            return Err(Error::ChannelCreate("session is closed".to_string()));
        }

        self.activity.channels_created.fetch_add(1, Ordering::SeqCst);
        Ok(FakeChannel {
            pending: command.chunks.iter().cloned().collect(),
            command,
            activity: Arc::clone(&self.activity),
        })
    }

    async fn disconnect(self) -> Result<()> {
        self.activity.disconnects.fetch_add(1, Ordering::SeqCst);
        if self.script.fail_disconnect {
            return Err(Error::Connection("broken pipe".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct FakeChannel {
    command: FakeCommand,
    pending: VecDeque<Vec<u8>>,
    activity: Arc<Activity>,
}

#[async_trait]
impl RemoteChannel for FakeChannel {
    async fn open_session(&mut self) -> Result<()> {
        if self.command.fault == Some(Fault::Open) {
            return Err(Error::ChannelOpen("administratively prohibited".to_string()));
        }
        Ok(())
    }

    async fn exec(&mut self, command: &str) -> Result<()> {
        self.activity.executed.lock().push(command.to_string());
        if self.command.fault == Some(Fault::Exec) {
            return Err(Error::ExecRejected("remote replied with failure".to_string()));
        }
        Ok(())
    }

    async fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if let Some(mut chunk) = self.pending.pop_front() {
            let n = chunk.len().min(buf.len());
            buf[..n].copy_from_slice(&chunk[..n]);
            if n < chunk.len() {
                self.pending.push_front(chunk.split_off(n));
            }
            return Ok(n);
        }

        match self.command.fault {
            Some(Fault::Read) => Err(Error::Read("connection lost".to_string())),
            Some(Fault::Hang) => {
                std::future::pending::<()>().await;
                Ok(0)
            }
            _ => Ok(0),
        }
    }

    fn exit_status(&self) -> Option<u32> {
        self.command.exit_status
    }

    async fn close(self) -> Result<()> {
        self.activity.channels_closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
