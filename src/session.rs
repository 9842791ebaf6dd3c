//! Session management for TN3270R
//!
//! A [`Session`] owns one TCP connection to a host: it negotiates Telnet
//! options, starts the reader thread that keeps the screen buffer current,
//! and hands out the [`Screen`] used to type and press keys. The screen
//! buffer outlives individual connections.

use std::io::{self, ErrorKind};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};

use crate::config::{SessionConfig, HOST};
use crate::error::{Result, TN3270Error};
use crate::lib3270::display::Display3270;
use crate::lib3270::protocol::{DataStreamReader, ProtocolProcessor3270};
use crate::lib3270::screen::Screen;
use crate::lib3270::shared::{DisplayGuard, HostWriter, SharedDisplay};
use crate::telnet_negotiation::{TelnetNegotiator, TelnetOptions};

/// Read timeout used by the reader thread to notice a shutdown request
const READ_POLL_INTERVAL: Duration = Duration::from_millis(250);

const JOIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Host and negotiated options of the live connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub host: String,
    pub port: u16,
    pub peer: SocketAddr,
    pub options: TelnetOptions,
}

struct ActiveConnection {
    stream: TcpStream,
    screen: Arc<Screen>,
    reader: Option<JoinHandle<()>>,
    info: ConnectionInfo,
}

pub struct Session {
    config: SessionConfig,
    shared: Arc<SharedDisplay>,
    running: Arc<AtomicBool>,
    connected: Arc<AtomicBool>,
    connection: Option<ActiveConnection>,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        let shared = SharedDisplay::new(Display3270::new(), config.lock_timeout());
        Self {
            config,
            shared: Arc::new(shared),
            running: Arc::new(AtomicBool::new(false)),
            connected: Arc::new(AtomicBool::new(false)),
            connection: None,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Connect, negotiate and start the reader thread
    pub fn connect(&mut self, host: &str, port: u16) -> Result<()> {
        if self.connection.is_some() {
            if self.is_connected() {
                return Err(TN3270Error::AlreadyConnected);
            }
            // The reader already ended; tidy up before reconnecting
            self.disconnect();
        }
        if host.trim().is_empty() {
            return Err(TN3270Error::config(HOST, "must not be empty"));
        }
        self.config.validate()?;

        let mut stream = self.open_stream(host, port)?;
        let peer = stream.peer_addr()?;
        info!("connected to {} ({})", host, peer);

        let mut negotiator = TelnetNegotiator::new(self.config.terminal_type());
        stream.set_read_timeout(Some(READ_POLL_INTERVAL.min(self.config.negotiation_timeout())))?;
        let mut writer = stream.try_clone()?;
        let shared = Arc::clone(&self.shared);
        let first = negotiator.negotiate(
            &mut stream,
            &mut writer,
            self.config.negotiation_timeout(),
            || {
                if let Ok(mut guard) = shared.lock() {
                    shared.notify_update(&mut guard);
                }
            },
        )?;
        let options = negotiator.options();
        info!("telnet negotiation complete: {:?}", options);

        self.shared
            .lock()?
            .cycle_mut()
            .set_ignore_ack_count(self.config.ignore_ack_count());

        let host_writer = HostWriter::new(stream.try_clone()?);
        let processor = ProtocolProcessor3270::with_strict_commands(self.config.strict_commands());
        let mut reader = DataStreamReader::new(
            stream.try_clone()?,
            negotiator,
            processor,
            Arc::clone(&self.running),
        );
        reader.push_data(first);

        self.running.store(true, Ordering::SeqCst);
        self.connected.store(true, Ordering::SeqCst);
        let handle = match self.spawn_reader(reader, host_writer.clone()) {
            Ok(handle) => handle,
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                self.connected.store(false, Ordering::SeqCst);
                return Err(e);
            }
        };

        let screen = Screen::new(
            Arc::clone(&self.shared),
            host_writer,
            self.config.completion_timeout(),
        );
        self.connection = Some(ActiveConnection {
            stream,
            screen: Arc::new(screen),
            reader: Some(handle),
            info: ConnectionInfo {
                host: host.to_string(),
                port,
                peer,
                options,
            },
        });
        Ok(())
    }

    /// Connect to the host and port from the configuration
    pub fn connect_configured(&mut self) -> Result<()> {
        let host = self.config.host();
        let port = self.config.port();
        self.connect(&host, port)
    }

    fn open_stream(&self, host: &str, port: u16) -> Result<TcpStream> {
        let timeout = self.config.connect_timeout();
        let mut last_error = None;

        for addr in (host, port).to_socket_addrs()? {
            debug!("trying {}", addr);
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(stream) => {
                    stream.set_nodelay(true)?;
                    return Ok(stream);
                }
                Err(e) => last_error = Some(e),
            }
        }

        Err(last_error
            .unwrap_or_else(|| io::Error::new(ErrorKind::AddrNotAvailable, "no socket addresses resolved"))
            .into())
    }

    fn spawn_reader(
        &self,
        mut reader: DataStreamReader<TcpStream>,
        writer: HostWriter,
    ) -> Result<JoinHandle<()>> {
        let shared = Arc::clone(&self.shared);
        let running = Arc::clone(&self.running);
        let connected = Arc::clone(&self.connected);

        let handle = thread::Builder::new()
            .name("tn3270-reader".to_string())
            .spawn(move || {
                match reader.run(&shared, &writer) {
                    Ok(()) => info!("reader finished"),
                    Err(e) => error!("reader stopped: {}", e),
                }
                connected.store(false, Ordering::SeqCst);
                running.store(false, Ordering::SeqCst);
                // Let anyone waiting for a screen change see the disconnect
                if let Ok(mut guard) = shared.lock() {
                    shared.notify_update(&mut guard);
                }
            })?;
        Ok(handle)
    }

    /// Stop the reader and close the connection. A reader that does not
    /// finish within the join timeout is left to end on its own.
    pub fn disconnect(&mut self) {
        let Some(mut connection) = self.connection.take() else {
            return;
        };

        self.running.store(false, Ordering::SeqCst);
        if let Err(e) = connection.stream.shutdown(Shutdown::Both) {
            debug!("socket shutdown: {}", e);
        }

        if let Some(handle) = connection.reader.take() {
            let deadline = Instant::now() + self.config.reader_join_timeout();
            while !handle.is_finished() && Instant::now() < deadline {
                thread::sleep(JOIN_POLL_INTERVAL);
            }
            if handle.is_finished() {
                if handle.join().is_err() {
                    warn!("reader thread panicked");
                }
            } else {
                warn!("reader thread did not stop in time, abandoning it");
            }
        }

        self.connected.store(false, Ordering::SeqCst);
        info!("disconnected from {}:{}", connection.info.host, connection.info.port);
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    pub fn connection_info(&self) -> Option<&ConnectionInfo> {
        self.connection.as_ref().map(|c| &c.info)
    }

    /// Sender handle for the live connection
    pub fn screen(&self) -> Result<Arc<Screen>> {
        match &self.connection {
            Some(connection) if self.is_connected() => Ok(Arc::clone(&connection.screen)),
            _ => Err(TN3270Error::NotConnected),
        }
    }

    pub fn shared_display(&self) -> Arc<SharedDisplay> {
        Arc::clone(&self.shared)
    }

    /// Lock the screen buffer for reading
    pub fn display(&self) -> Result<DisplayGuard<'_>> {
        self.shared.lock()
    }

    /// Block until the next screen update. Returns false on timeout.
    pub fn wait_for_update(&self, timeout: Duration) -> Result<bool> {
        let mut guard = self.shared.lock()?;
        Ok(self.shared.wait_for_update(&mut guard, timeout))
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.disconnect();
    }
}
