use crate::input::{parse_command, Command, HELP};
use crate::listening_area_controller::{ListeningAreaEvent, ListeningAreaEventKind};
use crate::town_controller::{AreaController, TownController};
use crate::viewing_area_controller::{ViewingAreaEvent, ViewingAreaEventKind};
use bincode::{deserialize, serialize};
use log::{debug, error, info, warn};
use shared::{Packet, PROTOCOL_VERSION};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::UdpSocket;
use tokio::time::{interval, sleep};

const MAX_PACKET_SIZE: usize = 8192;
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(1);

pub struct Client {
    socket: UdpSocket,
    server_addr: SocketAddr,
    user_name: String,
    town: Option<TownController>,
    fake_ping_ms: u64,
    running: bool,
}

impl Client {
    pub async fn new(
        server_addr: &str,
        user_name: &str,
        fake_ping_ms: u64,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        let server_addr = server_addr.parse()?;

        Ok(Client {
            socket,
            server_addr,
            user_name: user_name.to_string(),
            town: None,
            fake_ping_ms,
            running: true,
        })
    }

    pub fn town(&self) -> Option<&TownController> {
        self.town.as_ref()
    }

    async fn connect(&self) -> Result<(), Box<dyn std::error::Error>> {
        info!("Connecting to server as {}...", self.user_name);

        let packet = Packet::Connect {
            client_version: PROTOCOL_VERSION,
            user_name: self.user_name.clone(),
        };
        self.send_packet(&packet).await
    }

    async fn send_packet(&self, packet: &Packet) -> Result<(), Box<dyn std::error::Error>> {
        if self.fake_ping_ms > 0 {
            sleep(Duration::from_millis(self.fake_ping_ms / 2)).await;
        }

        let data = serialize(packet)?;
        self.socket.send_to(&data, self.server_addr).await?;
        Ok(())
    }

    fn handle_packet(&mut self, packet: Packet) {
        match packet {
            Packet::Connected {
                player_id,
                snapshot,
            } => {
                info!(
                    "Connected! Player ID: {} ({} areas, {} players)",
                    player_id,
                    snapshot.interactables.len(),
                    snapshot.players.len()
                );
                let town = TownController::from_snapshot(player_id, snapshot);
                log_area_changes(&town);
                self.town = Some(town);
            }

            Packet::Disconnected { reason } => {
                warn!("Disconnected: {}", reason);
                self.town = None;
                self.running = false;
            }

            other => match self.town.as_mut() {
                Some(town) => town.apply_packet(&other),
                None => debug!("Ignoring packet before connection: {:?}", other),
            },
        }
    }

    async fn handle_line(&mut self, line: &str) {
        let command = match parse_command(line) {
            Ok(Some(command)) => command,
            Ok(None) => return,
            Err(e) => {
                println!("{}", e);
                return;
            }
        };

        let Some(town) = self.town.as_mut() else {
            println!("Not connected yet");
            return;
        };

        match &command {
            Command::Help => println!("{}", HELP),
            Command::Who => {
                for player in town.players() {
                    let area = player.location.interactable_id.as_deref().unwrap_or("-");
                    println!(
                        "{:>4} {:<16} ({:.0}, {:.0}) in {}",
                        player.id, player.user_name, player.location.x, player.location.y, area
                    );
                }
            }
            Command::Areas => {
                for area in town.areas() {
                    println!("{}", describe_area(area));
                }
            }
            Command::Quit => self.running = false,
            _ => {}
        }

        match town.apply_command(&command) {
            Ok(Some(request)) => {
                if let Err(e) = self.send_packet(&request).await {
                    error!("Error sending request: {}", e);
                }
            }
            Ok(None) => {}
            Err(e) => println!("{}", e),
        }
    }

    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.connect().await?;

        let mut heartbeat = interval(HEARTBEAT_INTERVAL);
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut buffer = vec![0u8; MAX_PACKET_SIZE];

        while self.running {
            tokio::select! {
                result = self.socket.recv_from(&mut buffer) => {
                    match result {
                        Ok((len, _)) => {
                            if self.fake_ping_ms > 0 {
                                sleep(Duration::from_millis(self.fake_ping_ms / 2)).await;
                            }

                            match deserialize::<Packet>(&buffer[0..len]) {
                                Ok(packet) => self.handle_packet(packet),
                                Err(e) => warn!("Failed to deserialize packet: {}", e),
                            }
                        },
                        Err(e) => error!("Error receiving packet: {}", e),
                    }
                },

                line = lines.next_line() => {
                    match line {
                        Ok(Some(line)) => self.handle_line(&line).await,
                        Ok(None) => self.running = false,
                        Err(e) => {
                            error!("Error reading input: {}", e);
                            self.running = false;
                        }
                    }
                },

                _ = heartbeat.tick() => {
                    if self.town.is_some() {
                        if let Err(e) = self.send_packet(&Packet::Heartbeat).await {
                            error!("Error sending heartbeat: {}", e);
                        }
                    }
                },
            }
        }

        if self.town.is_some() {
            let _ = self.send_packet(&Packet::Disconnect).await;
        }

        Ok(())
    }
}

fn describe_area(area: &AreaController) -> String {
    match area {
        AreaController::Listening(controller) => format!(
            "{:<16} listening  song={} playing={}",
            controller.id(),
            controller.song().unwrap_or("-"),
            controller.is_playing()
        ),
        AreaController::Viewing(controller) => format!(
            "{:<16} viewing    video={} playing={} at {:.1}s",
            controller.id(),
            controller.video().unwrap_or("-"),
            controller.is_playing(),
            controller.elapsed_time_sec()
        ),
    }
}

/// Logs every change notification, standing in for the UI widgets
fn log_area_changes(town: &TownController) {
    for area in town.areas() {
        match area {
            AreaController::Listening(controller) => {
                for kind in [
                    ListeningAreaEventKind::PlaybackChange,
                    ListeningAreaEventKind::SongChange,
                ] {
                    let id = controller.id().to_string();
                    controller.add_listener(kind, move |event| match event {
                        ListeningAreaEvent::PlaybackChange(playing) => {
                            info!("[{}] playing: {}", id, playing)
                        }
                        ListeningAreaEvent::SongChange(song) => {
                            info!("[{}] song: {}", id, song.as_deref().unwrap_or("(none)"))
                        }
                    });
                }
            }
            AreaController::Viewing(controller) => {
                for kind in [
                    ViewingAreaEventKind::PlaybackChange,
                    ViewingAreaEventKind::ProgressChange,
                    ViewingAreaEventKind::VideoChange,
                ] {
                    let id = controller.id().to_string();
                    controller.add_listener(kind, move |event| match event {
                        ViewingAreaEvent::PlaybackChange(playing) => {
                            info!("[{}] playing: {}", id, playing)
                        }
                        ViewingAreaEvent::ProgressChange(secs) => {
                            info!("[{}] position: {:.1}s", id, secs)
                        }
                        ViewingAreaEvent::VideoChange(video) => {
                            info!("[{}] video: {}", id, video.as_deref().unwrap_or("(none)"))
                        }
                    });
                }
            }
        }
    }
}
