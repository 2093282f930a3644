//! Server network layer: UDP transport around the authoritative town

use crate::client_manager::ClientManager;
use crate::config::ServerConfig;
use crate::emitter::ChannelEmitter;
use crate::layout::MapLayout;
use crate::town::Town;
use bincode::{deserialize, serialize};
use log::{debug, error, info, warn};
use shared::{InteractableModel, Packet, PROTOCOL_VERSION};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, RwLock};

pub const MAX_PACKET_SIZE: usize = 8192;

/// Messages sent from network tasks to main server loop
#[derive(Debug)]
pub enum ServerMessage {
    PacketReceived { packet: Packet, addr: SocketAddr },
    ClientTimeout { client_id: u32 },
}

/// Messages sent from the town to the network sender task
#[derive(Debug)]
pub enum GameMessage {
    SendPacket {
        packet: Packet,
        addr: SocketAddr,
    },
    BroadcastPacket {
        packet: Packet,
    },
}

/// Owns the socket, the client roster and the town
///
/// All town mutation happens on the task running [`Server::run`], one packet
/// at a time, so areas never see concurrent updates.
pub struct Server {
    socket: Arc<UdpSocket>,
    clients: Arc<RwLock<ClientManager>>,
    town: Town,

    // Communication channels
    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
    game_tx: mpsc::UnboundedSender<GameMessage>,
    game_rx: mpsc::UnboundedReceiver<GameMessage>,
}

impl Server {
    pub async fn new(
        config: &ServerConfig,
        layout: &MapLayout,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let (server_tx, server_rx) = mpsc::unbounded_channel();
        let (game_tx, game_rx) = mpsc::unbounded_channel();

        let emitter = Arc::new(ChannelEmitter::new(game_tx.clone()));
        let town = Town::from_layout(layout, config.spawn, emitter)?;

        let socket = Arc::new(UdpSocket::bind(&config.bind_addr).await?);
        info!("Server listening on {}", socket.local_addr()?);

        Ok(Server {
            socket,
            clients: Arc::new(RwLock::new(ClientManager::new(
                config.max_clients,
                config.client_timeout,
            ))),
            town,
            server_tx,
            server_rx,
            game_tx,
            game_rx,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    pub fn town(&self) -> &Town {
        &self.town
    }

    /// Spawns task that continuously listens for incoming packets
    fn spawn_network_receiver(&self) {
        let socket = Arc::clone(&self.socket);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut buffer = vec![0u8; MAX_PACKET_SIZE];

            loop {
                match socket.recv_from(&mut buffer).await {
                    Ok((len, addr)) => {
                        if let Ok(packet) = deserialize::<Packet>(&buffer[0..len]) {
                            if let Err(e) =
                                server_tx.send(ServerMessage::PacketReceived { packet, addr })
                            {
                                error!("Failed to send packet to main loop: {}", e);
                                break;
                            }
                        } else {
                            warn!("Failed to deserialize packet from {}", addr);
                        }
                    }
                    Err(e) => {
                        error!("Error receiving packet: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });
    }

    /// Spawns task that drains the outgoing queue in order
    fn spawn_network_sender(&mut self) {
        let socket = Arc::clone(&self.socket);
        let clients = Arc::clone(&self.clients);
        let mut game_rx = std::mem::replace(&mut self.game_rx, mpsc::unbounded_channel().1);

        tokio::spawn(async move {
            while let Some(message) = game_rx.recv().await {
                match message {
                    GameMessage::SendPacket { packet, addr } => {
                        if let Err(e) = Self::send_packet_impl(&socket, &packet, addr).await {
                            error!("Failed to send packet to {}: {}", addr, e);
                        }
                    }
                    GameMessage::BroadcastPacket { packet } => {
                        let client_addrs = {
                            let clients_guard = clients.read().await;
                            clients_guard.get_client_addrs()
                        };

                        for (client_id, addr) in client_addrs {
                            if let Err(e) = Self::send_packet_impl(&socket, &packet, addr).await {
                                error!("Failed to send to client {}: {}", client_id, e);
                            }
                        }
                    }
                }
            }
        });
    }

    /// Spawns task that monitors client timeouts
    fn spawn_timeout_checker(&self) {
        let clients = Arc::clone(&self.clients);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));

            loop {
                interval.tick().await;

                let timed_out = {
                    let mut clients_guard = clients.write().await;
                    clients_guard.check_timeouts()
                };

                for client_id in timed_out {
                    if let Err(e) = server_tx.send(ServerMessage::ClientTimeout { client_id }) {
                        error!("Failed to send timeout message: {}", e);
                        return;
                    }
                }
            }
        });
    }

    async fn send_packet_impl(
        socket: &UdpSocket,
        packet: &Packet,
        addr: SocketAddr,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let data = serialize(packet)?;
        socket.send_to(&data, addr).await?;
        Ok(())
    }

    fn send_packet(&self, packet: Packet, addr: SocketAddr) {
        if let Err(e) = self.game_tx.send(GameMessage::SendPacket { packet, addr }) {
            error!("Failed to queue packet for sending: {}", e);
        }
    }

    /// Resolves the sender of a packet and records their activity
    async fn known_client(&self, addr: SocketAddr) -> Option<u32> {
        let mut clients = self.clients.write().await;
        let client_id = clients.find_client_by_addr(addr)?;
        clients.touch(client_id);
        Some(client_id)
    }

    async fn handle_connect(&mut self, client_version: u32, user_name: String, addr: SocketAddr) {
        info!(
            "Client {} connecting from {} (version: {})",
            user_name, addr, client_version
        );

        if client_version != PROTOCOL_VERSION {
            self.send_packet(
                Packet::Disconnected {
                    reason: "Protocol version mismatch".to_string(),
                },
                addr,
            );
            return;
        }

        // Remove existing connection if present
        let existing_client_id = {
            let clients = self.clients.read().await;
            clients.find_client_by_addr(addr)
        };

        if let Some(existing_id) = existing_client_id {
            info!("Removing existing client {} from {}", existing_id, addr);
            let mut clients = self.clients.write().await;
            clients.remove_client(&existing_id);
            self.town.remove_player(&existing_id);
        }

        let client_id = {
            let mut clients = self.clients.write().await;
            clients.add_client(addr, &user_name)
        };

        match client_id {
            Some(player_id) => {
                self.town.add_player(player_id, &user_name);
                let snapshot = self.town.snapshot();
                self.send_packet(
                    Packet::Connected {
                        player_id,
                        snapshot,
                    },
                    addr,
                );
            }
            None => {
                self.send_packet(
                    Packet::Disconnected {
                        reason: "Server full".to_string(),
                    },
                    addr,
                );
            }
        }
    }

    fn handle_interactable_update(
        &mut self,
        client_id: u32,
        model: InteractableModel,
        addr: SocketAddr,
    ) {
        match self.town.apply_interactable_update(&model) {
            Ok(()) => debug!("Client {} updated {}", client_id, model.id()),
            Err(e) => {
                warn!("Rejected update from client {}: {}", client_id, e);
                self.send_packet(
                    Packet::UpdateRejected {
                        area_id: model.id().to_string(),
                        reason: e.to_string(),
                    },
                    addr,
                );
            }
        }
    }

    /// Processes one incoming packet against the town
    async fn handle_packet(&mut self, packet: Packet, addr: SocketAddr) {
        let packet = match packet {
            Packet::Connect {
                client_version,
                user_name,
            } => {
                self.handle_connect(client_version, user_name, addr).await;
                return;
            }
            other => other,
        };

        let Some(client_id) = self.known_client(addr).await else {
            warn!("Packet from unknown client at {}", addr);
            return;
        };

        match packet {
            Packet::Move { x, y } => {
                self.town.move_player(client_id, x, y);
            }

            Packet::InteractableUpdate(model) => {
                self.handle_interactable_update(client_id, model, addr);
            }

            Packet::Heartbeat => {}

            Packet::Disconnect => {
                let mut clients = self.clients.write().await;
                clients.remove_client(&client_id);
                self.town.remove_player(&client_id);
            }

            _ => {
                warn!("Unexpected packet type from client at {}", addr);
            }
        }
    }

    /// Main server loop: one message at a time until shutdown
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.spawn_network_receiver();
        self.spawn_network_sender();
        self.spawn_timeout_checker();

        info!("Server started successfully");

        loop {
            match self.server_rx.recv().await {
                Some(ServerMessage::PacketReceived { packet, addr }) => {
                    self.handle_packet(packet, addr).await;
                }
                Some(ServerMessage::ClientTimeout { client_id }) => {
                    info!("Client {} timed out", client_id);
                    self.town.remove_player(&client_id);
                }
                None => {
                    info!("Server shutting down");
                    break;
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    #[test]
    fn test_game_message_broadcast() {
        let packet = Packet::PlayerDisconnected { player_id: 3 };

        let msg = GameMessage::BroadcastPacket {
            packet: packet.clone(),
        };

        match msg {
            GameMessage::BroadcastPacket { packet: p } => {
                assert_eq!(p, packet);
            }
            _ => panic!("Unexpected message type"),
        }
    }

    #[test]
    fn test_channel_communication() {
        let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 8080);

        let msg = ServerMessage::PacketReceived {
            packet: Packet::Heartbeat,
            addr,
        };
        assert!(tx.send(msg).is_ok());

        match rx.try_recv() {
            Ok(ServerMessage::PacketReceived { packet, addr: a }) => {
                assert_eq!(a, addr);
                assert_eq!(packet, Packet::Heartbeat);
            }
            other => panic!("Unexpected message: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_server_binds_ephemeral_port() {
        let config = ServerConfig {
            bind_addr: "127.0.0.1:0".to_string(),
            ..ServerConfig::default()
        };

        let server = Server::new(&config, &MapLayout::default()).await.unwrap();
        assert_ne!(server.local_addr().unwrap().port(), 0);
        assert!(server.town().areas().is_empty());
    }

    #[tokio::test]
    async fn test_server_rejects_malformed_layout() {
        use crate::layout::MapObject;

        let layout = MapLayout {
            objects: vec![MapObject {
                id: 1,
                name: "stage".to_string(),
                class: Some("ListeningArea".to_string()),
                x: 0.0,
                y: 0.0,
                width: None,
                height: Some(10.0),
                visible: true,
            }],
        };
        let config = ServerConfig {
            bind_addr: "127.0.0.1:0".to_string(),
            ..ServerConfig::default()
        };

        assert!(Server::new(&config, &layout).await.is_err());
    }

    #[test]
    fn test_max_packet_size_fits_udp() {
        assert!(MAX_PACKET_SIZE >= 1024);
        assert!(MAX_PACKET_SIZE <= 65507);
    }
}
