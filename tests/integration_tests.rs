//! Integration tests for the shared-area protocol
//!
//! These tests drive the authoritative server model and the client mirrors
//! together, and exercise a real UDP session end to end.

use bincode::{deserialize, serialize};
use client::listening_area_controller::{ListeningAreaEvent, ListeningAreaEventKind};
use client::town_controller::{AreaController, TownController};
use server::emitter::{ChannelEmitter, RecordingEmitter, TownEmitter};
use server::layout::{MapLayout, MapObject};
use server::listening_area::ListeningArea;
use server::network::GameMessage;
use server::player::Player;
use server::town::Town;
use shared::{BoundingBox, InteractableModel, ListeningAreaModel, Packet};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

fn stage_layout() -> MapLayout {
    MapLayout {
        objects: vec![
            MapObject {
                id: 1,
                name: "stage".to_string(),
                class: Some("ListeningArea".to_string()),
                x: 100.0,
                y: 100.0,
                width: Some(100.0),
                height: Some(100.0),
                visible: true,
            },
            MapObject {
                id: 2,
                name: "cinema".to_string(),
                class: Some("ViewingArea".to_string()),
                x: 300.0,
                y: 100.0,
                width: Some(100.0),
                height: Some(100.0),
                visible: true,
            },
        ],
    }
}

fn listening(model: &InteractableModel) -> &ListeningAreaModel {
    match model {
        InteractableModel::Listening(model) => model,
        other => panic!("Expected a listening area, got {:?}", other),
    }
}

/// AREA LIFECYCLE TESTS
mod area_lifecycle_tests {
    use super::*;

    /// Empty -> occupied -> update -> drained, checking every broadcast
    #[test]
    fn listening_area_full_cycle() {
        let emitter = Arc::new(RecordingEmitter::new());
        let object = &stage_layout().objects[0];
        let mut area = ListeningArea::from_map_object(object, emitter.clone()).unwrap();
        let mut p1 = Player::new(1, "P1", 150.0, 150.0);

        assert!(!area.is_active());
        assert!(area.song().is_none());

        area.add(&mut p1);
        assert!(area.is_active());
        let moved = emitter.last_player_moved().unwrap();
        assert_eq!(moved.id, 1);
        assert_eq!(moved.location.interactable_id.as_deref(), Some("stage"));

        area.update_model(&ListeningAreaModel {
            id: "ignore".to_string(),
            is_playing: false,
            song: Some("X".to_string()),
        });
        let updates = emitter.interactable_updates();
        assert_eq!(updates.len(), 1);
        assert_eq!(
            listening(&updates[0]),
            &ListeningAreaModel {
                id: "stage".to_string(),
                song: Some("X".to_string()),
                is_playing: false,
            }
        );

        area.remove(&mut p1);
        assert!(area.occupants_by_id().is_empty());
        assert!(area.song().is_none());

        let updates = emitter.interactable_updates();
        assert_eq!(updates.len(), 2);
        assert_eq!(listening(&updates[1]).song, None);
        assert_eq!(listening(&updates[1]).id, "stage");

        let moved = emitter.last_player_moved().unwrap();
        assert_eq!(moved.location.interactable_id, None);
        assert!(p1.location.interactable_id.is_none());
    }

    /// Occupants follow adds minus removes, in insertion order
    #[test]
    fn occupants_track_add_remove_sequences() {
        let emitter = Arc::new(RecordingEmitter::new());
        let mut area = ListeningArea::from_model(
            &ListeningAreaModel {
                id: "stage".to_string(),
                song: Some("X".to_string()),
                is_playing: true,
            },
            BoundingBox::new(0.0, 0.0, 10.0, 10.0),
            emitter.clone(),
        );
        let mut players: Vec<Player> = (1..=4).map(|id| Player::new(id, "p", 1.0, 1.0)).collect();

        for player in players.iter_mut() {
            area.add(player);
        }
        area.add(&mut players[1]);
        area.remove(&mut players[2]);
        area.remove(&mut players[0]);
        area.add(&mut players[0]);

        assert_eq!(area.occupants_by_id(), &[2, 4, 1]);
        // 4 adds + 2 removes + 1 re-add; the duplicate add is silent
        assert_eq!(emitter.player_moves().len(), 7);
        assert!(emitter.interactable_updates().is_empty());
        assert_eq!(area.song(), Some("X"));
    }
}

/// SYNCHRONIZATION TESTS
mod synchronization_tests {
    use super::*;

    /// Replays every broadcast over the wire into a client mirror
    fn deliver(emitter: &RecordingEmitter, mirrors: &mut [&mut TownController]) {
        for packet in emitter.packets() {
            let bytes = serialize(&packet).unwrap();
            let decoded: Packet = deserialize(&bytes).unwrap();
            for mirror in mirrors.iter_mut() {
                mirror.apply_packet(&decoded);
            }
        }
        emitter.clear();
    }

    fn song_log(town: &mut TownController) -> Rc<RefCell<Vec<Option<String>>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let stage = town.listening_area_mut("stage").unwrap();
        stage.add_listener(ListeningAreaEventKind::SongChange, move |event| {
            if let ListeningAreaEvent::SongChange(song) = event {
                sink.borrow_mut().push(song.clone());
            }
        });
        log
    }

    /// Two clients converge on the server state; the editor is notified once
    #[test]
    fn clients_converge_on_authoritative_state() {
        let emitter = Arc::new(RecordingEmitter::new());
        let mut town = Town::from_layout(&stage_layout(), (0.0, 0.0), emitter.clone()).unwrap();
        town.add_player(1, "ada");
        town.add_player(2, "bo");
        town.move_player(1, 150.0, 150.0);

        let mut alice = TownController::from_snapshot(1, town.snapshot());
        let mut bob = TownController::from_snapshot(2, town.snapshot());
        emitter.clear();

        let alice_songs = song_log(&mut alice);
        let bob_songs = song_log(&mut bob);

        // Optimistic edit on alice's side
        let request = alice
            .apply_command(&client::input::Command::SetSong {
                area_id: "stage".to_string(),
                song: Some("X".to_string()),
            })
            .unwrap()
            .unwrap();
        assert_eq!(*alice_songs.borrow(), vec![Some("X".to_string())]);

        match request {
            Packet::InteractableUpdate(model) => town.apply_interactable_update(&model).unwrap(),
            other => panic!("Unexpected request: {:?}", other),
        }
        deliver(&emitter, &mut [&mut alice, &mut bob]);

        assert_eq!(*alice_songs.borrow(), vec![Some("X".to_string())]);
        assert_eq!(*bob_songs.borrow(), vec![Some("X".to_string())]);

        // Alice walks out; the stage drains and both mirrors clear the song
        town.move_player(1, 10.0, 10.0);
        deliver(&emitter, &mut [&mut alice, &mut bob]);

        for mirror in [&alice, &bob] {
            match mirror.area("stage") {
                Some(AreaController::Listening(stage)) => assert_eq!(stage.song(), None),
                _ => panic!("stage missing"),
            }
            let ada = mirror.players().find(|p| p.id == 1).unwrap();
            assert_eq!(ada.location.interactable_id, None);
        }
        assert_eq!(*bob_songs.borrow(), vec![Some("X".to_string()), None]);
    }

    /// Seeks made by one viewer reach the other; draining keeps the position
    #[test]
    fn viewing_progress_reaches_other_clients() {
        let emitter = Arc::new(RecordingEmitter::new());
        let mut town = Town::from_layout(&stage_layout(), (0.0, 0.0), emitter.clone()).unwrap();
        town.add_player(1, "ada");
        town.move_player(1, 350.0, 150.0);

        let mut viewer = TownController::from_snapshot(2, town.snapshot());
        emitter.clear();

        town.apply_interactable_update(&InteractableModel::Viewing(shared::ViewingAreaModel {
            id: "cinema".to_string(),
            video: Some("intro".to_string()),
            is_playing: true,
            elapsed_time_sec: 42.5,
        }))
        .unwrap();
        town.remove_player(&1);
        deliver(&emitter, &mut [&mut viewer]);

        let cinema = viewer.viewing_area_mut("cinema").unwrap();
        assert_eq!(cinema.video(), None);
        assert!(cinema.is_playing());
        assert_approx_eq::assert_approx_eq!(cinema.elapsed_time_sec(), 42.5);
        assert!(viewer.players().next().is_none());
    }

    /// A rejected update leaves the server state and broadcasts untouched
    #[test]
    fn rejected_update_changes_nothing() {
        let emitter = Arc::new(RecordingEmitter::new());
        let mut town = Town::from_layout(&stage_layout(), (0.0, 0.0), emitter.clone()).unwrap();
        let before = town.snapshot();

        let result = town.apply_interactable_update(&InteractableModel::Listening(
            ListeningAreaModel {
                id: "cinema".to_string(),
                song: Some("X".to_string()),
                is_playing: true,
            },
        ));

        assert!(result.is_err());
        assert_eq!(town.snapshot(), before);
        assert!(emitter.packets().is_empty());
    }

    /// Broadcasts reach the sender queue in mutation order
    #[test]
    fn channel_emitter_preserves_mutation_order() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let emitter: Arc<dyn TownEmitter> = Arc::new(ChannelEmitter::new(tx));
        let mut town = Town::from_layout(&stage_layout(), (0.0, 0.0), emitter).unwrap();
        town.add_player(1, "ada");
        town.move_player(1, 150.0, 150.0);

        for i in 0..50 {
            town.apply_interactable_update(&InteractableModel::Listening(ListeningAreaModel {
                id: "stage".to_string(),
                song: Some(format!("song-{}", i)),
                is_playing: i % 2 == 0,
            }))
            .unwrap();
        }
        drop(town);

        let songs = tokio_test::block_on(async {
            let mut songs = Vec::new();
            while let Some(message) = rx.recv().await {
                if let GameMessage::BroadcastPacket {
                    packet: Packet::InteractableUpdate(model),
                    ..
                } = message
                {
                    songs.push(listening(&model).song.clone().unwrap());
                }
            }
            songs
        });

        let expected: Vec<String> = (0..50).map(|i| format!("song-{}", i)).collect();
        assert_eq!(songs, expected);
    }
}

/// NETWORK TESTS
mod network_tests {
    use super::*;
    use server::config::ServerConfig;
    use server::network::Server;
    use shared::PROTOCOL_VERSION;
    use std::time::Duration;
    use tokio::net::UdpSocket;
    use tokio::time::timeout;

    async fn send(socket: &UdpSocket, packet: &Packet) {
        socket.send(&serialize(packet).unwrap()).await.unwrap();
    }

    /// Reads packets until one matches, failing after a short timeout
    async fn recv_until(socket: &UdpSocket, mut matches: impl FnMut(&Packet) -> bool) -> Packet {
        let mut buf = vec![0u8; 8192];
        timeout(Duration::from_secs(2), async {
            loop {
                let len = socket.recv(&mut buf).await.unwrap();
                let packet: Packet = deserialize(&buf[..len]).unwrap();
                if matches(&packet) {
                    return packet;
                }
            }
        })
        .await
        .expect("timed out waiting for packet")
    }

    async fn connect(addr: std::net::SocketAddr, name: &str) -> (UdpSocket, u32) {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        socket.connect(addr).await.unwrap();
        send(
            &socket,
            &Packet::Connect {
                client_version: PROTOCOL_VERSION,
                user_name: name.to_string(),
            },
        )
        .await;

        match recv_until(&socket, |p| matches!(p, Packet::Connected { .. })).await {
            Packet::Connected { player_id, .. } => (socket, player_id),
            _ => unreachable!(),
        }
    }

    /// Full session over UDP: the observer sees the drain when the DJ leaves
    #[tokio::test]
    async fn udp_session_drains_area_on_disconnect() {
        let config = ServerConfig {
            bind_addr: "127.0.0.1:0".to_string(),
            ..ServerConfig::default()
        };
        let mut server = Server::new(&config, &stage_layout()).await.unwrap();
        let addr = server.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = server.run().await;
        });

        let (observer, _) = connect(addr, "observer").await;
        let (dj, dj_id) = connect(addr, "dj").await;

        send(&dj, &Packet::Move { x: 150.0, y: 150.0 }).await;
        send(
            &dj,
            &Packet::InteractableUpdate(InteractableModel::Listening(ListeningAreaModel {
                id: "stage".to_string(),
                song: Some("X".to_string()),
                is_playing: true,
            })),
        )
        .await;

        let update = recv_until(&observer, |p| matches!(p, Packet::InteractableUpdate(_))).await;
        match update {
            Packet::InteractableUpdate(model) => {
                assert_eq!(listening(&model).song.as_deref(), Some("X"))
            }
            _ => unreachable!(),
        }

        send(&dj, &Packet::Disconnect).await;

        let drained = recv_until(&observer, |p| matches!(p, Packet::InteractableUpdate(_))).await;
        match drained {
            Packet::InteractableUpdate(model) => {
                assert_eq!(listening(&model).song, None);
                assert!(listening(&model).is_playing);
            }
            _ => unreachable!(),
        }

        let gone = recv_until(&observer, |p| matches!(p, Packet::PlayerDisconnected { .. })).await;
        assert_eq!(gone, Packet::PlayerDisconnected { player_id: dj_id });
    }

    /// Updates for areas that do not exist are bounced back to the sender
    #[tokio::test]
    async fn udp_rejects_update_for_unknown_area() {
        let config = ServerConfig {
            bind_addr: "127.0.0.1:0".to_string(),
            ..ServerConfig::default()
        };
        let mut server = Server::new(&config, &stage_layout()).await.unwrap();
        let addr = server.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = server.run().await;
        });

        let (socket, _) = connect(addr, "ada").await;
        send(
            &socket,
            &Packet::InteractableUpdate(InteractableModel::Listening(ListeningAreaModel {
                id: "nowhere".to_string(),
                song: None,
                is_playing: true,
            })),
        )
        .await;

        match recv_until(&socket, |p| matches!(p, Packet::UpdateRejected { .. })).await {
            Packet::UpdateRejected { area_id, .. } => assert_eq!(area_id, "nowhere"),
            _ => unreachable!(),
        }
    }

    /// A client speaking another protocol version is turned away
    #[tokio::test]
    async fn udp_rejects_protocol_mismatch() {
        let config = ServerConfig {
            bind_addr: "127.0.0.1:0".to_string(),
            ..ServerConfig::default()
        };
        let mut server = Server::new(&config, &MapLayout::default()).await.unwrap();
        let addr = server.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = server.run().await;
        });

        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        socket.connect(addr).await.unwrap();
        send(
            &socket,
            &Packet::Connect {
                client_version: PROTOCOL_VERSION + 1,
                user_name: "old".to_string(),
            },
        )
        .await;

        let reply = recv_until(&socket, |p| matches!(p, Packet::Disconnected { .. })).await;
        assert_eq!(
            reply,
            Packet::Disconnected {
                reason: "Protocol version mismatch".to_string()
            }
        );
    }
}
