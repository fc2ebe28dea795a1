//! End-to-end match scenarios driven through the intent queue

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_test::assert_ok;
use uuid::Uuid;

use arena_server::client::{ClientView, Correction};
use arena_server::game::combat::{MUZZLE_OFFSET, RESPAWN_DELAY_MS, WIN_KILLS};
use arena_server::game::snapshot::SnapshotBuilder;
use arena_server::game::{Arena, Intent, SessionEvent, SharedWorld, Simulation, World};
use arena_server::util::time::{unix_millis, TICK_DURATION_MICROS};
use arena_server::ws::protocol::{ClientMsg, ServerMsg};
use arena_server::ws::ConnectionRegistry;

struct Harness {
    sim: Simulation,
    tx: mpsc::Sender<Intent>,
    world: SharedWorld,
    registry: Arc<ConnectionRegistry>,
}

impl Harness {
    fn new() -> Self {
        let world = World::new(Arc::new(Arena::standard()), 11).into_shared();
        let registry = Arc::new(ConnectionRegistry::new());
        let (tx, rx) = mpsc::channel(256);
        let sim = Simulation::new(world.clone(), rx, registry.clone());
        Self {
            sim,
            tx,
            world,
            registry,
        }
    }

    async fn send(&self, id: Uuid, msg: ClientMsg) {
        assert_ok!(
            self.tx
                .send(Intent {
                    connection_id: id,
                    event: SessionEvent::Message(msg),
                    received_at: unix_millis(),
                })
                .await
        );
    }

    async fn disconnect(&self, id: Uuid) {
        assert_ok!(
            self.tx
                .send(Intent {
                    connection_id: id,
                    event: SessionEvent::Disconnected,
                    received_at: unix_millis(),
                })
                .await
        );
    }

    fn tick(&mut self) {
        let report = self.sim.tick();
        self.registry.dispatch(report.outbound);
    }

    async fn join(&mut self, name: &str, character: &str) -> (Uuid, mpsc::Receiver<ServerMsg>) {
        let id = Uuid::new_v4();
        let rx = self.registry.register(id);
        self.send(
            id,
            ClientMsg::Join {
                name: name.into(),
                character: character.into(),
            },
        )
        .await;
        self.tick();
        (id, rx)
    }

    /// Shooter at (600, 500) aiming along +x, victim one tick of travel past the muzzle
    fn line_up(&self, shooter: Uuid, victim: Uuid, victim_health: f32) {
        let mut w = self.world.write();
        let s = w.players.get_mut(&shooter).unwrap();
        s.x = 600.0;
        s.y = 500.0;
        s.angle = 0.0;
        let v = w.players.get_mut(&victim).unwrap();
        v.x = 600.0 + MUZZLE_OFFSET + 12.0;
        v.y = 500.0;
        v.health = victim_health;
    }
}

fn drain(rx: &mut mpsc::Receiver<ServerMsg>) -> Vec<ServerMsg> {
    let mut out = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        out.push(msg);
    }
    out
}

#[tokio::test]
async fn test_lethal_shot_notifies_victim_and_everyone() {
    let mut h = Harness::new();
    let (x, mut rx_x) = h.join("xena", "Fishcer").await;
    let (y, mut rx_y) = h.join("yuri", "Denver").await;
    drain(&mut rx_x);
    drain(&mut rx_y);

    h.line_up(x, y, 30.0);
    h.send(x, ClientMsg::Shoot).await;
    h.tick();

    let to_y = drain(&mut rx_y);
    assert_eq!(
        to_y,
        vec![
            ServerMsg::HitConfirm { health: 0.0 },
            ServerMsg::KillFeed {
                killer: "xena".into(),
                victim: "yuri".into(),
                killer_character: "Fishcer".parse().unwrap(),
            },
        ]
    );
    let to_x = drain(&mut rx_x);
    assert_eq!(to_x.len(), 1);
    assert!(matches!(&to_x[0], ServerMsg::KillFeed { killer, .. } if killer == "xena"));

    {
        let w = h.world.read();
        assert!(!w.players[&y].alive);
        assert_eq!(w.players[&x].kills, 1);
    }

    let ticks = RESPAWN_DELAY_MS * 1000 / TICK_DURATION_MICROS + 2;
    for _ in 0..ticks {
        h.tick();
    }
    assert!(drain(&mut rx_x).contains(&ServerMsg::PlayerRespawn { id: y }));
    assert!(h.world.read().players[&y].alive);
}

#[tokio::test]
async fn test_join_handshake_and_departure() {
    let mut h = Harness::new();
    let (a, mut rx_a) = h.join("  ann  ", "Andree").await;

    let msgs = drain(&mut rx_a);
    assert!(matches!(&msgs[0], ServerMsg::Joined { id, characters } if *id == a && characters.len() == 5));
    assert!(matches!(&msgs[1], ServerMsg::PlayerJoined { name, .. } if name == "ann"));

    let (b, _rx_b) = h.join("bo", "Chesney").await;
    drain(&mut rx_a);

    h.disconnect(b).await;
    h.registry.unregister(b);
    h.tick();

    assert_eq!(drain(&mut rx_a), vec![ServerMsg::PlayerLeft { name: "bo".into() }]);
    assert!(!h.world.read().players.contains_key(&b));
}

#[tokio::test]
async fn test_full_match_to_reset() {
    let mut h = Harness::new();
    let (x, mut rx_x) = h.join("xena", "Fishcer").await;
    let (y, _rx_y) = h.join("yuri", "Denver").await;

    h.world.write().players.get_mut(&x).unwrap().kills = WIN_KILLS - 1;
    h.line_up(x, y, 1.0);
    drain(&mut rx_x);

    h.send(x, ClientMsg::Shoot).await;
    h.tick();

    let msgs = drain(&mut rx_x);
    assert!(msgs.contains(&ServerMsg::GameOver {
        winner: "xena".into(),
        character: "Fishcer".parse().unwrap(),
    }));

    // Frozen world ignores movement and shots
    let tick = h.world.read().tick;
    h.send(
        y,
        ClientMsg::PlayerVelocity {
            vx: 1.0,
            vy: 0.0,
            angle: 0.0,
        },
    )
    .await;
    h.send(x, ClientMsg::Shoot).await;
    h.tick();
    {
        let w = h.world.read();
        assert_eq!(w.tick, tick);
        assert!(w.projectiles.is_empty());
    }

    h.send(y, ClientMsg::NewGame).await;
    h.tick();
    assert!(drain(&mut rx_x).contains(&ServerMsg::GameReset));

    let w = h.world.read();
    assert!(!w.is_game_over());
    assert!(w.players.values().all(|p| p.alive && p.kills == 0));
}

#[tokio::test]
async fn test_client_view_tracks_server_snapshots() {
    let mut h = Harness::new();
    let (me, mut rx) = h.join("me", "Andree").await;
    let mut view = ClientView::new();
    view.apply(ServerMsg::MapData {
        walls: h.world.read().arena.obstacles.clone(),
        width: 1200.0,
        height: 800.0,
    });
    for msg in drain(&mut rx) {
        view.apply(msg);
    }
    view.apply(SnapshotBuilder::build(&h.world.read()));
    assert_eq!(view.last_correction, Some(Correction::Snap));

    {
        let mut w = h.world.write();
        let p = w.players.get_mut(&me).unwrap();
        p.x = 600.0;
        p.y = 500.0;
    }
    view.apply(SnapshotBuilder::build(&h.world.read()));

    // Predict and send the same intents the server will apply
    for _ in 0..6 {
        if let Some(msg) = view.predictor.predict(1.0, 0.0, 0.0) {
            h.send(me, msg).await;
        }
        h.tick();
    }
    view.apply(SnapshotBuilder::build(&h.world.read()));

    let server_x = h.world.read().players[&me].x;
    let local_x = view.predictor.avatar().unwrap().x;
    assert_eq!(view.last_correction, Some(Correction::None));
    assert!((server_x - local_x).abs() < 4.0);
}
