//! End-to-end exercises of the store API against the in-memory backend.

use modelbase::{bson::doc, memory::InMemoryStore, prelude::*};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Player {
    #[serde(flatten)]
    base: BaseModel,
    name: String,
    #[serde(default)]
    rank: i32,
}

impl Player {
    fn named(name: &str, rank: i32) -> Self {
        Self {
            base: BaseModel::new(),
            name: name.to_string(),
            rank,
        }
    }
}

impl Model for Player {
    fn collection_name() -> &'static str {
        "players"
    }

    fn base(&self) -> &BaseModel {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseModel {
        &mut self.base
    }
}

fn new_store() -> ModelStore<InMemoryStore> {
    ModelStore::new(InMemoryStore::new())
}

async fn seed(store: &ModelStore<InMemoryStore>, count: i32) -> Vec<Player> {
    let mut players = Vec::new();
    for n in 0..count {
        let mut player = Player::named(&format!("player{n:02}"), n);
        store.insert(&mut player).await.unwrap();
        players.push(player);
    }
    players
}

#[tokio::test]
async fn insert_assigns_identity_and_round_trips() {
    let store = new_store();

    let mut player = Player::named("alice", 1);
    assert!(player.base.is_zero());

    store.insert(&mut player).await.unwrap();
    assert!(!player.base.is_zero());
    assert!(player.base.create_time > 0);
    assert!(player.base.last_modify_time >= player.base.create_time);

    let mut found = Player::named("", 0);
    let hit = store
        .find_by_id(&player.id_hex(), &mut found)
        .await
        .unwrap();
    assert!(hit);
    assert_eq!(found.name, "alice");
    assert_eq!(found.object_id(), player.object_id());
}

#[tokio::test]
async fn find_by_id_misses_cleanly() {
    let store = new_store();
    seed(&store, 3).await;

    let mut dest = Player::named("", 0);
    let hit = store
        .find_by_id("ffffffffffffffffffffffff", &mut dest)
        .await
        .unwrap();
    assert!(!hit);

    // Garbage hex resolves to the nil id instead of failing.
    let hit = store.find_by_id("not-hex", &mut dest).await.unwrap();
    assert!(!hit);
}

#[tokio::test]
async fn insert_twice_is_a_duplicate() {
    let store = new_store();

    let mut player = Player::named("alice", 1);
    store.insert(&mut player).await.unwrap();

    let result = store.insert(&mut player).await;
    assert!(matches!(result, Err(ModelStoreError::DuplicateId(_, _))));
}

#[tokio::test]
async fn last_page_holds_the_remainder() {
    let store = new_store();
    seed(&store, 25).await;

    let mut page: Vec<Player> = Vec::new();
    let (total, pages) = store.find_page(None, &mut page, 10, 3).await;

    assert_eq!((total, pages), (25, 3));
    assert_eq!(page.len(), 5);
    // Insertion order is stable, so page 3 is players 20 through 24.
    let names: Vec<_> = page.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["player20", "player21", "player22", "player23", "player24"]
    );
}

#[tokio::test]
async fn page_past_the_end_keeps_totals() {
    let store = new_store();
    seed(&store, 25).await;

    let mut page: Vec<Player> = Vec::new();
    let (total, pages) = store.find_page(None, &mut page, 10, 4).await;

    assert_eq!((total, pages), (25, 3));
    assert!(page.is_empty());
}

#[tokio::test]
async fn empty_collection_pages_to_zero() {
    let store = new_store();

    let mut page = vec![Player::named("sentinel", 0)];
    let (total, pages) = store.find_page(None, &mut page, 10, 1).await;

    assert_eq!((total, pages), (0, 0));
    // The destination is appended to, never cleared.
    assert_eq!(page.len(), 1);
}

#[tokio::test]
async fn paging_respects_the_filter() {
    let store = new_store();
    seed(&store, 10).await;

    let mut page: Vec<Player> = Vec::new();
    let (total, pages) = store
        .find_page(Some(doc! { "rank": { "$gte": 6 } }), &mut page, 2, 2)
        .await;

    assert_eq!((total, pages), (4, 2));
    let ranks: Vec<_> = page.iter().map(|p| p.rank).collect();
    assert_eq!(ranks, vec![8, 9]);
}

#[tokio::test]
async fn page_options_shape_and_sort_the_results() {
    let store = new_store();
    seed(&store, 5).await;

    let mut options = FindPageOptions::acquire();
    options
        .select("rank", false)
        .sort("name", SortOrder::Desc);

    let mut page: Vec<Player> = Vec::new();
    let (total, pages) = store
        .find_page_with_options(None, &mut page, 3, 1, options)
        .await;

    assert_eq!((total, pages), (5, 2));
    let names: Vec<_> = page.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["player04", "player03", "player02"]);
    // Rank was projected away and fell back to its default.
    assert!(page.iter().all(|p| p.rank == 0));

    // The option object went back to its pool cleared.
    assert!(FindPageOptions::acquire().is_empty());
}

#[tokio::test]
async fn update_cannot_escape_its_own_document() {
    let store = new_store();

    let mut alice = Player::named("alice", 1);
    let mut bob = Player::named("bob", 2);
    store.insert(&mut alice).await.unwrap();
    store.insert(&mut bob).await.unwrap();

    // A filter aimed at bob still gets alice's id forced in, so nothing
    // matches and bob stays untouched.
    alice.rank = 99;
    let result = store
        .update(&mut alice, Some(doc! { "name": "bob" }))
        .await
        .unwrap();
    assert_eq!(result.matched_count, 0);

    let mut stored_bob = Player::named("", 0);
    store
        .find_by_id(&bob.id_hex(), &mut stored_bob)
        .await
        .unwrap();
    assert_eq!(stored_bob.rank, 2);

    // The default filter matches by id and lands.
    let result = store.update(&mut alice, None).await.unwrap();
    assert_eq!(result.matched_count, 1);

    let mut stored_alice = Player::named("", 0);
    store
        .find_by_id(&alice.id_hex(), &mut stored_alice)
        .await
        .unwrap();
    assert_eq!(stored_alice.rank, 99);
}

#[tokio::test]
async fn updater_refuses_to_write_blind() {
    let store = new_store();

    let mut player = Player::named("alice", 1);
    store.insert(&mut player).await.unwrap();

    let mut ghost = Player::named("ghost", 0);
    let mut updater = store.updater(&mut ghost);
    let result = updater.update(None).await;
    assert!(matches!(result, Err(ModelStoreError::DocumentNotExist)));

    let mut updater = store.updater(&mut player);
    assert!(updater.find().await);
    updater.model().rank = 50;
    let result = updater.update(None).await.unwrap();
    assert_eq!(result.matched_count, 1);
}

#[tokio::test]
async fn delete_removes_exactly_one_document() {
    let store = new_store();
    let players = seed(&store, 3).await;

    store.delete(&players[1]).await.unwrap();

    let mut dest = Player::named("", 0);
    let hit = store
        .find_by_id(&players[1].id_hex(), &mut dest)
        .await
        .unwrap();
    assert!(!hit);

    let result = store.delete(&players[1]).await;
    assert!(matches!(result, Err(ModelStoreError::NotFound)));

    let mut page: Vec<Player> = Vec::new();
    let (total, _) = store.find_page(None, &mut page, 10, 1).await;
    assert_eq!(total, 2);
}

#[tokio::test]
async fn exists_answers_without_decoding() {
    let store = new_store();
    seed(&store, 3).await;

    assert!(store.exists::<Player>(Some(doc! { "rank": 2 })).await);
    assert!(!store.exists::<Player>(Some(doc! { "rank": 9 })).await);
}

#[tokio::test]
async fn distinct_collects_typed_values() {
    let store = new_store();

    for (name, rank) in [("a", 1), ("b", 1), ("c", 2)] {
        let mut player = Player::named(name, rank);
        store.insert(&mut player).await.unwrap();
    }

    let mut ranks: Vec<i32> = Vec::new();
    store
        .distinct::<Player, i32>(None, "rank", &mut ranks)
        .await
        .unwrap();
    assert_eq!(ranks, vec![1, 2]);
}

#[tokio::test]
async fn aggregate_runs_a_pipeline() {
    let store = new_store();
    seed(&store, 10).await;

    #[derive(Debug, Deserialize)]
    struct CountRow {
        total: i64,
    }

    let mut rows: Vec<CountRow> = Vec::new();
    store
        .aggregate::<Player, CountRow>(
            vec![
                doc! { "$match": { "rank": { "$gte": 5 } } },
                doc! { "$count": "total" },
            ],
            &mut rows,
        )
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].total, 5);
}
