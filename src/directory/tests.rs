use super::*;
use crate::directory::create::{CreateRoomForm, DuplicateIdPolicy, RoomCreator};
use crate::store::memory::MemoryCollectionClient;
use crate::store::{CollectionClient, Document};
use serde_json::json;
use std::time::Duration;

async fn wait_for_rooms(directory: &RoomDirectory, expected: &[Room]) {
    let mut rooms = directory.watch();
    tokio::time::timeout(
        Duration::from_secs(1),
        rooms.wait_for(|rooms| rooms.as_slice() == expected),
    )
    .await
    .expect("directory should converge")
    .expect("sync task alive");
}

#[test]
fn snapshot_maps_key_and_name() {
    let snapshot = Snapshot {
        collection: "rooms".to_string(),
        documents: vec![
            Document {
                key: "gen".to_string(),
                body: json!({ "name": "General", "topic": "anything" }),
            },
            Document {
                key: "blank".to_string(),
                body: json!({ "title": "no name field" }),
            },
            Document {
                key: "num".to_string(),
                body: json!({ "name": 42 }),
            },
        ],
    };
    assert_eq!(
        rooms_from_snapshot(&snapshot),
        vec![
            Room::new("gen", "General"),
            Room::new("blank", ""),
            Room::new("num", ""),
        ]
    );
}

#[tokio::test]
async fn mirrors_existing_documents_on_activation() {
    let client = MemoryCollectionClient::new();
    client
        .upsert("rooms", "gen", json!({ "name": "General" }))
        .await
        .expect("seed");

    let directory = RoomDirectory::activate(&client, "rooms")
        .await
        .expect("activate");
    // Populated as soon as activation returns.
    assert_eq!(*directory.rooms(), vec![Room::new("gen", "General")]);
    assert_eq!(directory.collection(), "rooms");
    directory.deactivate().await;
}

#[tokio::test]
async fn each_snapshot_replaces_the_whole_list() {
    let client = MemoryCollectionClient::new();
    let directory = RoomDirectory::activate(&client, "rooms")
        .await
        .expect("activate");

    client
        .upsert("rooms", "gen", json!({ "name": "General" }))
        .await
        .expect("write gen");
    wait_for_rooms(&directory, &[Room::new("gen", "General")]).await;

    client
        .upsert("rooms", "help", json!({ "name": "Help Desk" }))
        .await
        .expect("write help");
    wait_for_rooms(
        &directory,
        &[Room::new("gen", "General"), Room::new("help", "Help Desk")],
    )
    .await;
    assert_eq!(directory.rooms().len(), 2);

    client.delete("rooms", "gen").await.expect("delete");
    wait_for_rooms(&directory, &[Room::new("help", "Help Desk")]).await;
    directory.deactivate().await;
}

#[tokio::test]
async fn deactivate_releases_the_subscription() {
    let client = MemoryCollectionClient::new();
    let directory = RoomDirectory::activate(&client, "rooms")
        .await
        .expect("activate");
    assert_eq!(client.subscriber_count("rooms"), 1);

    directory.deactivate().await;
    assert_eq!(client.subscriber_count("rooms"), 0);

    client
        .upsert("rooms", "gen", json!({ "name": "General" }))
        .await
        .expect("writes still succeed");
}

#[tokio::test]
async fn dropping_the_directory_releases_the_subscription() {
    let client = MemoryCollectionClient::new();
    let directory = RoomDirectory::activate(&client, "rooms")
        .await
        .expect("activate");
    let mut rooms = directory.watch();
    drop(directory);

    // The aborted task drops its sender, which closes every watch receiver.
    tokio::time::timeout(Duration::from_secs(1), async {
        while rooms.changed().await.is_ok() {}
    })
    .await
    .expect("sync task should stop");
    assert_eq!(client.subscriber_count("rooms"), 0);
}

#[tokio::test]
async fn created_room_appears_only_through_the_subscription() {
    let client = Arc::new(MemoryCollectionClient::new());
    let directory = RoomDirectory::activate(&*client, "rooms")
        .await
        .expect("activate");
    wait_for_rooms(&directory, &[]).await;

    let creator = RoomCreator::new(
        Arc::clone(&client) as Arc<dyn CollectionClient>,
        "rooms",
        DuplicateIdPolicy::Overwrite,
    );
    let mut form = CreateRoomForm::new();
    form.show();
    form.set_name("General");
    form.set_id("GEN");
    form.submit(&creator, &directory.rooms())
        .await
        .expect("created");

    wait_for_rooms(&directory, &[Room::new("gen", "General")]).await;
    directory.deactivate().await;
}

#[tokio::test]
async fn sync_stops_when_the_client_goes_away() {
    let client = MemoryCollectionClient::new();
    client
        .upsert("rooms", "gen", json!({ "name": "General" }))
        .await
        .expect("seed");
    let directory = RoomDirectory::activate(&client, "rooms")
        .await
        .expect("activate");
    let mut rooms = directory.watch();
    drop(client);

    tokio::time::timeout(Duration::from_secs(1), async {
        while rooms.changed().await.is_ok() {}
    })
    .await
    .expect("sync task should stop once the feed ends");
    // The last snapshot stays readable.
    assert_eq!(*directory.rooms(), vec![Room::new("gen", "General")]);
    directory.deactivate().await;
}
