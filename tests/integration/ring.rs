//! Happy-path ring formation and traversal.

use crate::infra::{play, spawn_member, spawn_origin};
use anyhow::Result;
use serde_json::Value;

#[tokio::test]
async fn single_member_ring_completes_a_round_trip() -> Result<()> {
    let origin = spawn_origin("H", 5, 10).await?;

    let response = play(&origin, "solo lap").await?;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await?;

    assert_eq!(body["contentResult"], "Success");
    assert_eq!(body["receivedHash"], body["originalHash"]);
    let items = body["signatures"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["name"], "H");
    Ok(())
}

#[tokio::test]
async fn four_member_ring_traverses_in_reverse_join_order() -> Result<()> {
    let origin = spawn_origin("H", 5, 10).await?;
    let _a = spawn_member("A", &origin).await?;
    let _b = spawn_member("B", &origin).await?;
    let _c = spawn_member("C", &origin).await?;

    // Join order H, A, B, C means relay order H → C → B → A → H.
    let response = play(&origin, "hello ring").await?;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await?;

    assert_eq!(body["contentResult"], "Success");
    let items = body["signatures"]["items"].as_array().unwrap();
    let names: Vec<&str> = items.iter().map(|s| s["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["C", "B", "A", "H"]);
    assert_eq!(body["receivedHash"], body["originalHash"]);
    assert_eq!(body["receivedLength"], 10);
    Ok(())
}

#[tokio::test]
async fn consecutive_round_trips_advance_the_clock() -> Result<()> {
    let origin = spawn_origin("H", 5, 10).await?;
    let _a = spawn_member("A", &origin).await?;

    for _ in 0..3 {
        let response = play(&origin, "again").await?;
        assert_eq!(response.status(), 200);
    }

    let status: Value = reqwest::get(origin.url("/status")).await?.json().await?;
    assert_eq!(status["role"], "origin");
    assert_eq!(status["members"], 2);
    assert_eq!(status["clock"], 3);
    Ok(())
}

#[tokio::test]
async fn rejoin_with_same_identity_is_accepted_idempotently() -> Result<()> {
    let origin = spawn_origin("H", 5, 10).await?;
    let a = spawn_member("A", &origin).await?;
    let _b = spawn_member("B", &origin).await?;

    let identity = a.node.identity().clone();
    let port = identity.port.to_string();
    let uuid = identity.uuid.to_string();
    let rejoin = reqwest::Client::new()
        .post(origin.url("/register-node"))
        .query(&[
            ("host", identity.host.as_str()),
            ("port", port.as_str()),
            ("uuid", uuid.as_str()),
            ("salt", identity.salt.as_str()),
            ("name", identity.name.as_str()),
        ])
        .send()
        .await?;
    assert_eq!(rejoin.status(), 202);
    let pointer: Value = rejoin.json().await?;
    // Same successor it was handed the first time: the origin.
    assert_eq!(pointer["nextPort"], origin.addr.port());

    let status: Value = reqwest::get(origin.url("/status")).await?.json().await?;
    assert_eq!(status["members"], 3);
    Ok(())
}

#[tokio::test]
async fn member_status_reports_successor() -> Result<()> {
    let origin = spawn_origin("H", 5, 10).await?;
    let a = spawn_member("A", &origin).await?;

    let status: Value = reqwest::get(a.url("/status")).await?.json().await?;
    assert_eq!(status["role"], "member");
    assert_eq!(
        status["successor"],
        format!("127.0.0.1:{}", origin.addr.port())
    );
    Ok(())
}
