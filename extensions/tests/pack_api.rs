//! Live tests against a pack server. They read `PACKSYNC_API_URL`, `PACKSYNC_TOKEN` and
//! `PACKSYNC_TEST_PACK` and skip themselves when those are missing.

mod common;

use packsync_core::api::{ApiError, PackApi};
use packsync_core::pack::PackId;
use packsync_core::snapshot::{LoadError, SnapshotLoader};
use packsync_extensions::http::{HttpConfig, PackClient};
use tracing::info;

fn setup_tracing() {
    let _ = tracing_subscriber::fmt::try_init();
}

fn client(test_name: &str) -> Option<PackClient> {
    let url = common::get_env_or_skip("PACKSYNC_API_URL", test_name)?;
    let token = common::get_env_or_skip("PACKSYNC_TOKEN", test_name)?;
    let config = HttpConfig::new(&url, token).expect("Invalid test configuration");
    Some(PackClient::new(config).expect("Failed to build client"))
}

#[tokio::test]
#[ignore]
async fn fetch_library_integration() {
    setup_tracing();
    let Some(client) = client("fetch_library_integration") else { return };

    let library = client.fetch_library().await.unwrap();
    info!("Library has {} samples.", library.len());
    for sample in library.iter().take(5) {
        info!("Sample: id={}, name={}", sample.id, sample.metadata.name);
    }
}

#[tokio::test]
#[ignore]
async fn load_pack_integration() {
    setup_tracing();
    let Some(client) = client("load_pack_integration") else { return };
    let Some(pack_id) = common::get_env_or_skip("PACKSYNC_TEST_PACK", "load_pack_integration")
    else {
        return;
    };

    let loaded = SnapshotLoader::new(&client)
        .load(&PackId::new(pack_id.clone()))
        .await
        .unwrap();
    assert_eq!(loaded.snapshot.pack_id().as_str(), pack_id);
    assert!(loaded.records.iter().all(|r| r.already_in_pack()));
}

#[tokio::test]
#[ignore]
async fn missing_pack_is_not_found_integration() {
    setup_tracing();
    let Some(client) = client("missing_pack_is_not_found_integration") else { return };

    let err = SnapshotLoader::new(&client)
        .load(&PackId::new("packsync-test-does-not-exist"))
        .await
        .unwrap_err();
    assert!(matches!(err, LoadError::NotFound(_)), "unexpected error: {err:?}");
}

#[tokio::test]
#[ignore]
async fn bad_token_is_unauthorized_integration() {
    setup_tracing();
    let Some(url) =
        common::get_env_or_skip("PACKSYNC_API_URL", "bad_token_is_unauthorized_integration")
    else {
        return;
    };
    let client = PackClient::new(HttpConfig::new(&url, "not-a-real-token").unwrap()).unwrap();

    let err = client.fetch_library().await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized(_)), "unexpected error: {err:?}");
}

#[tokio::test]
async fn unreachable_server_is_a_network_error() {
    // Port 9 (discard) on localhost is closed on any sane test machine.
    let config = HttpConfig::new("http://127.0.0.1:9", "token").unwrap();
    let client = PackClient::new(config).unwrap();

    let err = client.fetch_pack(&PackId::new("p1")).await.unwrap_err();
    assert!(err.is_network(), "unexpected error: {err:?}");
}
