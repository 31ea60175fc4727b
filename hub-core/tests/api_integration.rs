//! Integration tests that call the real generative APIs.
//!
//! These tests require ANTHROPIC_API_KEY (and IMAGE_API_KEY for
//! manifestation) to be set, via .env file or environment.
//! Run with: `cargo test -p hub-core --test api_integration -- --ignored`

use hub_core::{GenAiService, Hub, HubConfig, Lab, MemoryStore, SynthesisFormat};
use std::sync::Arc;

/// Load environment variables from .env file
fn setup() {
    let _ = dotenvy::dotenv();
}

fn has_key(var: &str) -> bool {
    std::env::var(var).is_ok()
}

fn live_lab() -> Lab<MemoryStore> {
    let service = GenAiService::from_env().expect("Failed to create service");
    Lab::new(
        Hub::open(MemoryStore::new(), HubConfig::default()),
        Arc::new(service),
    )
}

#[tokio::test]
#[ignore] // Run with: cargo test -p hub-core --test api_integration -- --ignored
async fn test_live_audit() {
    setup();
    if !has_key("ANTHROPIC_API_KEY") || !has_key("IMAGE_API_KEY") {
        eprintln!("Skipping test: API keys not set");
        return;
    }

    let lab = live_lab();
    let report = lab
        .audit("A smart lock that pairs over Bluetooth Low Energy")
        .await
        .expect("audit should succeed");

    assert!(report.encryption_strength <= 100);
    assert!(report.integrity_score <= 100);
    assert_eq!(lab.hub().await.essence(), 1075);
}

#[tokio::test]
#[ignore]
async fn test_live_synthesis() {
    setup();
    if !has_key("ANTHROPIC_API_KEY") || !has_key("IMAGE_API_KEY") {
        eprintln!("Skipping test: API keys not set");
        return;
    }

    let lab = live_lab();
    let id = lab
        .synthesize("Satellite uplink spoofing", &SynthesisFormat::CommunityPost)
        .await
        .expect("synthesis should succeed");

    let hub = lab.hub().await;
    let inv = hub.invention(&id).expect("invention should exist");
    assert!(!inv.name.is_empty());
    assert!(!inv.category.is_empty());
}

#[tokio::test]
#[ignore]
async fn test_live_manifestation() {
    setup();
    if !has_key("ANTHROPIC_API_KEY") || !has_key("IMAGE_API_KEY") {
        eprintln!("Skipping test: API keys not set");
        return;
    }

    let lab = live_lab();
    let id = lab
        .manifest("A glowing circuit board shaped like a moth")
        .await
        .expect("manifestation should succeed");

    let hub = lab.hub().await;
    let url = hub.invention(&id).and_then(|inv| inv.image_url.clone());
    let url = url.expect("manifestation should carry an image");
    assert!(url.starts_with("http") || url.starts_with("data:image/"));
}
