//! Integration tests for the lifecycle controller on the SQLite store.
//!
//! These exercise the real `kv` schema through the library API, with a
//! scripted processor in place of the HTTP endpoint.

use std::sync::Arc;

use async_trait::async_trait;
use docstash::app::open_store;
use docstash::config::Config;
use docstash_core::id::IdGenerator;
use docstash_core::index::{ReferenceIndex, SAVED_REFERENCES_KEY};
use docstash_core::kv::KeyValueStore;
use docstash_core::lifecycle::{Captured, DocumentList};
use docstash_core::models::ImageRef;
use docstash_core::processor::{DocumentProcessor, ProcessError};
use docstash_core::{DocumentId, Language, LifecycleController};
use tempfile::TempDir;

/// Returns `"<language>: <image>"`, or fails for images named `*fail*`.
struct ScriptedProcessor;

#[async_trait]
impl DocumentProcessor for ScriptedProcessor {
    async fn process(&self, image: &ImageRef, language: Language) -> Result<String, ProcessError> {
        if image.as_str().contains("fail") {
            return Err(ProcessError::Status {
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        Ok(format!("{}: {}", language, image))
    }
}

fn test_config(tmp: &TempDir) -> Config {
    let toml_str = format!(
        r#"
[db]
path = "{}/docstash.sqlite"
"#,
        tmp.path().display()
    );
    toml::from_str(&toml_str).unwrap()
}

async fn controller(config: &Config) -> (Arc<dyn KeyValueStore>, LifecycleController) {
    let store: Arc<dyn KeyValueStore> = open_store(config).await.unwrap();
    let controller = LifecycleController::new(store.clone(), Arc::new(ScriptedProcessor));
    (store, controller)
}

#[tokio::test]
async fn test_documents_survive_reopen() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(&tmp);

    let id = {
        let (_store, controller) = controller(&config).await;
        let processed = controller
            .upload(Captured::new(ImageRef::new("file:///a.jpg"), Language::German))
            .await
            .unwrap();
        controller.save(&processed).await.unwrap().id()
    };

    let (_store, controller) = controller(&config).await;
    let listed = controller.list().await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, id);
    assert_eq!(listed[0].server_response.as_deref(), Some("german: file:///a.jpg"));
}

#[tokio::test]
async fn test_stored_layout_matches_key_space() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(&tmp);
    let (store, controller) = controller(&config).await;

    let processed = controller
        .upload(Captured::new(ImageRef::new("file:///b.jpg"), Language::Espanol))
        .await
        .unwrap();
    let id = controller.save(&processed).await.unwrap().id();

    assert_eq!(
        store.get(&id.image_key()).await.unwrap().as_deref(),
        Some("file:///b.jpg")
    );
    assert_eq!(
        store.get(&id.response_key()).await.unwrap().as_deref(),
        Some("\"espanol: file:///b.jpg\"")
    );
    let blob = store.get(SAVED_REFERENCES_KEY).await.unwrap().unwrap();
    assert_eq!(
        blob,
        format!(
            r#"[{{"imageKey":"image_{id}","responseKey":"response_{id}"}}]"#,
            id = id
        )
    );
}

#[tokio::test]
async fn test_failed_upload_leaves_store_unchanged() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(&tmp);
    let (store, controller) = controller(&config).await;

    let err = controller
        .upload(Captured::new(ImageRef::new("file:///fail.jpg"), Language::English))
        .await
        .unwrap_err();
    assert!(err.into_captured().is_some());
    assert_eq!(store.get(SAVED_REFERENCES_KEY).await.unwrap(), None);
    assert!(controller.list().await.is_empty());
}

#[tokio::test]
async fn test_concurrent_saves_are_all_indexed() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(&tmp);
    let (_store, controller) = controller(&config).await;
    let controller = Arc::new(controller);

    let processed = controller
        .upload(Captured::new(ImageRef::new("file:///c.jpg"), Language::Dutch))
        .await
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..16 {
        let controller = controller.clone();
        let processed = processed.clone();
        handles.push(tokio::spawn(async move {
            controller.save(&processed).await.unwrap()
        }));
    }
    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap().id());
    }
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 16);
    assert_eq!(controller.list().await.len(), 16);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_saves_from_separate_stores_on_one_file_are_all_indexed() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(&tmp);

    // Two independently opened stores stand in for two CLI processes. Both
    // clocks are frozen on the same millisecond so every id is contested.
    let mut controllers = Vec::new();
    for _ in 0..2 {
        let (_store, controller) = controller(&config).await;
        let controller =
            controller.with_id_generator(IdGenerator::with_clock(|| 1_700_000_000_000));
        controllers.push(Arc::new(controller));
    }

    let processed = controllers[0]
        .upload(Captured::new(ImageRef::new("file:///shared.jpg"), Language::Czech))
        .await
        .unwrap();

    let mut handles = Vec::new();
    for i in 0..40 {
        let controller = controllers[i % 2].clone();
        let processed = processed.clone();
        handles.push(tokio::spawn(async move {
            controller.save(&processed).await.unwrap().id()
        }));
    }
    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap());
    }
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 40);

    let (_store, fresh) = controller(&config).await;
    let listed = fresh.list().await;
    assert_eq!(listed.len(), 40);
    assert!(listed.iter().all(|e| !e.is_orphaned()));
}

#[tokio::test]
async fn test_delete_reclaims_everything() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(&tmp);
    let (store, controller) = controller(&config).await;

    let processed = controller
        .upload(Captured::new(ImageRef::new("file:///d.jpg"), Language::Polish))
        .await
        .unwrap();
    let keep = controller.save(&processed).await.unwrap().id();
    let gone = controller.save(&processed).await.unwrap().id();

    let mut view = DocumentList::new();
    view.refresh(&controller).await;
    view.delete(&controller, &gone).await.unwrap();

    assert_eq!(view.len(), 1);
    assert_eq!(view.entries()[0].id, keep);
    assert_eq!(store.get(&gone.image_key()).await.unwrap(), None);
    assert_eq!(store.get(&gone.response_key()).await.unwrap(), None);
    assert_eq!(controller.list().await, view.entries());

    let index = ReferenceIndex::new(store.clone());
    assert!(!index.contains(&gone.image_key()).await);
    assert!(index.contains(&keep.image_key()).await);
}

#[tokio::test]
async fn test_doctor_repairs_dangling_pointer() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(&tmp);
    let (store, controller) = controller(&config).await;

    let processed = controller
        .upload(Captured::new(ImageRef::new("file:///e.jpg"), Language::Greek))
        .await
        .unwrap();
    let id = controller.save(&processed).await.unwrap().id();
    store.remove(&id.image_key()).await.unwrap();
    store.remove(&id.response_key()).await.unwrap();

    let report = controller.diagnose().await;
    assert_eq!(report.dangling.len(), 1);

    let report = controller.repair().await.unwrap();
    assert_eq!(report.removed, 1);
    assert!(controller.list().await.is_empty());
    assert!(controller.open(&DocumentId::new(id.as_str())).await.is_none());
}
