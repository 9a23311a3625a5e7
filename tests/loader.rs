//! Loader and cache integration tests

use std::io::{Cursor, Write};
use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use babele::translation::model::Provider;
use babele::translation::pipeline::{LoadRequest, LocalSource, TranslationLoader};
use babele::translation::{RedbStore, TranslationStore};

#[allow(dead_code)]
mod common {
    include!("common/mod.rs");
}

use common::{item_host, items_metadata, longsword, TestEnvironment};

fn zip_bytes(files: &[(&str, &str)]) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    {
        let mut writer = ZipWriter::new(&mut buffer);
        for (name, contents) in files {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(contents.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
    }
    buffer.into_inner()
}

#[tokio::test]
async fn test_archive_provider() {
    let env = TestEnvironment::new();
    env.write_bytes(
        "modules/babele-de/translations.zip",
        &zip_bytes(&[
            ("de/dnd5e.items.json", r#"{"entries": {"Longsword": {"name": "Langschwert"}}}"#),
            ("de/readme.txt", "ignored"),
        ]),
    );

    let mut babele = env.engine("de");
    babele.register(Provider::new("babele-de", "de").with_zip_file("translations.zip"));
    let mut host = item_host(vec![longsword()]);

    assert!(babele.init(&mut host).await);
    assert_eq!(babele.translate("dnd5e.items", &longsword())["name"], json!("Langschwert"));
}

#[tokio::test]
async fn test_corrupt_archive_does_not_abort_other_providers() {
    let env = TestEnvironment::new();
    env.write_bytes("modules/broken/translations.zip", b"not a zip");
    env.write_json(
        "modules/babele-de/compendium/dnd5e.items.json",
        &json!({"entries": {"Longsword": {"name": "Langschwert"}}}),
    );

    let source = Arc::new(LocalSource::new(env.root()));
    let loader = TranslationLoader::new(source, &[items_metadata()]);
    let request = LoadRequest {
        lang: "de".to_string(),
        providers: vec![
            Provider::new("broken", "de").with_zip_file("translations.zip"),
            Provider::new("babele-de", "de").with_directory("compendium"),
        ],
        ..LoadRequest::default()
    };

    let loaded = loader.load(&request).await.unwrap();
    assert_eq!(loaded.translations.len(), 1);
    assert_eq!(loaded.errors.total_errors, 1);
}

#[tokio::test]
async fn test_system_translations_directory() {
    let env = TestEnvironment::new();
    env.write_json(
        "systems/dnd5e/lang/compendium/de/dnd5e.items.json",
        &json!({"entries": {"Longsword": {"name": "Langschwert"}}}),
    );

    let mut babele = env.engine("de");
    babele.set_system_translations_dir("lang/compendium");
    let mut host = item_host(vec![longsword()]);

    assert!(babele.init(&mut host).await);
    assert_eq!(babele.translate("dnd5e.items", &longsword())["name"], json!("Langschwert"));
}

#[tokio::test]
async fn test_inactive_and_foreign_language_providers_are_ignored() {
    let env = TestEnvironment::new();
    env.write_json(
        "modules/babele-fr/compendium/dnd5e.items.json",
        &json!({"entries": {"Longsword": {"name": "Épée longue"}}}),
    );
    env.write_json(
        "modules/babele-de/compendium/dnd5e.items.json",
        &json!({"entries": {"Longsword": {"name": "Langschwert"}}}),
    );

    let mut babele = env.engine("de");
    babele.register(Provider::new("babele-fr", "fr").with_directory("compendium"));
    babele.register(Provider::new("babele-de", "de").with_directory("compendium").inactive());
    let mut host = item_host(vec![longsword()]);

    assert!(!babele.init(&mut host).await);
}

#[tokio::test]
async fn test_cached_provider_skips_files_until_version_changes() {
    let env = TestEnvironment::new();
    env.write_json(
        "modules/babele-de/compendium/dnd5e.items.json",
        &json!({"entries": {"Longsword": {"name": "Langschwert"}}}),
    );
    let store: Arc<dyn TranslationStore> = Arc::new(RedbStore::open(&env.path("cache/translations.redb")).unwrap());

    let mut first = env.engine("de").with_store(store.clone());
    first.register(
        Provider::new("babele-de", "de")
            .with_directory("compendium")
            .with_version("1.0.0"),
    );
    assert!(first.init(&mut item_host(vec![])).await);

    let cached = store.load("dnd5e", "babele-de").unwrap().unwrap();
    assert_eq!(cached.version, "1.0.0");
    assert_eq!(cached.worlds, vec!["test-world".to_string()]);

    // Files are gone; the cache still serves the same version
    env.remove("modules/babele-de");
    let mut second = env.engine("de").with_store(store.clone());
    second.register(
        Provider::new("babele-de", "de")
            .with_directory("compendium")
            .with_version("1.0.0"),
    );
    assert!(second.init(&mut item_host(vec![])).await);
    assert_eq!(second.translate("dnd5e.items", &longsword())["name"], json!("Langschwert"));

    // A new version invalidates the cached entry
    let mut third = env.engine("de").with_store(store.clone());
    third.register(
        Provider::new("babele-de", "de")
            .with_directory("compendium")
            .with_version("2.0.0"),
    );
    assert!(!third.init(&mut item_host(vec![])).await);
    assert!(store.load("dnd5e", "babele-de").unwrap().is_none());

    assert_eq!(third.clear_cache().unwrap(), 0);
}
