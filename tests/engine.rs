//! Engine integration tests
//!
//! Load translations from a data tree, apply them to a host and translate documents.

use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use babele::translation::model::{DocumentType, Mapping, MappingTarget, PackMetadata, Provider};
use babele::translation::{CompendiumHost, ExportFormat, FolderScope, MemoryHost, PackFile};

#[allow(dead_code)]
mod common {
    include!("common/mod.rs");
}

use common::{index_named, item, item_host, items_metadata, longsword, names, TestEnvironment};

fn provider_files(env: &TestEnvironment, provider: &str, entries: Value) {
    env.write_json(
        &format!("modules/{}/compendium/dnd5e.items.json", provider),
        &json!({"label": "Gegenstände", "entries": entries}),
    );
}

#[tokio::test]
async fn test_longsword_is_translated_with_markers() {
    let env = TestEnvironment::new();
    provider_files(
        &env,
        "babele-de",
        json!({"Longsword": {"name": "Langschwert", "description": "Eine Klinge."}}),
    );

    let mut babele = env.engine("de");
    babele.register(Provider::new("babele-de", "de").with_directory("compendium"));
    let mut host = item_host(vec![longsword()]);
    assert!(babele.init(&mut host).await);

    let translated = babele.translate("dnd5e.items", &longsword());

    assert_eq!(translated["_id"], json!("abc123"));
    assert_eq!(translated["name"], json!("Langschwert"));
    assert_eq!(translated["system"]["description"]["value"], json!("Eine Klinge."));
    assert_eq!(translated["translated"], json!(true));
    assert_eq!(translated["hasTranslation"], json!(true));
    assert_eq!(translated["flags"]["babele"]["translated"], json!(true));
    assert_eq!(translated["flags"]["babele"]["originalName"], json!("Longsword"));
}

#[tokio::test]
async fn test_translation_is_idempotent() {
    let env = TestEnvironment::new();
    provider_files(&env, "babele-de", json!({"Longsword": {"name": "Langschwert"}}));

    let mut babele = env.engine("de");
    babele.register(Provider::new("babele-de", "de").with_directory("compendium"));
    let mut host = item_host(vec![longsword()]);
    assert!(babele.init(&mut host).await);

    let once = babele.translate("dnd5e.items", &longsword());
    let twice = babele.translate("dnd5e.items", &once);

    assert_eq!(twice, once);
}

#[tokio::test]
async fn test_untranslated_collection_passes_through() {
    let env = TestEnvironment::new();
    provider_files(&env, "babele-de", json!({"Longsword": {"name": "Langschwert"}}));

    let mut babele = env.engine("de");
    babele.register(Provider::new("babele-de", "de").with_directory("compendium"));
    let mut host = item_host(vec![longsword()]);
    host.add_pack(
        PackMetadata::new("dnd5e", "spells", DocumentType::Item),
        vec![],
    );
    assert!(babele.init(&mut host).await);

    let spell = json!({"_id": "s1", "name": "Fireball"});
    assert_eq!(babele.translate("dnd5e.spells", &spell), spell);
    assert_eq!(babele.translate("unknown.pack", &spell), spell);

    let untranslated = item("x1", "Dagger", "Short.");
    assert_eq!(babele.translate("dnd5e.items", &untranslated), untranslated);
}

#[tokio::test]
async fn test_lower_priority_number_wins_but_missing_fields_survive() {
    let env = TestEnvironment::new();
    provider_files(&env, "preferred", json!({"Longsword": {"name": "Langschwert"}}));
    provider_files(
        &env,
        "fallback",
        json!({"Longsword": {"name": "Schwert", "description": "Eine Klinge."}}),
    );

    let mut babele = env.engine("de");
    babele.register(Provider::new("fallback", "de").with_directory("compendium"));
    babele.register(
        Provider::new("preferred", "de")
            .with_directory("compendium")
            .with_priority(50),
    );
    let mut host = item_host(vec![longsword()]);
    assert!(babele.init(&mut host).await);

    let translated = babele.translate("dnd5e.items", &longsword());
    assert_eq!(translated["name"], json!("Langschwert"));
    assert_eq!(translated["system"]["description"]["value"], json!("Eine Klinge."));
}

#[tokio::test]
async fn test_reference_fallback() {
    let env = TestEnvironment::new();
    env.write_json(
        "modules/babele-de/compendium/dnd5e.items.json",
        &json!({"reference": "dnd5e.gear", "entries": {}}),
    );
    env.write_json(
        "modules/babele-de/compendium/dnd5e.gear.json",
        &json!({"entries": {"Rope": {"name": "Seil", "description": "Hanf."}}}),
    );

    let mut babele = env.engine("de");
    babele.register(Provider::new("babele-de", "de").with_directory("compendium"));
    let mut host = item_host(vec![]);
    host.add_pack(
        PackMetadata::new("dnd5e", "gear", DocumentType::Item),
        vec![],
    );
    assert!(babele.init(&mut host).await);

    let rope = item("r1", "Rope", "Hemp.");
    let via_reference = babele.translate("dnd5e.items", &rope);
    let direct = babele.translate("dnd5e.gear", &rope);

    assert_eq!(via_reference["name"], json!("Seil"));
    assert_eq!(via_reference["system"]["description"]["value"], json!("Hanf."));
    assert_eq!(via_reference["name"], direct["name"]);
}

#[tokio::test]
async fn test_index_sorted_with_german_collation() {
    let env = TestEnvironment::new();
    provider_files(&env, "babele-de", json!({"Banana": {"name": "Banane"}}));

    let mut babele = env.engine("de");
    babele.register(Provider::new("babele-de", "de").with_directory("compendium"));
    let mut host = item_host(vec![]);
    assert!(babele.init(&mut host).await);

    let sorted = babele.translate_index("dnd5e.items", &index_named(&["Banana", "apfel", "Äpfel"]));
    let sorted = names(&sorted);

    assert_eq!(sorted.len(), 3);
    assert_eq!(sorted[2], "Banane");
    assert!(sorted[..2].contains(&"apfel".to_string()));
    assert!(sorted[..2].contains(&"Äpfel".to_string()));
}

#[tokio::test]
async fn test_init_renames_pack_and_sidebar_folders() {
    let env = TestEnvironment::new();
    env.write_json(
        "modules/babele-de/compendium/dnd5e.items.json",
        &json!({"folders": {"Weapons": "Waffen"}, "entries": {}}),
    );
    env.write_json(
        "modules/babele-de/compendium/dnd5e_packs-folders.json",
        &json!({"entries": {"Monsters": "Monster"}}),
    );

    let mut babele = env.engine("de");
    babele.register(Provider::new("babele-de", "de").with_directory("compendium"));
    let mut host = MemoryHost::new().with_sidebar_folders(["Monsters", "Spells"]);
    host.add_pack_file(PackFile {
        metadata: items_metadata(),
        documents: vec![],
        folders: vec!["Weapons".to_string(), "Armor".to_string()],
    });
    assert!(babele.init(&mut host).await);

    assert_eq!(
        host.folder_names(&FolderScope::Pack("dnd5e.items".to_string())),
        vec!["Waffen", "Armor"]
    );
    assert_eq!(host.folder_names(&FolderScope::Sidebar), vec!["Monster", "Spells"]);
    assert_eq!(babele.system_folders()["Monsters"], "Monster");
}

#[tokio::test]
async fn test_unregistered_converter_stays_dynamic() {
    let env = TestEnvironment::new();
    provider_files(&env, "babele-de", json!({"Longsword": {"name": "Langschwert", "weight": "3 kg"}}));

    let mut mapping = Mapping::new();
    mapping.insert("weight".to_string(), MappingTarget::dynamic("missingConverter", "system.weight"));

    let mut babele = env.engine("de");
    babele.register(
        Provider::new("babele-de", "de")
            .with_directory("compendium")
            .with_custom_mapping(DocumentType::Item, mapping),
    );
    let mut host = item_host(vec![]);
    assert!(babele.init(&mut host).await);

    let mut document = longsword();
    document["system"]["weight"] = json!(3);

    let pack = babele.catalog();
    let pack = pack.pack("dnd5e.items").unwrap();
    assert!(pack.mapping().is_dynamic());
    assert_eq!(babele.translate_field("weight", "dnd5e.items", &document), None);
    assert_eq!(babele.extract("dnd5e.items", &document)["weight"], json!("{{converter}}"));

    let translated = babele.translate("dnd5e.items", &document);
    assert_eq!(translated["name"], json!("Langschwert"));
    assert_eq!(translated["system"]["weight"], json!(3));
}

#[tokio::test]
async fn test_export_is_deterministic() {
    let env = TestEnvironment::new();
    let babele = env.engine("de");
    let host = item_host(vec![
        item("b2", "Dagger", "Short."),
        longsword(),
    ]);

    let first = babele
        .export_translations_file(&host, "dnd5e.items", ExportFormat::Object)
        .unwrap();
    let second = babele
        .export_translations_file(&host, "dnd5e.items", ExportFormat::Object)
        .unwrap();
    assert_eq!(first, second);

    let exported: Value = serde_json::from_str(&first).unwrap();
    assert_eq!(exported["collection"], json!("dnd5e.items"));
    assert_eq!(
        exported["entries"]["Longsword"],
        json!({"description": "A blade.", "name": "Longsword"})
    );
    let keys: Vec<&String> = exported["entries"].as_object().unwrap().keys().collect();
    assert_eq!(keys, vec!["Dagger", "Longsword"]);

    let legacy = babele
        .export_translations_file(&host, "dnd5e.items", ExportFormat::Legacy)
        .unwrap();
    let legacy: Value = serde_json::from_str(&legacy).unwrap();
    assert_eq!(legacy["entries"][0]["id"], json!("Dagger"));
}

#[tokio::test]
async fn test_reload_keeps_snapshot_when_nothing_is_found() {
    let env = TestEnvironment::new();
    provider_files(&env, "babele-de", json!({"Longsword": {"name": "Langschwert"}}));

    let mut babele = env.engine("de");
    babele.register(Provider::new("babele-de", "de").with_directory("compendium"));
    let mut host = item_host(vec![longsword()]);
    assert!(babele.init(&mut host).await);
    let snapshot = babele.catalog();

    env.remove("modules/babele-de");
    assert!(!babele.reload(&mut host).await);

    assert_eq!(snapshot.translations().len(), 1);
    assert_eq!(babele.translate("dnd5e.items", &longsword())["name"], json!("Langschwert"));
}

#[tokio::test]
async fn test_actor_items_translated_from_item_pack() {
    let env = TestEnvironment::new();
    provider_files(&env, "babele-de", json!({"Longsword": {"name": "Langschwert"}}));
    env.write_json(
        "modules/babele-de/compendium/dnd5e.monsters.json",
        &json!({"entries": {"Goblin Boss": {"name": "Goblinboss"}}}),
    );

    let mut babele = env.engine("de");
    babele.register(Provider::new("babele-de", "de").with_directory("compendium"));
    let mut host = item_host(vec![longsword()]);
    host.add_pack(PackMetadata::new("dnd5e", "monsters", DocumentType::Actor), vec![]);
    assert!(babele.init(&mut host).await);

    let goblin = json!({
        "_id": "g1",
        "name": "Goblin",
        "prototypeToken": {"name": "Goblin"},
        "items": [longsword(), item("x1", "Dagger", "Short.")]
    });
    let translated = babele.translate("dnd5e.monsters", &goblin);

    assert_eq!(translated["name"], json!("Goblin"));
    assert_eq!(translated["hasTranslation"], json!(false));
    assert_eq!(translated["items"][0]["name"], json!("Langschwert"));
    assert_eq!(translated["items"][1]["name"], json!("Dagger"));

    let boss = json!({
        "_id": "g2",
        "name": "Goblin Boss",
        "prototypeToken": {"name": "Goblin Boss"},
        "items": []
    });
    let translated = babele.translate("dnd5e.monsters", &boss);

    assert_eq!(translated["name"], json!("Goblinboss"));
    assert_eq!(translated["prototypeToken"]["name"], json!("Goblinboss"));
}
