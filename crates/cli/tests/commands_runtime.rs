use std::env;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, OnceLock};

use catalog_cli::commands::product::{self, ProductCommand};
use catalog_cli::commands::{config, doctor};
use serde_json::Value;
use tempfile::TempDir;

fn create(id: &str, active: bool) -> ProductCommand {
    ProductCommand::Create {
        id: id.to_string(),
        name: format!("name-{id}"),
        description: String::new(),
        active,
        image_path: None,
    }
}

#[test]
fn create_then_get_reports_the_stored_product() {
    with_catalog(|catalog_path| {
        let result = product::run(ProductCommand::Create {
            id: "sku-1".to_string(),
            name: "Mug".to_string(),
            description: "Blue".to_string(),
            active: true,
            image_path: Some("/images/mug.png".to_string()),
        });
        assert_eq!(result.exit_code, 0, "expected successful create: {}", result.output);
        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "product.create");
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["data"]["imagePath"], "/images/mug.png");
        assert!(catalog_path.exists(), "catalog file should be written");

        let result = product::run(ProductCommand::Get { id: "sku-1".to_string() });
        assert_eq!(result.exit_code, 0);
        let payload = parse_payload(&result.output);
        assert_eq!(payload["data"]["productName"], "Mug");
        assert_eq!(payload["data"]["isActive"], true);
    });
}

#[test]
fn get_missing_product_is_not_found() {
    with_catalog(|_| {
        let result = product::run(ProductCommand::Get { id: "ghost".to_string() });
        assert_eq!(result.exit_code, 5);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "not_found");
    });
}

#[test]
fn list_pages_active_products_with_configured_page_size() {
    with_env(&[("CATALOG_PAGE_SIZE", "2")], |_| {
        for (id, active) in [("a", true), ("b", false), ("c", true), ("d", true)] {
            assert_eq!(product::run(create(id, active)).exit_code, 0);
        }

        let first = parse_payload(&product::run(ProductCommand::List { page: 1, all: false }).output);
        let ids: Vec<&str> = first["data"]
            .as_array()
            .expect("data should be an array")
            .iter()
            .filter_map(|product| product["productId"].as_str())
            .collect();
        assert_eq!(ids, vec!["a", "c"]);

        let second = parse_payload(&product::run(ProductCommand::List { page: 2, all: false }).output);
        assert_eq!(second["data"].as_array().map(Vec::len), Some(1));

        let past_end = parse_payload(&product::run(ProductCommand::List { page: 9, all: false }).output);
        assert_eq!(past_end["status"], "ok");
        assert_eq!(past_end["data"].as_array().map(Vec::len), Some(0));

        let all = parse_payload(&product::run(ProductCommand::List { page: -3, all: true }).output);
        assert_eq!(all["data"][1]["productId"], "b");
    });
}

#[test]
fn update_merges_and_delete_removes() {
    with_catalog(|_| {
        assert_eq!(product::run(create("sku-1", true)).exit_code, 0);

        let result = product::run(ProductCommand::Update {
            id: "sku-1".to_string(),
            new_id: None,
            name: Some("Renamed".to_string()),
            description: None,
            active: None,
            image_path: None,
        });
        assert_eq!(result.exit_code, 0, "update failed: {}", result.output);
        let payload = parse_payload(&result.output);
        assert_eq!(payload["data"]["productName"], "Renamed");
        assert_eq!(payload["data"]["isActive"], true);

        let result = product::run(ProductCommand::Delete { id: "sku-1".to_string() });
        assert_eq!(result.exit_code, 0);
        assert_eq!(parse_payload(&result.output)["data"]["productName"], "Renamed");

        let result = product::run(ProductCommand::Delete { id: "sku-1".to_string() });
        assert_eq!(result.exit_code, 5, "second delete should be not found");
    });
}

#[test]
fn empty_update_is_rejected_before_touching_storage() {
    with_catalog(|catalog_path| {
        let result = product::run(ProductCommand::Update {
            id: "sku-1".to_string(),
            new_id: None,
            name: None,
            description: None,
            active: None,
            image_path: None,
        });
        assert_eq!(result.exit_code, 4);
        assert_eq!(parse_payload(&result.output)["error_class"], "validation");
        assert!(!catalog_path.exists());
    });
}

#[test]
fn blank_id_is_rejected_by_validation() {
    with_catalog(|catalog_path| {
        let result = product::run(create("  ", true));
        assert_eq!(result.exit_code, 4);
        assert!(!catalog_path.exists());
    });
}

#[test]
fn reject_policy_reports_conflict() {
    with_env(&[("CATALOG_DUPLICATE_IDS", "reject")], |_| {
        assert_eq!(product::run(create("sku-1", true)).exit_code, 0);

        let result = product::run(create("sku-1", true));
        assert_eq!(result.exit_code, 6);
        assert_eq!(parse_payload(&result.output)["error_class"], "already_exists");
    });
}

#[test]
fn corrupt_catalog_is_reported_not_overwritten() {
    with_catalog(|catalog_path| {
        fs::create_dir_all(catalog_path.parent().expect("catalog has a parent"))
            .expect("create data dir");
        fs::write(catalog_path, b"{ definitely not an array").expect("seed corrupt file");

        let result = product::run(create("sku-1", true));
        assert_eq!(result.exit_code, 8);
        assert_eq!(parse_payload(&result.output)["error_class"], "corrupt_data");
        assert_eq!(
            fs::read(catalog_path).expect("read catalog"),
            b"{ definitely not an array".to_vec()
        );

        let report = doctor::run(true);
        let report: Value = serde_json::from_str(&report).expect("doctor output is json");
        assert_eq!(report["overall_status"], "fail");
        assert_eq!(report["checks"][1]["name"], "catalog_readable");
        assert_eq!(report["checks"][1]["status"], "fail");
    });
}

#[test]
fn invalid_config_fails_product_commands() {
    with_env(&[("CATALOG_PAGE_SIZE", "0")], |_| {
        let result = product::run(ProductCommand::List { page: 1, all: false });
        assert_eq!(result.exit_code, 2);
        assert_eq!(parse_payload(&result.output)["error_class"], "config_validation");

        let report: Value = serde_json::from_str(&doctor::run(true)).expect("doctor json");
        assert_eq!(report["checks"][0]["status"], "fail");
        assert_eq!(report["checks"][1]["status"], "skipped");
    });
}

#[test]
fn doctor_passes_on_fresh_catalog_location() {
    with_catalog(|_| {
        let report: Value = serde_json::from_str(&doctor::run(true)).expect("doctor json");
        assert_eq!(report["overall_status"], "pass", "report: {report}");

        let human = doctor::run(false);
        assert!(human.starts_with("doctor: all readiness checks passed"));
    });
}

#[test]
fn config_reports_env_sources() {
    with_env(&[("CATALOG_LOG_LEVEL", "debug")], |catalog_path| {
        let output = config::run();
        assert!(output.contains(&format!(
            "- storage.catalog_path = {} (source: env (CATALOG_STORAGE_PATH))",
            catalog_path.display()
        )));
        assert!(output.contains("- logging.level = debug (source: env (CATALOG_LOG_LEVEL))"));
        assert!(output.contains("- catalog.page_size = 10 (source: default)"));
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_catalog(test_fn: impl FnOnce(&Path)) {
    with_env(&[], test_fn);
}

/// Runs `test_fn` with a fresh catalog path in the environment plus `vars`,
/// restoring every catalog variable afterwards.
fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce(&Path)) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard = ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());

    let keys = [
        "CATALOG_STORAGE_PATH",
        "CATALOG_PAGE_SIZE",
        "CATALOG_DUPLICATE_IDS",
        "CATALOG_LOGGING_LEVEL",
        "CATALOG_LOGGING_FORMAT",
        "CATALOG_LOG_LEVEL",
        "CATALOG_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in keys {
        env::remove_var(key);
    }

    let dir = TempDir::new().expect("temp dir");
    let catalog_path = dir.path().join("data").join("products.json");
    env::set_var("CATALOG_STORAGE_PATH", &catalog_path);
    for (key, value) in vars {
        env::set_var(key, value);
    }

    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| test_fn(&catalog_path)));

    for (key, value) in previous_values {
        match value {
            Some(value) => env::set_var(key, value),
            None => env::remove_var(key),
        }
    }

    if let Err(panic) = outcome {
        std::panic::resume_unwind(panic);
    }
}
