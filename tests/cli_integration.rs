//! CLI integration tests for stockroom
//!
//! These tests drive the binary through whole workflows: workspace setup,
//! inventory configuration, item creation and the version checks on every
//! mutation.

use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

/// Get a command for the stockroom binary, acting as `user` inside `dir`
fn stockroom(dir: &TempDir, user: &str) -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::new(assert_cmd::cargo::cargo_bin!("stockroom"));
    cmd.current_dir(dir.path())
        .env("STOCKROOM_USER", user)
        .env("HOME", dir.path())
        .env("XDG_CONFIG_HOME", dir.path().join(".config"))
        .env_remove("RUST_LOG");
    cmd
}

/// Create a temporary directory and initialize a workspace in it
fn setup_workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    stockroom(&dir, "alice").arg("init").assert().success();
    dir
}

/// Run a command with `--format json` and parse its stdout
fn json(dir: &TempDir, user: &str, args: &[&str]) -> Value {
    let output = stockroom(dir, user)
        .args(["--format", "json"])
        .args(args)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "command {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_str(&String::from_utf8_lossy(&output.stdout)).unwrap()
}

fn create_tools(dir: &TempDir) -> String {
    let inventory = json(
        dir,
        "alice",
        &[
            "inventory", "create", "Tools",
            "--id", "fixed:T-",
            "--id", "sequence:4",
            "--field", "number:Weight",
            "--field", "text:Brand",
            "--field", "boolean:In stock",
        ],
    );
    inventory["id"].as_str().unwrap().to_string()
}

// =============================================================================
// Initialization Tests
// =============================================================================

#[test]
fn test_init_creates_structure() {
    let dir = TempDir::new().unwrap();

    stockroom(&dir, "alice")
        .arg("init")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized stockroom workspace"));

    assert!(dir.path().join(".stockroom").is_dir());
    assert!(dir.path().join(".stockroom/config.toml").is_file());
    assert!(dir.path().join(".stockroom/.gitignore").is_file());
    assert!(dir.path().join(".stockroom/catalog.db").is_file());
}

#[test]
fn test_init_is_idempotent() {
    let dir = TempDir::new().unwrap();

    stockroom(&dir, "alice").arg("init").assert().success();
    stockroom(&dir, "alice").arg("init").assert().success();
}

#[test]
fn test_commands_outside_workspace_fail() {
    let dir = TempDir::new().unwrap();

    stockroom(&dir, "alice")
        .args(["inventory", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not in a stockroom workspace"));
}

// =============================================================================
// Inventory Tests
// =============================================================================

#[test]
fn test_inventory_create_and_show() {
    let dir = setup_workspace();
    let id = create_tools(&dir);

    let shown = json(&dir, "alice", &["inventory", "show", &id]);
    assert_eq!(shown["title"], "Tools");
    assert_eq!(shown["version"], 0);
    assert_eq!(shown["createdBy"], "alice");
    assert_eq!(shown["fields"].as_array().unwrap().len(), 3);
    assert_eq!(shown["customIdFormat"][1]["type"], "sequence");

    stockroom(&dir, "alice")
        .args(["inventory", "show", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("ID format: fixed:T- sequence:4"));
}

#[test]
fn test_inventory_list() {
    let dir = setup_workspace();
    create_tools(&dir);

    stockroom(&dir, "alice")
        .args(["inventory", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Tools"));

    let list = json(&dir, "alice", &["inventory", "list"]);
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[test]
fn test_invalid_element_is_rejected() {
    let dir = setup_workspace();

    stockroom(&dir, "alice")
        .args(["inventory", "create", "Bad", "--id", "random99"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown element type"));

    stockroom(&dir, "alice")
        .args(["inventory", "create", "Bad", "--id", "sequence:wide"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Validation failed"));
}

#[test]
fn test_update_requires_current_version() {
    let dir = setup_workspace();
    let id = create_tools(&dir);

    let updated = json(
        &dir,
        "alice",
        &["inventory", "update", &id, "--version", "0", "--title", "Workshop"],
    );
    assert_eq!(updated["version"], 1);
    assert_eq!(updated["title"], "Workshop");

    // Same stale version again
    stockroom(&dir, "alice")
        .args(["inventory", "update", &id, "--version", "0", "--title", "Garage"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Version conflict"))
        .stderr(predicate::str::contains("current is 1"));

    let shown = json(&dir, "alice", &["inventory", "show", &id]);
    assert_eq!(shown["title"], "Workshop");
    assert_eq!(shown["version"], 1);
}

#[test]
fn test_other_users_cannot_modify_private_inventory() {
    let dir = setup_workspace();
    let id = create_tools(&dir);

    // Denied even with the right version
    stockroom(&dir, "bob")
        .args(["inventory", "update", &id, "--version", "0", "--title", "Mine"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not allowed"));

    stockroom(&dir, "bob")
        .args(["item", "add", &id, "Hammer"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not allowed"));
}

#[test]
fn test_sharing_grants_write_access() {
    let dir = setup_workspace();
    let id = create_tools(&dir);

    let shared = json(&dir, "alice", &["inventory", "share", &id, "bob", "--version", "0"]);
    assert_eq!(shared["allowedUsers"][0], "bob");

    stockroom(&dir, "bob")
        .args(["item", "add", &id, "Saw"])
        .assert()
        .success()
        .stdout(predicate::str::contains("T-0001"));

    // Listed users may write but not share
    stockroom(&dir, "bob")
        .args(["inventory", "share", &id, "carol", "--version", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not allowed"));

    // Admins may
    stockroom(&dir, "root")
        .args(["--admin", "inventory", "unshare", &id, "bob", "--version", "1"])
        .assert()
        .success();
}

#[test]
fn test_add_field_and_preview() {
    let dir = setup_workspace();
    let id = create_tools(&dir);

    let updated = json(
        &dir,
        "alice",
        &["inventory", "add-field", &id, "textarea:Notes", "--version", "0"],
    );
    assert_eq!(updated["fields"].as_array().unwrap().len(), 4);

    stockroom(&dir, "alice")
        .args(["inventory", "preview-id", &id])
        .assert()
        .success()
        .stdout(predicate::str::diff("T-0001\n"));
}

#[test]
fn test_delete_inventory_requires_owner() {
    let dir = setup_workspace();
    let id = create_tools(&dir);

    stockroom(&dir, "alice")
        .args(["inventory", "delete", &id, "--version", "5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Version conflict"));

    stockroom(&dir, "alice")
        .args(["inventory", "delete", &id, "--version", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted inventory"));

    stockroom(&dir, "alice")
        .args(["inventory", "show", &id])
        .assert()
        .failure()
        .stderr(predicate::str::contains("inventory not found"));
}

// =============================================================================
// Item Tests
// =============================================================================

#[test]
fn test_item_custom_ids_follow_sequence() {
    let dir = setup_workspace();
    let id = create_tools(&dir);

    for n in 1..=3 {
        let item = json(&dir, "alice", &["item", "add", &id, &format!("Tool {n}")]);
        assert_eq!(item["customId"], format!("T-{:04}", n));
        assert_eq!(item["version"], 0);
    }

    let items = json(&dir, "alice", &["item", "list", &id]);
    assert_eq!(items.as_array().unwrap().len(), 3);

    let found = json(&dir, "alice", &["item", "show", "T-0002", "--inventory", &id]);
    assert_eq!(found["title"], "Tool 2");
}

#[test]
fn test_fixed_format_rejects_second_item() {
    let dir = setup_workspace();
    let inventory = json(
        &dir,
        "alice",
        &["inventory", "create", "Singleton", "--id", "fixed:ONLY"],
    );
    let id = inventory["id"].as_str().unwrap();

    stockroom(&dir, "alice")
        .args(["item", "add", id, "First"])
        .assert()
        .success();

    stockroom(&dir, "alice")
        .args(["item", "add", id, "Second"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("'ONLY' already exists"));
}

#[test]
fn test_default_format_for_inventory_without_elements() {
    let dir = setup_workspace();
    let inventory = json(&dir, "alice", &["inventory", "create", "Plain"]);
    let id = inventory["id"].as_str().unwrap();

    let item = json(&dir, "alice", &["item", "add", id, "Thing"]);
    let custom_id = item["customId"].as_str().unwrap();
    assert!(custom_id.starts_with("ITEM-"));
    assert_eq!(custom_id.len(), 13);
}

#[test]
fn test_item_update_and_delete() {
    let dir = setup_workspace();
    let id = create_tools(&dir);
    let item = json(
        &dir,
        "alice",
        &["item", "add", &id, "Hammer", "--set", "Weight=1.5", "--set", "Brand=Acme"],
    );
    let item_id = item["id"].as_str().unwrap();

    let updated = json(
        &dir,
        "alice",
        &["item", "update", item_id, "--version", "0", "--set", "Weight=2", "--unset", "Brand"],
    );
    assert_eq!(updated["version"], 1);
    assert_eq!(updated["fields"].as_object().unwrap().len(), 1);

    stockroom(&dir, "alice")
        .args(["item", "delete", item_id, "--version", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Version conflict"));

    stockroom(&dir, "alice")
        .args(["item", "delete", item_id, "--version", "1"])
        .assert()
        .success();
}

#[test]
fn test_unknown_field_is_rejected() {
    let dir = setup_workspace();
    let id = create_tools(&dir);

    stockroom(&dir, "alice")
        .args(["item", "add", &id, "Hammer", "--set", "Color=red"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown field 'Color'"));
}

// =============================================================================
// Statistics Tests
// =============================================================================

#[test]
fn test_stats_report() {
    let dir = setup_workspace();
    let id = create_tools(&dir);

    for (weight, brand, stock) in [("10", "Acme", "true"), ("20", "Acme", "false"), ("abc", "Bolt", "true")] {
        stockroom(&dir, "alice")
            .args([
                "item", "add", &id, "Box",
                "--set", &format!("Weight={weight}"),
                "--set", &format!("Brand={brand}"),
                "--set", &format!("In stock={stock}"),
            ])
            .assert()
            .success();
    }

    let stats = json(&dir, "alice", &["stats", &id]);
    assert_eq!(stats["totalItems"], 3);

    let number = stats["fieldStats"]["number"].as_object().unwrap();
    let weight = number.values().next().unwrap();
    assert_eq!(weight["field"], "Weight");
    assert_eq!(weight["count"], 2);
    assert_eq!(weight["average"], 15.0);

    let text = stats["fieldStats"]["text"].as_object().unwrap();
    let brand = text.values().next().unwrap();
    assert_eq!(brand["topValues"][0]["value"], "Acme");
    assert_eq!(brand["topValues"][0]["count"], 2);
    assert_eq!(brand["uniqueCount"], 2);

    let boolean = stats["fieldStats"]["boolean"].as_object().unwrap();
    let stock = boolean.values().next().unwrap();
    assert_eq!(stock["trueCount"], 2);
    assert_eq!(stock["truePercentage"], 66.7);

    stockroom(&dir, "bob")
        .args(["stats", &id])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not allowed"));
}

#[test]
fn test_stats_text_output() {
    let dir = setup_workspace();
    let id = create_tools(&dir);

    stockroom(&dir, "alice")
        .args(["stats", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("Items: 0"));
}

#[test]
fn test_stats_overview_of_owned_inventories() {
    let dir = setup_workspace();
    let id = create_tools(&dir);
    json(&dir, "alice", &["item", "add", &id, "Box"]);
    json(&dir, "alice", &["item", "add", &id, "Crate"]);
    json(&dir, "bob", &["inventory", "create", "Bob's"]);

    let overview = json(&dir, "alice", &["stats"]);
    assert_eq!(overview["totalItems"], 2);
    assert_eq!(overview["inventories"].as_array().unwrap().len(), 1);
    assert_eq!(overview["inventories"][0]["inventoryId"], id.as_str());
    assert_eq!(overview["inventories"][0]["title"], "Tools");

    stockroom(&dir, "carol")
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("You do not own any inventories"));
}

// =============================================================================
// Listing and Search Tests
// =============================================================================

#[test]
fn test_inventory_list_mine_and_shared() {
    let dir = setup_workspace();
    let tools = create_tools(&dir);
    let shelf = json(&dir, "bob", &["inventory", "create", "Shelf"]);
    let shelf = shelf["id"].as_str().unwrap().to_string();
    json(&dir, "bob", &["inventory", "create", "Drawer"]);
    json(&dir, "bob", &["inventory", "share", &shelf, "alice", "--version", "0"]);

    let mine = json(&dir, "alice", &["inventory", "list", "--mine"]);
    let mine: Vec<_> = mine.as_array().unwrap().iter().map(|i| i["id"].clone()).collect();
    assert_eq!(mine, vec![Value::from(tools.as_str())]);

    let shared = json(&dir, "alice", &["inventory", "list", "--shared"]);
    let shared: Vec<_> = shared.as_array().unwrap().iter().map(|i| i["id"].clone()).collect();
    assert_eq!(shared, vec![Value::from(shelf.as_str())]);

    assert_eq!(json(&dir, "bob", &["inventory", "list"]).as_array().unwrap().len(), 3);
}

#[test]
fn test_search_titles_and_custom_ids() {
    let dir = setup_workspace();
    let id = create_tools(&dir);
    json(&dir, "alice", &["item", "add", &id, "Claw hammer"]);
    json(&dir, "alice", &["item", "add", &id, "Saw"]);

    let results = json(&dir, "alice", &["search", "HAMMER"]);
    assert!(results["inventories"].as_array().unwrap().is_empty());
    assert_eq!(results["items"][0]["title"], "Claw hammer");

    let results = json(&dir, "alice", &["search", "t-0002", "--inventory", &id]);
    assert_eq!(results["items"].as_array().unwrap().len(), 1);
    assert_eq!(results["items"][0]["title"], "Saw");

    let results = json(&dir, "alice", &["search", "tool"]);
    assert_eq!(results["inventories"][0]["id"], id.as_str());

    stockroom(&dir, "alice")
        .args(["search", "wrench"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing matches 'wrench'"));
}

#[test]
fn test_item_quantity_defaults_to_zero() {
    let dir = setup_workspace();
    let id = create_tools(&dir);

    let item = json(&dir, "alice", &["item", "add", &id, "Box"]);
    assert_eq!(item["quantity"], 0);

    let item = json(&dir, "alice", &["item", "add", &id, "Crate", "-q", "4"]);
    assert_eq!(item["quantity"], 4);
}
