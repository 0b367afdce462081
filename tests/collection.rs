use courier::env::store::EnvironmentStore;
use courier::http::build;
use courier::state::collection::Scope;
use courier::state::tree::CollectionTree;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

const DOC: &str = r#"{
  "info": {
    "_postman_id": "1b2c",
    "name": "Shop API",
    "schema": "https://schema.getpostman.com/json/collection/v2.1.0/collection.json"
  },
  "item": [
    {
      "name": "Health",
      "request": { "method": "GET", "url": { "raw": "{{base}}/health", "host": ["{{base}}"], "path": ["health"] } }
    },
    {
      "name": "Orders",
      "description": "order endpoints",
      "item": [
        {
          "name": "List orders",
          "request": {
            "method": "GET",
            "header": [{ "key": "Accept", "value": "application/json" }],
            "url": "{{base}}/orders",
            "auth": { "type": "bearer", "bearer": [{ "key": "token", "value": "{{token}}", "type": "string" }] }
          },
          "event": [{ "listen": "test", "script": { "type": "text/javascript", "exec": ["pm.test('ok', () => {", "  pm.response.to.have.status(200);", "});"] } }]
        },
        {
          "name": "Create order",
          "request": {
            "method": "POST",
            "header": [{ "key": "Content-Type", "value": "application/json" }],
            "body": { "mode": "raw", "raw": "{\n  \"sku\": \"{{sku}}\"\n}", "options": { "raw": { "language": "json" } } },
            "url": "{{base}}/orders"
          }
        }
      ]
    },
    {
      "name": "Users",
      "item": []
    }
  ],
  "variable": [{ "key": "base", "value": "https://shop.test" }]
}"#;

const ENV: &str = r#"{
  "id": "env-1",
  "name": "staging",
  "values": [
    { "key": "base", "value": "https://staging.shop.test", "enabled": true },
    { "key": "token", "value": "abc", "enabled": true },
    { "key": "sku", "value": "X-1", "enabled": false }
  ],
  "_postman_variable_scope": "environment"
}"#;

#[test]
fn test_load_edit_export_round_trip() {
    let mut tree = CollectionTree::new();
    tree.load(DOC).unwrap();

    assert_eq!(tree.requests(Scope::TopLevel).len(), 1);
    let names: Vec<&str> = tree.folders().iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, ["Orders", "Users"]);

    let orders = tree.folders()[0].id;
    assert_eq!(tree.selection().scope, Scope::Folder(orders));

    let new_id = tree.add_request(Scope::Folder(orders)).unwrap();
    let mut draft = tree.begin_edit(new_id).unwrap();
    draft.name = "Cancel order".into();
    tree.commit_edit(draft).unwrap();

    let exported = tree.export().unwrap();
    assert_eq!(exported["info"]["_postman_id"], "1b2c");
    assert_eq!(exported["variable"][0]["key"], "base");

    let items = exported["item"].as_array().unwrap();
    let item_names: Vec<&str> = items.iter().map(|i| i["name"].as_str().unwrap()).collect();
    assert_eq!(item_names, ["Health", "Orders", "Users"]);

    let folder = &items[1];
    assert_eq!(folder["description"], "order endpoints");
    let in_folder: Vec<&str> = folder["item"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["name"].as_str().unwrap())
        .collect();
    assert_eq!(in_folder, ["List orders", "Create order", "Cancel order"]);

    let list = &folder["item"][0];
    assert_eq!(list["event"][0]["script"]["exec"].as_array().unwrap().len(), 3);
    assert_eq!(list["request"]["auth"]["type"], "bearer");
    assert_eq!(
        folder["item"][1]["request"]["body"]["options"],
        json!({"raw": {"language": "json"}})
    );

    // Loading what we exported gives the same document back, ids aside.
    let mut reloaded = CollectionTree::new();
    reloaded.load_value(exported.clone()).unwrap();
    assert_eq!(reloaded.export().unwrap(), exported);
}

#[test]
fn test_requests_resolve_against_uploaded_environment() {
    let mut tree = CollectionTree::new();
    tree.load(DOC).unwrap();
    let mut envs = EnvironmentStore::new();
    envs.upload(ENV).unwrap();

    let orders = tree.folders()[0].id;
    let list = &tree.requests(Scope::Folder(orders))[0];
    let built = build(list, envs.active());
    assert_eq!(built.url, "https://staging.shop.test/orders");
    assert_eq!(built.header("Authorization"), Some("Bearer abc"));
    assert_eq!(built.header("Accept"), Some("application/json"));

    // `sku` is disabled, so the placeholder survives canonicalisation verbatim.
    let create = &tree.requests(Scope::Folder(orders))[1];
    let built = build(create, envs.active());
    assert_eq!(built.body.as_deref(), Some(r#"{"sku":"{{sku}}"}"#));

    let health = &tree.requests(Scope::TopLevel)[0];
    assert_eq!(build(health, envs.active()).url, "https://staging.shop.test/health");
}

#[test]
fn test_environment_export_keeps_unknown_fields() {
    let mut envs = EnvironmentStore::new();
    let idx = envs.upload(ENV).unwrap();
    let exported: Value = serde_json::from_str(&envs.export(idx).unwrap()).unwrap();
    assert_eq!(exported["id"], "env-1");
    assert_eq!(exported["_postman_variable_scope"], "environment");
    assert_eq!(exported["values"][2]["enabled"], false);
}
