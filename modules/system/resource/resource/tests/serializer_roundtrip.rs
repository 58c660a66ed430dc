#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{DOC_CLASS, World};
use resource::{ReadOnlyWrites, ResourceConfig};
use resource_sdk::{AclRule, NewResource, Payload, Principal, ResourceError, ResourceStore};
use serde_json::{Value, json};

fn payload(value: Value) -> Payload {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {other}"),
    }
}

#[test]
fn resource_reference_round_trips() {
    let w = World::new();
    let root = w.root();
    w.set_acl(&root, vec![AclRule::allow(Principal::User(w.admin))]);
    let template = w.document(&root, "template");
    let doc = w.document(&root, "report");

    let body = payload(json!({
        "document": { "body": "Quarterly numbers", "template": { "id": template.id } }
    }));
    let mut composite = w.service.serializer(doc.clone(), w.admin, Some(body));
    let updated = composite.deserialize().unwrap().clone();
    assert_eq!(updated.reference("template"), Some(template.id));

    let out = w
        .service
        .serializer(updated.clone(), w.admin, None)
        .serialize()
        .unwrap();
    assert_eq!(
        out["document"],
        json!({
            "body": "Quarterly numbers",
            "template": { "id": template.id, "parent": { "id": root.id } },
        })
    );

    // Writing the serialized payload back changes nothing.
    let mut composite = w.service.serializer(updated.clone(), w.admin, Some(out));
    assert_eq!(composite.deserialize().unwrap(), &updated);
    assert_eq!(w.store.lookup(doc.id).unwrap(), Some(updated));
}

#[test]
fn editors_may_edit_but_not_move() {
    let w = World::new();
    let root = w.root();
    let archive = w.group(&root, "archive");
    let doc = w.document(&root, "report");
    w.set_acl(&root, vec![AclRule::allow(Principal::Group(w.editors)).for_identity(DOC_CLASS)]);

    let body = payload(json!({
        "resource": { "display_name": "Report 2", "parent": { "id": archive.id } },
        "document": { "body": "Draft" },
    }));
    let err = w
        .service
        .serializer(doc.clone(), w.alice, Some(body))
        .deserialize()
        .unwrap_err();

    assert!(matches!(err, ResourceError::Forbidden { .. }));
    assert_eq!(w.store.lookup(doc.id).unwrap(), Some(doc.clone()));

    let body = payload(json!({
        "resource": { "display_name": "Report 2" },
        "document": { "body": "Draft" },
    }));
    let mut composite = w.service.serializer(doc, w.alice, Some(body));
    let updated = composite.deserialize().unwrap();
    assert_eq!(updated.display_name, "Report 2");
    assert_eq!(updated.attributes["body"], json!("Draft"));
}

#[test]
fn strict_mode_rejects_read_only_keys() {
    let w = World::with_config(ResourceConfig {
        read_only_writes: ReadOnlyWrites::Reject,
        ..ResourceConfig::default()
    });
    let root = w.root();
    w.set_acl(&root, vec![AclRule::allow(Principal::User(w.admin))]);
    let doc = w.document(&root, "report");

    let out = w
        .service
        .serializer(doc.clone(), w.admin, None)
        .serialize()
        .unwrap();
    let err = w
        .service
        .serializer(doc, w.admin, Some(out))
        .deserialize()
        .unwrap_err();
    assert_eq!(err, ResourceError::forbidden_attribute("id"));
}

#[test]
fn keyname_conflict_surfaces_from_store() {
    let w = World::new();
    let root = w.root();
    w.set_acl(&root, vec![AclRule::allow(Principal::User(w.admin))]);
    w.service
        .create_child(
            root.id,
            NewResource::new(DOC_CLASS, w.admin, "first").keyname("main"),
            w.admin,
        )
        .unwrap();
    let second = w.document(&root, "second");

    let body = payload(json!({ "resource": { "keyname": "main" } }));
    let err = w
        .service
        .serializer(second, w.admin, Some(body))
        .deserialize()
        .unwrap_err();
    assert!(matches!(err, ResourceError::Conflict(_)));
}
