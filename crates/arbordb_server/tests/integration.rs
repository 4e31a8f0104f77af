//! Integration tests for the full ingestion pipeline.

use arbordb_server::{CreateRequest, Server, ServerConfig, ServerError, Upload};
use arbordb_store::serialize::{SerializerOptions, XmlSerializer};
use arbordb_xml::{XmlToken, XmlTokenReader};
use std::sync::Arc;
use tempfile::tempdir;

#[tokio::test]
async fn ensure_database_is_idempotent() {
    let dir = tempdir().unwrap();
    let server = Server::new(ServerConfig::new(dir.path()));

    server
        .create(CreateRequest::database_only("shop"))
        .await
        .unwrap();
    server
        .create(CreateRequest::database_only("shop"))
        .await
        .unwrap();

    let path = server.manager().database_path("shop").unwrap();
    assert!(server.manager().exists(&path));
    assert_eq!(server.manager().open_count(), 1);

    let db = server.manager().open(&path).unwrap();
    assert!(db.list_resources().unwrap().is_empty());
}

#[tokio::test]
async fn response_preserves_document_shape() {
    let dir = tempdir().unwrap();
    let server = Server::new(ServerConfig::new(dir.path()));

    let body = r#"<fruit healthy="true"><name>apple</name><name>pear</name></fruit>"#;
    let response = server
        .create(CreateRequest::single("shop", "fruit", body))
        .await
        .unwrap();
    let text = response.body_text().unwrap().to_string();

    assert!(text.starts_with(r#"<rest:sequence xmlns:rest="https://arbordb.org/rest">"#));
    assert!(text.contains("<rest:item>"));
    assert!(text.contains("rest:id="));
    assert!(text.contains(r#"healthy="true""#));

    // Re-reading the response yields the original names, text, and order.
    let tokens: Vec<XmlToken> = XmlTokenReader::new(&text)
        .collect::<Result<_, _>>()
        .unwrap();
    let names: Vec<&str> = tokens
        .iter()
        .filter_map(|token| match token {
            XmlToken::StartElement { name, .. } => Some(name.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(names, ["rest:sequence", "rest:item", "fruit", "name", "name"]);

    let texts: Vec<&str> = tokens
        .iter()
        .filter_map(|token| match token {
            XmlToken::Text(text) => Some(text.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(texts, ["apple", "pear"]);
}

#[tokio::test]
async fn recreating_a_resource_replaces_content_and_identity() {
    let dir = tempdir().unwrap();
    let server = Server::new(ServerConfig::new(dir.path()));

    server
        .create(CreateRequest::single("shop", "inventory", "<old-stock/>"))
        .await
        .unwrap();
    let path = server.manager().database_path("shop").unwrap();
    let db = server.manager().open(&path).unwrap();
    let original_id = db.resource_session("inventory").unwrap().resource_id();

    let response = server
        .create(CreateRequest::single(
            "shop",
            "inventory",
            r#"<new-stock count="3"/>"#,
        ))
        .await
        .unwrap();
    let text = response.body_text().unwrap();
    assert!(text.contains("new-stock"));
    assert!(!text.contains("old-stock"));

    // The replacement is a new resource, not an edit of the old one.
    let replacement_id = db.resource_session("inventory").unwrap().resource_id();
    assert_ne!(original_id, replacement_id);
}

#[tokio::test]
async fn later_documents_become_the_first_child() {
    let dir = tempdir().unwrap();
    let server = Server::new(ServerConfig::new(dir.path()));

    server
        .create(CreateRequest::single("shop", "log", "<first-entry/>"))
        .await
        .unwrap();

    // Append a second document through the session, skipping the
    // create-or-replace step so both documents share the resource.
    let path = server.manager().database_path("shop").unwrap();
    let db = server.manager().open(&path).unwrap();
    let session = db.resource_session("log").unwrap();
    let mut txn = session.begin_write();
    txn.insert_subtree_as_first_child(XmlTokenReader::new("<second-entry/>"))
        .unwrap();
    txn.commit().unwrap();

    let out = XmlSerializer::new(SerializerOptions::default()).serialize(&session.read_tree());
    assert_eq!(out, "<second-entry/><first-entry/>");
}

#[tokio::test]
async fn batch_stores_one_resource_per_upload() {
    let dir = tempdir().unwrap();
    let server = Server::new(ServerConfig::new(dir.path()));

    let request = CreateRequest::batch(
        "library",
        vec![
            Upload::new("novels", r#"<shelf genre="novels"/>"#),
            Upload::new("poetry", r#"<shelf genre="poetry"/>"#),
            Upload::new("essays", r#"<shelf genre="essays"/>"#),
        ],
    );
    let response = server.create_multiple(request).await.unwrap();
    assert_eq!(response.body, None);

    let path = server.manager().database_path("library").unwrap();
    let db = server.manager().open(&path).unwrap();
    assert_eq!(db.list_resources().unwrap(), ["essays", "novels", "poetry"]);

    let session = db.resource_session("poetry").unwrap();
    let out = XmlSerializer::new(SerializerOptions::default()).serialize(&session.read_tree());
    assert_eq!(out, r#"<shelf genre="poetry"/>"#);
}

#[tokio::test]
async fn empty_batch_only_ensures_the_database() {
    let dir = tempdir().unwrap();
    let server = Server::new(ServerConfig::new(dir.path()));

    let response = server
        .create_multiple(CreateRequest::batch("library", Vec::new()))
        .await
        .unwrap();
    assert_eq!(response.body, None);

    let path = server.manager().database_path("library").unwrap();
    assert!(server.manager().exists(&path));
    let db = server.manager().open(&path).unwrap();
    assert!(db.list_resources().unwrap().is_empty());
}

#[tokio::test]
async fn invalid_upload_name_fails_before_any_storage_work() {
    let dir = tempdir().unwrap();
    let server = Server::new(ServerConfig::new(dir.path()));

    let request = CreateRequest::batch(
        "library",
        vec![
            Upload::new("fine", "<a/>"),
            Upload::new("../escape", "<b/>"),
        ],
    );
    let result = server.create_multiple(request).await;
    assert!(matches!(result, Err(ServerError::Validation(_))));

    // Nothing was created, not even the database.
    assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
}

#[tokio::test]
async fn malformed_document_leaves_an_empty_resource() {
    let dir = tempdir().unwrap();
    let server = Server::new(ServerConfig::new(dir.path()));

    let result = server
        .create(CreateRequest::single("shop", "broken", "<open><unclosed>"))
        .await;
    match result {
        Err(err @ ServerError::Ingest(_)) => assert!(err.is_client_error()),
        other => panic!("expected ingest error, got {other:?}"),
    }

    // Provisioning succeeded; the failed write rolled back to the empty tree.
    let path = server.manager().database_path("shop").unwrap();
    let db = server.manager().open(&path).unwrap();
    assert!(db.resource_exists("broken"));
    let session = db.resource_session("broken").unwrap();
    let tree = session.read_tree();
    assert!(tree.node(tree.root()).unwrap().children.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_requests_to_one_database_all_land() {
    let dir = tempdir().unwrap();
    let server = Arc::new(Server::new(ServerConfig::new(dir.path())));

    let mut handles = Vec::new();
    for i in 0..4 {
        let server = Arc::clone(&server);
        handles.push(tokio::spawn(async move {
            let body = format!(r#"<doc n="{i}"/>"#);
            server
                .create(CreateRequest::single("shop", format!("res-{i}"), body))
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let path = server.manager().database_path("shop").unwrap();
    let db = server.manager().open(&path).unwrap();
    assert_eq!(
        db.list_resources().unwrap(),
        ["res-0", "res-1", "res-2", "res-3"]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_writes_to_one_resource_stay_consistent() {
    let dir = tempdir().unwrap();
    let server = Arc::new(Server::new(ServerConfig::new(dir.path())));

    let mut handles = Vec::new();
    for i in 0..4 {
        let server = Arc::clone(&server);
        handles.push(tokio::spawn(async move {
            server
                .create(CreateRequest::single(
                    "shop",
                    "hot",
                    format!(r#"<write n="{i}"/>"#),
                ))
                .await
        }));
    }

    // Losing requests may observe the replacement race as an error, but
    // nothing may panic and at least one write must land.
    let mut wins = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => wins += 1,
            Err(err) => assert!(!matches!(err, ServerError::TaskFailed(_))),
        }
    }
    assert!(wins >= 1);

    let path = server.manager().database_path("shop").unwrap();
    let db = server.manager().open(&path).unwrap();
    assert!(db.resource_exists("hot"));

    // The surviving tree decodes and holds at least the last write.
    // Interleaved replacements may leave more than one document, never
    // zero and never a torn tree.
    let session = db.resource_session("hot").unwrap();
    let tree = session.read_tree();
    let root_children = &tree.node(tree.root()).unwrap().children;
    assert!((1..=4).contains(&root_children.len()));
}

#[tokio::test]
async fn ingested_documents_survive_a_server_restart() {
    let dir = tempdir().unwrap();

    let first = Server::new(ServerConfig::new(dir.path()));
    first
        .create(CreateRequest::single(
            "archive",
            "records",
            "<record year=\"2024\">kept</record>",
        ))
        .await
        .unwrap();
    first.shutdown();
    drop(first);

    let second = Server::new(ServerConfig::new(dir.path()));
    let path = second.manager().database_path("archive").unwrap();
    let db = second.manager().open(&path).unwrap();
    let session = db.resource_session("records").unwrap();
    let out = XmlSerializer::new(SerializerOptions::default()).serialize(&session.read_tree());
    assert_eq!(out, "<record year=\"2024\">kept</record>");
}
