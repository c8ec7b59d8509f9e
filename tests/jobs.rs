//! Local input is validated before any request is made

mod common;

use common::*;
use dc_replicator::{jobs, ConfigError, RemoteErrorKind};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use wiremock::matchers::any;
use wiremock::{Mock, MockServer, ResponseTemplate};

const ROSTER: &str = "\
<instances>
  <instance><subdomain>acme</subdomain><email>a@acme.com</email><token>t1</token></instance>
  <instance><subdomain>globex</subdomain><email>a@globex.com</email><token>t2</token></instance>
</instances>
";

const FIELDS: &str = "\
subdomain,field_id,field_title,field_type
acme,360001,Region,dropdown
globex,360101,Region,dropdown
";

const OPTIONS: &str = "subdomain,field_name,field_id,option_id,option_value\n";

/// Mock server that fails the test if it receives anything
async fn silent_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;
    server
}

fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

fn missing(dir: &TempDir) -> PathBuf {
    dir.path().join("absent.csv")
}

#[tokio::test]
async fn test_malformed_extract_stops_replication() {
    let server = silent_server().await;
    let dir = tempfile::tempdir().unwrap();
    let roster = write(&dir, "instances.xml", ROSTER);
    let fields = write(&dir, "fields.csv", "subdomain,title\nacme,Region\n");
    let options = write(&dir, "options.csv", OPTIONS);

    let err = jobs::replicate(&config_for(&server), &roster, &fields, &options, false)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ConfigError::MalformedExtract { column: "field_title", .. }
    ));
}

#[tokio::test]
async fn test_missing_option_extract_stops_replication() {
    let server = silent_server().await;
    let dir = tempfile::tempdir().unwrap();
    let roster = write(&dir, "instances.xml", ROSTER);
    let fields = write(&dir, "fields.csv", FIELDS);

    let err = jobs::replicate(&config_for(&server), &roster, &fields, &missing(&dir), false)
        .await
        .unwrap_err();

    assert!(matches!(err, ConfigError::Io { .. }));
}

#[tokio::test]
async fn test_malformed_roster_stops_every_command() {
    let server = silent_server().await;
    let dir = tempfile::tempdir().unwrap();
    let roster = write(
        &dir,
        "instances.xml",
        "<instances>\
           <instance><subdomain>acme</subdomain><email>a@acme.com</email><token>t</token></instance>\
           <instance><subdomain>evil.example/x?</subdomain><email>e</email><token>t</token></instance>\
         </instances>",
    );
    let fields = write(&dir, "fields.csv", FIELDS);
    let options = write(&dir, "options.csv", OPTIONS);
    let config = config_for(&server);

    let is_roster_error =
        |e: &ConfigError| matches!(e, ConfigError::MalformedRoster { entry: 2, field: "subdomain" });

    let err = jobs::replicate(&config, &roster, &fields, &options, false)
        .await
        .unwrap_err();
    assert!(is_roster_error(&err));

    let err = jobs::sweep(&config, &roster, false).await.unwrap_err();
    assert!(is_roster_error(&err));

    let out = dir.path().join("out");
    let err = jobs::export(&config, &roster, &out.join("f.csv"), &out.join("o.csv"))
        .await
        .unwrap_err();
    assert!(is_roster_error(&err));
}

#[tokio::test]
async fn test_dry_run_makes_no_requests() {
    let server = silent_server().await;
    let dir = tempfile::tempdir().unwrap();
    let roster = write(&dir, "instances.xml", ROSTER);
    let fields = write(&dir, "fields.csv", FIELDS);
    let options = write(&dir, "options.csv", OPTIONS);

    let run = jobs::replicate(&config_for(&server), &roster, &fields, &options, true)
        .await
        .unwrap();

    assert!(run.summary.dry_run);
    assert!(run.skipped_rows.is_empty());
    // Both extract rows derive `TF::Title-Region`; the second is a duplicate on each tenant
    for tenant in ["acme", "globex"] {
        let outcome = run.summary.tenant(tenant).unwrap();
        assert_eq!(outcome.items.attempted, 2);
        assert_eq!(outcome.items.succeeded, 1);
        assert_eq!(outcome.items.failed_of(RemoteErrorKind::BadRequest), 1);
    }
}

#[test]
fn test_load_items_reports_skipped_rows() {
    let dir = tempfile::tempdir().unwrap();
    let fields = write(&dir, "fields.csv", "field_title\nRegion\n\"\"\n");
    let options = write(&dir, "options.csv", "field_name,option_value\nRegion,EMEA\n");

    let (items, skipped) = jobs::load_items(&fields, &options).unwrap();
    let keys: Vec<_> = items.iter().map(|i| i.key.as_str()).collect();
    assert_eq!(keys, vec!["TF::Title-Region", "TF::Title-Region::EMEA"]);
    assert_eq!(skipped.len(), 1);
    assert_eq!(skipped[0].line, 3);
}
