//! Integration tests for the client: lookups, history, logging and full-log
//! pagination, driven through a scripted transport that plays both remote
//! services.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use qrzlog::PAGE_SIZE;
use qrzlog::prelude::*;
use qrzlog::protocol::fields;
use qrzlog::session::{SessionError, SessionState};
use qrzlog::transport::HttpResponse;
use qrzlog::transport::mock::{RecordedRequest, ScriptedTransport};

const SESSION_URL: &str = "https://xmldata.qrz.com/xml/current";
const LOGBOOK_URL: &str = "https://logbook.qrz.com/api";

// =========================================================================
// Fake services
// =========================================================================

fn ok(url: &str, body: impl Into<String>) -> Result<HttpResponse, qrzlog::transport::TransportError> {
    Ok(HttpResponse::new(url, 200, body))
}

fn key_body(key: &str) -> String {
    format!("<QRZDatabase><Session><Key>{key}</Key></Session></QRZDatabase>")
}

fn callsign_body(key: &str, call: &str) -> String {
    format!(
        "<QRZDatabase><Callsign><call>{call}</call><fname>Test</fname>\
         <name>Operator</name><class>G</class><lotw>1</lotw></Callsign>\
         <Session><Key>{key}</Key></Session></QRZDatabase>"
    )
}

/// Encodes one logbook page the way the service does: a status prefix and
/// HTML-escaped ADIF records.
fn page_body(ids: impl IntoIterator<Item = u64>) -> String {
    let records: Vec<String> = ids
        .into_iter()
        .map(|id| {
            let id = id.to_string();
            let call = format!("K{id}");
            AdifCodec.encode_one(&[
                (fields::LOG_ID, id.as_str()),
                (fields::CALL, call.as_str()),
                (fields::BAND, "20M"),
                (fields::MODE, "FT8"),
            ])
        })
        .collect();
    let adif = records
        .join("\n")
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;");
    format!("RESULT=OK&COUNT={}&ADIF={adif}", records.len())
}

fn after_log_id(request: &RecordedRequest) -> u64 {
    request
        .param("OPTION")
        .and_then(|opt| opt.split("AFTERLOGID:").nth(1))
        .and_then(|id| id.parse().ok())
        .expect("fetch_all always sends AFTERLOGID")
}

/// A logbook holding ids `1..=total`. Each page after the first repeats the
/// previous page's last id, as the live service does.
fn overlapping_logbook(total: u64) -> impl Fn(&RecordedRequest) -> Result<HttpResponse, qrzlog::transport::TransportError> {
    move |request| {
        let after = after_log_id(request);
        let start = if after == 0 { 1 } else { after };
        let end = (start + PAGE_SIZE as u64 - 1).min(total);
        if start > total || (after != 0 && start == total) {
            return ok(LOGBOOK_URL, "RESULT=OK&COUNT=0");
        }
        ok(LOGBOOK_URL, page_body(start..=end))
    }
}

fn client(transport: &Arc<ScriptedTransport>) -> QrzClient<ScriptedTransport> {
    QrzClient::with_transport(
        Arc::clone(transport),
        Credentials::new("w1aw", "hunter2", "ABCD-1234"),
        &ClientConfig::default(),
    )
}

fn fetch_count(transport: &ScriptedTransport) -> usize {
    transport
        .requests()
        .iter()
        .filter(|r| r.param("ACTION") == Some("FETCH"))
        .count()
}

// =========================================================================
// Directory
// =========================================================================

#[tokio::test]
async fn test_lookup_renews_expired_session_once() {
    let establishes = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&establishes);
    let transport = Arc::new(ScriptedTransport::with_handler(move |request| {
        if request.param("username").is_some() {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            return ok(SESSION_URL, key_body(&format!("key{n}")));
        }
        match request.param("s") {
            // The first key has already expired on the server side.
            Some("key1") => ok(SESSION_URL, "<QRZDatabase><Session></Session></QRZDatabase>"),
            Some(key) => ok(SESSION_URL, callsign_body(key, "W1AW")),
            None => panic!("lookup without session key"),
        }
    }));
    let client = client(&transport);
    client.connect().await.unwrap();

    let record = client.directory().lookup("W1AW").await.unwrap();

    assert_eq!(record.callsign, "W1AW");
    assert_eq!(record.full_name(), "Test Operator");
    assert_eq!(record.license_class, "General");
    assert_eq!(record.lotw, QslPreference::Yes);
    assert_eq!(establishes.load(Ordering::SeqCst), 2);
    assert_eq!(transport.request_count(), 4);
    assert_eq!(client.session().renewals(), 1);
}

#[tokio::test]
async fn test_lookup_expired_twice_propagates() {
    let transport = Arc::new(ScriptedTransport::with_handler(|request| {
        if request.param("username").is_some() {
            return ok(SESSION_URL, key_body("k"));
        }
        ok(SESSION_URL, "<QRZDatabase><Session></Session></QRZDatabase>")
    }));
    let client = client(&transport);

    let err = client.directory().lookup("W1AW").await.unwrap_err();

    assert!(matches!(
        err,
        QrzlogError::Session(SessionError::ExpiredAfterRenewal)
    ));
    assert_eq!(transport.request_count(), 4);
}

#[tokio::test]
async fn test_connect_without_key_is_fatal_and_stops() {
    let transport = Arc::new(ScriptedTransport::from_bodies([
        "<QRZDatabase><Session><Error>Username/password incorrect</Error></Session></QRZDatabase>",
    ]));
    let client = client(&transport);

    let err = client.connect().await.unwrap_err();

    assert!(err.is_fatal());
    assert_eq!(transport.request_count(), 1);
    assert_eq!(client.session().state().await, SessionState::Unestablished);
}

// =========================================================================
// Logbook: pagination
// =========================================================================

#[tokio::test]
async fn test_fetch_all_overlapping_pages_yields_unique_records() {
    let transport = Arc::new(ScriptedTransport::with_handler(overlapping_logbook(499)));
    let client = client(&transport);

    let log = client.logbook().fetch_all().await.unwrap();

    assert_eq!(log.qsos.len(), 499);
    assert_eq!(log.duplicates_dropped, 1);
    assert!(!log.stalled);
    let ids: Vec<u64> = log.qsos.iter().filter_map(|q| q.log_id()).map(|id| id.0).collect();
    assert_eq!(ids, (1..=499).collect::<Vec<_>>());

    let options: Vec<String> = transport
        .requests()
        .iter()
        .filter_map(|r| r.param("OPTION").map(str::to_string))
        .collect();
    assert_eq!(
        options,
        [
            "MAX:250,AFTERLOGID:0",
            "MAX:250,AFTERLOGID:250",
            "MAX:250,AFTERLOGID:499",
        ]
    );
    assert_eq!(log.pages, 3);
}

#[tokio::test]
async fn test_fetch_all_short_first_page_fetches_once() {
    let transport = Arc::new(ScriptedTransport::with_handler(overlapping_logbook(17)));
    let client = client(&transport);

    let log = client.logbook().fetch_all().await.unwrap();

    assert_eq!(log.qsos.len(), 17);
    assert_eq!(log.pages, 1);
    assert_eq!(fetch_count(&transport), 1);
}

#[tokio::test]
async fn test_fetch_all_empty_logbook() {
    let transport = Arc::new(ScriptedTransport::from_bodies(["RESULT=OK&COUNT=0"]));
    let log = client(&transport).logbook().fetch_all().await.unwrap();
    assert!(log.qsos.is_empty());
    assert_eq!(log.pages, 1);
}

#[tokio::test]
async fn test_fetch_all_stalled_cursor_stops() {
    // The service keeps answering the same full page no matter the cursor.
    let transport = Arc::new(ScriptedTransport::with_handler(|_| {
        ok(LOGBOOK_URL, page_body(1..=250))
    }));
    let client = client(&transport);

    let log = client.logbook().fetch_all().await.unwrap();

    assert!(log.stalled);
    assert_eq!(log.pages, 2);
    assert_eq!(log.qsos.len(), 250);
    assert_eq!(log.duplicates_dropped, 250);
}

#[tokio::test]
async fn test_fetch_all_full_page_without_log_id_stops() {
    let transport = Arc::new(ScriptedTransport::with_handler(|_| {
        let records: Vec<String> = (0..PAGE_SIZE)
            .map(|i| AdifCodec.encode_one(&[(fields::CALL, format!("K{i}").as_str())]))
            .collect();
        ok(LOGBOOK_URL, records.join("\n"))
    }));
    let client = client(&transport);

    let log = client.logbook().fetch_all().await.unwrap();

    assert!(log.stalled);
    assert_eq!(log.pages, 1);
    assert_eq!(log.qsos.len(), PAGE_SIZE);
}

#[tokio::test]
async fn test_fetch_all_transport_failure_propagates() {
    let transport = Arc::new(ScriptedTransport::from_results(vec![Ok(HttpResponse::new(
        LOGBOOK_URL,
        502,
        "bad gateway",
    ))]));
    let err = client(&transport).logbook().fetch_all().await.unwrap_err();
    assert!(matches!(err, QrzlogError::Transport(_)));
    assert_eq!(transport.request_count(), 1);
}

// =========================================================================
// Logbook: history and logging
// =========================================================================

#[tokio::test]
async fn test_history_then_log_contact() {
    let transport = Arc::new(ScriptedTransport::with_handler(|request| {
        match request.param("ACTION") {
            Some("FETCH") => ok(LOGBOOK_URL, "RESULT=OK&COUNT=0"),
            Some("INSERT") => ok(LOGBOOK_URL, "RESULT=OK&LOGID=1001&COUNT=1"),
            _ => panic!("unexpected request {request:?}"),
        }
    }));
    let client = client(&transport);

    let prior = client.logbook().query_by_callsign("K1ABC").await.unwrap();
    assert!(prior.is_empty());

    let draft = ContactDraft {
        call: "K1ABC".into(),
        band: "40M".into(),
        mode: "CW".into(),
        qso_date: "20240315".into(),
        time_on: "0102".into(),
        time_off: "0110".into(),
        rst_sent: "599".into(),
        rst_rcvd: "579".into(),
    };
    let status = client.logbook().add_contact(&draft).await.unwrap();
    assert_eq!(status.log_id(), Some(LogId(1001)));

    // The submitted record decodes back to the draft's fields.
    let insert = &transport.requests()[1];
    let sent = AdifCodec.decode_many(insert.param("ADIF").unwrap());
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].get(fields::CALL), Some("K1ABC"));
    assert_eq!(sent[0].get(fields::BAND_RX), Some("40M"));
    assert_eq!(sent[0].get(fields::RST_RCVD), Some("579"));
    assert_eq!(insert.param("KEY"), Some("ABCD-1234"));
}

#[tokio::test]
async fn test_log_contact_rejected_reports_status() {
    let transport = Arc::new(ScriptedTransport::from_bodies([
        "RESULT=FAIL&REASON=duplicate&COUNT=0",
    ]));
    let draft = ContactDraft {
        call: "K1ABC".into(),
        band: "40M".into(),
        mode: "CW".into(),
        qso_date: "20240315".into(),
        time_on: "0102".into(),
        time_off: "0110".into(),
        rst_sent: "599".into(),
        rst_rcvd: "579".into(),
    };

    let err = client(&transport).logbook().add_contact(&draft).await.unwrap_err();

    match err {
        QrzlogError::LogWriteFailed(status) => {
            assert_eq!(status.result(), Some("FAIL"));
            assert_eq!(status.reason(), Some("duplicate"));
        }
        other => panic!("expected LogWriteFailed, got {other:?}"),
    }
}
