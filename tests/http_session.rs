//! HttpTransport and Session against a local mock camera.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use gopro_session::{
    ConnectMode, Dialect, GoProError, HttpTransport, Session, SessionConfig, Transport,
};

const TIMEOUT: Duration = Duration::from_secs(5);

async fn camera(firmware: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gp/gpControl"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "info": { "model_name": "HERO7 Black", "firmware_version": firmware }
        })))
        .mount(&server)
        .await;
    server
}

fn session_for(server: &MockServer) -> Session {
    let config = SessionConfig {
        ip_addr:            server.address().to_string(),
        resolve_attempts:   2,
        resolve_backoff_ms: 0,
        poll_interval_ms:   0,
        ..SessionConfig::default()
    };
    let transport = Arc::new(HttpTransport::new().unwrap());
    Session::with_transport(config, transport)
}

#[tokio::test]
async fn text_body_is_returned() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/hello"))
        .respond_with(ResponseTemplate::new(200).set_body_string("world"))
        .mount(&server)
        .await;

    let transport = HttpTransport::new().unwrap();
    let body = transport.get_text(&format!("{}/hello", server.uri()), TIMEOUT).await.unwrap();
    assert_eq!(body, "world");
}

#[tokio::test]
async fn error_body_becomes_device_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gp/gpControl/command/shutter"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error_code": 8, "error_msg": "camera busy"
        })))
        .mount(&server)
        .await;

    let transport = HttpTransport::new().unwrap();
    let err = transport
        .get_text(&format!("{}/gp/gpControl/command/shutter", server.uri()), TIMEOUT)
        .await
        .unwrap_err();
    match err {
        GoProError::DeviceReported { status, code, message } => {
            assert_eq!(status, 500);
            assert_eq!(code, 8);
            assert_eq!(message, "camera busy");
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn plain_error_status_is_transport_failure() {
    let server = MockServer::start().await;
    let transport = HttpTransport::new().unwrap();
    let err = transport.get_text(&format!("{}/missing", server.uri()), TIMEOUT).await.unwrap_err();
    assert!(matches!(err, GoProError::HttpStatus { status: 404, .. }));
    assert!(err.is_transport());
}

#[tokio::test]
async fn slow_response_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let transport = HttpTransport::new().unwrap();
    let err = transport
        .get_text(&format!("{}/slow", server.uri()), Duration::from_millis(50))
        .await
        .unwrap_err();
    assert!(matches!(err, GoProError::TransportTimeout(_)));
}

#[tokio::test]
async fn download_streams_body_to_disk() {
    let body: Vec<u8> = (0..300_007u32).map(|i| (i % 253) as u8).collect();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/videos/DCIM/100GOPRO/GH010001.MP4"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("100GOPRO-GH010001.MP4");
    let transport = HttpTransport::new().unwrap();
    let written = transport
        .download(&format!("{}/videos/DCIM/100GOPRO/GH010001.MP4", server.uri()), &dest, 64 * 1024)
        .await
        .unwrap();
    assert_eq!(written, body.len() as u64);
    assert_eq!(std::fs::read(&dest).unwrap(), body);
}

#[tokio::test]
async fn failed_download_leaves_no_file() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("missing.MP4");
    let transport = HttpTransport::new().unwrap();
    let err = transport
        .download(&format!("{}/videos/DCIM/100GOPRO/none.MP4", server.uri()), &dest, 1024)
        .await
        .unwrap_err();
    assert!(err.is_transport());
    assert!(!dest.exists());
}

#[tokio::test]
async fn truncated_body_is_a_transport_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = [0u8; 1024];
        let _ = socket.read(&mut request).await.unwrap();
        socket
            .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 1000\r\n\r\n0123456789")
            .await
            .unwrap();
        socket.flush().await.unwrap();
    });

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("cut.MP4");
    let transport = HttpTransport::new().unwrap();
    let err = transport
        .download(&format!("http://{addr}/videos/DCIM/100GOPRO/cut.MP4"), &dest, 4)
        .await
        .unwrap_err();
    assert!(err.is_transport(), "{err:?}");
    assert!(!dest.exists());
}

#[tokio::test]
async fn session_detects_and_dispatches() {
    let server = camera("HD7.01.01.51.00").await;
    Mock::given(method("GET"))
        .and(path("/gp/gpControl/setting/2/9"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/gp/gpControl/command/sub_mode"))
        .and(query_param("mode", "0"))
        .and(query_param("sub_mode", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"path": "a\b"}"#))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/gp/gpControl/setting/10/1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let session = session_for(&server);
    let camera = session.connect(ConnectMode::Detect).await.unwrap();
    assert_eq!(camera.dialect, Dialect::GpControl);
    assert_eq!(camera.model_family, "HD7");

    assert_eq!(session.set_parameter("2", "9").await.unwrap().as_deref(), Some("{}"));
    assert_eq!(session.set_parameter("10", "1").await.unwrap(), None);
    let resp = session.run_command("sub_mode?mode=0&sub_mode=0").await.unwrap();
    assert_eq!(resp["path"], "a/b");
}

#[tokio::test]
async fn session_waits_for_idle_camera() {
    let server = camera("HD6.01.01.51.00").await;
    Mock::given(method("GET"))
        .and(path("/gp/gpControl/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": { "8": 1 }, "settings": {}
        })))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/gp/gpControl/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": { "8": 0 }, "settings": { "2": 9, "3": 8 }
        })))
        .mount(&server)
        .await;

    let session = session_for(&server);
    assert_eq!(session.wait_until_idle().await.unwrap(), 3);
    let status = session.status().await.unwrap();
    assert_eq!(status.get("IsBusy"), Some(&json!(0)));
    assert_eq!(status.settings["Resolution"], json!(9));
}

#[tokio::test]
async fn legacy_firmware_is_refused() {
    let server = camera("HD3.11.02.00").await;
    let session = session_for(&server);
    let err = session.connect(ConnectMode::Detect).await.unwrap_err();
    assert!(matches!(err, GoProError::CameraIdentification(_)));
    assert!(session.dialect().is_none());
}
