use bytes::Bytes;
use chrono::Utc;
use httpmock::Method::{DELETE, POST};
use httpmock::MockServer;
use marketplace_upload::{
    endpoints, Chunk, ErrorKind, HttpTransport, NetworkFailureKind, Transport, UploadUnit,
};
use serde_json::json;
use std::net::TcpListener;

fn can_bind_localhost() -> bool {
    TcpListener::bind("127.0.0.1:0").is_ok()
}

fn upload_response(file_name: &str, file_type: &str, size: u64) -> serde_json::Value {
    json!({
        "success": true,
        "fileUrl": format!("https://cdn.example.com/files/{}", file_name),
        "fileName": file_name,
        "fileSize": size,
        "fileType": file_type,
        "uploadedAt": "2024-05-01T10:00:00.000Z"
    })
}

#[tokio::test]
async fn test_single_upload_wire_format() -> Result<(), Box<dyn std::error::Error>> {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return Ok(());
    }

    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api/upload")
            .body_contains("name=\"file\"; filename=\"notes.txt\"")
            .body_contains("name=\"fileType\"\r\n\r\ntext/plain")
            .body_contains("name=\"fileSize\"\r\n\r\n5")
            .body_contains("name=\"uploadedAt\"");
        then.status(200)
            .json_body(upload_response("notes.txt", "text/plain", 5));
    });

    let transport = HttpTransport::new(&server.url("/api"))?;
    let unit = UploadUnit::new("notes.txt", "text/plain", b"hello".to_vec());
    let result = transport
        .send_unit(endpoints::UPLOAD, &unit, Utc::now())
        .await?;

    mock.assert_async().await;
    assert!(result.success);
    assert_eq!(result.file_name, "notes.txt");
    assert_eq!(result.file_size, 5);
    assert_eq!(result.file_url, "https://cdn.example.com/files/notes.txt");
    assert!(result.thumbnail_url.is_none());

    Ok(())
}

#[tokio::test]
async fn test_multiple_upload_wire_format() -> Result<(), Box<dyn std::error::Error>> {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return Ok(());
    }

    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api/upload/multiple")
            .body_contains("name=\"files\"; filename=\"a.txt\"")
            .body_contains("name=\"files\"; filename=\"b.txt\"");
        then.status(200).json_body(json!([
            upload_response("a.txt", "text/plain", 1),
            upload_response("b.txt", "text/plain", 2),
        ]));
    });

    let transport = HttpTransport::new(&server.url("/api"))?;
    let units = vec![
        UploadUnit::new("a.txt", "text/plain", b"a".to_vec()),
        UploadUnit::new("b.txt", "text/plain", b"bb".to_vec()),
    ];
    let results = transport
        .send_units(endpoints::UPLOAD_MULTIPLE, &units)
        .await?;

    mock.assert_async().await;
    let names: Vec<&str> = results.iter().map(|r| r.file_name.as_str()).collect();
    assert_eq!(names, vec!["a.txt", "b.txt"]);

    Ok(())
}

#[tokio::test]
async fn test_chunk_and_finalize_wire_format() -> Result<(), Box<dyn std::error::Error>> {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return Ok(());
    }

    let server = MockServer::start();
    let chunk_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api/upload/chunk")
            .body_contains("name=\"chunk\"")
            .body_contains("name=\"fileName\"\r\n\r\nvideo.mp4")
            .body_contains("name=\"chunkIndex\"\r\n\r\n1")
            .body_contains("name=\"totalChunks\"\r\n\r\n3");
        then.status(200).json_body(json!({ "received": true }));
    });
    let finalize_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api/upload/finalize")
            .json_body(json!({ "fileName": "video.mp4" }));
        then.status(200)
            .json_body(upload_response("video.mp4", "video/mp4", 2_500_000));
    });

    let transport = HttpTransport::new(&server.url("/api"))?;
    let chunk = Chunk {
        file_name: "video.mp4".to_string(),
        index: 1,
        total: 3,
        data: Bytes::from_static(b"chunk-bytes"),
    };
    transport.send_chunk(&chunk).await?;
    let result = transport.finalize("video.mp4").await?;

    chunk_mock.assert_async().await;
    finalize_mock.assert_async().await;
    assert_eq!(result.file_size, 2_500_000);

    Ok(())
}

#[tokio::test]
async fn test_delete_wire_format() -> Result<(), Box<dyn std::error::Error>> {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return Ok(());
    }

    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(DELETE)
            .path("/api/upload/delete")
            .query_param("fileUrl", "https://cdn.example.com/files/a.png");
        then.status(204);
    });

    let transport = HttpTransport::new(&server.url("/api"))?;
    transport
        .delete("https://cdn.example.com/files/a.png")
        .await?;

    mock.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn test_status_classification() -> Result<(), Box<dyn std::error::Error>> {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return Ok(());
    }

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/too-large/upload");
        then.status(413)
            .json_body(json!({ "message": "request entity too large" }));
    });
    server.mock(|when, then| {
        when.method(POST).path("/unsupported/upload");
        then.status(415);
    });
    server.mock(|when, then| {
        when.method(POST).path("/quota/upload");
        then.status(507).json_body(json!({ "message": "quota exceeded" }));
    });
    server.mock(|when, then| {
        when.method(POST).path("/gateway/upload");
        then.status(502).body("<html>bad gateway</html>");
    });

    let unit = UploadUnit::new("a.txt", "text/plain", b"a".to_vec());
    let cases = [
        (
            "/too-large",
            NetworkFailureKind::PayloadTooLarge,
            "File is too large",
        ),
        (
            "/unsupported",
            NetworkFailureKind::UnsupportedMediaType,
            "File type not supported",
        ),
        ("/quota", NetworkFailureKind::Generic, "quota exceeded"),
        ("/gateway", NetworkFailureKind::Generic, "File upload failed"),
    ];

    for (base, kind, message) in cases {
        let transport = HttpTransport::new(&server.url(base))?;
        let err = transport
            .send_unit(endpoints::UPLOAD, &unit, Utc::now())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NetworkFailure(kind), "{}", base);
        assert_eq!(err.to_string(), message, "{}", base);
    }

    Ok(())
}

#[tokio::test]
async fn test_malformed_success_body() -> Result<(), Box<dyn std::error::Error>> {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return Ok(());
    }

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/api/upload/finalize");
        then.status(200).body("not json");
    });

    let transport = HttpTransport::new(&server.url("/api"))?;
    let err = transport.finalize("a.bin").await.unwrap_err();
    assert_eq!(
        err.kind(),
        ErrorKind::NetworkFailure(NetworkFailureKind::Generic)
    );
    assert!(err.to_string().starts_with("Invalid upload response"));

    Ok(())
}

#[tokio::test]
async fn test_connection_failure_is_generic() -> Result<(), Box<dyn std::error::Error>> {
    let port = match TcpListener::bind("127.0.0.1:0") {
        Ok(listener) => listener.local_addr()?.port(),
        Err(_) => {
            eprintln!("Skipping: cannot bind to localhost");
            return Ok(());
        }
    };

    // listener dropped, nothing accepts on this port now
    let transport = HttpTransport::new(&format!("http://127.0.0.1:{}/api", port))?;
    let err = transport.delete("https://cdn.example.com/x").await.unwrap_err();
    assert_eq!(
        err.kind(),
        ErrorKind::NetworkFailure(NetworkFailureKind::Generic)
    );

    Ok(())
}
