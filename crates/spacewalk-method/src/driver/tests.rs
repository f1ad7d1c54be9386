//! Unit tests for the acquire loop

use super::*;

use camino::Utf8PathBuf;
use tokio::io::BufReader;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use spacewalk_client::testing::{plain_config, StaticAuth};
use spacewalk_config::ServerConfig;

type TestMethod<'a> = AcquireMethod<BufReader<&'a [u8]>, Vec<u8>, StaticAuth>;

fn method_for<'a>(input: &'a str, server_uri: &str) -> TestMethod<'a> {
    method_with(input.as_bytes(), plain_config(server_uri))
}

fn method_with(input: &[u8], config: ServerConfig) -> TestMethod<'_> {
    let session = Session::with_config(config, StaticAuth::registered("prod-x86_64"));
    AcquireMethod::new(BufReader::new(input), Vec::new(), session)
}

/// Every frame the method wrote, in order
async fn written_frames(method: TestMethod<'_>) -> Vec<Frame> {
    let output = method.writer.into_inner();
    let mut reader = FrameReader::new(BufReader::new(output.as_slice()));
    let mut frames = Vec::new();
    while let Some(frame) = reader.read_frame().await.unwrap() {
        frames.push(frame);
    }
    frames
}

fn acquire(uri: &str, destination: &Utf8PathBuf) -> String {
    format!("600 URI Acquire\nURI: {}\nFilename: {}\n\n", uri, destination)
}

#[tokio::test]
async fn test_capabilities_first_then_exit_at_end_of_input() {
    let mut method = method_for("", "http://127.0.0.1:9");
    assert_eq!(method.run().await.unwrap(), EXIT_SUCCESS);

    let frames = written_frames(method).await;
    assert_eq!(frames, vec![Frame::capabilities()]);
}

#[tokio::test]
async fn test_unknown_code_stops_with_100() {
    let input = "601 Configuration\nConfig-Item: Acquire::http::Timeout=30\n\n\
                 600 URI Acquire\nURI: spacewalk://127.0.0.1:9/dists/channels:/main/Release\nFilename: /tmp/Release\n\n";
    let mut method = method_for(input, "http://127.0.0.1:9");

    assert_eq!(method.run().await.unwrap(), EXIT_UNEXPECTED_MESSAGE);
    assert_eq!(method.session.auth().login_calls(), 0);
    assert_eq!(written_frames(method).await.len(), 1);
}

#[tokio::test]
async fn test_malformed_frame_stops_with_100() {
    let mut method = method_for("Acquire please\n\n", "http://127.0.0.1:9");
    assert_eq!(method.run().await.unwrap(), EXIT_UNEXPECTED_MESSAGE);
}

#[tokio::test]
async fn test_invalid_utf8_stops_with_100() {
    let input = b"600 URI Acquire\nURI: spacewalk://127.0.0.1:9/\xff\xfe\nFilename: /tmp/x\n\n";
    let mut method = method_with(input, plain_config("http://127.0.0.1:9"));
    assert_eq!(exit_code(method.run().await), EXIT_UNEXPECTED_MESSAGE);
    assert_eq!(method.session.auth().login_calls(), 0);
}

#[tokio::test]
async fn test_unreadable_ca_certificate_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = plain_config("http://127.0.0.1:9");
    config.use_tls = true;
    config.ca_cert_paths = vec![Utf8PathBuf::from_path_buf(dir.path().join("ca.pem")).unwrap()];

    let input = "600 URI Acquire\nURI: spacewalk://127.0.0.1:9/dists/channels:/main/Release\nFilename: /tmp/Release\n\n\
                 600 URI Acquire\nURI: spacewalk://127.0.0.1:9/dists/channels:/main/Packages\nFilename: /tmp/Packages\n\n";
    let mut method = method_with(input.as_bytes(), config);

    let outcome = method.run().await;
    assert!(matches!(outcome, Err(MethodError::BadTlsConfig { .. })));
    assert_eq!(exit_code(outcome), EXIT_FATAL);
    assert_eq!(method.session.auth().login_calls(), 0);
    assert!(written_frames(method).await.is_empty());
}

#[tokio::test]
async fn test_missing_filename_reported_and_loop_continues() {
    let input = "600 URI Acquire\nURI: spacewalk://127.0.0.1:9/dists/channels:/main/Release\n\n\
                 600 URI Acquire\nFilename: /tmp/Release\n\n";
    let mut method = method_for(input, "http://127.0.0.1:9");
    assert_eq!(method.run().await.unwrap(), EXIT_SUCCESS);

    let frames = written_frames(method).await;
    assert_eq!(frames.len(), 3);
    assert_eq!(frames[1].code, 400);
    assert_eq!(
        frames[1].field("URI"),
        Some("spacewalk://127.0.0.1:9/dists/channels:/main/Release")
    );
    assert_eq!(
        frames[1].field("Message"),
        Some("MissingField: Message is missing required field 'Filename'")
    );
    assert_eq!(frames[2].code, 400);
    assert_eq!(frames[2].field("URI"), None);
}

#[tokio::test]
async fn test_failed_request_does_not_stop_the_next() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/XMLRPC/GET-REQ/dists/channels:/prod-x86_64/Release"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/XMLRPC/GET-REQ/dists/channels:/prod-x86_64/repodata/repomd.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string("hello world"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let release = Utf8PathBuf::from_path_buf(dir.path().join("Release")).unwrap();
    let repomd = Utf8PathBuf::from_path_buf(dir.path().join("repomd.xml")).unwrap();
    let base = format!("spacewalk://{}", server.address());
    let release_uri = format!("{}/dists/channels:/main/Release", base);
    let repomd_uri = format!("{}/dists/channels:/main/repodata/repomd.xml", base);
    let input = format!("{}{}", acquire(&release_uri, &release), acquire(&repomd_uri, &repomd));

    let mut method = method_for(&input, &server.uri());
    assert_eq!(method.run().await.unwrap(), EXIT_SUCCESS);
    assert!(method.session.connection().is_none());

    let frames = written_frames(method).await;
    let codes: Vec<u16> = frames.iter().map(|f| f.code).collect();
    assert_eq!(codes, vec![100, 102, 102, 102, 400, 102, 200, 201]);

    let failure = &frames[4];
    assert_eq!(failure.field("URI"), Some(release_uri.as_str()));
    assert_eq!(failure.field("Message"), Some("404  Not Found"));
    assert_eq!(failure.field("FailReason"), Some("HttpError404"));
    assert!(!release.exists());

    let done = &frames[7];
    assert_eq!(done.field("URI"), Some(repomd_uri.as_str()));
    assert_eq!(done.field("Filename"), Some(repomd.as_str()));
    assert_eq!(done.field("Size"), Some("11"));
    assert_eq!(done.field("MD5-Hash"), Some("5eb63bbbe01eeed093cb22bb8f5acdc3"));
    assert_eq!(done.field("MD5Sum-Hash"), Some("5eb63bbbe01eeed093cb22bb8f5acdc3"));
    assert_eq!(
        done.field("SHA256-Hash"),
        Some("b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9")
    );
    assert_eq!(std::fs::read_to_string(&repomd).unwrap(), "hello world");
}
