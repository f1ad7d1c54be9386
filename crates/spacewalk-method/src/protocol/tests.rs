//! Unit tests for the frame codec

use super::*;

use proptest::prelude::*;
use tokio::io::BufReader;

fn reader(input: &str) -> FrameReader<BufReader<&[u8]>> {
    FrameReader::new(BufReader::new(input.as_bytes()))
}

#[tokio::test]
async fn test_read_acquire_frame() {
    let mut frames = reader(
        "600 URI Acquire\n\
         URI: spacewalk://sw.example.com/dists/channels:/main/Release\n\
         Filename: /var/lib/apt/lists/partial/Release\n\
         Last-Modified: Mon, 01 Jan 2024 00:00:00 GMT\n\
         \n",
    );

    let frame = frames.read_frame().await.unwrap().unwrap();
    assert_eq!(frame.code, 600);
    assert_eq!(frame.text, "URI Acquire");
    assert_eq!(frame.field("Filename"), Some("/var/lib/apt/lists/partial/Release"));
    // Split on the first ':' only
    assert_eq!(frame.field("Last-Modified"), Some("Mon, 01 Jan 2024 00:00:00 GMT"));

    assert!(frames.read_frame().await.unwrap().is_none());
}

#[tokio::test]
async fn test_end_of_input_before_frame() {
    assert!(reader("").read_frame().await.unwrap().is_none());
    assert!(reader("\n\n").read_frame().await.unwrap().is_none());
}

#[tokio::test]
async fn test_partial_frame_at_end_of_input() {
    let mut frames = reader("600 URI Acquire\nURI: spacewalk://h/x\n");
    let frame = frames.read_frame().await.unwrap().unwrap();
    assert_eq!(frame.field("URI"), Some("spacewalk://h/x"));
    assert_eq!(frame.field("Filename"), None);
    assert!(frames.read_frame().await.unwrap().is_none());
}

#[tokio::test]
async fn test_crlf_tolerated() {
    let mut frames = reader("600 URI Acquire\r\nURI: spacewalk://h/x\r\n\r\n601 Configuration\r\n\r\n");
    let first = frames.read_frame().await.unwrap().unwrap();
    assert_eq!(first.text, "URI Acquire");
    assert_eq!(first.field("URI"), Some("spacewalk://h/x"));

    let second = frames.read_frame().await.unwrap().unwrap();
    assert_eq!(second.code, 601);
    assert_eq!(second.field_count(), 0);
}

#[tokio::test]
async fn test_duplicate_field_last_write_wins() {
    let mut frames = reader("600 URI Acquire\nURI: a\nFilename: f\nURI: b\n\n");
    let frame = frames.read_frame().await.unwrap().unwrap();
    assert_eq!(frame.field("URI"), Some("b"));
    let names: Vec<_> = frame.fields().map(|(name, _)| name).collect();
    assert_eq!(names, vec!["URI", "Filename"]);
}

#[tokio::test]
async fn test_malformed_frames() {
    assert!(matches!(
        reader("URI Acquire\n\n").read_frame().await,
        Err(MethodError::Protocol { .. })
    ));
    assert!(matches!(
        reader("600 URI Acquire\nno separator here\n\n").read_frame().await,
        Err(MethodError::Protocol { .. })
    ));
}

#[tokio::test]
async fn test_invalid_utf8_is_protocol_error() {
    let input: &[u8] = b"600 URI Acquire\nFilename: /tmp/\xc3\x28\n\n";
    let mut frames = FrameReader::new(BufReader::new(input));
    assert!(matches!(
        frames.read_frame().await,
        Err(MethodError::Protocol { .. })
    ));
}

#[tokio::test]
async fn test_write_frame_exact_bytes() {
    let mut writer = FrameWriter::new(Vec::new());
    writer.write_frame(&Frame::capabilities()).await.unwrap();
    writer
        .send(Frame::status("spacewalk://h/x", "Logged in"))
        .await
        .unwrap();

    let written = String::from_utf8(writer.into_inner()).unwrap();
    assert_eq!(
        written,
        "100 Capabilities\nVersion: 1.0\nSingle-Instance: true\n\n\
         102 Status\nURI: spacewalk://h/x\nMessage: Logged in\n\n"
    );
}

#[tokio::test]
async fn test_written_frame_reads_back() {
    let frame = Frame::uri_start("spacewalk://h/x", Some(42), Some("Mon, 01 Jan 2024 00:00:00 GMT"));
    let wire = render(&frame);

    let read = reader(&wire).read_frame().await.unwrap().unwrap();
    assert_eq!(read, frame);
}

fn field_name() -> impl Strategy<Value = String> {
    "[A-Z][A-Za-z-]{0,15}"
}

fn field_value() -> impl Strategy<Value = String> {
    "[!-~]([ -~]{0,30}[!-~])?"
}

proptest! {
    #[test]
    fn test_frames_survive_the_wire(
        code in 100u16..700,
        fields in proptest::collection::vec((field_name(), field_value()), 0..8),
    ) {
        let mut frame = Frame::new(code, "Some Message");
        for (name, value) in &fields {
            frame.set_field(name.as_str(), value.as_str());
        }

        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let wire = render(&frame);
        let read = runtime.block_on(async { reader(&wire).read_frame().await }).unwrap().unwrap();
        prop_assert_eq!(read, frame);
    }
}
