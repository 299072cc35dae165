//! Tests for line exchange with wrapped tools.

use toolwrapper::{
    with_channel, ChannelConfig, ChannelError, ChannelStatus, ProcessChannel, TextEncoding,
};

const SAMPLE_LINES: [&str; 3] = ["hello", "hello again", "good bye"];

#[test]
fn cat_echoes_sample_lines() {
    let mut cat = ProcessChannel::spawn(["cat"]).unwrap();
    for line in SAMPLE_LINES {
        cat.writeline(line).unwrap();
        assert_eq!(cat.readline().unwrap(), line);
    }
    cat.close();
}

#[test]
fn cat_echoes_sample_lines_without_stdbuf() {
    let mut cat = ProcessChannel::new(ChannelConfig::new(["cat"]).stdbuf(false)).unwrap();
    assert!(!cat.uses_stdbuf());
    for line in SAMPLE_LINES {
        cat.writeline(line).unwrap();
        assert_eq!(cat.readline().unwrap(), line);
    }
    cat.close();
}

#[test]
fn with_channel_runs_and_returns_closure_result() {
    let echoed = with_channel(ChannelConfig::new(["cat"]), |cat| {
        let mut echoed = Vec::new();
        for line in SAMPLE_LINES {
            cat.writeline(line)?;
            echoed.push(cat.readline()?);
        }
        Ok::<_, ChannelError>(echoed)
    })
    .unwrap();

    assert_eq!(echoed, SAMPLE_LINES);
}

#[test]
fn readline_preserves_whitespace_and_unicode() {
    let mut cat = ProcessChannel::spawn(["cat"]).unwrap();
    for line in ["  leading and trailing  ", "tab\there", "ünïcödé ✓", ""] {
        cat.writeline(line).unwrap();
        assert_eq!(cat.readline().unwrap(), line);
    }
}

#[test]
fn latin1_round_trip() {
    let mut cat =
        ProcessChannel::new(ChannelConfig::new(["cat"]).encoding(TextEncoding::Latin1)).unwrap();
    cat.writeline("café crème").unwrap();
    assert_eq!(cat.readline().unwrap(), "café crème");
}

#[test]
fn unencodable_line_is_rejected_before_writing() {
    let mut cat =
        ProcessChannel::new(ChannelConfig::new(["cat"]).encoding(TextEncoding::Ascii)).unwrap();

    let err = cat.writeline("price: 5€").unwrap_err();
    assert!(matches!(err, ChannelError::Encoding(_)));

    cat.writeline("plain").unwrap();
    assert_eq!(cat.readline().unwrap(), "plain");
}

#[test]
fn sed_substitutes_per_line() {
    let mut sed = ProcessChannel::spawn(["sed", "-u", "s/Hello/Hi/"]).unwrap();
    sed.writeline("Hello there!").unwrap();
    assert_eq!(sed.readline().unwrap(), "Hi there!");
}

#[test]
fn empty_line_is_distinct_from_end_of_stream() {
    let mut tool =
        ProcessChannel::spawn(["sh", "-c", r#"read line; echo; echo "$line""#]).unwrap();

    tool.writeline("payload").unwrap();
    assert_eq!(tool.readline().unwrap(), "");
    assert_eq!(tool.readline().unwrap(), "payload");

    let err = tool.readline().unwrap_err();
    assert!(err.is_end_of_stream(), "Expected EndOfStream, got {err:?}");

    // End of stream does not close the channel.
    assert_eq!(tool.status(), ChannelStatus::Running);
    tool.close();
    assert_eq!(tool.status(), ChannelStatus::Closed);
}

#[test]
fn unterminated_final_line_is_returned() {
    let mut tool = ProcessChannel::spawn(["printf", "no newline"]).unwrap();
    assert_eq!(tool.readline().unwrap(), "no newline");
    assert!(tool.readline().unwrap_err().is_end_of_stream());
}

#[test]
fn stderr_is_captured_separately() {
    let mut tool =
        ProcessChannel::spawn(["sh", "-c", "echo oops >&2; echo fine"]).unwrap();

    assert_eq!(tool.readline().unwrap(), "fine");
    assert_eq!(tool.read_stderr_line().unwrap(), "oops");
}

#[test]
fn tool_runs_in_working_dir() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let temp_path = temp_dir.path().canonicalize().unwrap();

    let mut pwd = ProcessChannel::new(ChannelConfig::new(["pwd"]).working_dir(&temp_path)).unwrap();

    assert_eq!(pwd.working_dir(), Some(temp_path.as_path()));
    assert_eq!(pwd.readline().unwrap(), temp_path.to_str().unwrap());
}
