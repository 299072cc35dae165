//! Tests that closed and dropped channels leave no process behind.

use std::panic::{self, AssertUnwindSafe};

use nix::errno::Errno;
use nix::sys::signal::kill;
use nix::unistd::Pid;

use toolwrapper::{with_channel, ChannelConfig, ChannelError, ProcessChannel};

fn is_gone(pid: u32) -> bool {
    let pid = Pid::from_raw(i32::try_from(pid).unwrap());
    kill(pid, None) == Err(Errno::ESRCH)
}

#[test]
fn close_reaps_process() {
    let mut cat = ProcessChannel::spawn(["cat"]).unwrap();
    let pid = cat.pid().unwrap();
    assert!(!is_gone(pid));

    cat.close();
    assert!(is_gone(pid));
}

#[test]
fn drop_reaps_process() {
    let pid = {
        let cat = ProcessChannel::spawn(["cat"]).unwrap();
        cat.pid().unwrap()
    };
    assert!(is_gone(pid));
}

#[test]
fn restart_reaps_previous_process() {
    let mut cat = ProcessChannel::spawn(["cat"]).unwrap();
    let pid = cat.pid().unwrap();
    cat.restart().unwrap();
    assert!(is_gone(pid));
}

#[test]
fn close_after_tool_exited_does_not_fail() {
    let mut tool = ProcessChannel::spawn(["true"]).unwrap();
    let pid = tool.pid().unwrap();
    assert!(tool.readline().unwrap_err().is_end_of_stream());

    tool.close();
    assert!(is_gone(pid));
}

#[test]
fn with_channel_closes_on_error() {
    let mut seen = None;
    let result: Result<(), ChannelError> = with_channel(ChannelConfig::new(["cat"]), |cat| {
        seen = cat.pid();
        Err(ChannelError::EndOfStream)
    });

    assert!(result.unwrap_err().is_end_of_stream());
    assert!(is_gone(seen.unwrap()));
}

#[test]
fn with_channel_closes_on_panic() {
    let mut seen = None;
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        with_channel(ChannelConfig::new(["cat"]), |cat| -> Result<(), ChannelError> {
            seen = cat.pid();
            panic!("tool consumer failed");
        })
    }));

    assert!(outcome.is_err());
    assert!(is_gone(seen.unwrap()));
}
