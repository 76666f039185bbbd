use crate::ansi::strip_ansi;
use crate::console::Console;
use crate::script::{CommandStep, ProbeScript};
use crate::ProbeError;
use serde::{Deserialize, Serialize};
use std::io;
use std::time::{Duration, Instant};

const LINE_ENDING: &str = "\r\n";
const READ_CHUNK: usize = 4096;

#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Pause between polls when nothing has arrived
    pub poll_interval: Duration,
    /// Bare line endings sent to wake the shell
    pub wake_repeats: usize,
    pub wake_gap: Duration,
    /// How long to collect the shell's answer to being woken
    pub wake_listen: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            wake_repeats: 3,
            wake_gap: Duration::from_millis(300),
            wake_listen: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExchangeKind {
    Wake,
    Command,
    Listen,
}

/// Something sent to the device and what came back
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Exchange {
    pub kind: ExchangeKind,
    pub command: Option<String>,
    pub response: String,
}

impl Exchange {
    pub fn answered(&self) -> bool {
        !self.response.trim().is_empty()
    }
}

/// A conclusion drawn from the session rather than a raw response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, derive_more::Display)]
#[serde(tag = "finding", rename_all = "snake_case")]
pub enum Finding {
    #[display("no response — possible lockup (press the RESET button on the board)")]
    NoResponse { commands: Vec<String> },
    #[display("console error, session ended early: {message}")]
    ConsoleError { message: String },
}

/// A command and response session with a device shell
pub struct Session<C: Console> {
    console: C,
    options: SessionOptions,
    exchanges: Vec<Exchange>,
}

impl<C: Console> Session<C> {
    pub fn new(console: C, options: SessionOptions) -> Self {
        Self {
            console,
            options,
            exchanges: Vec::new(),
        }
    }

    /// Send one command and return everything received before `wait` elapsed.
    ///
    /// Unread input is dropped before sending. The response is decoded lossily with ANSI escape
    /// sequences removed, an unresponsive device gives an empty response.
    pub fn send_command(&mut self, command: &str, wait: Duration) -> Result<String, ProbeError> {
        log::debug!("Sending {command:?}, waiting {wait:?}");

        self.console.clear_input()?;
        self.console
            .write_all(format!("{command}{LINE_ENDING}").as_bytes())?;
        self.console.flush()?;

        let response = self.collect_for(wait)?;
        self.record(ExchangeKind::Command, Some(command), &response);
        Ok(response)
    }

    /// Send bare line endings to wake the shell and return any banner or prompt it prints
    pub fn wake(&mut self) -> Result<String, ProbeError> {
        for repeat in 0..self.options.wake_repeats {
            if repeat > 0 {
                std::thread::sleep(self.options.wake_gap);
            }
            self.console.write_all(LINE_ENDING.as_bytes())?;
        }
        self.console.flush()?;

        let response = self.collect_for(self.options.wake_listen)?;
        self.record(ExchangeKind::Wake, None, &response);
        Ok(response)
    }

    /// Collect whatever the device prints without sending anything
    pub fn listen(&mut self, duration: Duration) -> Result<String, ProbeError> {
        let response = self.collect_for(duration)?;
        self.record(ExchangeKind::Listen, None, &response);
        Ok(response)
    }

    /// Run a script to completion.
    ///
    /// Nothing here fails: an unresponsive device or a console error becomes a [Finding] and the
    /// session stops at that point.
    pub fn run_script(&mut self, script: &ProbeScript) -> Vec<Finding> {
        match self.try_run_script(script) {
            Ok(findings) => findings,
            Err(e) => {
                log::warn!("Session with script {} ended early: {e}", script.name);
                vec![Finding::ConsoleError {
                    message: e.to_string(),
                }]
            }
        }
    }

    fn try_run_script(&mut self, script: &ProbeScript) -> Result<Vec<Finding>, ProbeError> {
        if script.wake {
            self.wake()?;
        }

        if !script.probe.is_empty() && !self.any_answered(&script.probe)? {
            log::warn!("No response to {} probe commands", script.probe.len());
            self.listen(script.listen())?;

            return Ok(vec![Finding::NoResponse {
                commands: commands_of(&script.probe),
            }]);
        }

        let mut answered = false;
        for step in &script.commands {
            answered |= !self.send_command(&step.command, step.wait())?.trim().is_empty();
        }

        if script.probe.is_empty() && !script.commands.is_empty() && !answered {
            log::warn!("No response to any of {} commands", script.commands.len());
            return Ok(vec![Finding::NoResponse {
                commands: commands_of(&script.commands),
            }]);
        }

        Ok(Vec::new())
    }

    /// Try the steps in order until one gets a response
    fn any_answered(&mut self, steps: &[CommandStep]) -> Result<bool, ProbeError> {
        for step in steps {
            if !self.send_command(&step.command, step.wait())?.trim().is_empty() {
                return Ok(true);
            }
        }

        Ok(false)
    }

    pub fn exchanges(&self) -> &[Exchange] {
        &self.exchanges
    }

    pub fn into_exchanges(self) -> Vec<Exchange> {
        self.exchanges
    }

    fn record(&mut self, kind: ExchangeKind, command: Option<&str>, response: &str) {
        self.exchanges.push(Exchange {
            kind,
            command: command.map(str::to_string),
            response: response.to_string(),
        });
    }

    fn collect_for(&mut self, duration: Duration) -> io::Result<String> {
        let deadline = Instant::now() + duration;
        let mut received = Vec::new();
        let mut buf = [0u8; READ_CHUNK];

        loop {
            let now = Instant::now();
            if now >= deadline {
                break;
            }

            let available = self.console.bytes_available()?;
            if available == 0 {
                std::thread::sleep(self.options.poll_interval.min(deadline - now));
                continue;
            }

            match self.console.read(&mut buf[..available.min(READ_CHUNK)]) {
                Ok(n) => received.extend_from_slice(&buf[..n]),
                Err(e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::TimedOut
                            | io::ErrorKind::WouldBlock
                            | io::ErrorKind::Interrupted
                    ) => {}
                Err(e) => return Err(e),
            }
        }

        log::trace!("Received {} bytes", received.len());
        Ok(strip_ansi(&String::from_utf8_lossy(&received)).into_owned())
    }
}

fn commands_of(steps: &[CommandStep]) -> Vec<String> {
    steps.iter().map(|s| s.command.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::VecDeque;
    use std::io::{Read, Write};

    /// Echoes a fixed reply to every line written, or stays silent
    #[derive(Default)]
    struct FixedReply {
        reply: Vec<u8>,
        pending: VecDeque<u8>,
        written: Vec<u8>,
        fail_writes: bool,
    }

    impl Read for FixedReply {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = buf.len().min(self.pending.len());
            for (slot, byte) in buf.iter_mut().zip(self.pending.drain(..n)) {
                *slot = byte;
            }
            Ok(n)
        }
    }

    impl Write for FixedReply {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.fail_writes {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged"));
            }
            self.written.extend_from_slice(buf);
            if buf.ends_with(b"\n") {
                self.pending.extend(self.reply.iter().copied());
            }
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Console for FixedReply {
        fn clear_input(&mut self) -> io::Result<()> {
            self.pending.clear();
            Ok(())
        }

        fn bytes_available(&mut self) -> io::Result<usize> {
            Ok(self.pending.len())
        }
    }

    fn fast_options() -> SessionOptions {
        SessionOptions {
            poll_interval: Duration::from_millis(1),
            wake_repeats: 3,
            wake_gap: Duration::ZERO,
            wake_listen: Duration::from_millis(5),
        }
    }

    #[test]
    fn command_is_line_terminated_and_response_cleaned() -> anyhow::Result<()> {
        let console = FixedReply {
            reply: b"\x1b[1;32mleader\x1b[0m\r\nDone\r\n".to_vec(),
            ..Default::default()
        };
        let mut session = Session::new(console, fast_options());

        let response = session.send_command("ot state", Duration::from_millis(10))?;

        assert_eq!(response, "leader\r\nDone\r\n");
        assert_eq!(session.console.written, b"ot state\r\n");
        assert_eq!(session.exchanges().len(), 1);
        assert_eq!(session.exchanges()[0].kind, ExchangeKind::Command);
        Ok(())
    }

    #[test]
    fn invalid_utf8_is_replaced() -> anyhow::Result<()> {
        let console = FixedReply {
            reply: vec![b'o', b'k', 0xff],
            ..Default::default()
        };
        let mut session = Session::new(console, fast_options());

        assert_eq!(
            session.send_command("x", Duration::from_millis(10))?,
            "ok\u{fffd}"
        );
        Ok(())
    }

    #[test]
    fn stale_input_is_dropped_before_sending() -> anyhow::Result<()> {
        let console = FixedReply {
            pending: b"boot log".iter().copied().collect(),
            ..Default::default()
        };
        let mut session = Session::new(console, fast_options());

        assert_eq!(session.send_command("help", Duration::from_millis(5))?, "");
        Ok(())
    }

    #[test]
    fn wake_sends_bare_line_endings() -> anyhow::Result<()> {
        let console = FixedReply {
            reply: b"uart:~$ ".to_vec(),
            ..Default::default()
        };
        let mut session = Session::new(console, fast_options());

        let banner = session.wake()?;

        assert_eq!(session.console.written, b"\r\n\r\n\r\n");
        assert_eq!(banner, "uart:~$ uart:~$ uart:~$ ");
        Ok(())
    }

    #[test]
    fn silent_device_is_a_finding() {
        let mut session = Session::new(FixedReply::default(), fast_options());
        let script = ProbeScript {
            name: "test".to_string(),
            wake: false,
            hold_reset_lines_low: false,
            probe: vec![CommandStep::new("kernel version", 5)],
            listen_ms: 5,
            commands: vec![CommandStep::new("ot state", 5)],
        };

        let findings = session.run_script(&script);

        assert_eq!(
            findings,
            vec![Finding::NoResponse {
                commands: vec!["kernel version".to_string()],
            }]
        );
        // The commands are skipped, the session listens instead
        let kinds = session
            .exchanges()
            .iter()
            .map(|e| e.kind)
            .collect::<Vec<_>>();
        assert_eq!(kinds, vec![ExchangeKind::Command, ExchangeKind::Listen]);
        assert!(findings[0].to_string().starts_with("no response"));
    }

    #[test]
    fn write_failure_ends_session_with_finding() {
        let console = FixedReply {
            fail_writes: true,
            ..Default::default()
        };
        let mut session = Session::new(console, fast_options());

        let findings = session.run_script(&ProbeScript::quick());

        assert_eq!(findings.len(), 1);
        assert!(matches!(findings[0], Finding::ConsoleError { .. }));
        assert!(session.exchanges().is_empty());
    }
}
