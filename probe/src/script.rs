use crate::ProbeError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// One shell command and how long to collect its response for
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommandStep {
    pub command: String,
    #[serde(default = "default_wait_ms")]
    pub wait_ms: u64,
}

fn default_wait_ms() -> u64 {
    2000
}

impl CommandStep {
    pub fn new(command: impl Into<String>, wait_ms: u64) -> Self {
        Self {
            command: command.into(),
            wait_ms,
        }
    }

    pub fn wait(&self) -> Duration {
        Duration::from_millis(self.wait_ms)
    }
}

/// A fixed sequence of status queries to run against the device shell.
///
/// The `probe` commands are tried in order until one gets a response. When none does the device is
/// assumed to be stuck, the session listens for `listen_ms` to catch anything it still prints and
/// `commands` are skipped. Without probe commands, `commands` always run.
///
/// A script file is TOML, e.g.
///
/// ```toml
/// name = "radio"
///
/// [[probe]]
/// command = "kernel version"
///
/// [[commands]]
/// command = "ot channel"
/// wait_ms = 1000
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ProbeScript {
    pub name: String,
    /// Send bare line endings first to wake the shell
    #[serde(default = "default_true")]
    pub wake: bool,
    /// Open the port with DTR and RTS held low so the board is not reset
    #[serde(default)]
    pub hold_reset_lines_low: bool,
    #[serde(default)]
    pub probe: Vec<CommandStep>,
    #[serde(default = "default_listen_ms")]
    pub listen_ms: u64,
    #[serde(default)]
    pub commands: Vec<CommandStep>,
}

fn default_true() -> bool {
    true
}

fn default_listen_ms() -> u64 {
    5000
}

/// OpenThread status queries, in the order they are worth reading
fn thread_status_commands() -> Vec<CommandStep> {
    vec![
        CommandStep::new("ot state", 3000),
        CommandStep::new("ot channel", 2000),
        CommandStep::new("ot panid", 2000),
        CommandStep::new("ot networkname", 2000),
        CommandStep::new("ot ipaddr", 3000),
        CommandStep::new("ot ifconfig", 2000),
        CommandStep::new("ot thread", 2000),
    ]
}

impl ProbeScript {
    /// Thread network state and an LwM2M self read, without waking or probing the shell
    pub fn quick() -> Self {
        let mut commands = vec![
            CommandStep::new("ot state", 2000),
            CommandStep::new("ot role", 2000),
            CommandStep::new("ot dataset active", 2000),
        ];
        commands.extend(
            thread_status_commands()
                .into_iter()
                .skip(1)
                .map(|step| CommandStep::new(step.command, 2000)),
        );
        commands.push(CommandStep::new("lwm2m read 0/0/0 -s", 2000));

        Self {
            name: "quick".to_string(),
            wake: false,
            hold_reset_lines_low: false,
            probe: Vec::new(),
            listen_ms: default_listen_ms(),
            commands,
        }
    }

    /// Check the shell answers before querying the Thread state
    pub fn full() -> Self {
        Self {
            name: "full".to_string(),
            wake: true,
            hold_reset_lines_low: false,
            probe: vec![
                CommandStep::new("kernel version", 3000),
                CommandStep::new("help", 3000),
            ],
            listen_ms: default_listen_ms(),
            commands: thread_status_commands(),
        }
    }

    /// Query a running board without resetting it
    pub fn passive() -> Self {
        let mut commands = vec![CommandStep::new("kernel version", 2000)];
        commands.extend(thread_status_commands());
        commands.push(CommandStep::new("kernel uptime", 2000));

        Self {
            name: "passive".to_string(),
            wake: true,
            hold_reset_lines_low: true,
            probe: Vec::new(),
            listen_ms: default_listen_ms(),
            commands,
        }
    }

    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            "quick" => Some(Self::quick()),
            "full" => Some(Self::full()),
            "passive" => Some(Self::passive()),
            _ => None,
        }
    }

    pub fn load(path: &Path) -> Result<Self, ProbeError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ProbeError> {
        Ok(toml::from_str(content)?)
    }

    pub fn listen(&self) -> Duration {
        Duration::from_millis(self.listen_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn commands(steps: &[CommandStep]) -> Vec<&str> {
        steps.iter().map(|s| s.command.as_str()).collect()
    }

    #[test]
    fn quick_ends_with_lwm2m_read() {
        let script = ProbeScript::quick();
        assert_eq!(
            commands(&script.commands),
            vec![
                "ot state",
                "ot role",
                "ot dataset active",
                "ot channel",
                "ot panid",
                "ot networkname",
                "ot ipaddr",
                "ot ifconfig",
                "ot thread",
                "lwm2m read 0/0/0 -s",
            ]
        );
        assert!(script.probe.is_empty());
    }

    #[test]
    fn full_probes_before_thread_commands() {
        let script = ProbeScript::full();
        assert_eq!(commands(&script.probe), vec!["kernel version", "help"]);
        assert_eq!(script.commands[0], CommandStep::new("ot state", 3000));
    }

    #[test]
    fn passive_holds_reset_lines() {
        let script = ProbeScript::passive();
        assert!(script.hold_reset_lines_low);
        assert_eq!(
            script.commands.last().map(|s| s.command.as_str()),
            Some("kernel uptime")
        );
    }

    #[test]
    fn unknown_builtin() {
        assert_eq!(ProbeScript::builtin("verbose"), None);
        assert_eq!(ProbeScript::builtin("full"), Some(ProbeScript::full()));
    }

    #[test]
    fn custom_script_from_toml() -> anyhow::Result<()> {
        let script = ProbeScript::from_toml_str(
            r#"
            name = "radio"

            [[probe]]
            command = "kernel version"

            [[commands]]
            command = "ot channel"
            wait_ms = 1000
            "#,
        )?;

        assert_eq!(script.name, "radio");
        assert!(script.wake);
        assert!(!script.hold_reset_lines_low);
        assert_eq!(script.probe, vec![CommandStep::new("kernel version", 2000)]);
        assert_eq!(script.commands, vec![CommandStep::new("ot channel", 1000)]);
        assert_eq!(script.listen(), Duration::from_secs(5));
        Ok(())
    }

    #[test]
    fn unknown_field_is_rejected() {
        assert!(ProbeScript::from_toml_str("name = \"x\"\nretries = 3\n").is_err());
    }
}
