#![allow(dead_code)]

use lustre_bench::exec::{CommandRunner, CommandSpec};
use lustre_bench::{LustreBenchError, Result};
use std::sync::Mutex;
use std::time::Duration;

/// Stand-in for the system runner.
///
/// Records every command. `dd` sleeps briefly so timings are nonzero and
/// creates its `of=` file when that is a real path. `lfs` returns canned
/// text. The Nth command (0-based) can be made to fail.
#[derive(Default)]
pub struct ScriptedRunner {
    commands: Mutex<Vec<CommandSpec>>,
    fail_at: Option<(usize, String)>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_at(index: usize, stderr: &str) -> Self {
        Self {
            commands: Mutex::new(Vec::new()),
            fail_at: Some((index, stderr.to_string())),
        }
    }

    pub fn commands(&self) -> Vec<CommandSpec> {
        self.commands.lock().unwrap().clone()
    }

    pub fn argvs(&self) -> Vec<Vec<String>> {
        self.commands().iter().map(CommandSpec::argv).collect()
    }

    pub fn count_program(&self, program: &str) -> usize {
        self.argvs().iter().filter(|a| a[0] == program).count()
    }
}

impl CommandRunner for ScriptedRunner {
    async fn run(&self, command: &CommandSpec) -> Result<String> {
        let index = {
            let mut commands = self.commands.lock().unwrap();
            commands.push(command.clone());
            commands.len() - 1
        };

        if let Some((fail_index, stderr)) = &self.fail_at {
            if *fail_index == index {
                return Err(LustreBenchError::CommandExecution {
                    command: command.to_string(),
                    exit_code: Some(1),
                    stderr: stderr.clone(),
                });
            }
        }

        let argv = command.argv();
        match argv[0].as_str() {
            "dd" => {
                if let Some(of) = command.operand("of").filter(|of| of != "/dev/null") {
                    std::fs::write(of, b"").unwrap();
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
                Ok(String::new())
            }
            "lfs" if argv[1] == "getstripe" => Ok(format!(
                "{}\nstripe_count:  1 stripe_size:   1048576 stripe_offset: -1\n",
                argv[2]
            )),
            "lfs" if argv[1] == "df" => Ok(
                "UUID                 bytes   Used  Available Use% Mounted on\n\
                 scratch-OST0000_UUID 7.2T    1.1T  6.1T      15%  /scratch[OST:0]\n"
                    .to_string(),
            ),
            _ => Ok(String::new()),
        }
    }
}
