/*
 * Test utilities for Hush
 *
 * A scripted command executor that answers by substring match and records
 * every command line it was asked to run.
 */

#[cfg(test)]
pub mod test_utils {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use crate::system::executor::{
        CommandExecutor, CommandOutput, ExecError, IpmiInterface, IpmiTool,
    };

    enum Reply {
        Stdout(String),
        Fail(String),
    }

    #[derive(Default)]
    pub struct ScriptedExecutor {
        rules: Mutex<Vec<(String, Reply)>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedExecutor {
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        /// Answer commands containing `pattern` with `stdout`. Earlier rules win.
        pub fn on(self: &Arc<Self>, pattern: &str, stdout: &str) -> Arc<Self> {
            let reply = Reply::Stdout(stdout.to_string());
            self.rules.lock().unwrap().push((pattern.to_string(), reply));
            Arc::clone(self)
        }

        /// Fail commands containing `pattern` with a non-zero exit.
        pub fn fail(self: &Arc<Self>, pattern: &str, stderr: &str) -> Arc<Self> {
            self.rules.lock().unwrap().push((pattern.to_string(), Reply::Fail(stderr.to_string())));
            Arc::clone(self)
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        pub fn count(&self, pattern: &str) -> usize {
            self.calls().iter().filter(|c| c.contains(pattern)).count()
        }
    }

    #[async_trait]
    impl CommandExecutor for ScriptedExecutor {
        async fn run(&self, command: &str) -> Result<CommandOutput, ExecError> {
            self.calls.lock().unwrap().push(command.to_string());

            let rules = self.rules.lock().unwrap();
            match rules.iter().find(|(pattern, _)| command.contains(pattern.as_str())) {
                Some((_, Reply::Stdout(out))) => Ok(CommandOutput::new(out.clone())),
                Some((_, Reply::Fail(err))) => Err(ExecError::Failed {
                    command: command.to_string(),
                    code: Some(1),
                    stderr: err.clone(),
                }),
                None => Err(ExecError::Failed {
                    command: command.to_string(),
                    code: Some(127),
                    stderr: "no scripted reply".to_string(),
                }),
            }
        }
    }

    /// In-band ipmitool front-end over a scripted shell.
    pub fn local_ipmi(shell: &Arc<ScriptedExecutor>) -> IpmiTool {
        IpmiTool::new(shell.clone(), IpmiInterface::Local)
    }
}
