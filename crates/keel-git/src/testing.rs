//! Scripted command runner for driver tests.

use std::collections::VecDeque;

use async_trait::async_trait;
use keel_core::VcsError;
use parking_lot::Mutex;

use crate::command::{CommandOutput, CommandRunner, GitCommand, PipedOutput};

/// Replays queued results in order and records every command it is given.
///
/// An exhausted queue answers with an empty successful output.
#[derive(Default)]
pub(crate) struct ScriptedRunner {
    outputs: Mutex<VecDeque<Result<CommandOutput, VcsError>>>,
    piped: Mutex<VecDeque<Result<PipedOutput, VcsError>>>,
    commands: Mutex<Vec<GitCommand>>,
}

impl ScriptedRunner {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&self, output: CommandOutput) {
        self.outputs.lock().push_back(Ok(output));
    }

    pub(crate) fn push_error(&self, error: VcsError) {
        self.outputs.lock().push_back(Err(error));
    }

    pub(crate) fn push_piped(&self, output: PipedOutput) {
        self.piped.lock().push_back(Ok(output));
    }

    pub(crate) fn push_piped_error(&self, error: VcsError) {
        self.piped.lock().push_back(Err(error));
    }

    /// Rendered command lines, in call order.
    pub(crate) fn calls(&self) -> Vec<String> {
        self.commands.lock().iter().map(ToString::to_string).collect()
    }

    pub(crate) fn commands(&self) -> Vec<GitCommand> {
        self.commands.lock().clone()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, command: &GitCommand) -> Result<CommandOutput, VcsError> {
        self.commands.lock().push(command.clone());
        self.outputs
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(CommandOutput::ok("")))
    }

    async fn run_piped(
        &self,
        producer: &GitCommand,
        consumer: &GitCommand,
    ) -> Result<PipedOutput, VcsError> {
        {
            let mut commands = self.commands.lock();
            commands.push(producer.clone());
            commands.push(consumer.clone());
        }
        self.piped.lock().pop_front().unwrap_or_else(|| {
            Ok(PipedOutput {
                producer: CommandOutput::ok(""),
                consumer: CommandOutput::ok(""),
            })
        })
    }
}
