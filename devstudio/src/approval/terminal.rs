//! Approval prompt on an interactive terminal.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::io::{BufRead, BufReader, Write};
use std::sync::Arc;
use tokio::sync::oneshot;

use super::{ApprovalDecision, ApprovalNotifier, ApprovalRequest, NotifierError};

type Input = Arc<Mutex<Box<dyn BufRead + Send>>>;
type Output = Arc<Mutex<Box<dyn Write + Send>>>;

/// Asks a human on a terminal and reads a `y`/`n` answer.
///
/// The prompt is written and flushed up front; the answer is read on a
/// detached thread so a timed-out or cancelled wait never holds the output
/// stream or the runtime. An abandoned reader keeps the input until the next
/// line or end of input.
#[derive(Clone)]
pub struct TerminalNotifier {
    input: Input,
    output: Output,
}

impl TerminalNotifier {
    /// Prompts on stderr and reads answers from stdin.
    #[must_use]
    pub fn stdio() -> Self {
        Self::with_io(BufReader::new(std::io::stdin()), std::io::stderr())
    }

    /// Prompts on `output` and reads answers from `input`.
    #[must_use]
    pub fn with_io(
        input: impl BufRead + Send + 'static,
        output: impl Write + Send + 'static,
    ) -> Self {
        Self {
            input: Arc::new(Mutex::new(Box::new(input))),
            output: Arc::new(Mutex::new(Box::new(output))),
        }
    }

    fn write_prompt(&self, request: &ApprovalRequest) -> Result<(), NotifierError> {
        let payload = serde_json::to_string_pretty(&request.payload).map_err(transport)?;
        let prompt = format!(
            "\n[{}] {}\n{payload}\nApprove? [y/N] ",
            request.stage, request.message
        );

        let mut output = self.output.lock();
        output
            .write_all(prompt.as_bytes())
            .and_then(|()| output.flush())
            .map_err(transport)
    }
}

impl std::fmt::Debug for TerminalNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalNotifier").finish_non_exhaustive()
    }
}

#[async_trait]
impl ApprovalNotifier for TerminalNotifier {
    async fn request_decision(
        &self,
        request: &ApprovalRequest,
    ) -> Result<ApprovalDecision, NotifierError> {
        self.write_prompt(request)?;

        let (answer_tx, answer_rx) = oneshot::channel();
        let input = Arc::clone(&self.input);
        std::thread::Builder::new()
            .name("approval-prompt".to_string())
            .spawn(move || {
                let mut reader = input.lock();
                let _ = answer_tx.send(read_answer(reader.as_mut()));
            })
            .map_err(transport)?;

        answer_rx.await.map_err(|_| NotifierError::Closed)?
    }
}

fn read_answer(input: &mut dyn BufRead) -> Result<ApprovalDecision, NotifierError> {
    let mut answer = String::new();
    if input.read_line(&mut answer).map_err(transport)? == 0 {
        return Err(NotifierError::Closed);
    }

    match answer.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => Ok(ApprovalDecision::Approved),
        _ => Ok(ApprovalDecision::rejected(Some(
            "declined at terminal".to_string(),
        ))),
    }
}

fn transport(e: impl std::fmt::Display) -> NotifierError {
    NotifierError::Transport(e.to_string())
}
