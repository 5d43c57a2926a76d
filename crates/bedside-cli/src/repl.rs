//! Interactive terminal chat over a single session.

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::warn;

use bedside_core::SessionService;

const PROMPT: &str = "Ask a question: ";

/// Read questions line by line until EOF or `/quit`.
///
/// `/reset` clears the session history. Blank lines are skipped. Replies are
/// printed as the model wrote them.
pub async fn run<R, W>(session: &SessionService, input: R, mut output: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    loop {
        output.write_all(PROMPT.as_bytes()).await?;
        output.flush().await?;

        let Some(line) = lines.next_line().await? else {
            output.write_all(b"\n").await?;
            break;
        };
        let question = line.trim();
        match question {
            "" => continue,
            "/quit" => break,
            "/reset" => {
                session.reset().await;
                output.write_all(b"History cleared.\n").await?;
            }
            _ => match session.handle(question).await {
                Ok(reply) => {
                    output
                        .write_all(format!("Chatbot: {}\n", reply.raw).as_bytes())
                        .await?;
                }
                Err(e) => {
                    warn!(error = %e, "chat turn failed");
                    output.write_all(format!("Error: {e}\n").as_bytes()).await?;
                }
            },
        }
    }
    output.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bedside_core::llm::LlmError;
    use bedside_test_utils::{StubCompletionClient, TestConfigBuilder, test_session};
    use pretty_assertions::assert_eq;

    #[test_log::test(tokio::test)]
    async fn test_conversation_transcript() {
        let config = TestConfigBuilder::new().build();
        let (session, _) = test_session(
            &config,
            StubCompletionClient::new().reply("Hello doctor.").reply("Since Monday."),
        );

        let mut out = Vec::new();
        run(&session, &b"hi\n\nsince when?\n/quit\n"[..], &mut out)
            .await
            .unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Ask a question: Chatbot: Hello doctor.\n\
             Ask a question: Ask a question: Chatbot: Since Monday.\n\
             Ask a question: "
        );
        assert_eq!(session.history().await.len(), 2);
    }

    #[test_log::test(tokio::test)]
    async fn test_reset_and_error_lines() {
        let config = TestConfigBuilder::new().build();
        let (session, _) = test_session(
            &config,
            StubCompletionClient::new().reply("ok").fail(LlmError::Timeout),
        );

        let mut out = Vec::new();
        run(&session, &b"one\n/reset\ntwo\n"[..], &mut out)
            .await
            .unwrap();

        let transcript = String::from_utf8(out).unwrap();
        assert!(transcript.contains("History cleared.\n"));
        assert!(transcript.contains("Error: completion failed: timeout\n"));
        assert!(session.history().await.is_empty());
    }
}
