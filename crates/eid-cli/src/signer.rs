//! Wallet stand-in for the terminal.
//!
//! The CLI cannot drive a browser wallet, so signing is delegated to the
//! user: the nonce is printed (raw and base64, the form `sui keytool sign
//! --data` expects) and the signature is read back from a line of input.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use eid_sdk::{SignRejected, SignedMessage, WalletAccount, WalletCapability};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

type Input = Box<dyn AsyncBufRead + Unpin + Send>;
type Output = Box<dyn AsyncWrite + Unpin + Send>;

/// Signs by asking whoever sits at the terminal.
pub struct ExternalSigner {
    account: WalletAccount,
    io: Mutex<(Input, Output)>,
}

impl ExternalSigner {
    /// Prompt on stderr, read the signature from stdin.
    pub fn stdio(account: WalletAccount) -> Self {
        Self::new(
            account,
            Box::new(tokio::io::BufReader::new(tokio::io::stdin())),
            Box::new(tokio::io::stderr()),
        )
    }

    pub fn new(account: WalletAccount, input: Input, output: Output) -> Self {
        Self {
            account,
            io: Mutex::new((input, output)),
        }
    }
}

#[async_trait]
impl WalletCapability for ExternalSigner {
    fn current_account(&self) -> Option<WalletAccount> {
        Some(self.account.clone())
    }

    async fn sign_personal_message(&self, message: &[u8]) -> Result<SignedMessage, SignRejected> {
        let mut io = self.io.lock().await;
        let (input, output) = &mut *io;

        let prompt = format!(
            "Sign this message with {}:\n  text:   {}\n  base64: {}\nSignature (empty line to cancel): ",
            self.account.address,
            String::from_utf8_lossy(message),
            STANDARD.encode(message),
        );
        output
            .write_all(prompt.as_bytes())
            .await
            .map_err(|e| SignRejected(format!("could not prompt for a signature: {e}")))?;
        output
            .flush()
            .await
            .map_err(|e| SignRejected(format!("could not prompt for a signature: {e}")))?;

        let mut line = String::new();
        let read = input
            .read_line(&mut line)
            .await
            .map_err(|e| SignRejected(format!("could not read the signature: {e}")))?;

        let signature = line.trim();
        if read == 0 || signature.is_empty() {
            return Err(SignRejected("Signing cancelled".to_string()));
        }
        Ok(SignedMessage {
            signature: signature.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> WalletAccount {
        WalletAccount::on_chain("0xabc", "sui:testnet".parse().unwrap())
    }

    fn signer(input: &'static [u8]) -> ExternalSigner {
        ExternalSigner::new(account(), Box::new(input), Box::new(tokio::io::sink()))
    }

    #[tokio::test]
    async fn reads_trimmed_signature() {
        let signer = signer(b"  AQID==  \n");
        let signed = signer.sign_personal_message(b"n1").await.unwrap();
        assert_eq!(signed.signature, "AQID==");
    }

    #[tokio::test]
    async fn blank_line_cancels() {
        let err = signer(b"\n").sign_personal_message(b"n1").await.unwrap_err();
        assert_eq!(err.to_string(), "Signing cancelled");
    }

    #[tokio::test]
    async fn closed_input_cancels() {
        let err = signer(b"").sign_personal_message(b"n1").await.unwrap_err();
        assert_eq!(err.0, "Signing cancelled");
    }

    #[tokio::test]
    async fn one_line_per_request() {
        let signer = signer(b"first\nsecond\n");
        assert_eq!(signer.sign_personal_message(b"a").await.unwrap().signature, "first");
        assert_eq!(signer.sign_personal_message(b"b").await.unwrap().signature, "second");
    }

    #[test]
    fn exposes_configured_account() {
        assert_eq!(signer(b"").current_account(), Some(account()));
    }
}
