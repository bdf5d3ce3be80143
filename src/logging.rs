//! Tracing setup with bot-token redaction
//!
//! teloxide includes the full request URL (and therefore the bot token) in
//! some error messages. Every formatted log line passes through
//! [`Redactor`] before it reaches stderr.

use regex::Regex;
use std::io::{self, Write};
use std::sync::Arc;
use tracing_subscriber::{prelude::*, EnvFilter};

/// Regex-based scrubber for secrets in log output
pub struct Redactor {
    rules: Vec<(Regex, &'static str)>,
}

impl Redactor {
    /// Compile the redaction rules.
    ///
    /// # Errors
    ///
    /// Returns an error if any regex pattern is invalid.
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            rules: vec![
                // https://api.telegram.org/bot<token>/method
                (
                    Regex::new(r"(https?://[^/]+/bot)([0-9]+:[A-Za-z0-9_-]+)")?,
                    "${1}[TELEGRAM_TOKEN]",
                ),
                // Bare tokens
                (
                    Regex::new(r"\b[0-9]{8,10}:[A-Za-z0-9_-]{35}\b")?,
                    "[TELEGRAM_TOKEN]",
                ),
                (
                    Regex::new(r"((?:BOT|TELEGRAM)_TOKEN=)[^\s&]+")?,
                    "${1}[MASKED]",
                ),
            ],
        })
    }

    /// Replace every secret in `input`.
    #[must_use]
    pub fn redact(&self, input: &str) -> String {
        self.rules
            .iter()
            .fold(input.to_string(), |text, (pattern, replacement)| {
                pattern.replace_all(&text, *replacement).into_owned()
            })
    }
}

struct RedactingWriter<W: Write> {
    inner: W,
    redactor: Arc<Redactor>,
}

impl<W: Write> Write for RedactingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let s = String::from_utf8_lossy(buf);
        self.inner
            .write_all(self.redactor.redact(&s).as_bytes())?;
        // Report the original length; the redacted text may differ in size.
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

struct RedactingMakeWriter<F> {
    make_inner: F,
    redactor: Arc<Redactor>,
}

impl<'a, F, W> tracing_subscriber::fmt::MakeWriter<'a> for RedactingMakeWriter<F>
where
    F: Fn() -> W + 'static,
    W: Write,
{
    type Writer = RedactingWriter<W>;

    fn make_writer(&'a self) -> Self::Writer {
        RedactingWriter {
            inner: (self.make_inner)(),
            redactor: self.redactor.clone(),
        }
    }
}

/// Install the global subscriber writing redacted output to stderr.
///
/// The filter comes from `RUST_LOG` and defaults to `info`.
pub fn init(redactor: Arc<Redactor>) {
    let make_writer = RedactingMakeWriter {
        make_inner: io::stderr,
        redactor,
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(make_writer))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN: &str = "123456789:AAHdqTcvCH1vGWJxfSeofSAs0K5PALDsawq";

    #[test]
    fn test_redacts_api_url() {
        let r = Redactor::new().unwrap();
        let line = format!("error sending request for url (https://api.telegram.org/bot{TOKEN}/getUpdates)");
        let out = r.redact(&line);
        assert!(!out.contains(TOKEN));
        assert!(out.contains("https://api.telegram.org/bot[TELEGRAM_TOKEN]/getUpdates"));
    }

    #[test]
    fn test_redacts_bare_token_and_env_assignment() {
        let r = Redactor::new().unwrap();
        assert_eq!(r.redact(&format!("token {TOKEN} leaked")), "token [TELEGRAM_TOKEN] leaked");
        assert_eq!(r.redact("BOT_TOKEN=abc:def rest"), "BOT_TOKEN=[MASKED] rest");
    }

    #[test]
    fn test_plain_text_untouched() {
        let r = Redactor::new().unwrap();
        let line = "Recorded message from alice in group -100123";
        assert_eq!(r.redact(line), line);
    }

    #[test]
    fn test_writer_reports_original_length() {
        let redactor = Arc::new(Redactor::new().unwrap());
        let mut writer = RedactingWriter {
            inner: Vec::new(),
            redactor,
        };
        let input = format!("x {TOKEN}\n");
        let written = writer.write(input.as_bytes()).unwrap();
        assert_eq!(written, input.len());
        assert_eq!(String::from_utf8(writer.inner).unwrap(), "x [TELEGRAM_TOKEN]\n");
    }
}
