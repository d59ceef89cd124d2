use std::error::Error as StdError;
use std::fmt;

/// Maximum number of cause segments rendered by [`Error::descriptive_string`].
/// Chains longer than this are truncated with a marker so rendering
/// terminates even if an upstream `source()` implementation aliases itself.
pub const MAX_CAUSE_DEPTH: usize = 32;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Domain {
    Config,
    Notice,
}

impl Domain {
    pub fn as_str(self) -> &'static str {
        match self {
            Domain::Config => "config-error",
            Domain::Notice => "notice-error",
        }
    }
}

/// Closed code set for the config codec. Wire codes 1-2.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConfigCode {
    DecodeFailed = 1,
    EncodeFailed = 2,
}

/// Closed code set for the notice codec. Wire codes 101-105, disjoint from
/// the config range.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NoticeCode {
    EncodeUtf8Failed = 101,
    DecodeUtf8Failed = 102,
    DecodeJsonFailed = 103,
    EncodeJsonFailed = 104,
    DataMissing = 105,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    Config(ConfigCode),
    Notice(NoticeCode),
}

impl ErrorKind {
    pub fn domain(self) -> Domain {
        match self {
            ErrorKind::Config(_) => Domain::Config,
            ErrorKind::Notice(_) => Domain::Notice,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            ErrorKind::Config(code) => code as i32,
            ErrorKind::Notice(code) => code as i32,
        }
    }

    /// Stable fallback text used when an error carries no explicit message.
    pub fn default_message(self) -> &'static str {
        match self {
            ErrorKind::Config(ConfigCode::DecodeFailed) => "decoding config failed",
            ErrorKind::Config(ConfigCode::EncodeFailed) => "encoding config failed",
            ErrorKind::Notice(NoticeCode::EncodeUtf8Failed) => "encoding notice text failed",
            ErrorKind::Notice(NoticeCode::DecodeUtf8Failed) => "decoding notice text failed",
            ErrorKind::Notice(NoticeCode::DecodeJsonFailed) => "decoding notice json failed",
            ErrorKind::Notice(NoticeCode::EncodeJsonFailed) => "encoding notice json failed",
            ErrorKind::Notice(NoticeCode::DataMissing) => "notice data missing",
        }
    }
}

impl From<ConfigCode> for ErrorKind {
    fn from(code: ConfigCode) -> Self {
        ErrorKind::Config(code)
    }
}

impl From<NoticeCode> for ErrorKind {
    fn from(code: NoticeCode) -> Self {
        ErrorKind::Notice(code)
    }
}

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
    hint: Option<String>,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl Error {
    pub fn new(kind: impl Into<ErrorKind>) -> Self {
        Self {
            kind: kind.into(),
            message: None,
            hint: None,
            source: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn domain(&self) -> Domain {
        self.kind.domain()
    }

    pub fn code(&self) -> i32 {
        self.kind.code()
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Render this error and its full cause chain as one display string:
    /// `domain.code: message` followed by each cause's own display, outermost
    /// first. The walk is iterative and stops after [`MAX_CAUSE_DEPTH`]
    /// causes, appending a truncation marker instead of recursing forever.
    pub fn descriptive_string(&self) -> String {
        let mut out = self.to_string();
        let mut current = self.source();
        let mut depth = 0usize;
        while let Some(cause) = current {
            if depth == MAX_CAUSE_DEPTH {
                out.push_str(" (cause chain truncated)");
                break;
            }
            out.push(' ');
            out.push_str(&cause.to_string());
            current = cause.source();
            depth += 1;
        }
        out
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = self
            .message
            .as_deref()
            .unwrap_or_else(|| self.kind.default_message());
        write!(
            f,
            "{}.{}: {message}",
            self.kind.domain().as_str(),
            self.kind.code()
        )
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn StdError + 'static))
    }
}

pub fn to_exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::Config(ConfigCode::DecodeFailed) => 3,
        ErrorKind::Config(ConfigCode::EncodeFailed) => 4,
        ErrorKind::Notice(NoticeCode::EncodeUtf8Failed) => 5,
        ErrorKind::Notice(NoticeCode::DecodeUtf8Failed) => 6,
        ErrorKind::Notice(NoticeCode::DecodeJsonFailed) => 7,
        ErrorKind::Notice(NoticeCode::EncodeJsonFailed) => 8,
        ErrorKind::Notice(NoticeCode::DataMissing) => 9,
    }
}
