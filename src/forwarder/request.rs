use serde_json::Value;

/// Position in the two-step attempt sequence of a forwarded call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    First,
    Retried,
}

impl Attempt {
    /// Number of retries performed so far.
    pub fn count(self) -> u8 {
        match self {
            Attempt::First => 0,
            Attempt::Retried => 1,
        }
    }

    /// There is no attempt after `Retried`.
    pub fn next(self) -> Option<Attempt> {
        match self {
            Attempt::First => Some(Attempt::Retried),
            Attempt::Retried => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Attempt::First => "first",
            Attempt::Retried => "retried",
        }
    }
}

/// One downstream business call.
#[derive(Debug, Clone)]
pub struct ForwardRequest {
    endpoint: String,
    payload: Value,
    attempt: Attempt,
    used_token: Option<String>,
}

impl ForwardRequest {
    pub fn new(endpoint: impl Into<String>, payload: Value) -> Self {
        Self {
            endpoint: endpoint.into(),
            payload,
            attempt: Attempt::First,
            used_token: None,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn attempt(&self) -> Attempt {
        self.attempt
    }

    pub fn attempt_count(&self) -> u8 {
        self.attempt.count()
    }

    /// Token presented on the latest attempt.
    pub fn used_token(&self) -> Option<&str> {
        self.used_token.as_deref()
    }

    pub(crate) fn present(&mut self, token: &str) {
        self.used_token = Some(token.to_owned());
    }

    /// Move to the retry attempt. `None` once the retry has been spent.
    pub(crate) fn advance(&mut self) -> Option<Attempt> {
        let next = self.attempt.next()?;
        self.attempt = next;
        Some(next)
    }
}
