/// Who said an earlier turn of the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Speaker {
    User,
    Assistant,
}

/// One earlier turn sent along as context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Assistant,
            text: text.into(),
        }
    }
}

/// A question for the assistant: the new prompt plus the turns before it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub model_id: String,
    pub preamble: String,
    pub history: Vec<Turn>,
    pub prompt: String,
    pub max_tokens: Option<u64>,
}

impl ChatRequest {
    pub fn new(model_id: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            preamble: String::new(),
            history: Vec::new(),
            prompt: prompt.into(),
            max_tokens: None,
        }
    }

    pub fn with_preamble(mut self, preamble: impl Into<String>) -> Self {
        self.preamble = preamble.into();
        self
    }

    pub fn with_history(mut self, history: impl IntoIterator<Item = Turn>) -> Self {
        self.history = history.into_iter().collect();
        self
    }

    /// Caps the reply length. `None` leaves the provider default.
    pub fn with_max_tokens(mut self, max_tokens: Option<u64>) -> Self {
        self.max_tokens = max_tokens.filter(|limit| *limit > 0);
        self
    }

    /// True when there is nothing to ask.
    pub fn is_blank(&self) -> bool {
        self.prompt.trim().is_empty()
    }
}
