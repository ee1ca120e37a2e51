/// A model the assistant can be pointed at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Model {
    pub id: String,
    pub description: Option<String>,
}

impl Model {
    pub fn from_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Label used in model pickers: the id, followed by the description when present.
    pub fn label(&self) -> String {
        match &self.description {
            Some(description) => format!("{} ({description})", self.id),
            None => self.id.clone(),
        }
    }
}

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// Models offered when the user has not configured any.
pub fn default_openai_models() -> Vec<Model> {
    vec![
        Model::from_id(DEFAULT_OPENAI_MODEL).with_description("quick label questions"),
        Model::from_id("gpt-4o").with_description("detailed ingredient analysis"),
        Model::from_id("gpt-4.1").with_description("long product comparisons"),
    ]
}
