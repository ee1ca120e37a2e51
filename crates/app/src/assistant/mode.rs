use serde::{Deserialize, Serialize};

const CONVERSATIONAL_PREAMBLE: &str = "You are NutriLens, a friendly assistant for questions about \
food products, ingredients and healthy eating. Answer concisely and say when a claim depends on \
the exact product label.";

const HEALTH_ANALYSIS_PREAMBLE: &str = "You are NutriLens in health-analysis mode. Evaluate food \
products per 100g: call out sodium, calories, sugar, protein, fiber and additives, rate each as \
good, moderate or poor, and keep the verdict short.";

/// Which sub-tree the assistant panel shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssistantMode {
    #[default]
    Conversational,
    HealthAnalysis,
}

impl AssistantMode {
    pub const ALL: [AssistantMode; 2] = [Self::Conversational, Self::HealthAnalysis];

    pub fn label(self) -> &'static str {
        match self {
            Self::Conversational => "Chat",
            Self::HealthAnalysis => "Health Analysis",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Conversational => "AI Assistant",
            Self::HealthAnalysis => "Health Analysis",
        }
    }

    /// System preamble sent with every provider request in this mode.
    pub fn preamble(self) -> &'static str {
        match self {
            Self::Conversational => CONVERSATIONAL_PREAMBLE,
            Self::HealthAnalysis => HEALTH_ANALYSIS_PREAMBLE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modes_serialize_as_kebab_case() {
        let encoded = serde_json::to_string(&AssistantMode::HealthAnalysis).ok();
        assert_eq!(encoded.as_deref(), Some("\"health-analysis\""));

        let decoded = serde_json::from_str::<AssistantMode>("\"conversational\"").ok();
        assert_eq!(decoded, Some(AssistantMode::Conversational));
    }

    #[test]
    fn each_mode_has_a_distinct_preamble() {
        assert_ne!(
            AssistantMode::Conversational.preamble(),
            AssistantMode::HealthAnalysis.preamble()
        );
        assert!(AssistantMode::HealthAnalysis.preamble().contains("per 100g"));
    }
}
