use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use snafu::{ResultExt, Snafu};

const SAMPLE_PRODUCT_JSON: &str = include_str!("../../assets/sample_product.json");

/// Per-100g nutrient values. Missing values read as zero.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NutritionalInfo {
    #[serde(default)]
    pub salt_100g: Option<f64>,
    #[serde(default)]
    pub energy_100g: Option<f64>,
    #[serde(default)]
    pub proteins_100g: Option<f64>,
    #[serde(default)]
    pub fiber_100g: Option<f64>,
    #[serde(default)]
    pub sugars_100g: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdditiveRisk {
    Low,
    #[default]
    Moderate,
    High,
}

impl AdditiveRisk {
    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low risk",
            Self::Moderate => "Moderate risk",
            Self::High => "High risk",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Additive {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub risk: AdditiveRisk,
    #[serde(default)]
    pub description: String,
}

/// A scanned product with its nutrition facts and additives.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    #[serde(default)]
    pub nutritional_info: NutritionalInfo,
    #[serde(default)]
    pub additives: Vec<Additive>,
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ProductError {
    #[snafu(display("failed to read product file {path:?} on `{stage}`: {source}"))]
    ReadFile {
        stage: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("failed to parse product JSON on `{stage}`: {source}"))]
    ParseJson {
        stage: &'static str,
        source: serde_json::Error,
    },
}

impl Product {
    pub fn from_json_str(json: &str) -> Result<Self, ProductError> {
        serde_json::from_str(json).context(ParseJsonSnafu {
            stage: "parse-product-json",
        })
    }

    pub fn load(path: &Path) -> Result<Self, ProductError> {
        let content = std::fs::read_to_string(path).context(ReadFileSnafu {
            stage: "read-product-file",
            path: path.to_path_buf(),
        })?;
        Self::from_json_str(&content)
    }

    /// Product bundled with the app, shown when no product file is configured.
    pub fn sample() -> Self {
        match Self::from_json_str(SAMPLE_PRODUCT_JSON) {
            Ok(product) => product,
            Err(error) => {
                tracing::error!(error = %error, "bundled sample product is invalid");
                Self::default()
            }
        }
    }
}

/// Whether a high score is bad (negative) or good (positive) for the product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricPolarity {
    Negative,
    Positive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricLevel {
    Good,
    Moderate,
    Poor,
}

/// Maps a 0-100 score to a level. Thresholds are inclusive.
pub fn metric_level(score: u8, polarity: MetricPolarity) -> MetricLevel {
    match polarity {
        MetricPolarity::Negative if score >= 70 => MetricLevel::Poor,
        MetricPolarity::Negative if score >= 40 => MetricLevel::Moderate,
        MetricPolarity::Negative => MetricLevel::Good,
        MetricPolarity::Positive if score >= 70 => MetricLevel::Good,
        MetricPolarity::Positive if score >= 40 => MetricLevel::Moderate,
        MetricPolarity::Positive => MetricLevel::Poor,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    Additives,
    Sodium,
    Calories,
    Protein,
    Fiber,
    Sugar,
}

impl MetricKind {
    pub const NEGATIVES: [MetricKind; 3] = [Self::Additives, Self::Sodium, Self::Calories];
    pub const POSITIVES: [MetricKind; 3] = [Self::Protein, Self::Fiber, Self::Sugar];

    pub fn label(self) -> &'static str {
        match self {
            Self::Additives => "Additives",
            Self::Sodium => "Sodium",
            Self::Calories => "Calories",
            Self::Protein => "Protein",
            Self::Fiber => "Fiber",
            Self::Sugar => "Sugar",
        }
    }

    pub fn polarity(self) -> MetricPolarity {
        match self {
            Self::Additives | Self::Sodium | Self::Calories => MetricPolarity::Negative,
            Self::Protein | Self::Fiber | Self::Sugar => MetricPolarity::Positive,
        }
    }

    /// Fixed severity score of the row.
    pub fn score(self) -> u8 {
        match self {
            Self::Additives => 70,
            Self::Sodium => 80,
            Self::Calories => 60,
            Self::Protein => 80,
            Self::Fiber => 60,
            Self::Sugar => 90,
        }
    }
}

/// One rendered metric line.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRow {
    pub kind: MetricKind,
    pub value: String,
    pub level: MetricLevel,
}

impl MetricRow {
    fn new(kind: MetricKind, value: String) -> Self {
        Self {
            kind,
            value,
            level: metric_level(kind.score(), kind.polarity()),
        }
    }
}

pub const ADDITIVES_TO_AVOID_LABEL: &str = "Contains additives to avoid";
pub const NO_ADDITIVES_LABEL: &str = "No additives listed";

pub fn metric_row(kind: MetricKind, product: &Product) -> MetricRow {
    let info = &product.nutritional_info;
    let value = match kind {
        MetricKind::Additives if product.additives.is_empty() => NO_ADDITIVES_LABEL.to_string(),
        MetricKind::Additives => ADDITIVES_TO_AVOID_LABEL.to_string(),
        MetricKind::Sodium => format!("{}g", format_amount(info.salt_100g)),
        MetricKind::Calories => format!("{} kcal", format_amount(info.energy_100g)),
        MetricKind::Protein => format!("{}g", format_amount(info.proteins_100g)),
        MetricKind::Fiber => format!("{}g", format_amount(info.fiber_100g)),
        MetricKind::Sugar => format!("{}g", format_amount(info.sugars_100g)),
    };

    MetricRow::new(kind, value)
}

pub fn negative_rows(product: &Product) -> Vec<MetricRow> {
    MetricKind::NEGATIVES
        .into_iter()
        .map(|kind| metric_row(kind, product))
        .collect()
}

pub fn positive_rows(product: &Product) -> Vec<MetricRow> {
    MetricKind::POSITIVES
        .into_iter()
        .map(|kind| metric_row(kind, product))
        .collect()
}

/// Formats an amount without trailing zeros; missing or non-finite values print as `0`.
pub fn format_amount(value: Option<f64>) -> String {
    let value = value.filter(|value| value.is_finite()).unwrap_or(0.0);
    let formatted = format!("{value:.2}");
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_thresholds_are_inclusive() {
        assert_eq!(metric_level(70, MetricPolarity::Negative), MetricLevel::Poor);
        assert_eq!(metric_level(69, MetricPolarity::Negative), MetricLevel::Moderate);
        assert_eq!(metric_level(40, MetricPolarity::Negative), MetricLevel::Moderate);
        assert_eq!(metric_level(39, MetricPolarity::Negative), MetricLevel::Good);
    }

    #[test]
    fn positive_thresholds_are_inclusive() {
        assert_eq!(metric_level(70, MetricPolarity::Positive), MetricLevel::Good);
        assert_eq!(metric_level(69, MetricPolarity::Positive), MetricLevel::Moderate);
        assert_eq!(metric_level(40, MetricPolarity::Positive), MetricLevel::Moderate);
        assert_eq!(metric_level(0, MetricPolarity::Positive), MetricLevel::Poor);
    }

    #[test]
    fn missing_nutrients_render_as_zero() {
        let product = Product::from_json_str(r#"{ "name": "Plain water" }"#).ok();
        let Some(product) = product else {
            panic!("minimal product should parse");
        };

        let values = negative_rows(&product)
            .into_iter()
            .chain(positive_rows(&product))
            .map(|row| row.value)
            .collect::<Vec<_>>();
        assert_eq!(
            values,
            vec![NO_ADDITIVES_LABEL, "0g", "0 kcal", "0g", "0g", "0g"]
        );
    }

    #[test]
    fn rows_carry_levels_from_fixed_scores() {
        let product = Product::default();
        let levels = negative_rows(&product)
            .into_iter()
            .chain(positive_rows(&product))
            .map(|row| (row.kind, row.level))
            .collect::<Vec<_>>();

        assert_eq!(
            levels,
            vec![
                (MetricKind::Additives, MetricLevel::Poor),
                (MetricKind::Sodium, MetricLevel::Poor),
                (MetricKind::Calories, MetricLevel::Moderate),
                (MetricKind::Protein, MetricLevel::Good),
                (MetricKind::Fiber, MetricLevel::Moderate),
                (MetricKind::Sugar, MetricLevel::Good),
            ]
        );
    }

    #[test]
    fn amounts_drop_trailing_zeros() {
        assert_eq!(format_amount(Some(0.3)), "0.3");
        assert_eq!(format_amount(Some(12.0)), "12");
        assert_eq!(format_amount(Some(1.256)), "1.26");
        assert_eq!(format_amount(Some(f64::NAN)), "0");
        assert_eq!(format_amount(None), "0");
    }

    #[test]
    fn product_json_with_additives_parses() {
        let json = r#"{
            "name": "Cola",
            "nutritional_info": { "sugars_100g": 10.6, "energy_100g": 42 },
            "additives": [
                { "code": "E150d", "name": "Sulphite ammonia caramel", "risk": "high" }
            ]
        }"#;
        let product = Product::from_json_str(json).ok();
        let Some(product) = product else {
            panic!("product should parse");
        };

        assert_eq!(product.nutritional_info.sugars_100g, Some(10.6));
        assert_eq!(product.additives[0].risk, AdditiveRisk::High);
        assert_eq!(product.additives[0].description, "");
        assert_eq!(
            metric_row(MetricKind::Additives, &product).value,
            ADDITIVES_TO_AVOID_LABEL
        );
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(
            Product::from_json_str("{ not json"),
            Err(ProductError::ParseJson { .. })
        ));
    }

    #[test]
    fn bundled_sample_parses() {
        let product = Product::sample();
        assert!(!product.name.is_empty());
        assert!(!product.additives.is_empty());
    }
}
