use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Advertising category a creator covers or a sponsor targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Tech,
    Saas,
    DevTools,
    AiMl,
    Fintech,
    Crypto,
    Finance,
    Business,
    Gaming,
    Education,
    Lifestyle,
    Marketing,
    Ecommerce,
    Health,
    Other,
}

impl Category {
    pub const ALL: [Category; 15] = [
        Category::Tech,
        Category::Saas,
        Category::DevTools,
        Category::AiMl,
        Category::Fintech,
        Category::Crypto,
        Category::Finance,
        Category::Business,
        Category::Gaming,
        Category::Education,
        Category::Lifestyle,
        Category::Marketing,
        Category::Ecommerce,
        Category::Health,
        Category::Other,
    ];

    /// Stored code for this category
    pub fn code(self) -> &'static str {
        match self {
            Category::Tech => "tech",
            Category::Saas => "saas",
            Category::DevTools => "dev-tools",
            Category::AiMl => "ai-ml",
            Category::Fintech => "fintech",
            Category::Crypto => "crypto",
            Category::Finance => "finance",
            Category::Business => "business",
            Category::Gaming => "gaming",
            Category::Education => "education",
            Category::Lifestyle => "lifestyle",
            Category::Marketing => "marketing",
            Category::Ecommerce => "ecommerce",
            Category::Health => "health",
            Category::Other => "other",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::Tech => "Technology & Software",
            Category::Saas => "SaaS & Cloud",
            Category::DevTools => "Developer Tools",
            Category::AiMl => "AI & Machine Learning",
            Category::Fintech => "FinTech",
            Category::Crypto => "Crypto & Web3",
            Category::Finance => "Finance & Investing",
            Category::Business => "Business Tools",
            Category::Gaming => "Gaming & Esports",
            Category::Education => "Education & Learning",
            Category::Lifestyle => "Lifestyle & Wellness",
            Category::Marketing => "Marketing & Growth",
            Category::Ecommerce => "E-commerce",
            Category::Health => "Health & Fitness",
            Category::Other => "Other",
        }
    }

    /// Look up a category by its stored code (exact match).
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.code() == code)
    }
}

/// Category code paired with its display label.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CategoryInfo {
    pub value: Category,
    pub label: String,
}

impl From<Category> for CategoryInfo {
    fn from(category: Category) -> Self {
        Self {
            value: category,
            label: category.label().to_string(),
        }
    }
}

pub fn category_table() -> Vec<CategoryInfo> {
    Category::ALL.iter().copied().map(CategoryInfo::from).collect()
}

/// Serialize a category list for storage.
///
/// Codes are stored as submitted; unknown codes are dropped when the list is read back.
pub fn encode_categories(codes: &[String]) -> String {
    serde_json::Value::from(codes.to_vec()).to_string()
}

/// Decode a stored category list, silently dropping unknown codes.
/// A missing or malformed value decodes to an empty list.
pub fn decode_categories(raw: Option<&str>) -> Vec<Category> {
    let Some(raw) = raw.filter(|r| !r.trim().is_empty()) else {
        return Vec::new();
    };

    match serde_json::from_str::<Vec<String>>(raw) {
        Ok(codes) => {
            let mut out: Vec<Category> = Vec::with_capacity(codes.len());
            for category in codes.iter().filter_map(|c| Category::from_code(c)) {
                if !out.contains(&category) {
                    out.push(category);
                }
            }
            out
        }
        Err(e) => {
            tracing::debug!("Ignoring malformed category list {:?}: {}", raw, e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip_through_lookup() {
        for category in Category::ALL {
            assert_eq!(Category::from_code(category.code()), Some(category));
        }
        assert_eq!(Category::from_code("Tech"), None);
    }

    #[test]
    fn serde_uses_stored_codes() {
        let json = serde_json::to_string(&Category::DevTools).unwrap();
        assert_eq!(json, "\"dev-tools\"");
        let parsed: Category = serde_json::from_str("\"ai-ml\"").unwrap();
        assert_eq!(parsed, Category::AiMl);
    }

    #[test]
    fn decode_drops_unknown_codes_and_duplicates() {
        let decoded = decode_categories(Some(r#"["tech","knitting","gaming","tech"]"#));
        assert_eq!(decoded, vec![Category::Tech, Category::Gaming]);
    }

    #[test]
    fn decode_tolerates_missing_or_malformed_values() {
        assert!(decode_categories(None).is_empty());
        assert!(decode_categories(Some("")).is_empty());
        assert!(decode_categories(Some("tech,gaming")).is_empty());
    }

    #[test]
    fn encode_produces_json_array() {
        let encoded = encode_categories(&["saas".to_string(), "crypto".to_string()]);
        assert_eq!(encoded, r#"["saas","crypto"]"#);
        assert_eq!(
            decode_categories(Some(&encoded)),
            vec![Category::Saas, Category::Crypto]
        );
    }
}
