use std::fmt;

use serde::{Deserialize, Serialize};

/// Partition of uploaded media. Each category maps to its own directory
/// under `uploads/` and its own URL namespace.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Posts,
    Stories,
    Profiles,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Posts, Category::Stories, Category::Profiles];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Posts => "posts",
            Category::Stories => "stories",
            Category::Profiles => "profiles",
        }
    }

    /// Strict parse. Returns `None` for anything that is not one of the
    /// three recognized names.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "posts" => Some(Category::Posts),
            "stories" => Some(Category::Stories),
            "profiles" => Some(Category::Profiles),
            _ => None,
        }
    }

    /// Form-field parse: an absent or unrecognized value becomes `Posts`.
    pub fn from_form_value(value: Option<&str>) -> Self {
        match value {
            Some(raw) => match Self::parse(raw) {
                Some(category) => category,
                None => {
                    tracing::debug!(value = raw, "unrecognized upload category, using posts");
                    Category::default()
                }
            },
            None => Category::default(),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
