use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// One row of product input data.
///
/// Column names are matched case-insensitively for the common spreadsheet
/// headers (`Name`, `Description`, ...). `price` accepts either a number or a
/// string; `tags` accepts either a list or a comma-separated string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    #[serde(alias = "Name")]
    pub name: String,
    #[serde(default, alias = "Description")]
    pub description: String,
    #[serde(default, alias = "Price", deserialize_with = "deserialize_price")]
    pub price: String,
    #[serde(default, alias = "Tags", deserialize_with = "deserialize_tags")]
    pub tags: Vec<String>,
    #[serde(default, alias = "Image", alias = "image")]
    pub image_url: Option<String>,
    #[serde(default, alias = "Tagline")]
    pub tagline: Option<String>,
    #[serde(default)]
    pub last_processed: Option<DateTime<Utc>>,
}

impl ProductRecord {
    /// Create a product with only a name set.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            price: String::new(),
            tags: Vec::new(),
            image_url: None,
            tagline: None,
            last_processed: None,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PriceField {
    Text(String),
    Integer(i64),
    Float(f64),
}

fn deserialize_price<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<PriceField>::deserialize(deserializer)? {
        Some(PriceField::Text(s)) => s,
        Some(PriceField::Integer(i)) => i.to_string(),
        Some(PriceField::Float(f)) => format!("{:.2}", f),
        None => String::new(),
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TagsField {
    List(Vec<String>),
    Csv(String),
}

fn deserialize_tags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = match Option::<TagsField>::deserialize(deserializer)? {
        Some(TagsField::List(list)) => list,
        Some(TagsField::Csv(csv)) => csv.split(',').map(str::to_string).collect(),
        None => Vec::new(),
    };

    Ok(raw
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect())
}
