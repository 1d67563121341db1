//! Prompt construction for script generation.

use crate::products::ProductRecord;

/// System message sent with every script request.
pub const SYSTEM_PROMPT: &str = "You are a creative video script writer specializing in engaging product marketing content.";

/// Length and tone guidance for a target platform.
pub fn platform_spec(platform: &str) -> &'static str {
    match platform.to_ascii_lowercase().as_str() {
        "youtube" => "Create a 60-90 second engaging video script",
        "instagram" => "Create a 30-60 second captivating reel script",
        "pinterest" => "Create a 15-30 second inspiring video script",
        "twitter" => "Create a 15-30 second attention-grabbing video script",
        _ => "Create a 30-60 second video script",
    }
}

/// Build the user prompt for `product` on `platform`.
pub fn build_prompt(product: &ProductRecord, platform: &str) -> String {
    format!(
        "{spec} for this product:\n\n\
         Product Name: {name}\n\
         Description: {description}\n\
         Price: {price}\n\n\
         Requirements:\n\
         - Hook viewers in the first 3 seconds\n\
         - Highlight key benefits and features\n\
         - Include a clear call-to-action\n\
         - Keep it conversational and enthusiastic\n\
         - Make it suitable for text-to-speech narration\n\n\
         Format the script as natural spoken dialogue without stage directions.\n",
        spec = platform_spec(platform),
        name = product.name,
        description = product.description,
        price = product.price,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_spec_is_case_insensitive() {
        assert_eq!(
            platform_spec("YouTube"),
            "Create a 60-90 second engaging video script"
        );
        assert_eq!(platform_spec("general"), "Create a 30-60 second video script");
    }

    #[test]
    fn test_prompt_contains_product_fields() {
        let mut product = ProductRecord::named("Desk Lamp");
        product.description = "Warm adjustable light".to_string();
        product.price = "24.50".to_string();

        let prompt = build_prompt(&product, "instagram");
        assert!(prompt.starts_with("Create a 30-60 second captivating reel script"));
        assert!(prompt.contains("Product Name: Desk Lamp"));
        assert!(prompt.contains("Description: Warm adjustable light"));
        assert!(prompt.contains("Price: 24.50"));
        assert!(prompt.contains("call-to-action"));
    }
}
