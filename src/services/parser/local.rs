//! Deterministic on-device parser: schema.org JSON-LD scraping with an
//! OpenGraph/title fallback, plus the line-oriented text parser used for OCR
//! output.

use std::time::Duration;

use async_trait::async_trait;
use scraper::{Html, Selector};
use serde_json::Value;

use crate::config::ImportConfig;

use super::{ImportError, ParsedRecipe, RecipeParser};

pub struct LocalRecipeParser {
    client: reqwest::Client,
}

impl LocalRecipeParser {
    pub fn new(config: &ImportConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_seconds))
            .user_agent("recipe-log/0.1")
            .build()
            .unwrap_or_default();
        Self { client }
    }

    /// Extract a recipe from an already-fetched document. Field extraction is
    /// fault-isolated: anything the markup does not yield becomes `None`. As
    /// long as a document exists, the parse succeeds.
    pub fn extract_from_document(html: &str, source_url: &str) -> ParsedRecipe {
        let document = Html::parse_document(html);

        if let Some(node) = find_ld_json_recipe(&document) {
            return recipe_from_ld_json(&node, source_url);
        }

        // Generic fallback: no structured recipe data, scrape page metadata
        // so the caller still gets a draft worth editing.
        ParsedRecipe {
            title: meta_content(&document, "og:title").or_else(|| page_title(&document)),
            description: meta_content(&document, "og:description"),
            image_url: meta_content(&document, "og:image"),
            source_url: Some(source_url.to_string()),
            ..Default::default()
        }
    }
}

#[async_trait]
impl RecipeParser for LocalRecipeParser {
    async fn parse_url(&self, url: &str) -> Result<ParsedRecipe, ImportError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ImportError::Fetch(e.to_string()))?;

        let response = response
            .error_for_status()
            .map_err(|e| ImportError::Fetch(e.to_string()))?;

        let html = response
            .text()
            .await
            .map_err(|e| ImportError::Fetch(e.to_string()))?;

        Ok(Self::extract_from_document(&html, url))
    }

    async fn parse_text(&self, text: &str) -> Result<ParsedRecipe, ImportError> {
        let lines: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();

        Ok(ParsedRecipe {
            title: Some(
                lines
                    .first()
                    .map(|l| l.to_string())
                    .unwrap_or_else(|| "Untitled".to_string()),
            ),
            ingredients: lines.iter().skip(1).map(|l| l.to_string()).collect(),
            ..Default::default()
        })
    }
}

// ============================================================================
// JSON-LD extraction
// ============================================================================

fn find_ld_json_recipe(document: &Html) -> Option<Value> {
    let selector =
        Selector::parse("script[type='application/ld+json']").expect("static selector");

    for script in document.select(&selector) {
        let raw = script.text().collect::<String>();
        let Ok(value) = serde_json::from_str::<Value>(&raw) else {
            continue;
        };
        if let Some(recipe) = find_recipe_node(&value) {
            return Some(recipe.clone());
        }
    }
    None
}

/// Locate a schema.org Recipe object inside a JSON-LD value: a direct object,
/// an element of a top-level array, or a member of an `@graph`.
fn find_recipe_node(value: &Value) -> Option<&Value> {
    match value {
        Value::Object(map) => {
            if is_recipe_type(map.get("@type")) {
                return Some(value);
            }
            if let Some(graph) = map.get("@graph") {
                return find_recipe_node(graph);
            }
            None
        }
        Value::Array(items) => items.iter().find_map(find_recipe_node),
        _ => None,
    }
}

/// `@type` may be a string or an array of strings.
fn is_recipe_type(type_field: Option<&Value>) -> bool {
    match type_field {
        Some(Value::String(s)) => s == "Recipe",
        Some(Value::Array(items)) => items.iter().any(|v| v.as_str() == Some("Recipe")),
        _ => false,
    }
}

fn recipe_from_ld_json(node: &Value, source_url: &str) -> ParsedRecipe {
    ParsedRecipe {
        title: string_field(node.get("name")),
        description: string_field(node.get("description")),
        image_url: image_field(node.get("image")),
        source_url: Some(source_url.to_string()),
        author: author_field(node.get("author")),
        servings: yields_field(node.get("recipeYield")),
        prep_time: duration_to_minutes(node.get("prepTime")),
        cook_time: duration_to_minutes(node.get("cookTime")),
        total_time: duration_to_minutes(node.get("totalTime")),
        cuisine: string_field(node.get("recipeCuisine")),
        category: string_field(node.get("recipeCategory")),
        ingredients: string_list(node.get("recipeIngredient")),
        steps: instruction_list(node.get("recipeInstructions")),
    }
}

/// A string, or the first string of an array. Empty strings count as absent.
fn string_field(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => non_empty(s),
        Value::Array(items) => items
            .iter()
            .find_map(|v| v.as_str().and_then(non_empty)),
        _ => None,
    }
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// `image`: a URL string, an array of URLs, or an ImageObject with `url`.
fn image_field(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => non_empty(s),
        Value::Array(items) => items.iter().find_map(|v| image_field(Some(v))),
        Value::Object(map) => map.get("url").and_then(|v| v.as_str()).and_then(non_empty),
        _ => None,
    }
}

/// `author`: a string, a Person object with `name`, or an array of either.
fn author_field(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => non_empty(s),
        Value::Object(map) => map.get("name").and_then(|v| v.as_str()).and_then(non_empty),
        Value::Array(items) => items.iter().find_map(|v| author_field(Some(v))),
        _ => None,
    }
}

/// `recipeYield` normalizes to a display string: a string as-is, a number
/// stringified, an array by its first usable element.
fn yields_field(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => non_empty(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => items.iter().find_map(|v| yields_field(Some(v))),
        _ => None,
    }
}

/// Normalize a duration to integer minutes. Accepts JSON numbers (already
/// minutes), numeric strings, and ISO-8601 durations. Non-positive and
/// non-numeric values normalize to `None` — never zero, never an error.
fn duration_to_minutes(value: Option<&Value>) -> Option<i64> {
    let minutes = match value? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?,
        Value::String(s) => {
            let s = s.trim();
            if let Ok(n) = s.parse::<i64>() {
                n
            } else {
                iso8601_minutes(s)?
            }
        }
        _ => return None,
    };
    (minutes > 0).then_some(minutes)
}

/// Minimal ISO-8601 duration reader, enough for the `PT1H30M` shapes found
/// in recipe markup. Date-part years/months are not meaningful for cook
/// times and are ignored; days are counted.
fn iso8601_minutes(s: &str) -> Option<i64> {
    let s = s.to_ascii_uppercase();
    let rest = s.strip_prefix('P')?;
    let (date_part, time_part) = match rest.split_once('T') {
        Some((d, t)) => (d, t),
        None => (rest, ""),
    };

    let mut minutes = 0i64;
    let mut matched = false;

    let mut number = String::new();
    for c in date_part.chars() {
        if c.is_ascii_digit() || c == '.' {
            number.push(c);
        } else {
            let n: f64 = number.parse().ok()?;
            number.clear();
            if c == 'D' {
                minutes += (n * 24.0 * 60.0) as i64;
                matched = true;
            }
        }
    }

    number.clear();
    for c in time_part.chars() {
        if c.is_ascii_digit() || c == '.' {
            number.push(c);
        } else {
            let n: f64 = number.parse().ok()?;
            number.clear();
            match c {
                'H' => {
                    minutes += (n * 60.0) as i64;
                    matched = true;
                }
                'M' => {
                    minutes += n as i64;
                    matched = true;
                }
                'S' => {
                    minutes += (n / 60.0).round() as i64;
                    matched = true;
                }
                _ => return None,
            }
        }
    }

    matched.then_some(minutes)
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str().and_then(non_empty))
            .collect(),
        Some(Value::String(s)) => non_empty(s).into_iter().collect(),
        _ => Vec::new(),
    }
}

/// Flatten `recipeInstructions` preserving encounter order. Each element may
/// be a plain string, a HowToStep-like object (prefer `text`, then `name`,
/// else the JSON stringification), or a HowToSection whose nested
/// `itemListElement` is flattened in place.
fn instruction_list(value: Option<&Value>) -> Vec<String> {
    let mut steps = Vec::new();
    if let Some(v) = value {
        collect_instructions(v, &mut steps);
    }
    steps
}

fn collect_instructions(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => {
            if let Some(text) = non_empty(s) {
                out.push(text);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_instructions(item, out);
            }
        }
        Value::Object(map) => {
            if let Some(nested) = map.get("itemListElement") {
                collect_instructions(nested, out);
            } else if let Some(text) = map
                .get("text")
                .and_then(|v| v.as_str())
                .and_then(non_empty)
            {
                out.push(text);
            } else if let Some(name) = map
                .get("name")
                .and_then(|v| v.as_str())
                .and_then(non_empty)
            {
                out.push(name);
            } else {
                out.push(value.to_string());
            }
        }
        _ => {}
    }
}

// ============================================================================
// Page metadata fallback
// ============================================================================

fn meta_content(document: &Html, property: &str) -> Option<String> {
    let selector = Selector::parse(&format!("meta[property='{}']", property)).ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|el| el.value().attr("content"))
        .and_then(non_empty)
}

fn page_title(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").expect("static selector");
    document
        .select(&selector)
        .next()
        .and_then(|el| non_empty(&el.text().collect::<String>()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ImportConfig;
    use serde_json::json;

    fn parser() -> LocalRecipeParser {
        LocalRecipeParser::new(&ImportConfig {
            backend: "local".to_string(),
            openai_api_key: None,
            fetch_timeout_seconds: 5,
            ocr_timeout_seconds: 5,
        })
    }

    #[tokio::test]
    async fn parse_text_empty_input() {
        let parsed = parser().parse_text("").await.unwrap();
        assert_eq!(parsed.title.as_deref(), Some("Untitled"));
        assert!(parsed.ingredients.is_empty());
        assert!(parsed.steps.is_empty());
    }

    #[tokio::test]
    async fn parse_text_title_and_ingredients() {
        let parsed = parser().parse_text("Title\nline1\nline2").await.unwrap();
        assert_eq!(parsed.title.as_deref(), Some("Title"));
        assert_eq!(parsed.ingredients, vec!["line1", "line2"]);
        assert!(parsed.steps.is_empty());
    }

    #[tokio::test]
    async fn parse_text_skips_blank_and_trims() {
        let parsed = parser()
            .parse_text("  Pancakes  \n\n  2 eggs \n\t\n flour ")
            .await
            .unwrap();
        assert_eq!(parsed.title.as_deref(), Some("Pancakes"));
        assert_eq!(parsed.ingredients, vec!["2 eggs", "flour"]);
    }

    #[test]
    fn duration_zero_negative_and_garbage_are_absent() {
        assert_eq!(duration_to_minutes(Some(&json!(0))), None);
        assert_eq!(duration_to_minutes(Some(&json!(-5))), None);
        assert_eq!(duration_to_minutes(Some(&json!("0"))), None);
        assert_eq!(duration_to_minutes(Some(&json!("-3"))), None);
        assert_eq!(duration_to_minutes(Some(&json!("soon"))), None);
        assert_eq!(duration_to_minutes(Some(&json!(null))), None);
        assert_eq!(duration_to_minutes(None), None);
    }

    #[test]
    fn duration_numbers_and_iso8601() {
        assert_eq!(duration_to_minutes(Some(&json!(25))), Some(25));
        assert_eq!(duration_to_minutes(Some(&json!("45"))), Some(45));
        assert_eq!(duration_to_minutes(Some(&json!("PT30M"))), Some(30));
        assert_eq!(duration_to_minutes(Some(&json!("PT1H30M"))), Some(90));
        assert_eq!(duration_to_minutes(Some(&json!("pt2h"))), Some(120));
        assert_eq!(duration_to_minutes(Some(&json!("P1DT1H"))), Some(1500));
        assert_eq!(duration_to_minutes(Some(&json!("PT0M"))), None);
    }

    #[test]
    fn instructions_mix_of_shapes() {
        let value = json!([
            "Preheat the oven.",
            { "@type": "HowToStep", "text": "Mix the batter." },
            { "@type": "HowToStep", "name": "Rest the dough" },
            {
                "@type": "HowToSection",
                "name": "Baking",
                "itemListElement": [
                    { "@type": "HowToStep", "text": "Bake 20 minutes." }
                ]
            }
        ]);
        let steps = instruction_list(Some(&value));
        assert_eq!(
            steps,
            vec![
                "Preheat the oven.",
                "Mix the batter.",
                "Rest the dough",
                "Bake 20 minutes."
            ]
        );
    }

    #[test]
    fn instructions_opaque_object_is_stringified() {
        let value = json!([{ "weird": true }]);
        let steps = instruction_list(Some(&value));
        assert_eq!(steps.len(), 1);
        assert!(steps[0].contains("weird"));
    }

    #[test]
    fn yields_variants() {
        assert_eq!(yields_field(Some(&json!("4 servings"))).as_deref(), Some("4 servings"));
        assert_eq!(yields_field(Some(&json!(6))).as_deref(), Some("6"));
        assert_eq!(
            yields_field(Some(&json!(["8", "8 portions"]))).as_deref(),
            Some("8")
        );
        assert_eq!(yields_field(Some(&json!([]))), None);
        assert_eq!(yields_field(None), None);
    }

    #[test]
    fn extracts_recipe_from_ld_json() {
        let html = r#"
        <html><head>
        <script type="application/ld+json">
        {
            "@context": "https://schema.org",
            "@type": "Recipe",
            "name": "Shakshuka",
            "description": "Eggs in tomato sauce",
            "author": { "@type": "Person", "name": "A. Cook" },
            "image": ["https://example.com/shakshuka.jpg"],
            "recipeYield": "4 servings",
            "prepTime": "PT10M",
            "cookTime": "PT20M",
            "totalTime": "PT30M",
            "recipeCuisine": "Middle Eastern",
            "recipeCategory": "Breakfast",
            "recipeIngredient": ["6 eggs", "800g tomatoes"],
            "recipeInstructions": [
                { "@type": "HowToStep", "text": "Simmer the tomatoes." },
                { "@type": "HowToStep", "text": "Crack in the eggs." }
            ]
        }
        </script>
        </head><body></body></html>
        "#;

        let parsed =
            LocalRecipeParser::extract_from_document(html, "https://example.com/shakshuka");
        assert_eq!(parsed.title.as_deref(), Some("Shakshuka"));
        assert_eq!(parsed.author.as_deref(), Some("A. Cook"));
        assert_eq!(
            parsed.image_url.as_deref(),
            Some("https://example.com/shakshuka.jpg")
        );
        assert_eq!(parsed.servings.as_deref(), Some("4 servings"));
        assert_eq!(parsed.prep_time, Some(10));
        assert_eq!(parsed.cook_time, Some(20));
        assert_eq!(parsed.total_time, Some(30));
        assert_eq!(parsed.cuisine.as_deref(), Some("Middle Eastern"));
        assert_eq!(parsed.category.as_deref(), Some("Breakfast"));
        assert_eq!(parsed.ingredients, vec!["6 eggs", "800g tomatoes"]);
        assert_eq!(parsed.steps.len(), 2);
        assert_eq!(
            parsed.source_url.as_deref(),
            Some("https://example.com/shakshuka")
        );
    }

    #[test]
    fn finds_recipe_inside_graph_with_array_type() {
        let html = r#"
        <script type="application/ld+json">
        {
            "@graph": [
                { "@type": "WebSite", "name": "Some blog" },
                {
                    "@type": ["Recipe", "NewsArticle"],
                    "name": "Graph Soup",
                    "recipeIngredient": ["water"]
                }
            ]
        }
        </script>
        "#;

        let parsed = LocalRecipeParser::extract_from_document(html, "https://example.com/soup");
        assert_eq!(parsed.title.as_deref(), Some("Graph Soup"));
        assert_eq!(parsed.ingredients, vec!["water"]);
    }

    #[test]
    fn bad_field_degrades_to_absent_not_failure() {
        // cuisine is a number, image is an unexpected shape; both become None
        // while the rest of the parse stays intact.
        let html = r#"
        <script type="application/ld+json">
        {
            "@type": "Recipe",
            "name": "Resilient Stew",
            "recipeCuisine": 5,
            "image": 42,
            "prepTime": "whenever",
            "recipeIngredient": ["beans"]
        }
        </script>
        "#;

        let parsed = LocalRecipeParser::extract_from_document(html, "https://example.com/stew");
        assert_eq!(parsed.title.as_deref(), Some("Resilient Stew"));
        assert_eq!(parsed.cuisine, None);
        assert_eq!(parsed.image_url, None);
        assert_eq!(parsed.prep_time, None);
        assert_eq!(parsed.ingredients, vec!["beans"]);
    }

    #[test]
    fn falls_back_to_page_metadata() {
        let html = r#"
        <html><head>
        <title>Plain Page</title>
        <meta property="og:title" content="Grandma's Pie">
        <meta property="og:description" content="A pie.">
        <meta property="og:image" content="https://example.com/pie.jpg">
        </head><body>no structured data here</body></html>
        "#;

        let parsed = LocalRecipeParser::extract_from_document(html, "https://example.com/pie");
        assert_eq!(parsed.title.as_deref(), Some("Grandma's Pie"));
        assert_eq!(parsed.description.as_deref(), Some("A pie."));
        assert_eq!(parsed.image_url.as_deref(), Some("https://example.com/pie.jpg"));
        assert!(parsed.ingredients.is_empty());
        assert!(parsed.steps.is_empty());
        assert_eq!(parsed.source_url.as_deref(), Some("https://example.com/pie"));
    }

    #[test]
    fn title_tag_when_no_opengraph() {
        let html = "<html><head><title>Just a Title</title></head><body></body></html>";
        let parsed = LocalRecipeParser::extract_from_document(html, "https://example.com/x");
        assert_eq!(parsed.title.as_deref(), Some("Just a Title"));
        assert_eq!(parsed.description, None);
    }
}
