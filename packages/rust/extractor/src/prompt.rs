//! Prompt, output schema and response parsing for company extraction.

use serde::{Deserialize, Deserializer};
use serde_json::{Value, json};

use prospector_shared::{ExtractedCompany, ProspectorError, Result};

use crate::llm::{ChatMessage, OutputSchema};

/// Schema name sent with the structured-output request.
pub(crate) const SCHEMA_NAME: &str = "company_profile";

const SYSTEM_PROMPT: &str = "You extract company facts from website text for B2B prospecting. \
Only report what the text supports. Use null for unknown contact details or headcount, \
an empty string for unknown text fields and an empty list when nothing applies.";

/// Build the message list for one page.
pub(crate) fn build_messages(content: &str, source_url: &str) -> Vec<ChatMessage> {
    let user = format!(
        "Extract the following from the website content of {source_url}:\n\
         - name: the company name\n\
         - industry: the industry or sector\n\
         - location: headquarters city and/or country\n\
         - employee_count: approximate number of employees, as an integer\n\
         - description: a 1-2 sentence description of what the company does\n\
         - products: the products it sells\n\
         - services: the services it offers\n\
         - hiring_signals: phrases showing the company is hiring or growing its team \
           (e.g. \"we're hiring\", \"join our team\", open roles)\n\
         - contact_email: a general contact email address\n\
         - contact_phone: a general contact phone number\n\n\
         Website content:\n{content}"
    );

    vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(user)]
}

/// JSON Schema for the extraction response (strict mode: every key present).
pub(crate) fn company_schema() -> OutputSchema {
    let string_list = json!({"type": "array", "items": {"type": "string"}});

    OutputSchema {
        name: SCHEMA_NAME.into(),
        schema: json!({
            "type": "object",
            "properties": {
                "name": {"type": "string"},
                "industry": {"type": "string"},
                "location": {"type": "string"},
                "employee_count": {"type": ["integer", "null"]},
                "description": {"type": "string"},
                "products": string_list,
                "services": string_list,
                "hiring_signals": string_list,
                "contact_email": {"type": ["string", "null"]},
                "contact_phone": {"type": ["string", "null"]}
            },
            "required": [
                "name", "industry", "location", "employee_count", "description",
                "products", "services", "hiring_signals", "contact_email", "contact_phone"
            ],
            "additionalProperties": false
        }),
    }
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

/// Raw model payload, before normalization.
#[derive(Debug, Deserialize)]
struct ExtractionPayload {
    name: String,
    #[serde(default)]
    industry: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default, deserialize_with = "lenient_count")]
    employee_count: Option<u64>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    products: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    services: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    hiring_signals: Vec<String>,
    #[serde(default)]
    contact_email: Option<String>,
    #[serde(default)]
    contact_phone: Option<String>,
}

/// Turn a model payload into a company record for `website`.
///
/// Fails when the payload does not match the schema or carries no usable name.
pub(crate) fn parse_company(value: Value, website: &str) -> Result<ExtractedCompany> {
    // A derived struct deserializer also accepts a sequence, matching fields by position.
    if !value.is_object() {
        return Err(ProspectorError::Extraction("payload is not a JSON object".into()));
    }

    let payload: ExtractionPayload = serde_json::from_value(value)
        .map_err(|e| ProspectorError::Extraction(format!("payload does not match schema: {e}")))?;

    let name = payload.name.trim();
    if name.is_empty() {
        return Err(ProspectorError::Extraction("payload has an empty name".into()));
    }

    Ok(ExtractedCompany {
        name: name.to_string(),
        website: website.to_string(),
        industry: non_empty(payload.industry),
        location: non_empty(payload.location),
        employee_count: payload.employee_count,
        description: non_empty(payload.description),
        products: clean_list(payload.products),
        services: clean_list(payload.services),
        hiring_signals: clean_list(payload.hiring_signals),
        contact_email: non_empty(payload.contact_email),
        contact_phone: non_empty(payload.contact_phone),
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accept a headcount as an integer, a non-negative float, or a numeric string
/// such as `"1,200"` or `"500+"`. Anything else is treated as unknown.
fn lenient_count<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .map(|f| f.round() as u64)
        }),
        Value::String(s) => {
            let digits: String = s
                .trim()
                .trim_end_matches('+')
                .chars()
                .filter(|c| *c != ',' && *c != '_')
                .collect();
            digits.trim().parse().ok()
        }
        _ => None,
    })
}
