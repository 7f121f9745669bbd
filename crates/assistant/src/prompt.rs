//! System prompt rendering from structured domain data.
//!
//! Pure string substitution into a fixed template. A missing substitution
//! key is a configuration error and surfaces at startup, never mid-request.

use huurwijzer_config::DomainData;
use huurwijzer_core::error::PromptError;

/// The fixed behavioral template. Placeholders are filled from [`DomainData`].
const SYSTEM_PROMPT_TEMPLATE: &str = "\
You are an Expat Rental Assistant specialized in helping international professionals and families find rental properties in the Netherlands.

Core Topics:
- Expat-friendly neighborhoods and cities in {cities}
- Dutch rental contracts and legal requirements such as huurcontract and huurcommissie
- Visa and residency considerations for renting including BSN and residence permit
- International tenant rights in the Netherlands
- Cultural differences in Dutch rental markets
- Furnished vs unfurnished rentals common in expat areas
- Utilities like gas water electricity, deposits, and service costs
- Expat community resources and international schools
- Transportation including OV-chipkaart and cycling culture

Special Features:

Price Fairness Checker - When users ask about rental prices provide context based on 2024 averages:
{price_data}
Utilities typically add {utilities_min}-{utilities_max} euro per month
Note if price seems fair high or low and mention factors that affect pricing.

Document Checklist - Provide complete list:
{documents}

Scam Detection - Warn about common scams:
{scam_warnings}

Important Guidelines:
Keep responses SHORT and CONCISE with 2-5 sentences maximum
Break information into clear separate sentences
Use simple language and natural conversational tone
Be direct and practical
Focus on Netherlands rental market
Politely redirect if asked about buying property or topics outside expat rentals";

/// Render the system prompt from domain data.
///
/// Deterministic, no side effects. Price rows render one city per line in
/// the configured city order.
pub fn render_system_prompt(domain: &DomainData) -> Result<String, PromptError> {
    let price_data = domain
        .prices
        .iter()
        .map(|p| {
            format!(
                "{} 1-bed {}-{} euro, 2-bed {}-{} euro",
                p.city, p.one_bed.min, p.one_bed.max, p.two_bed.min, p.two_bed.max
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    substitute(
        SYSTEM_PROMPT_TEMPLATE,
        &[
            ("cities", domain.cities.join(", ")),
            ("price_data", price_data),
            ("utilities_min", domain.utilities.min.to_string()),
            ("utilities_max", domain.utilities.max.to_string()),
            ("documents", domain.documents.join("\n")),
            ("scam_warnings", domain.scam_warnings.join("\n")),
        ],
    )
}

/// Replace every `{key}` placeholder with its value. Errors if the template
/// still contains a placeholder no value was supplied for.
fn substitute(template: &str, vars: &[(&str, String)]) -> Result<String, PromptError> {
    let mut out = template.to_string();
    for (key, value) in vars {
        out = out.replace(&format!("{{{key}}}"), value);
    }

    if let Some(key) = leftover_placeholder(&out) {
        return Err(PromptError::MissingKey(key));
    }

    Ok(out)
}

/// Find the first `{identifier}` placeholder remaining in `text`, if any.
fn leftover_placeholder(text: &str) -> Option<String> {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'{' {
            let rest = &text[i + 1..];
            if let Some(end) = rest.find('}') {
                let name = &rest[..end];
                if !name.is_empty()
                    && name
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || c == '_')
                {
                    return Some(name.to_string());
                }
            }
        }
        i += 1;
    }
    None
}
