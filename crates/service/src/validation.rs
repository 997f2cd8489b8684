//! Rule tables for write payloads.
//!
//! Each field owns an ordered list of rules. A missing or blank value reports
//! only its "required" message; otherwise every failing rule is reported.
//! Lengths are counted in characters.

use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde_json::Value;
use uuid::Uuid;

use crate::dto::{ProviderInput, ServiceInput, ServiceUpdateInput};
use crate::errors::{FieldViolation, ServiceError};
use crate::repository::{ProviderFields, ServiceFields};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex"));
static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+?[0-9]+$").expect("phone regex"));
static PRICE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+(\.\d{1,2})?$").expect("price regex"));

fn is_phone(value: &str) -> bool {
    PHONE_RE.is_match(value)
}

enum Rule {
    MinChars(usize, &'static str),
    MaxChars(usize, &'static str),
    Matches(fn(&str) -> bool, &'static str),
    /// Message contains a `{value}` placeholder.
    Email(&'static str),
}

impl Rule {
    fn check(&self, value: &str) -> Option<String> {
        match self {
            Rule::MinChars(min, msg) if value.chars().count() < *min => Some((*msg).to_string()),
            Rule::MaxChars(max, msg) if value.chars().count() > *max => Some((*msg).to_string()),
            Rule::Matches(accepts, msg) if !accepts(value) => Some((*msg).to_string()),
            Rule::Email(msg) if !EMAIL_RE.is_match(value) => Some(msg.replace("{value}", value)),
            _ => None,
        }
    }
}

struct FieldRules {
    property: &'static str,
    required: &'static str,
    rules: &'static [Rule],
}

const NAME: FieldRules = FieldRules {
    property: "name",
    required: "Name is required",
    rules: &[
        Rule::MinChars(2, "Name must be at least 2 characters"),
        Rule::MaxChars(255, "Name cannot exceed 255 characters"),
    ],
};

const EMAIL: FieldRules = FieldRules {
    property: "email",
    required: "Email is required",
    rules: &[
        Rule::Email("The email \"{value}\" is not a valid email."),
        Rule::MaxChars(255, "Email cannot exceed 255 characters"),
    ],
};

const PHONE: FieldRules = FieldRules {
    property: "phone",
    required: "Phone number is required",
    rules: &[
        Rule::MinChars(10, "Phone number must be at least 10 characters"),
        Rule::MaxChars(15, "Phone number cannot exceed 15 characters"),
        Rule::Matches(is_phone, "Phone number can only contain numbers and an optional + prefix"),
    ],
};

const ADDRESS: FieldRules = FieldRules {
    property: "address",
    required: "Address is required",
    rules: &[
        Rule::MinChars(5, "Address must be at least 5 characters"),
        Rule::MaxChars(255, "Address cannot exceed 255 characters"),
    ],
};

const DESCRIPTION: FieldRules = FieldRules {
    property: "description",
    required: "Description is required",
    rules: &[],
};

fn check<'a>(field: &FieldRules, value: Option<&'a str>, out: &mut Vec<FieldViolation>) -> Option<&'a str> {
    let value = match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => {
            out.push(FieldViolation::new(field.property, field.required));
            return None;
        }
    };
    let before = out.len();
    out.extend(field.rules.iter().filter_map(|r| r.check(value)).map(|m| FieldViolation::new(field.property, m)));
    (out.len() == before).then_some(value)
}

/// Canonical price: `^\d+(\.\d{1,2})?$`, greater than zero, at most the
/// column maximum, rescaled to two fractional digits.
pub fn parse_price(value: Option<&Value>) -> Result<Decimal, String> {
    let text = match value {
        None | Some(Value::Null) => return Err("Price is required".into()),
        Some(Value::String(s)) if s.trim().is_empty() => return Err("Price is required".into()),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(_) => return Err("Price must be a number".into()),
    };
    if matches!(Decimal::from_str(&text), Ok(d) if d <= Decimal::ZERO) {
        return Err("Price must be greater than zero".into());
    }
    if !PRICE_RE.is_match(&text) {
        return Err("Price must be a valid number with up to 2 decimal places".into());
    }
    let max = models::service::max_price();
    let mut price = Decimal::from_str(&text).map_err(|_| format!("Price cannot exceed {max}"))?;
    if price > max {
        return Err(format!("Price cannot exceed {max}"));
    }
    price.rescale(2);
    Ok(price)
}

fn check_price(value: Option<&Value>, out: &mut Vec<FieldViolation>) -> Option<Decimal> {
    parse_price(value).map_err(|m| out.push(FieldViolation::new("price", m))).ok()
}

fn check_provider_id(value: Option<&Value>, out: &mut Vec<FieldViolation>) -> Option<Uuid> {
    let parsed = match value {
        None | Some(Value::Null) => Err("Provider ID is required"),
        Some(Value::String(s)) if s.trim().is_empty() => Err("Provider ID is required"),
        Some(Value::String(s)) => Uuid::parse_str(s.trim()).map_err(|_| "Provider ID must be a valid identifier"),
        Some(_) => Err("Provider ID must be a valid identifier"),
    };
    parsed.map_err(|m| out.push(FieldViolation::new("providerId", m))).ok()
}

fn finish<T>(violations: Vec<FieldViolation>, value: Option<T>) -> Result<T, ServiceError> {
    match value {
        Some(v) if violations.is_empty() => Ok(v),
        _ => Err(ServiceError::Validation(violations)),
    }
}

pub fn validate_provider(input: &ProviderInput) -> Result<ProviderFields, ServiceError> {
    let mut out = Vec::new();
    let name = check(&NAME, input.name.as_deref(), &mut out);
    let email = check(&EMAIL, input.email.as_deref(), &mut out);
    let phone = check(&PHONE, input.phone.as_deref(), &mut out);
    let address = check(&ADDRESS, input.address.as_deref(), &mut out);
    let fields = match (name, email, phone, address) {
        (Some(name), Some(email), Some(phone), Some(address)) => Some(ProviderFields {
            name: name.to_string(),
            email: email.to_string(),
            phone: Some(phone.to_string()),
            address: Some(address.to_string()),
        }),
        _ => None,
    };
    finish(out, fields)
}

fn service_fields(
    name: Option<&str>,
    description: Option<&str>,
    price: Option<&Value>,
    out: &mut Vec<FieldViolation>,
) -> Option<ServiceFields> {
    let name = check(&NAME, name, out);
    let description = check(&DESCRIPTION, description, out);
    let price = check_price(price, out);
    Some(ServiceFields {
        name: name?.to_string(),
        description: Some(description?.to_string()),
        price: price?,
    })
}

/// Returns the owning provider id alongside the normalized fields.
pub fn validate_service_create(input: &ServiceInput) -> Result<(Uuid, ServiceFields), ServiceError> {
    let mut out = Vec::new();
    let fields = service_fields(input.name.as_deref(), input.description.as_deref(), input.price.as_ref(), &mut out);
    let provider_id = check_provider_id(input.provider_id.as_ref(), &mut out);
    finish(out, provider_id.zip(fields))
}

pub fn validate_service_update(input: &ServiceUpdateInput) -> Result<ServiceFields, ServiceError> {
    let mut out = Vec::new();
    let fields = service_fields(input.name.as_deref(), input.description.as_deref(), input.price.as_ref(), &mut out);
    finish(out, fields)
}
