//! Catalog statistics for the admin endpoint and the `stats` command.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::errors::ServiceError;
use crate::repository::ProviderRepository;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogStats {
    pub total_providers: u64,
    pub total_services: u64,
    /// Rounded to two decimals; `0` when there are no providers.
    pub avg_services_per_provider: f64,
    pub providers_without_services: u64,
    /// Exact sum of service prices.
    pub total_service_value: Decimal,
}

impl CatalogStats {
    pub fn rows(&self) -> Vec<(&'static str, String)> {
        vec![
            ("total_providers", self.total_providers.to_string()),
            ("total_services", self.total_services.to_string()),
            ("avg_services_per_provider", format!("{:.2}", self.avg_services_per_provider)),
            ("providers_without_services", self.providers_without_services.to_string()),
            ("total_service_value", self.total_service_value.to_string()),
        ]
    }

    /// Two-column `Metric | Value` table.
    pub fn render_table(&self) -> String {
        let rows = self.rows();
        let width = rows.iter().map(|(k, _)| k.len()).max().unwrap_or(0).max("Metric".len());
        let mut out = format!("{:<width$} | Value\n{}-+-{}\n", "Metric", "-".repeat(width), "-".repeat(12));
        for (k, v) in rows {
            out.push_str(&format!("{k:<width$} | {v}\n"));
        }
        out
    }
}

pub async fn generate(providers: &dyn ProviderRepository) -> Result<CatalogStats, ServiceError> {
    let rows = providers.list_with_services().await?;
    let total_providers = rows.len() as u64;
    let total_services: u64 = rows.iter().map(|(_, s)| s.len() as u64).sum();
    let providers_without_services = rows.iter().filter(|(_, s)| s.is_empty()).count() as u64;
    let total_service_value: Decimal = rows.iter().flat_map(|(_, s)| s.iter().map(|s| s.price)).sum();

    let avg_services_per_provider = if total_providers == 0 {
        0.0
    } else {
        let avg = Decimal::from(total_services) / Decimal::from(total_providers);
        avg.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero).to_string().parse().unwrap_or(0.0)
    };

    tracing::info!(total_providers, total_services, "catalog statistics generated");
    Ok(CatalogStats {
        total_providers,
        total_services,
        avg_services_per_provider,
        providers_without_services,
        total_service_value,
    })
}
