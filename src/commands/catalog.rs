//! Services page commands: browse, filter, search, rate.

use chrono::Utc;
use serde::Serialize;

use super::Notification;
use crate::catalog::{self, CategoryFilter, Service};
use crate::core_state::{CoreError, CoreState};
use crate::persistence::CatalogPreferences;
use crate::validation::{self, ValidationError};

#[derive(Debug, Clone, Serialize)]
pub struct ServiceCard {
    pub service: &'static Service,
    /// Query string for the appointments page.
    pub booking_link: String,
    /// Average of ratings left on this device.
    pub user_rating: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogView {
    pub filter: &'static str,
    pub filter_label: &'static str,
    pub search: String,
    pub services: Vec<ServiceCard>,
}

fn card(state: &CoreState, service: &'static Service) -> Result<ServiceCard, CoreError> {
    Ok(ServiceCard {
        service,
        booking_link: catalog::booking_link(service.id).unwrap_or_default(),
        user_rating: state.store().average_rating(service.id)?,
    })
}

/// Filter and search the directory, remembering the choice.
pub fn browse_services(
    state: &CoreState,
    filter: &str,
    search: &str,
) -> Result<CatalogView, Notification> {
    let filter = CategoryFilter::parse(filter);
    let services = catalog::browse(filter, search)
        .into_iter()
        .map(|s| card(state, s))
        .collect::<Result<Vec<_>, _>>()?;

    let prefs = CatalogPreferences {
        last_filter: filter.as_str().to_string(),
        last_search: search.trim().to_string(),
        timestamp: Some(Utc::now()),
    };
    if let Err(e) = state.store().save_preferences(&prefs) {
        tracing::warn!("Failed to save catalog preferences: {e}");
    }

    tracing::debug!(filter = filter.as_str(), results = services.len(), "Catalog browsed");
    Ok(CatalogView {
        filter: filter.as_str(),
        filter_label: filter.label(),
        search: prefs.last_search,
        services,
    })
}

/// Re-open the services page with the last filter and search.
pub fn restore_catalog(state: &CoreState) -> Result<CatalogView, Notification> {
    let prefs = state.store().load_preferences().map_err(CoreError::from)?;
    browse_services(state, &prefs.last_filter, &prefs.last_search)
}

pub fn get_service(state: &CoreState, service_id: &str) -> Result<ServiceCard, Notification> {
    let service = catalog::find_service(service_id)
        .ok_or_else(|| ValidationError::UnknownService(service_id.to_string()))?;
    Ok(card(state, service)?)
}

/// Record a 1-5 rating. Returns the new average.
pub fn rate_service(state: &CoreState, service_id: &str, rating: u8) -> Result<f64, Notification> {
    if catalog::find_service(service_id).is_none() {
        return Err(ValidationError::UnknownService(service_id.to_string()).into());
    }
    let rating = validation::validate_rating(rating)?;
    let average = state
        .store()
        .add_rating(service_id, rating)
        .map_err(CoreError::from)?;
    tracing::info!(service = service_id, rating, "Service rated");
    Ok(average)
}
