//! Product catalog route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use ironhouse_core::ProductId;
use serde::Deserialize;
use tracing::instrument;

use crate::backend::{BackendError, Product};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Listing order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    /// Newest first (backend order when dates are missing).
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    Name,
}

/// Query parameters for the product listing.
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub category: Option<String>,
    pub q: Option<String>,
    #[serde(default)]
    pub sort: ProductSort,
}

/// Filter and order active products for the listing.
#[must_use]
pub fn filter_products(products: &[Product], query: &ProductQuery) -> Vec<Product> {
    let category = query
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());
    let needle = query
        .q
        .as_deref()
        .map(|q| q.trim().to_lowercase())
        .filter(|q| !q.is_empty());

    let mut listed: Vec<Product> = products
        .iter()
        .filter(|p| p.is_active)
        .filter(|p| {
            category.is_none_or(|c| {
                p.category
                    .as_deref()
                    .is_some_and(|pc| pc.eq_ignore_ascii_case(c))
            })
        })
        .filter(|p| {
            needle.as_deref().is_none_or(|n| {
                p.name.to_lowercase().contains(n) || p.description.to_lowercase().contains(n)
            })
        })
        .cloned()
        .collect();

    match query.sort {
        ProductSort::Newest => listed.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        ProductSort::PriceAsc => listed.sort_by(|a, b| a.price.cmp(&b.price)),
        ProductSort::PriceDesc => listed.sort_by(|a, b| b.price.cmp(&a.price)),
        ProductSort::Name => listed.sort_by_cached_key(|p| p.name.to_lowercase()),
    }
    listed
}

/// `GET /api/products`
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<Vec<Product>>> {
    let products = state.backend().get_products().await?;
    Ok(Json(filter_products(&products, &query)))
}

/// `GET /api/products/{id}`
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    match state.backend().get_product(&id).await {
        Ok(product) if product.is_active => Ok(Json(product)),
        Ok(_) | Err(BackendError::NotFound(_)) => {
            Err(AppError::NotFound(format!("product {id}")))
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn product(id: &str, name: &str, price: i64, category: Option<&str>) -> Product {
        Product {
            id: ProductId::new(id),
            name: name.to_string(),
            description: format!("{name} for serious lifters"),
            price: Decimal::new(price, 0),
            category: category.map(String::from),
            stock: 10,
            image_url: None,
            is_active: true,
            created_at: None,
        }
    }

    fn catalog() -> Vec<Product> {
        let mut hidden = product("p4", "Old Shaker", 5, Some("accessories"));
        hidden.is_active = false;
        vec![
            product("p1", "Whey Protein", 2499, Some("supplements")),
            product("p2", "lifting belt", 1800, Some("Accessories")),
            product("p3", "Creatine", 899, Some("supplements")),
            hidden,
        ]
    }

    fn ids(products: &[Product]) -> Vec<&str> {
        products.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn test_inactive_hidden() {
        let listed = filter_products(&catalog(), &ProductQuery::default());
        assert_eq!(listed.len(), 3);
        assert!(listed.iter().all(|p| p.is_active));
    }

    #[test]
    fn test_category_filter_ignores_case() {
        let query = ProductQuery {
            category: Some("accessories".into()),
            ..ProductQuery::default()
        };
        assert_eq!(ids(&filter_products(&catalog(), &query)), vec!["p2"]);
    }

    #[test]
    fn test_search_matches_name_and_description() {
        let query = ProductQuery {
            q: Some("  PROTEIN ".into()),
            ..ProductQuery::default()
        };
        assert_eq!(ids(&filter_products(&catalog(), &query)), vec!["p1"]);

        let query = ProductQuery {
            q: Some("serious".into()),
            sort: ProductSort::Name,
            ..ProductQuery::default()
        };
        assert_eq!(ids(&filter_products(&catalog(), &query)), vec!["p3", "p2", "p1"]);
    }

    #[test]
    fn test_price_sorting() {
        let asc = ProductQuery {
            sort: ProductSort::PriceAsc,
            ..ProductQuery::default()
        };
        assert_eq!(ids(&filter_products(&catalog(), &asc)), vec!["p3", "p2", "p1"]);

        let desc = ProductQuery {
            sort: ProductSort::PriceDesc,
            ..ProductQuery::default()
        };
        assert_eq!(ids(&filter_products(&catalog(), &desc)), vec!["p1", "p2", "p3"]);
    }

    #[test]
    fn test_sort_from_query_string() {
        let query: ProductQuery = serde_json::from_str(r#"{"sort":"price_desc"}"#).unwrap_or_default();
        assert_eq!(query.sort, ProductSort::PriceDesc);
    }
}
