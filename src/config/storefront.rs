//! Storefront configuration loading from storefront.toml
//!
//! The file holds the cart sync debounce and the seed catalog used when the
//! local store has nothing saved yet. When no `storefront.toml` is present the
//! bundled `seed.toml` is used instead.

use crate::core::models::{AppSettings, DealProduct, MenuEntry, Product, ProductImage};
use crate::core::slug::slugify;
use crate::core::state::StoreSnapshot;
use crate::errors::{Error, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use tracing::info;

const DEFAULT_CONFIG_PATH: &str = "storefront.toml";
const BUNDLED_SEED: &str = include_str!("seed.toml");

/// Configuration structure representing the entire storefront.toml file
#[derive(Debug, Default, Deserialize)]
pub struct StorefrontConfig {
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub products: Vec<ProductSeed>,
    #[serde(default)]
    pub deals: Vec<DealSeed>,
    #[serde(default)]
    pub menu: Vec<MenuSeed>,
    #[serde(default)]
    pub settings: SettingsSeed,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Quiet period before a remote cart write is sent
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

const fn default_debounce_ms() -> u64 {
    1000
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl SyncConfig {
    #[must_use]
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// A catalog product as written in the config file.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductSeed {
    pub id: String,
    pub name: String,
    /// Derived from `name` when omitted
    pub slug: Option<String>,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    #[serde(default)]
    pub category: String,
    /// Image URLs; a placeholder is used when empty
    #[serde(default)]
    pub images: Vec<String>,
    pub download_file: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DealSeed {
    #[serde(flatten)]
    pub product: ProductSeed,
    pub discount_price: f64,
    pub stock: u32,
    #[serde(default)]
    pub sold: u32,
    #[serde(default)]
    pub rating: f32,
    pub offer_ends_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MenuSeed {
    pub label: String,
    pub href: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsSeed {
    #[serde(default)]
    pub share_link: String,
}

impl ProductSeed {
    fn to_product(&self, now: DateTime<Utc>) -> Result<Product> {
        if self.name.trim().is_empty() {
            return Err(Error::Config {
                message: format!("product {} has an empty name", self.id),
            });
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(Error::InvalidAmount { amount: self.price });
        }
        let slug = self.slug.clone().unwrap_or_else(|| slugify(&self.name));
        let images = if self.images.is_empty() {
            vec![ProductImage::placeholder(&slug)]
        } else {
            self.images
                .iter()
                .map(|url| ProductImage {
                    url: url.clone(),
                    alt: self.name.clone(),
                })
                .collect()
        };
        Ok(Product {
            id: self.id.clone(),
            slug,
            name: self.name.clone(),
            description: self.description.clone(),
            price: self.price,
            images,
            category: self.category.clone(),
            created_at: self.created_at.unwrap_or(now),
            download_file: self.download_file.clone(),
        })
    }
}

impl StorefrontConfig {
    /// Builds the seed snapshot. Product and deal ids must be unique across
    /// both catalogs.
    pub fn seed_snapshot(&self, now: DateTime<Utc>) -> Result<StoreSnapshot> {
        let mut seen = HashSet::new();
        let ids = self
            .products
            .iter()
            .chain(self.deals.iter().map(|deal| &deal.product))
            .map(|seed| seed.id.as_str());
        for id in ids {
            if !seen.insert(id) {
                return Err(Error::Config {
                    message: format!("duplicate catalog id '{id}'"),
                });
            }
        }

        let products = self
            .products
            .iter()
            .map(|seed| seed.to_product(now))
            .collect::<Result<Vec<_>>>()?;
        let deals = self
            .deals
            .iter()
            .map(|seed| {
                Ok(DealProduct {
                    product: seed.product.to_product(now)?,
                    discount_price: seed.discount_price,
                    stock: seed.stock,
                    sold: seed.sold,
                    rating: seed.rating,
                    offer_ends_at: seed.offer_ends_at,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let menu_entries = self
            .menu
            .iter()
            .enumerate()
            .map(|(index, seed)| MenuEntry {
                id: format!("menu-{}", index + 1),
                slug: slugify(&seed.label),
                label: seed.label.clone(),
                href: seed.href.clone(),
                created_at: now,
            })
            .collect();

        Ok(StoreSnapshot {
            products,
            deals,
            menu_entries,
            settings: AppSettings {
                share_link: self.settings.share_link.clone(),
            },
            ..StoreSnapshot::default()
        })
    }
}

/// Parses storefront configuration from TOML text.
pub fn parse_config(contents: &str) -> Result<StorefrontConfig> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse storefront config: {e}"),
    })
}

/// Loads storefront configuration from a TOML file
///
/// # Errors
/// Returns an error if the file cannot be read, the TOML syntax is invalid
/// or required fields are missing.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<StorefrontConfig> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;
    parse_config(&contents)
}

/// Loads `STOREFRONT_CONFIG`, else `./storefront.toml`, else the bundled seed.
pub fn load_default_config() -> Result<StorefrontConfig> {
    if let Ok(path) = std::env::var("STOREFRONT_CONFIG") {
        info!("Loading storefront config from {}", path);
        return load_config(path);
    }
    if Path::new(DEFAULT_CONFIG_PATH).exists() {
        info!("Loading storefront config from {}", DEFAULT_CONFIG_PATH);
        return load_config(DEFAULT_CONFIG_PATH);
    }
    info!("No {} found, using bundled seed catalog", DEFAULT_CONFIG_PATH);
    parse_config(BUNDLED_SEED)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;

    #[test]
    fn test_parse_storefront_config() {
        let toml_str = r#"
            [sync]
            debounce_ms = 250

            [[products]]
            id = "prod1"
            name = "Classic Wedding Invite"
            price = 120.0
            category = "wedding"

            [[deals]]
            id = "deal1"
            name = "Summer Deal Bundle"
            price = 200.0
            discount_price = 150.0
            stock = 60
            sold = 20
            offer_ends_at = "2030-01-01T00:00:00Z"

            [settings]
            share_link = "https://shop.example/s"
        "#;

        let config = parse_config(toml_str).unwrap();
        assert_eq!(config.sync.debounce(), Duration::from_millis(250));
        assert_eq!(config.products.len(), 1);
        assert_eq!(config.deals[0].product.name, "Summer Deal Bundle");
        assert_eq!(config.deals[0].discount_price, 150.0);

        let snapshot = config.seed_snapshot(Utc::now()).unwrap();
        assert_eq!(snapshot.products[0].slug, "classic-wedding-invite");
        assert_eq!(snapshot.products[0].images.len(), 1);
        assert_eq!(snapshot.deals[0].sold, 20);
        assert_eq!(snapshot.settings.share_link, "https://shop.example/s");
        assert!(snapshot.cart.is_empty());
    }

    #[test]
    fn test_defaults_when_sections_missing() {
        let config = parse_config("").unwrap();
        assert_eq!(config.sync.debounce_ms, 1000);
        assert!(config.products.is_empty());
    }

    #[test]
    fn test_missing_required_field() {
        let toml_str = r#"
            [[products]]
            id = "prod1"
            name = "No Price"
        "#;
        assert!(matches!(parse_config(toml_str), Err(Error::Config { .. })));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let toml_str = r#"
            [[products]]
            id = "x"
            name = "One"
            price = 1.0

            [[deals]]
            id = "x"
            name = "Two"
            price = 2.0
            discount_price = 1.0
            stock = 1
            offer_ends_at = "2030-01-01T00:00:00Z"
        "#;
        let config = parse_config(toml_str).unwrap();
        assert!(matches!(
            config.seed_snapshot(Utc::now()),
            Err(Error::Config { .. })
        ));
    }

    #[test]
    fn test_bundled_seed_is_valid() {
        let config = parse_config(BUNDLED_SEED).unwrap();
        let snapshot = config.seed_snapshot(Utc::now()).unwrap();
        assert!(!snapshot.products.is_empty());
        assert!(!snapshot.deals.is_empty());
        assert!(!snapshot.menu_entries.is_empty());
    }
}
