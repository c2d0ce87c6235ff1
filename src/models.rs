//! Request bodies accepted by the API and their field-by-field validation.
//!
//! Create bodies turn into the insertable rows in [`crate::db::models`];
//! patch bodies turn into changesets where an absent field is left alone.

use serde::{Deserialize, Deserializer};

use crate::db::models::{
    CategoryChanges, NewCategory, NewProduct, ProductChanges, SiteSettingChanges,
};

/// Lets a patch body distinguish an absent field (`None`) from an explicit
/// `null` (`Some(None)`).
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Lowercase ASCII letters and digits in hyphen-separated runs.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug.split('-').all(|part| {
            !part.is_empty()
                && part
                    .bytes()
                    .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
        })
}

/// Derives a slug from a display name: "Hijabs & Veils" becomes "hijabs-veils".
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

fn require_name(name: &str, what: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err(format!("{what} name cannot be empty"));
    }
    Ok(())
}

fn check_slug(slug: &str) -> Result<(), String> {
    if slug.is_empty() {
        return Err("Slug is required".to_string());
    }
    if !is_valid_slug(slug) {
        return Err(format!(
            "Invalid slug \"{slug}\": use lowercase letters, digits and single hyphens"
        ));
    }
    Ok(())
}

fn resolve_slug(slug: Option<String>, name: &str) -> Result<String, String> {
    let slug = match slug {
        Some(slug) => slug.trim().to_string(),
        None => slugify(name),
    };
    check_slug(&slug)?;
    Ok(slug)
}

fn check_price(price: f64) -> Result<(), String> {
    if !price.is_finite() || price < 0.0 {
        return Err("Product price must be a non-negative number".to_string());
    }
    Ok(())
}

fn check_quantity(quantity: Option<i32>) -> Result<(), String> {
    match quantity {
        Some(q) if q < 0 => Err("Product quantity cannot be negative".to_string()),
        _ => Ok(()),
    }
}

fn check_image_urls(urls: &[String]) -> Result<(), String> {
    if urls.iter().any(|url| url.trim().is_empty()) {
        return Err("Image URL cannot be empty".to_string());
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryRequest {
    pub name: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub order: Option<i32>,
    #[serde(default)]
    pub image_urls: Vec<String>,
}

impl CreateCategoryRequest {
    pub fn into_new(self) -> Result<(NewCategory, Vec<String>), String> {
        require_name(&self.name, "Category")?;
        check_image_urls(&self.image_urls)?;
        let slug = resolve_slug(self.slug, &self.name)?;
        let category = NewCategory {
            name: self.name.trim().to_string(),
            slug,
            description: self.description,
            sort_order: self.order.unwrap_or(0),
        };
        Ok((category, self.image_urls))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    pub order: Option<i32>,
}

impl UpdateCategoryRequest {
    pub fn into_changes(self) -> Result<CategoryChanges, String> {
        if let Some(name) = &self.name {
            require_name(name, "Category")?;
        }
        if let Some(slug) = &self.slug {
            check_slug(slug)?;
        }
        Ok(CategoryChanges {
            name: self.name.map(|n| n.trim().to_string()),
            slug: self.slug,
            description: self.description,
            sort_order: self.order,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub name: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub price: f64,
    pub size: Option<String>,
    pub weight: Option<String>,
    pub quantity: Option<i32>,
    pub category_id: i32,
    #[serde(default)]
    pub image_urls: Vec<String>,
}

impl CreateProductRequest {
    pub fn into_new(self) -> Result<(NewProduct, Vec<String>), String> {
        require_name(&self.name, "Product")?;
        check_price(self.price)?;
        check_quantity(self.quantity)?;
        check_image_urls(&self.image_urls)?;
        let slug = resolve_slug(self.slug, &self.name)?;
        let product = NewProduct {
            name: self.name.trim().to_string(),
            slug,
            description: self.description,
            price: self.price,
            size: self.size,
            weight: self.weight,
            quantity: self.quantity,
            category_id: self.category_id,
        };
        Ok((product, self.image_urls))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "nullable")]
    pub size: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub weight: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub quantity: Option<Option<i32>>,
    pub category_id: Option<i32>,
}

impl UpdateProductRequest {
    pub fn into_changes(self) -> Result<ProductChanges, String> {
        if let Some(name) = &self.name {
            require_name(name, "Product")?;
        }
        if let Some(slug) = &self.slug {
            check_slug(slug)?;
        }
        if let Some(price) = self.price {
            check_price(price)?;
        }
        if let Some(quantity) = self.quantity {
            check_quantity(quantity)?;
        }
        Ok(ProductChanges {
            name: self.name.map(|n| n.trim().to_string()),
            slug: self.slug,
            description: self.description,
            price: self.price,
            size: self.size,
            weight: self.weight,
            quantity: self.quantity,
            category_id: self.category_id,
        })
    }
}

/// Body for attaching an already-uploaded image url to a category, product
/// or the homepage carousel.
#[derive(Debug, Deserialize)]
pub struct CreateImageRequest {
    pub url: String,
    pub order: Option<i32>,
}

impl CreateImageRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.url.trim().is_empty() {
            return Err("Image URL cannot be empty".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingsRequest {
    pub store_name: Option<String>,
    pub whatsapp: Option<String>,
    pub telegram: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub facebook: Option<Option<String>>,
    pub location_kontagora: Option<String>,
    pub location_abuja: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub hero_image_url: Option<Option<String>>,
}

impl UpdateSettingsRequest {
    pub fn into_changes(self) -> Result<SiteSettingChanges, String> {
        if let Some(name) = &self.store_name {
            require_name(name, "Store")?;
        }
        Ok(SiteSettingChanges {
            store_name: self.store_name,
            whatsapp: self.whatsapp,
            telegram: self.telegram,
            facebook: self.facebook,
            location_kontagora: self.location_kontagora,
            location_abuja: self.location_abuja,
            hero_image_url: self.hero_image_url,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}
