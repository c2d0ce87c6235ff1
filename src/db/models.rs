use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::db::schema::{
    categories, category_images, hero_images, product_images, products, site_settings, users,
};

pub const DEFAULT_STORE_NAME: &str = "AL-MUSLIMAH CLOTHINGS & SHOES";
pub const DEFAULT_WHATSAPP: &str = "07016342022";
pub const DEFAULT_TELEGRAM: &str = "07016342022";
pub const DEFAULT_LOCATION_KONTAGORA: &str =
    "1st floor by LAPO office, Madengene plaza, Opposite Korna amala, Kontagora, Niger state.";
pub const DEFAULT_LOCATION_ABUJA: &str =
    "Opposite Zahra bread, Compensation lay out, Old kutunku, Gwagwalada FCT, Abuja.";

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    pub id: i32,
    pub username: String,
    /// Argon2 PHC string.
    pub password: String,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub username: String,
    pub password: String,
}

#[derive(Queryable, Selectable, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[diesel(table_name = categories)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    #[serde(rename = "order")]
    pub sort_order: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = categories)]
pub struct NewCategory {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub sort_order: i32,
}

#[derive(AsChangeset, Debug, Clone, Default)]
#[diesel(table_name = categories)]
pub struct CategoryChanges {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<Option<String>>,
    pub sort_order: Option<i32>,
}

/// A category annotated with the url of its lowest `(order, id)` image.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CategoryWithImage {
    #[serde(flatten)]
    pub category: Category,
    pub primary_image_url: Option<String>,
}

#[derive(Queryable, Selectable, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[diesel(table_name = category_images)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct CategoryImage {
    pub id: i32,
    pub url: String,
    pub category_id: i32,
    #[serde(rename = "order")]
    pub sort_order: i32,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = category_images)]
pub struct NewCategoryImage {
    pub url: String,
    pub category_id: i32,
    pub sort_order: i32,
}

#[derive(Queryable, Selectable, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[diesel(table_name = products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub price: f64,
    pub size: Option<String>,
    pub weight: Option<String>,
    pub quantity: Option<i32>,
    pub category_id: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = products)]
pub struct NewProduct {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub price: f64,
    pub size: Option<String>,
    pub weight: Option<String>,
    pub quantity: Option<i32>,
    pub category_id: i32,
}

#[derive(AsChangeset, Debug, Clone, Default)]
#[diesel(table_name = products)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<Option<String>>,
    pub price: Option<f64>,
    pub size: Option<Option<String>>,
    pub weight: Option<Option<String>>,
    pub quantity: Option<Option<i32>>,
    pub category_id: Option<i32>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductWithImage {
    #[serde(flatten)]
    pub product: Product,
    pub primary_image_url: Option<String>,
}

#[derive(Queryable, Selectable, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[diesel(table_name = product_images)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct ProductImage {
    pub id: i32,
    pub url: String,
    pub product_id: i32,
    #[serde(rename = "order")]
    pub sort_order: i32,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = product_images)]
pub struct NewProductImage {
    pub url: String,
    pub product_id: i32,
    pub sort_order: i32,
}

#[derive(Queryable, Selectable, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[diesel(table_name = hero_images)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct HeroImage {
    pub id: i32,
    pub url: String,
    #[serde(rename = "order")]
    pub sort_order: i32,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = hero_images)]
pub struct NewHeroImage {
    pub url: String,
    pub sort_order: i32,
}

#[derive(Queryable, Selectable, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[diesel(table_name = site_settings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct SiteSetting {
    pub id: i32,
    pub store_name: String,
    pub whatsapp: String,
    pub telegram: String,
    pub facebook: Option<String>,
    pub location_kontagora: String,
    pub location_abuja: String,
    pub hero_image_url: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl SiteSetting {
    /// The row the database would create from its column defaults.
    pub fn with_defaults(now: NaiveDateTime) -> Self {
        SiteSetting {
            id: 1,
            store_name: DEFAULT_STORE_NAME.to_string(),
            whatsapp: DEFAULT_WHATSAPP.to_string(),
            telegram: DEFAULT_TELEGRAM.to_string(),
            facebook: None,
            location_kontagora: DEFAULT_LOCATION_KONTAGORA.to_string(),
            location_abuja: DEFAULT_LOCATION_ABUJA.to_string(),
            hero_image_url: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(AsChangeset, Debug, Clone, Default)]
#[diesel(table_name = site_settings)]
pub struct SiteSettingChanges {
    pub store_name: Option<String>,
    pub whatsapp: Option<String>,
    pub telegram: Option<String>,
    pub facebook: Option<Option<String>>,
    pub location_kontagora: Option<String>,
    pub location_abuja: Option<String>,
    pub hero_image_url: Option<Option<String>>,
}
