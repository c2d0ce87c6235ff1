//! The persistence seam.
//!
//! Every handler reaches the catalog through [`Storage`]. Two backends exist:
//! [`crate::db::PgStorage`] over Postgres and [`crate::db::MemoryStorage`],
//! which keeps the same tables in process memory.
//!
//! Lookups report absence as `Ok(None)`. Errors are reserved for rule
//! violations and backend failures.

use thiserror::Error;

use crate::db::models::*;

#[derive(Debug, Error)]
pub enum StorageError {
    /// A referenced row (usually a parent category or product) does not exist.
    #[error("{0}")]
    NotFound(String),
    /// A business rule refused the mutation before anything was written.
    #[error("{0}")]
    Conflict(String),
    /// A constraint such as slug uniqueness rejected the write.
    #[error("{0}")]
    Validation(String),
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),
    #[error("migration error: {0}")]
    Migration(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Result of deleting image rows, directly or through their parent.
///
/// `image_urls` lists only urls that no remaining row references, so the
/// caller can clean up those hosted assets once the local delete has
/// committed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Removed {
    pub image_urls: Vec<String>,
}

pub const CATEGORY_HAS_PRODUCTS: &str =
    "Cannot delete category with existing products. Please remove or reassign products first.";

pub trait Storage: Send + Sync {
    /// Cheap round trip used by the health endpoint.
    fn ping(&self) -> StorageResult<()>;

    // Users
    fn get_user_by_username(&self, username: &str) -> StorageResult<Option<User>>;
    fn create_user(&self, user: NewUser) -> StorageResult<User>;
    fn set_user_password(&self, username: &str, password_hash: &str) -> StorageResult<bool>;

    // Categories, ordered by (order, name)
    fn list_categories(&self) -> StorageResult<Vec<CategoryWithImage>>;
    fn get_category(&self, id: i32) -> StorageResult<Option<CategoryWithImage>>;
    fn get_category_by_slug(&self, slug: &str) -> StorageResult<Option<CategoryWithImage>>;
    /// Inserts the category and one image row per url, in one transaction.
    fn create_category(
        &self,
        category: NewCategory,
        image_urls: Vec<String>,
    ) -> StorageResult<Category>;
    fn update_category(&self, id: i32, changes: CategoryChanges)
        -> StorageResult<Option<Category>>;
    /// Refuses with [`StorageError::Conflict`] while products reference the
    /// category. `Ok(None)` when the id is unknown.
    fn delete_category(&self, id: i32) -> StorageResult<Option<Removed>>;

    // Category images, ordered by (order, id)
    fn list_category_images(&self, category_id: i32) -> StorageResult<Vec<CategoryImage>>;
    fn create_category_image(&self, image: NewCategoryImage) -> StorageResult<CategoryImage>;
    fn delete_category_image(&self, id: i32) -> StorageResult<Option<Removed>>;

    // Products, newest first
    fn list_products(&self) -> StorageResult<Vec<ProductWithImage>>;
    fn list_products_by_category(&self, category_id: i32)
        -> StorageResult<Vec<ProductWithImage>>;
    fn get_product(&self, id: i32) -> StorageResult<Option<ProductWithImage>>;
    fn get_product_by_slug(&self, slug: &str) -> StorageResult<Option<ProductWithImage>>;
    fn create_product(&self, product: NewProduct, image_urls: Vec<String>)
        -> StorageResult<Product>;
    fn update_product(&self, id: i32, changes: ProductChanges) -> StorageResult<Option<Product>>;
    fn delete_product(&self, id: i32) -> StorageResult<Option<Removed>>;

    // Product images, ordered by (order, id)
    fn list_product_images(&self, product_id: i32) -> StorageResult<Vec<ProductImage>>;
    fn create_product_image(&self, image: NewProductImage) -> StorageResult<ProductImage>;
    fn delete_product_image(&self, id: i32) -> StorageResult<Option<Removed>>;

    // Hero images, ordered by (order, id)
    fn list_hero_images(&self) -> StorageResult<Vec<HeroImage>>;
    fn create_hero_image(&self, image: NewHeroImage) -> StorageResult<HeroImage>;
    fn delete_hero_image(&self, id: i32) -> StorageResult<Option<Removed>>;

    /// Returns the settings row, creating it from defaults on first access.
    fn get_site_settings(&self) -> StorageResult<SiteSetting>;
    fn update_site_settings(&self, changes: SiteSettingChanges) -> StorageResult<SiteSetting>;
}
