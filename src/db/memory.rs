//! In-process [`Storage`] backend.
//!
//! Holds every table in a single mutex so each call observes and mutates a
//! consistent snapshot, which gives the same all-or-nothing behaviour the
//! Postgres backend gets from transactions. Used by the test suite and by the
//! `storage = "memory"` demo mode.

use std::sync::{Mutex, MutexGuard};

use chrono::{NaiveDateTime, Utc};

use crate::db::models::*;
use crate::storage::{Removed, Storage, StorageError, StorageResult, CATEGORY_HAS_PRODUCTS};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    categories: Vec<Category>,
    category_images: Vec<CategoryImage>,
    products: Vec<Product>,
    product_images: Vec<ProductImage>,
    hero_images: Vec<HeroImage>,
    settings: Option<SiteSetting>,
    last_id: i32,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.last_id += 1;
        self.last_id
    }

    fn category_slug_taken(&self, slug: &str, except: Option<i32>) -> bool {
        self.categories
            .iter()
            .any(|c| c.slug == slug && Some(c.id) != except)
    }

    fn product_slug_taken(&self, slug: &str, except: Option<i32>) -> bool {
        self.products
            .iter()
            .any(|p| p.slug == slug && Some(p.id) != except)
    }

    fn has_category(&self, id: i32) -> bool {
        self.categories.iter().any(|c| c.id == id)
    }

    fn has_product(&self, id: i32) -> bool {
        self.products.iter().any(|p| p.id == id)
    }

    fn category_primary(&self, category_id: i32) -> Option<String> {
        self.category_images
            .iter()
            .filter(|img| img.category_id == category_id)
            .min_by_key(|img| (img.sort_order, img.id))
            .map(|img| img.url.clone())
    }

    fn product_primary(&self, product_id: i32) -> Option<String> {
        self.product_images
            .iter()
            .filter(|img| img.product_id == product_id)
            .min_by_key(|img| (img.sort_order, img.id))
            .map(|img| img.url.clone())
    }

    fn category_view(&self, category: &Category) -> CategoryWithImage {
        CategoryWithImage {
            primary_image_url: self.category_primary(category.id),
            category: category.clone(),
        }
    }

    fn product_view(&self, product: &Product) -> ProductWithImage {
        ProductWithImage {
            primary_image_url: self.product_primary(product.id),
            product: product.clone(),
        }
    }

    fn product_views<'a>(
        &self,
        rows: impl Iterator<Item = &'a Product>,
    ) -> Vec<ProductWithImage> {
        let mut rows: Vec<&Product> = rows.collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        rows.into_iter().map(|p| self.product_view(p)).collect()
    }

    fn references(&self, url: &str) -> bool {
        self.category_images.iter().any(|img| img.url == url)
            || self.product_images.iter().any(|img| img.url == url)
            || self.hero_images.iter().any(|img| img.url == url)
            || self
                .settings
                .as_ref()
                .is_some_and(|s| s.hero_image_url.as_deref() == Some(url))
    }

    /// Urls among `urls` that nothing references any more, without repeats.
    fn orphaned(&self, urls: Vec<String>) -> Removed {
        let mut image_urls: Vec<String> = Vec::with_capacity(urls.len());
        for url in urls {
            if !self.references(&url) && !image_urls.contains(&url) {
                image_urls.push(url);
            }
        }
        Removed { image_urls }
    }

    fn settings(&mut self, now: NaiveDateTime) -> &mut SiteSetting {
        self.settings
            .get_or_insert_with(|| SiteSetting::with_defaults(now))
    }
}

fn duplicate_slug(kind: &str, slug: &str) -> StorageError {
    StorageError::Validation(format!("A {kind} with slug \"{slug}\" already exists"))
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

#[derive(Default)]
pub struct MemoryStorage {
    tables: Mutex<Tables>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        MemoryStorage::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        // A panic mid-call never leaves a half-applied write: every method
        // validates before it mutates.
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn settings_rows(&self) -> usize {
        usize::from(self.lock().settings.is_some())
    }
}

impl Storage for MemoryStorage {
    fn ping(&self) -> StorageResult<()> {
        Ok(())
    }

    fn get_user_by_username(&self, username: &str) -> StorageResult<Option<User>> {
        Ok(self
            .lock()
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    fn create_user(&self, user: NewUser) -> StorageResult<User> {
        let mut tables = self.lock();
        if tables.users.iter().any(|u| u.username == user.username) {
            return Err(StorageError::Validation(format!(
                "A user named \"{}\" already exists",
                user.username
            )));
        }
        let created = User {
            id: tables.next_id(),
            username: user.username,
            password: user.password,
            created_at: now(),
        };
        tables.users.push(created.clone());
        Ok(created)
    }

    fn set_user_password(&self, username: &str, password_hash: &str) -> StorageResult<bool> {
        let mut tables = self.lock();
        match tables.users.iter_mut().find(|u| u.username == username) {
            Some(user) => {
                user.password = password_hash.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn list_categories(&self) -> StorageResult<Vec<CategoryWithImage>> {
        let tables = self.lock();
        let mut rows: Vec<&Category> = tables.categories.iter().collect();
        rows.sort_by(|a, b| {
            a.sort_order
                .cmp(&b.sort_order)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(rows.into_iter().map(|c| tables.category_view(c)).collect())
    }

    fn get_category(&self, id: i32) -> StorageResult<Option<CategoryWithImage>> {
        let tables = self.lock();
        Ok(tables
            .categories
            .iter()
            .find(|c| c.id == id)
            .map(|c| tables.category_view(c)))
    }

    fn get_category_by_slug(&self, slug: &str) -> StorageResult<Option<CategoryWithImage>> {
        let tables = self.lock();
        Ok(tables
            .categories
            .iter()
            .find(|c| c.slug == slug)
            .map(|c| tables.category_view(c)))
    }

    fn create_category(
        &self,
        category: NewCategory,
        image_urls: Vec<String>,
    ) -> StorageResult<Category> {
        let mut tables = self.lock();
        if tables.category_slug_taken(&category.slug, None) {
            return Err(duplicate_slug("category", &category.slug));
        }
        let stamp = now();
        let created = Category {
            id: tables.next_id(),
            name: category.name,
            slug: category.slug,
            description: category.description,
            sort_order: category.sort_order,
            created_at: stamp,
            updated_at: stamp,
        };
        tables.categories.push(created.clone());
        for (position, url) in image_urls.into_iter().enumerate() {
            let id = tables.next_id();
            tables.category_images.push(CategoryImage {
                id,
                url,
                category_id: created.id,
                sort_order: position as i32,
                created_at: stamp,
            });
        }
        Ok(created)
    }

    fn update_category(
        &self,
        id: i32,
        changes: CategoryChanges,
    ) -> StorageResult<Option<Category>> {
        let mut tables = self.lock();
        if let Some(slug) = &changes.slug {
            if tables.category_slug_taken(slug, Some(id)) {
                return Err(duplicate_slug("category", slug));
            }
        }
        let Some(category) = tables.categories.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            category.name = name;
        }
        if let Some(slug) = changes.slug {
            category.slug = slug;
        }
        if let Some(description) = changes.description {
            category.description = description;
        }
        if let Some(sort_order) = changes.sort_order {
            category.sort_order = sort_order;
        }
        category.updated_at = now();
        Ok(Some(category.clone()))
    }

    fn delete_category(&self, id: i32) -> StorageResult<Option<Removed>> {
        let mut tables = self.lock();
        if !tables.has_category(id) {
            return Ok(None);
        }
        if tables.products.iter().any(|p| p.category_id == id) {
            return Err(StorageError::Conflict(CATEGORY_HAS_PRODUCTS.to_string()));
        }
        let (owned, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut tables.category_images)
            .into_iter()
            .partition(|img| img.category_id == id);
        tables.category_images = kept;
        tables.categories.retain(|c| c.id != id);
        Ok(Some(tables.orphaned(owned.into_iter().map(|img| img.url).collect())))
    }

    fn list_category_images(&self, category_id: i32) -> StorageResult<Vec<CategoryImage>> {
        let tables = self.lock();
        let mut rows: Vec<CategoryImage> = tables
            .category_images
            .iter()
            .filter(|img| img.category_id == category_id)
            .cloned()
            .collect();
        rows.sort_by_key(|img| (img.sort_order, img.id));
        Ok(rows)
    }

    fn create_category_image(&self, image: NewCategoryImage) -> StorageResult<CategoryImage> {
        let mut tables = self.lock();
        if !tables.has_category(image.category_id) {
            return Err(StorageError::NotFound("Category not found".to_string()));
        }
        let created = CategoryImage {
            id: tables.next_id(),
            url: image.url,
            category_id: image.category_id,
            sort_order: image.sort_order,
            created_at: now(),
        };
        tables.category_images.push(created.clone());
        Ok(created)
    }

    fn delete_category_image(&self, id: i32) -> StorageResult<Option<Removed>> {
        let mut tables = self.lock();
        let Some(index) = tables.category_images.iter().position(|img| img.id == id) else {
            return Ok(None);
        };
        let removed = tables.category_images.remove(index);
        Ok(Some(tables.orphaned(vec![removed.url])))
    }

    fn list_products(&self) -> StorageResult<Vec<ProductWithImage>> {
        let tables = self.lock();
        Ok(tables.product_views(tables.products.iter()))
    }

    fn list_products_by_category(
        &self,
        category_id: i32,
    ) -> StorageResult<Vec<ProductWithImage>> {
        let tables = self.lock();
        Ok(tables.product_views(
            tables
                .products
                .iter()
                .filter(|p| p.category_id == category_id),
        ))
    }

    fn get_product(&self, id: i32) -> StorageResult<Option<ProductWithImage>> {
        let tables = self.lock();
        Ok(tables
            .products
            .iter()
            .find(|p| p.id == id)
            .map(|p| tables.product_view(p)))
    }

    fn get_product_by_slug(&self, slug: &str) -> StorageResult<Option<ProductWithImage>> {
        let tables = self.lock();
        Ok(tables
            .products
            .iter()
            .find(|p| p.slug == slug)
            .map(|p| tables.product_view(p)))
    }

    fn create_product(
        &self,
        product: NewProduct,
        image_urls: Vec<String>,
    ) -> StorageResult<Product> {
        let mut tables = self.lock();
        if !tables.has_category(product.category_id) {
            return Err(StorageError::NotFound("Category not found".to_string()));
        }
        if tables.product_slug_taken(&product.slug, None) {
            return Err(duplicate_slug("product", &product.slug));
        }
        let stamp = now();
        let created = Product {
            id: tables.next_id(),
            name: product.name,
            slug: product.slug,
            description: product.description,
            price: product.price,
            size: product.size,
            weight: product.weight,
            quantity: product.quantity,
            category_id: product.category_id,
            created_at: stamp,
            updated_at: stamp,
        };
        tables.products.push(created.clone());
        for (position, url) in image_urls.into_iter().enumerate() {
            let id = tables.next_id();
            tables.product_images.push(ProductImage {
                id,
                url,
                product_id: created.id,
                sort_order: position as i32,
                created_at: stamp,
            });
        }
        Ok(created)
    }

    fn update_product(&self, id: i32, changes: ProductChanges) -> StorageResult<Option<Product>> {
        let mut tables = self.lock();
        if let Some(category_id) = changes.category_id {
            if !tables.has_category(category_id) {
                return Err(StorageError::NotFound("Category not found".to_string()));
            }
        }
        if let Some(slug) = &changes.slug {
            if tables.product_slug_taken(slug, Some(id)) {
                return Err(duplicate_slug("product", slug));
            }
        }
        let Some(product) = tables.products.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            product.name = name;
        }
        if let Some(slug) = changes.slug {
            product.slug = slug;
        }
        if let Some(description) = changes.description {
            product.description = description;
        }
        if let Some(price) = changes.price {
            product.price = price;
        }
        if let Some(size) = changes.size {
            product.size = size;
        }
        if let Some(weight) = changes.weight {
            product.weight = weight;
        }
        if let Some(quantity) = changes.quantity {
            product.quantity = quantity;
        }
        if let Some(category_id) = changes.category_id {
            product.category_id = category_id;
        }
        product.updated_at = now();
        Ok(Some(product.clone()))
    }

    fn delete_product(&self, id: i32) -> StorageResult<Option<Removed>> {
        let mut tables = self.lock();
        if !tables.has_product(id) {
            return Ok(None);
        }
        let (owned, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut tables.product_images)
            .into_iter()
            .partition(|img| img.product_id == id);
        tables.product_images = kept;
        tables.products.retain(|p| p.id != id);
        Ok(Some(tables.orphaned(owned.into_iter().map(|img| img.url).collect())))
    }

    fn list_product_images(&self, product_id: i32) -> StorageResult<Vec<ProductImage>> {
        let tables = self.lock();
        let mut rows: Vec<ProductImage> = tables
            .product_images
            .iter()
            .filter(|img| img.product_id == product_id)
            .cloned()
            .collect();
        rows.sort_by_key(|img| (img.sort_order, img.id));
        Ok(rows)
    }

    fn create_product_image(&self, image: NewProductImage) -> StorageResult<ProductImage> {
        let mut tables = self.lock();
        if !tables.has_product(image.product_id) {
            return Err(StorageError::NotFound("Product not found".to_string()));
        }
        let created = ProductImage {
            id: tables.next_id(),
            url: image.url,
            product_id: image.product_id,
            sort_order: image.sort_order,
            created_at: now(),
        };
        tables.product_images.push(created.clone());
        Ok(created)
    }

    fn delete_product_image(&self, id: i32) -> StorageResult<Option<Removed>> {
        let mut tables = self.lock();
        let Some(index) = tables.product_images.iter().position(|img| img.id == id) else {
            return Ok(None);
        };
        let removed = tables.product_images.remove(index);
        Ok(Some(tables.orphaned(vec![removed.url])))
    }

    fn list_hero_images(&self) -> StorageResult<Vec<HeroImage>> {
        let mut rows = self.lock().hero_images.clone();
        rows.sort_by_key(|img| (img.sort_order, img.id));
        Ok(rows)
    }

    fn create_hero_image(&self, image: NewHeroImage) -> StorageResult<HeroImage> {
        let mut tables = self.lock();
        let created = HeroImage {
            id: tables.next_id(),
            url: image.url,
            sort_order: image.sort_order,
            created_at: now(),
        };
        tables.hero_images.push(created.clone());
        Ok(created)
    }

    fn delete_hero_image(&self, id: i32) -> StorageResult<Option<Removed>> {
        let mut tables = self.lock();
        let Some(index) = tables.hero_images.iter().position(|img| img.id == id) else {
            return Ok(None);
        };
        let removed = tables.hero_images.remove(index);
        Ok(Some(tables.orphaned(vec![removed.url])))
    }

    fn get_site_settings(&self) -> StorageResult<SiteSetting> {
        Ok(self.lock().settings(now()).clone())
    }

    fn update_site_settings(&self, changes: SiteSettingChanges) -> StorageResult<SiteSetting> {
        let mut tables = self.lock();
        let stamp = now();
        let settings = tables.settings(stamp);
        if let Some(store_name) = changes.store_name {
            settings.store_name = store_name;
        }
        if let Some(whatsapp) = changes.whatsapp {
            settings.whatsapp = whatsapp;
        }
        if let Some(telegram) = changes.telegram {
            settings.telegram = telegram;
        }
        if let Some(facebook) = changes.facebook {
            settings.facebook = facebook;
        }
        if let Some(location) = changes.location_kontagora {
            settings.location_kontagora = location;
        }
        if let Some(location) = changes.location_abuja {
            settings.location_abuja = location;
        }
        if let Some(url) = changes.hero_image_url {
            settings.hero_image_url = url;
        }
        settings.updated_at = stamp;
        Ok(settings.clone())
    }
}
