use std::collections::{HashMap, HashSet};

use chrono::Utc;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sql_types::{Array, Integer, Text};

use crate::db::connection::{PgPool, PgPooledConnection};
use crate::db::models::*;
use crate::db::schema::*;
use crate::storage::{Removed, Storage, StorageError, StorageResult, CATEGORY_HAS_PRODUCTS};

const SETTINGS_ID: i32 = 1;

/// Postgres-backed [`Storage`].
#[derive(Clone)]
pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    pub fn new(pool: PgPool) -> Self {
        PgStorage { pool }
    }

    fn conn(&self) -> StorageResult<PgPooledConnection> {
        Ok(self.pool.get()?)
    }
}

/// Classifies constraint failures raised by INSERT/UPDATE statements.
fn map_write_error(err: DieselError) -> StorageError {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            let message = match info.constraint_name() {
                Some(name) if name.ends_with("_slug_key") => "Slug is already in use".to_string(),
                _ => info.message().to_string(),
            };
            StorageError::Validation(message)
        }
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
            StorageError::NotFound(info.message().to_string())
        }
        other => StorageError::Database(other),
    }
}

#[derive(QueryableByName)]
struct PrimaryImage {
    #[diesel(sql_type = Integer)]
    parent_id: i32,
    #[diesel(sql_type = Text)]
    url: String,
}

/// First image per parent by `(order, id)`, fetched in one statement for all
/// of `parent_ids`.
fn primary_images(
    conn: &mut PgConnection,
    table: &str,
    parent_column: &str,
    parent_ids: Vec<i32>,
) -> QueryResult<HashMap<i32, String>> {
    if parent_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let query = format!(
        "SELECT DISTINCT ON ({parent_column}) {parent_column} AS parent_id, url \
         FROM {table} WHERE {parent_column} = ANY($1) \
         ORDER BY {parent_column}, \"order\", id"
    );
    let rows = diesel::sql_query(query)
        .bind::<Array<Integer>, _>(parent_ids)
        .load::<PrimaryImage>(conn)?;
    Ok(rows.into_iter().map(|row| (row.parent_id, row.url)).collect())
}

#[derive(QueryableByName)]
struct ReferencedUrl {
    #[diesel(sql_type = Text)]
    url: String,
}

/// Drops every url that a remaining image row or the settings row still
/// points at. Must run after the delete, inside the same transaction.
fn orphaned(conn: &mut PgConnection, urls: Vec<String>) -> QueryResult<Vec<String>> {
    if urls.is_empty() {
        return Ok(urls);
    }
    let referenced: HashSet<String> = diesel::sql_query(
        "SELECT url FROM category_images WHERE url = ANY($1) \
         UNION SELECT url FROM product_images WHERE url = ANY($1) \
         UNION SELECT url FROM hero_images WHERE url = ANY($1) \
         UNION SELECT hero_image_url AS url FROM site_settings WHERE hero_image_url = ANY($1)",
    )
    .bind::<Array<Text>, _>(urls.clone())
    .load::<ReferencedUrl>(conn)?
    .into_iter()
    .map(|row| row.url)
    .collect();
    let mut seen = HashSet::new();
    Ok(urls
        .into_iter()
        .filter(|url| !referenced.contains(url) && seen.insert(url.clone()))
        .collect())
}

fn with_category_images(
    conn: &mut PgConnection,
    rows: Vec<Category>,
) -> QueryResult<Vec<CategoryWithImage>> {
    let ids = rows.iter().map(|c| c.id).collect();
    let mut primary = primary_images(conn, "category_images", "category_id", ids)?;
    Ok(rows
        .into_iter()
        .map(|category| CategoryWithImage {
            primary_image_url: primary.remove(&category.id),
            category,
        })
        .collect())
}

fn with_product_images(
    conn: &mut PgConnection,
    rows: Vec<Product>,
) -> QueryResult<Vec<ProductWithImage>> {
    let ids = rows.iter().map(|p| p.id).collect();
    let mut primary = primary_images(conn, "product_images", "product_id", ids)?;
    Ok(rows
        .into_iter()
        .map(|product| ProductWithImage {
            primary_image_url: primary.remove(&product.id),
            product,
        })
        .collect())
}

fn category_exists(conn: &mut PgConnection, id: i32) -> QueryResult<bool> {
    Ok(categories::table
        .find(id)
        .select(categories::id)
        .first::<i32>(conn)
        .optional()?
        .is_some())
}

fn product_exists(conn: &mut PgConnection, id: i32) -> QueryResult<bool> {
    Ok(products::table
        .find(id)
        .select(products::id)
        .first::<i32>(conn)
        .optional()?
        .is_some())
}

fn ensure_settings(conn: &mut PgConnection) -> StorageResult<SiteSetting> {
    let existing = site_settings::table
        .find(SETTINGS_ID)
        .select(SiteSetting::as_select())
        .first(conn)
        .optional()?;
    if let Some(settings) = existing {
        return Ok(settings);
    }
    diesel::insert_into(site_settings::table)
        .values(site_settings::id.eq(SETTINGS_ID))
        .on_conflict_do_nothing()
        .execute(conn)?;
    Ok(site_settings::table
        .find(SETTINGS_ID)
        .select(SiteSetting::as_select())
        .first(conn)?)
}

impl Storage for PgStorage {
    fn ping(&self) -> StorageResult<()> {
        let conn = &mut *self.conn()?;
        diesel::sql_query("SELECT 1").execute(conn)?;
        Ok(())
    }

    fn get_user_by_username(&self, username: &str) -> StorageResult<Option<User>> {
        let conn = &mut *self.conn()?;
        Ok(users::table
            .filter(users::username.eq(username))
            .select(User::as_select())
            .first(conn)
            .optional()?)
    }

    fn create_user(&self, user: NewUser) -> StorageResult<User> {
        let conn = &mut *self.conn()?;
        diesel::insert_into(users::table)
            .values(&user)
            .returning(User::as_returning())
            .get_result(conn)
            .map_err(map_write_error)
    }

    fn set_user_password(&self, username: &str, password_hash: &str) -> StorageResult<bool> {
        let conn = &mut *self.conn()?;
        let updated = diesel::update(users::table.filter(users::username.eq(username)))
            .set(users::password.eq(password_hash))
            .execute(conn)?;
        Ok(updated > 0)
    }

    fn list_categories(&self) -> StorageResult<Vec<CategoryWithImage>> {
        let conn = &mut *self.conn()?;
        let rows = categories::table
            .order((categories::sort_order.asc(), categories::name.asc()))
            .select(Category::as_select())
            .load(conn)?;
        Ok(with_category_images(conn, rows)?)
    }

    fn get_category(&self, id: i32) -> StorageResult<Option<CategoryWithImage>> {
        let conn = &mut *self.conn()?;
        let rows = categories::table
            .find(id)
            .select(Category::as_select())
            .load(conn)?;
        Ok(with_category_images(conn, rows)?.into_iter().next())
    }

    fn get_category_by_slug(&self, slug: &str) -> StorageResult<Option<CategoryWithImage>> {
        let conn = &mut *self.conn()?;
        let rows = categories::table
            .filter(categories::slug.eq(slug))
            .select(Category::as_select())
            .load(conn)?;
        Ok(with_category_images(conn, rows)?.into_iter().next())
    }

    fn create_category(
        &self,
        category: NewCategory,
        image_urls: Vec<String>,
    ) -> StorageResult<Category> {
        let conn = &mut *self.conn()?;
        conn.transaction(|conn| {
            let created = diesel::insert_into(categories::table)
                .values(&category)
                .returning(Category::as_returning())
                .get_result(conn)
                .map_err(map_write_error)?;
            let images: Vec<NewCategoryImage> = image_urls
                .into_iter()
                .enumerate()
                .map(|(position, url)| NewCategoryImage {
                    url,
                    category_id: created.id,
                    sort_order: position as i32,
                })
                .collect();
            if !images.is_empty() {
                diesel::insert_into(category_images::table)
                    .values(&images)
                    .execute(conn)?;
            }
            Ok(created)
        })
    }

    fn update_category(
        &self,
        id: i32,
        changes: CategoryChanges,
    ) -> StorageResult<Option<Category>> {
        let conn = &mut *self.conn()?;
        diesel::update(categories::table.find(id))
            .set((changes, categories::updated_at.eq(Utc::now().naive_utc())))
            .returning(Category::as_returning())
            .get_result(conn)
            .optional()
            .map_err(map_write_error)
    }

    fn delete_category(&self, id: i32) -> StorageResult<Option<Removed>> {
        let conn = &mut *self.conn()?;
        conn.transaction(|conn| {
            // Row lock blocks concurrent product inserts referencing this id.
            let locked = categories::table
                .find(id)
                .select(categories::id)
                .for_update()
                .first::<i32>(conn)
                .optional()?;
            if locked.is_none() {
                return Ok(None);
            }

            let product_count: i64 = products::table
                .filter(products::category_id.eq(id))
                .count()
                .get_result(conn)?;
            if product_count > 0 {
                return Err(StorageError::Conflict(CATEGORY_HAS_PRODUCTS.to_string()));
            }

            let image_urls = diesel::delete(
                category_images::table.filter(category_images::category_id.eq(id)),
            )
            .returning(category_images::url)
            .get_results::<String>(conn)?;
            diesel::delete(categories::table.find(id)).execute(conn)?;
            Ok(Some(Removed {
                image_urls: orphaned(conn, image_urls)?,
            }))
        })
    }

    fn list_category_images(&self, category_id: i32) -> StorageResult<Vec<CategoryImage>> {
        let conn = &mut *self.conn()?;
        Ok(category_images::table
            .filter(category_images::category_id.eq(category_id))
            .order((category_images::sort_order.asc(), category_images::id.asc()))
            .select(CategoryImage::as_select())
            .load(conn)?)
    }

    fn create_category_image(&self, image: NewCategoryImage) -> StorageResult<CategoryImage> {
        let conn = &mut *self.conn()?;
        if !category_exists(conn, image.category_id)? {
            return Err(StorageError::NotFound("Category not found".to_string()));
        }
        diesel::insert_into(category_images::table)
            .values(&image)
            .returning(CategoryImage::as_returning())
            .get_result(conn)
            .map_err(map_write_error)
    }

    fn delete_category_image(&self, id: i32) -> StorageResult<Option<Removed>> {
        let conn = &mut *self.conn()?;
        conn.transaction(|conn| {
            let url = diesel::delete(category_images::table.find(id))
                .returning(category_images::url)
                .get_result::<String>(conn)
                .optional()?;
            match url {
                Some(url) => Ok(Some(Removed {
                    image_urls: orphaned(conn, vec![url])?,
                })),
                None => Ok(None),
            }
        })
    }

    fn list_products(&self) -> StorageResult<Vec<ProductWithImage>> {
        let conn = &mut *self.conn()?;
        let rows = products::table
            .order((products::created_at.desc(), products::id.desc()))
            .select(Product::as_select())
            .load(conn)?;
        Ok(with_product_images(conn, rows)?)
    }

    fn list_products_by_category(
        &self,
        category_id: i32,
    ) -> StorageResult<Vec<ProductWithImage>> {
        let conn = &mut *self.conn()?;
        let rows = products::table
            .filter(products::category_id.eq(category_id))
            .order((products::created_at.desc(), products::id.desc()))
            .select(Product::as_select())
            .load(conn)?;
        Ok(with_product_images(conn, rows)?)
    }

    fn get_product(&self, id: i32) -> StorageResult<Option<ProductWithImage>> {
        let conn = &mut *self.conn()?;
        let rows = products::table
            .find(id)
            .select(Product::as_select())
            .load(conn)?;
        Ok(with_product_images(conn, rows)?.into_iter().next())
    }

    fn get_product_by_slug(&self, slug: &str) -> StorageResult<Option<ProductWithImage>> {
        let conn = &mut *self.conn()?;
        let rows = products::table
            .filter(products::slug.eq(slug))
            .select(Product::as_select())
            .load(conn)?;
        Ok(with_product_images(conn, rows)?.into_iter().next())
    }

    fn create_product(
        &self,
        product: NewProduct,
        image_urls: Vec<String>,
    ) -> StorageResult<Product> {
        let conn = &mut *self.conn()?;
        conn.transaction(|conn| {
            if !category_exists(conn, product.category_id)? {
                return Err(StorageError::NotFound("Category not found".to_string()));
            }
            let created = diesel::insert_into(products::table)
                .values(&product)
                .returning(Product::as_returning())
                .get_result(conn)
                .map_err(map_write_error)?;
            let images: Vec<NewProductImage> = image_urls
                .into_iter()
                .enumerate()
                .map(|(position, url)| NewProductImage {
                    url,
                    product_id: created.id,
                    sort_order: position as i32,
                })
                .collect();
            if !images.is_empty() {
                diesel::insert_into(product_images::table)
                    .values(&images)
                    .execute(conn)?;
            }
            Ok(created)
        })
    }

    fn update_product(&self, id: i32, changes: ProductChanges) -> StorageResult<Option<Product>> {
        let conn = &mut *self.conn()?;
        if let Some(category_id) = changes.category_id {
            if !category_exists(conn, category_id)? {
                return Err(StorageError::NotFound("Category not found".to_string()));
            }
        }
        diesel::update(products::table.find(id))
            .set((changes, products::updated_at.eq(Utc::now().naive_utc())))
            .returning(Product::as_returning())
            .get_result(conn)
            .optional()
            .map_err(map_write_error)
    }

    fn delete_product(&self, id: i32) -> StorageResult<Option<Removed>> {
        let conn = &mut *self.conn()?;
        conn.transaction(|conn| {
            if !product_exists(conn, id)? {
                return Ok(None);
            }
            let image_urls =
                diesel::delete(product_images::table.filter(product_images::product_id.eq(id)))
                    .returning(product_images::url)
                    .get_results::<String>(conn)?;
            diesel::delete(products::table.find(id)).execute(conn)?;
            Ok(Some(Removed {
                image_urls: orphaned(conn, image_urls)?,
            }))
        })
    }

    fn list_product_images(&self, product_id: i32) -> StorageResult<Vec<ProductImage>> {
        let conn = &mut *self.conn()?;
        Ok(product_images::table
            .filter(product_images::product_id.eq(product_id))
            .order((product_images::sort_order.asc(), product_images::id.asc()))
            .select(ProductImage::as_select())
            .load(conn)?)
    }

    fn create_product_image(&self, image: NewProductImage) -> StorageResult<ProductImage> {
        let conn = &mut *self.conn()?;
        if !product_exists(conn, image.product_id)? {
            return Err(StorageError::NotFound("Product not found".to_string()));
        }
        diesel::insert_into(product_images::table)
            .values(&image)
            .returning(ProductImage::as_returning())
            .get_result(conn)
            .map_err(map_write_error)
    }

    fn delete_product_image(&self, id: i32) -> StorageResult<Option<Removed>> {
        let conn = &mut *self.conn()?;
        conn.transaction(|conn| {
            let url = diesel::delete(product_images::table.find(id))
                .returning(product_images::url)
                .get_result::<String>(conn)
                .optional()?;
            match url {
                Some(url) => Ok(Some(Removed {
                    image_urls: orphaned(conn, vec![url])?,
                })),
                None => Ok(None),
            }
        })
    }

    fn list_hero_images(&self) -> StorageResult<Vec<HeroImage>> {
        let conn = &mut *self.conn()?;
        Ok(hero_images::table
            .order((hero_images::sort_order.asc(), hero_images::id.asc()))
            .select(HeroImage::as_select())
            .load(conn)?)
    }

    fn create_hero_image(&self, image: NewHeroImage) -> StorageResult<HeroImage> {
        let conn = &mut *self.conn()?;
        diesel::insert_into(hero_images::table)
            .values(&image)
            .returning(HeroImage::as_returning())
            .get_result(conn)
            .map_err(map_write_error)
    }

    fn delete_hero_image(&self, id: i32) -> StorageResult<Option<Removed>> {
        let conn = &mut *self.conn()?;
        conn.transaction(|conn| {
            let url = diesel::delete(hero_images::table.find(id))
                .returning(hero_images::url)
                .get_result::<String>(conn)
                .optional()?;
            match url {
                Some(url) => Ok(Some(Removed {
                    image_urls: orphaned(conn, vec![url])?,
                })),
                None => Ok(None),
            }
        })
    }

    fn get_site_settings(&self) -> StorageResult<SiteSetting> {
        let conn = &mut *self.conn()?;
        ensure_settings(conn)
    }

    fn update_site_settings(&self, changes: SiteSettingChanges) -> StorageResult<SiteSetting> {
        let conn = &mut *self.conn()?;
        let current = ensure_settings(conn)?;
        diesel::update(site_settings::table.find(current.id))
            .set((changes, site_settings::updated_at.eq(Utc::now().naive_utc())))
            .returning(SiteSetting::as_returning())
            .get_result(conn)
            .map_err(map_write_error)
    }
}
