//! Sample catalog for a fresh install.

use thiserror::Error;

use crate::auth::hash_password;
use crate::config::SeedConfig;
use crate::db::models::{NewCategory, NewProduct, NewUser};
use crate::storage::{Storage, StorageError};

#[derive(Debug, Error)]
pub enum SeedError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("failed to hash admin password: {0}")]
    Hash(String),
    #[error("seed.admin_password must be set")]
    MissingPassword,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub admin_created: bool,
    pub categories_created: usize,
    pub products_created: usize,
}

struct SampleCategory {
    name: &'static str,
    slug: &'static str,
    description: &'static str,
    image_url: &'static str,
    order: i32,
}

struct SampleProduct {
    name: &'static str,
    slug: &'static str,
    description: &'static str,
    price: f64,
    size: Option<&'static str>,
    quantity: i32,
    category: &'static str,
}

const CATEGORIES: &[SampleCategory] = &[
    SampleCategory {
        name: "Hijabs & Veils",
        slug: "hijabs-veils",
        description: "Premium quality hijabs and veils in various styles and colors",
        image_url: "https://images.unsplash.com/photo-1583391733981-5afc8f5ca2f8?w=400&h=300&fit=crop",
        order: 1,
    },
    SampleCategory {
        name: "Abayas",
        slug: "abayas",
        description: "Elegant and modest abayas for everyday wear",
        image_url: "https://images.unsplash.com/photo-1434389677669-e08b4cac3105?w=400&h=300&fit=crop",
        order: 2,
    },
    SampleCategory {
        name: "Islamic Footwear",
        slug: "islamic-footwear",
        description: "Comfortable and stylish shoes for Muslim women",
        image_url: "https://images.unsplash.com/photo-1543163521-1bf539c55dd2?w=400&h=300&fit=crop",
        order: 3,
    },
    SampleCategory {
        name: "Prayer Accessories",
        slug: "prayer-accessories",
        description: "Prayer mats, beads, and other essentials",
        image_url: "https://images.unsplash.com/photo-1591604129926-37eb1ff5c2f7?w=400&h=300&fit=crop",
        order: 4,
    },
];

const HIJAB_SIZE: Option<&str> = Some("Standard (180cm x 70cm)");
const ABAYA_SIZE: Option<&str> = Some("Available in S, M, L, XL");
const SHOE_SIZE: Option<&str> = Some("Available in sizes 36-42");

const PRODUCTS: &[SampleProduct] = &[
    SampleProduct {
        name: "Premium Cotton Hijab",
        slug: "premium-cotton-hijab",
        description: "Soft, breathable cotton hijab perfect for daily wear",
        price: 2500.0,
        size: HIJAB_SIZE,
        quantity: 25,
        category: "hijabs-veils",
    },
    SampleProduct {
        name: "Silk Blend Hijab - Navy",
        slug: "silk-blend-hijab-navy",
        description: "Luxurious silk blend hijab with elegant drape",
        price: 4500.0,
        size: HIJAB_SIZE,
        quantity: 15,
        category: "hijabs-veils",
    },
    SampleProduct {
        name: "Chiffon Hijab Set (3 Pack)",
        slug: "chiffon-hijab-set",
        description: "Set of 3 lightweight chiffon hijabs in complementary colors",
        price: 6000.0,
        size: HIJAB_SIZE,
        quantity: 10,
        category: "hijabs-veils",
    },
    SampleProduct {
        name: "Classic Black Abaya",
        slug: "classic-black-abaya",
        description: "Timeless black abaya with elegant cut",
        price: 12000.0,
        size: ABAYA_SIZE,
        quantity: 20,
        category: "abayas",
    },
    SampleProduct {
        name: "Embroidered Abaya - Beige",
        slug: "embroidered-abaya-beige",
        description: "Beautiful beige abaya with delicate embroidery",
        price: 15000.0,
        size: ABAYA_SIZE,
        quantity: 12,
        category: "abayas",
    },
    SampleProduct {
        name: "Casual Abaya with Pockets",
        slug: "casual-abaya-pockets",
        description: "Practical abaya with side pockets for everyday comfort",
        price: 10000.0,
        size: ABAYA_SIZE,
        quantity: 18,
        category: "abayas",
    },
    SampleProduct {
        name: "Comfort Leather Sandals",
        slug: "comfort-leather-sandals",
        description: "Genuine leather sandals with cushioned footbed",
        price: 8500.0,
        size: SHOE_SIZE,
        quantity: 30,
        category: "islamic-footwear",
    },
    SampleProduct {
        name: "Indoor Prayer Slippers",
        slug: "indoor-prayer-slippers",
        description: "Soft slippers perfect for prayer and indoor use",
        price: 3500.0,
        size: SHOE_SIZE,
        quantity: 40,
        category: "islamic-footwear",
    },
    SampleProduct {
        name: "Premium Prayer Mat",
        slug: "premium-prayer-mat",
        description: "Plush prayer mat with built-in compass",
        price: 5500.0,
        size: Some("110cm x 70cm"),
        quantity: 25,
        category: "prayer-accessories",
    },
    SampleProduct {
        name: "Tasbih Prayer Beads",
        slug: "tasbih-prayer-beads",
        description: "Traditional 99-bead tasbih in various colors",
        price: 1500.0,
        size: None,
        quantity: 50,
        category: "prayer-accessories",
    },
];

/// Creates the admin account (or resets its password) and fills in whatever
/// part of the sample catalog is missing. Safe to run repeatedly.
pub fn seed(storage: &dyn Storage, admin: &SeedConfig) -> Result<SeedSummary, SeedError> {
    if admin.admin_password.is_empty() {
        return Err(SeedError::MissingPassword);
    }
    let mut summary = SeedSummary::default();

    let password = hash_password(&admin.admin_password).map_err(|e| SeedError::Hash(e.to_string()))?;
    if storage.set_user_password(&admin.admin_username, &password)? {
        tracing::info!(username = %admin.admin_username, "admin password updated");
    } else {
        storage.create_user(NewUser {
            username: admin.admin_username.clone(),
            password,
        })?;
        summary.admin_created = true;
        tracing::info!(username = %admin.admin_username, "admin user created");
    }

    for sample in CATEGORIES {
        if storage.get_category_by_slug(sample.slug)?.is_some() {
            continue;
        }
        let category = NewCategory {
            name: sample.name.to_string(),
            slug: sample.slug.to_string(),
            description: Some(sample.description.to_string()),
            sort_order: sample.order,
        };
        storage.create_category(category, vec![sample.image_url.to_string()])?;
        summary.categories_created += 1;
    }

    for sample in PRODUCTS {
        if storage.get_product_by_slug(sample.slug)?.is_some() {
            continue;
        }
        let Some(category) = storage.get_category_by_slug(sample.category)? else {
            tracing::warn!(slug = sample.slug, "sample category missing, product skipped");
            continue;
        };
        let product = NewProduct {
            name: sample.name.to_string(),
            slug: sample.slug.to_string(),
            description: Some(sample.description.to_string()),
            price: sample.price,
            size: sample.size.map(str::to_string),
            weight: None,
            quantity: Some(sample.quantity),
            category_id: category.category.id,
        };
        storage.create_product(product, Vec::new())?;
        summary.products_created += 1;
    }

    storage.get_site_settings()?;
    Ok(summary)
}
