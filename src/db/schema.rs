diesel::table! {
    users (id) {
        id -> Int4,
        username -> Varchar,
        password -> Varchar,
        created_at -> Timestamp,
    }
}

diesel::table! {
    categories (id) {
        id -> Int4,
        name -> Varchar,
        slug -> Varchar,
        description -> Nullable<Text>,
        #[sql_name = "order"]
        sort_order -> Int4,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    category_images (id) {
        id -> Int4,
        url -> Text,
        category_id -> Int4,
        #[sql_name = "order"]
        sort_order -> Int4,
        created_at -> Timestamp,
    }
}

diesel::table! {
    products (id) {
        id -> Int4,
        name -> Varchar,
        slug -> Varchar,
        description -> Nullable<Text>,
        price -> Float8,
        size -> Nullable<Varchar>,
        weight -> Nullable<Varchar>,
        quantity -> Nullable<Int4>,
        category_id -> Int4,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    product_images (id) {
        id -> Int4,
        url -> Text,
        product_id -> Int4,
        #[sql_name = "order"]
        sort_order -> Int4,
        created_at -> Timestamp,
    }
}

diesel::table! {
    site_settings (id) {
        id -> Int4,
        store_name -> Varchar,
        whatsapp -> Varchar,
        telegram -> Varchar,
        facebook -> Nullable<Varchar>,
        location_kontagora -> Text,
        location_abuja -> Text,
        hero_image_url -> Nullable<Text>,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    hero_images (id) {
        id -> Int4,
        url -> Text,
        #[sql_name = "order"]
        sort_order -> Int4,
        created_at -> Timestamp,
    }
}

diesel::joinable!(category_images -> categories (category_id));
diesel::joinable!(products -> categories (category_id));
diesel::joinable!(product_images -> products (product_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    categories,
    category_images,
    products,
    product_images,
    site_settings,
    hero_images,
);
