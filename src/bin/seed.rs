use std::collections::BTreeMap;

use online_store_api::{
    config::AppConfig,
    db::{create_pool, run_migrations},
    dto::{auth::SignUpRequest, items::ItemRequest},
    entity::{Items, Users, items, users},
    error::AppError,
    middleware::auth::{AuthUser, ensure_admin},
    services::{auth_service, item_service},
    state::AppState,
};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    run_migrations(&pool).await?;
    let state = AppState::new(config, pool).await?;

    let admin_id = ensure_user(&state, "admin", "admin@example.com", "+10000000001").await?;
    let admin = AuthUser { user_id: admin_id };
    // Only the first account is promoted automatically.
    if let Err(err) = ensure_admin(&state, &admin).await {
        anyhow::bail!("seed admin {admin_id} cannot manage the catalog: {err}");
    }
    let user_id = ensure_user(&state, "shopper", "shopper@example.com", "+10000000002").await?;

    seed_items(&state, &admin).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_user(
    state: &AppState,
    login: &str,
    email: &str,
    phone: &str,
) -> anyhow::Result<Uuid> {
    let request = SignUpRequest {
        email: email.to_string(),
        login: login.to_string(),
        password: format!("{login}123"),
        phone: phone.to_string(),
        firstname: "Seed".to_string(),
        lastname: "Account".to_string(),
        address: "1 Example Street, Springfield".to_string(),
    };

    match auth_service::sign_up(state, request).await {
        Ok(resp) => {
            let user = resp.data.ok_or_else(|| anyhow::anyhow!("empty sign-up response"))?;
            println!("Created user {login} (admin={})", user.is_admin);
            Ok(user.id)
        }
        // If user already exists, fetch id
        Err(AppError::Conflict(_)) => {
            let existing = Users::find()
                .filter(users::Column::Login.eq(login))
                .one(&state.orm)
                .await?
                .ok_or_else(|| anyhow::anyhow!("{login} conflicts with another account"))?;
            println!("User {login} already present");
            Ok(existing.id)
        }
        Err(err) => Err(err.into()),
    }
}

async fn seed_items(state: &AppState, admin: &AuthUser) -> anyhow::Result<()> {
    let catalog = [
        (
            "Ferris Plush",
            "A soft, huggable crab that keeps your desk company.",
            "24.90",
            &["Toys", "Plush"][..],
        ),
        (
            "Mechanical Keyboard",
            "Tenkeyless board with hot-swappable switches and PBT caps.",
            "129.00",
            &["Electronics", "Peripherals", "Keyboards"][..],
        ),
        (
            "Noise Cancelling Headphones",
            "Over-ear headphones with thirty hours of battery life.",
            "199.99",
            &["Electronics", "Audio"][..],
        ),
        (
            "Pixel Phone",
            "An Android phone with a very capable camera system.",
            "799.00",
            &["Electronics", "Phones"][..],
        ),
    ];

    for (name, description, price, category) in catalog {
        let exists = Items::find()
            .filter(items::Column::Name.eq(name))
            .one(&state.orm)
            .await?
            .is_some();
        if exists {
            continue;
        }
        let request = ItemRequest {
            name: name.to_string(),
            price: price.parse::<Decimal>()?,
            description: description.to_string(),
            category: category.iter().map(|s| s.to_string()).collect(),
            technical_details: BTreeMap::from([("origin".to_string(), "seed".to_string())]),
        };
        item_service::create_item(state, admin, request).await?;
    }

    let tree = state.settings.category_tree().await;
    println!("Seeded items; {} category paths", tree.leaf_paths().len());
    Ok(())
}
