use std::collections::HashMap;

use aula_market_engine::{
    config::EngineConfig,
    db_types::User,
    events::EventProducers,
    test_utils::prepare_env::{create_database, random_db_path, run_migrations},
    CatalogApi,
    OrderFlowApi,
    ProfileApi,
    SqliteDatabase,
};
use cucumber::World;
use log::*;
use tokio::time::sleep;

#[derive(Default, Debug, World)]
pub struct MarketWorld {
    pub system: Option<MarketSystem>,
    pub users: HashMap<String, User>,
    pub courses: HashMap<String, i64>,
    pub products: HashMap<String, i64>,
    pub events: HashMap<String, i64>,
    pub last_order: Option<i64>,
    pub last_error: Option<String>,
}

#[derive(Debug)]
pub struct MarketSystem {
    pub db_path: String,
    pub api: OrderFlowApi<SqliteDatabase>,
    pub profiles: ProfileApi<SqliteDatabase>,
    pub catalog: CatalogApi<SqliteDatabase>,
}

impl MarketWorld {
    pub fn api(&self) -> &OrderFlowApi<SqliteDatabase> {
        &self.system.as_ref().expect("OrderFlowApi not initialised").api
    }

    pub fn profiles(&self) -> &ProfileApi<SqliteDatabase> {
        &self.system.as_ref().expect("ProfileApi not initialised").profiles
    }

    pub fn catalog(&self) -> &CatalogApi<SqliteDatabase> {
        &self.system.as_ref().expect("CatalogApi not initialised").catalog
    }

    pub fn user(&self, name: &str) -> &User {
        self.users.get(name).expect("No customer with that name has been registered")
    }

    pub fn course_id(&self, title: &str) -> i64 {
        *self.courses.get(title).expect("No course with that title has been added")
    }

    pub fn product_id(&self, title: &str) -> i64 {
        *self.products.get(title).expect("No product with that title has been added")
    }

    pub fn event_id(&self, title: &str) -> i64 {
        *self.events.get(title).expect("No event with that title has been added")
    }

    pub fn order_id(&self) -> i64 {
        self.last_order.expect("No order has been placed yet")
    }
}

impl MarketSystem {
    pub async fn new() -> Self {
        let url = prepare_test_env().await;
        let db = SqliteDatabase::new_with_url(&url, 1).await.expect("Error creating connection to database");
        debug!("Created database: {url}");
        sleep(std::time::Duration::from_millis(50)).await;
        let api = OrderFlowApi::new(db.clone(), EngineConfig::default(), EventProducers::default());
        let profiles = ProfileApi::new(db.clone());
        let catalog = CatalogApi::new(db);
        Self { db_path: url, api, profiles, catalog }
    }
}

pub async fn prepare_test_env() -> String {
    let path = random_db_path();
    create_database(&path).await;
    run_migrations(&path).await;
    path
}
