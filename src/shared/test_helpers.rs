#[cfg(test)]
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

#[cfg(test)]
use crate::core::config::ClassifierConfig;

/// In-memory database with the schema applied. A single connection keeps
/// every query in the test on the same `:memory:` instance.
#[cfg(test)]
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("failed to open in-memory database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("failed to run migrations");

    pool
}

/// Classifier configuration with no credential: classification is disabled
/// and never reaches the network.
#[cfg(test)]
pub fn disabled_classifier_config() -> ClassifierConfig {
    ClassifierConfig {
        api_key: None,
        base_url: "http://127.0.0.1:0".to_string(),
        model: "test-model".to_string(),
        timeout_secs: 1,
    }
}

/// A well-formed ticket creation payload with randomized text fields
#[cfg(test)]
pub fn valid_ticket_payload() -> serde_json::Value {
    use fake::faker::internet::en::SafeEmail;
    use fake::faker::lorem::en::Sentence;
    use fake::Fake;

    serde_json::json!({
        "title": Sentence(3..6).fake::<String>(),
        "description": Sentence(8..16).fake::<String>(),
        "contact_email": SafeEmail().fake::<String>(),
        "category": "technical",
        "priority": "high",
    })
}
