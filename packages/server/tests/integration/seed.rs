use nursery_server::seed::seed_sample_catalog;

use crate::common::{TestApp, routes};

mod sample_catalog {
    use super::*;

    #[tokio::test]
    async fn second_run_creates_nothing() {
        let app = TestApp::spawn().await;

        let first = seed_sample_catalog(&app.db).await.unwrap();
        let second = seed_sample_catalog(&app.db).await.unwrap();

        assert_eq!(first, 7);
        assert_eq!(second, 0);
        let list = app.get_without_token(routes::PLANTS).await;
        assert_eq!(list.body["pagination"]["total"], 7);
    }

    #[tokio::test]
    async fn existing_scientific_names_are_skipped() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("grower", "securepass").await;

        let first = seed_sample_catalog(&app.db).await.unwrap();
        let plants = app
            .get_without_token(&format!("{}?per_page=1", routes::PLANTS))
            .await;
        let name = plants.body["data"][0]["scientific_name"]
            .as_str()
            .unwrap()
            .to_string();
        let id = plants.body["data"][0]["id"].as_i64().unwrap() as i32;
        app.delete_with_token(&routes::plant(id), &token).await;

        let again = seed_sample_catalog(&app.db).await.unwrap();

        assert_eq!(first, 7);
        assert_eq!(again, 1);
        let found = app
            .get_without_token(&format!("{}?search={name}", routes::PLANTS))
            .await;
        assert_eq!(found.body["pagination"]["total"], 1);
    }
}
