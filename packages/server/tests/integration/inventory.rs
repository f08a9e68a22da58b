use serde_json::json;

use crate::common::{TestApp, routes};

mod create {
    use super::*;

    #[tokio::test]
    async fn caller_becomes_the_nursery() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("nursery", "securepass").await;
        let nursery_id = app.user_id(&token).await;
        let plant_id = app.create_plant(&token, "Lavender", "Lavandula angustifolia").await;

        let res = app
            .post_with_token(
                routes::INVENTORY,
                &json!({
                    "plant_id": plant_id,
                    "quantity": 12,
                    "price": "7.5",
                    "size": " 4 inch pot ",
                    "notes": "Greenhouse B",
                }),
                &token,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["nursery_id"], nursery_id);
        assert_eq!(res.body["plant"]["id"], plant_id);
        assert_eq!(res.body["plant"]["common_name"], "Lavender");
        assert_eq!(res.body["price"], "7.50");
        assert_eq!(res.body["size"], "4 inch pot");
        assert_eq!(res.body["seasonal_availability"], "");
    }

    #[tokio::test]
    async fn missing_fields_are_all_reported() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("nursery", "securepass").await;

        let res = app
            .post_with_token(routes::INVENTORY, &json!({"quantity": -1}), &token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.error_fields(), vec!["plant_id", "quantity", "price", "size"]);
        assert_eq!(
            res.error_message("plant_id").as_deref(),
            Some("This field is required.")
        );
    }

    #[tokio::test]
    async fn unknown_plant_is_a_field_error() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("nursery", "securepass").await;

        let res = app
            .post_with_token(
                routes::INVENTORY,
                &json!({"plant_id": 4242, "quantity": 1, "price": "1.00", "size": "Small"}),
                &token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(
            res.error_message("plant_id").as_deref(),
            Some("Invalid pk \"4242\" - object does not exist.")
        );
    }

    #[tokio::test]
    async fn duplicate_plant_and_size_is_rejected_without_changes() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("nursery", "securepass").await;
        let plant_id = app.create_plant(&token, "Lavender", "Lavandula angustifolia").await;
        let first = app.create_inventory(&token, plant_id, "1 gallon").await;

        let res = app
            .post_with_token(
                routes::INVENTORY,
                &json!({"plant_id": plant_id, "quantity": 99, "price": "1.00", "size": "1 gallon"}),
                &token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.error_fields(), vec!["non_field_errors"]);
        assert_eq!(
            res.error_message("non_field_errors").as_deref(),
            Some("The fields plant, nursery, size must make a unique set.")
        );

        let list = app
            .get_with_token(&format!("{}?plant_id={plant_id}", routes::INVENTORY), &token)
            .await;
        assert_eq!(list.body["pagination"]["total"], 1);
        assert_eq!(list.body["data"][0]["id"], first);
        assert_eq!(list.body["data"][0]["quantity"], 5);
    }

    #[tokio::test]
    async fn different_nurseries_may_stock_the_same_size() {
        let app = TestApp::spawn().await;
        let first = app.create_authenticated_user("north", "securepass").await;
        let second = app.create_authenticated_user("south", "securepass").await;
        let plant_id = app.create_plant(&first, "Lavender", "Lavandula angustifolia").await;

        app.create_inventory(&first, plant_id, "1 gallon").await;
        app.create_inventory(&second, plant_id, "1 gallon").await;

        let south_id = app.user_id(&second).await;
        let list = app
            .get_with_token(
                &format!("{}?nursery_id={south_id}", routes::INVENTORY),
                &second,
            )
            .await;
        assert_eq!(list.body["pagination"]["total"], 1);
    }
}

mod template {
    use super::*;

    #[tokio::test]
    async fn requires_authentication() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("nursery", "securepass").await;
        let plant_id = app.create_plant(&token, "Jade Plant", "Crassula ovata").await;

        let res = app.post_empty(&routes::use_as_template(plant_id), None).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn empty_body_uses_defaults() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("nursery", "securepass").await;
        let nursery_id = app.user_id(&token).await;
        let plant_id = app.create_plant(&token, "Jade Plant", "Crassula ovata").await;

        let res = app
            .post_empty(&routes::use_as_template(plant_id), Some(&token))
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["nursery_id"], nursery_id);
        assert_eq!(res.body["plant"]["id"], plant_id);
        assert_eq!(res.body["quantity"], 1);
        assert_eq!(res.body["price"], "0.00");
        assert_eq!(res.body["size"], "Standard");
    }

    #[tokio::test]
    async fn overrides_apply_and_duplicates_are_rejected() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("nursery", "securepass").await;
        let plant_id = app.create_plant(&token, "Jade Plant", "Crassula ovata").await;
        let path = routes::use_as_template(plant_id);

        let res = app
            .post_with_token(&path, &json!({"quantity": 3, "size": "Large"}), &token)
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["quantity"], 3);
        assert_eq!(res.body["size"], "Large");

        let again = app
            .post_with_token(&path, &json!({"size": "Large"}), &token)
            .await;
        assert_eq!(again.status, 400);
        assert_eq!(again.error_fields(), vec!["non_field_errors"]);
    }

    #[tokio::test]
    async fn unknown_plant_is_a_field_error() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("nursery", "securepass").await;

        let res = app.post_empty(&routes::use_as_template(777), Some(&token)).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.error_fields(), vec!["plant_id"]);
    }
}

mod update {
    use super::*;

    #[tokio::test]
    async fn patch_merges_and_revalidates() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("nursery", "securepass").await;
        let plant_id = app.create_plant(&token, "Lavender", "Lavandula angustifolia").await;
        let id = app.create_inventory(&token, plant_id, "Small").await;

        let res = app
            .patch_with_token(&routes::inventory(id), &json!({"quantity": 40}), &token)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["quantity"], 40);
        assert_eq!(res.body["size"], "Small");
        assert_eq!(res.body["price"], "12.50");

        let res = app
            .patch_with_token(&routes::inventory(id), &json!({"quantity": -2}), &token)
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.error_fields(), vec!["quantity"]);

        let res = app
            .patch_with_token(
                &routes::inventory(id),
                &json!({"quantity": 99_999_999_999_i64}),
                &token,
            )
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.error_fields(), vec!["quantity"]);
    }

    #[tokio::test]
    async fn null_plant_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("nursery", "securepass").await;
        let plant_id = app.create_plant(&token, "Lavender", "Lavandula angustifolia").await;
        let id = app.create_inventory(&token, plant_id, "Small").await;

        let res = app
            .patch_with_token(&routes::inventory(id), &json!({"plant_id": null}), &token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.error_fields(), vec!["plant_id"]);
        assert_eq!(
            res.error_message("plant_id").as_deref(),
            Some("This field may not be null.")
        );
        let fetched = app.get_with_token(&routes::inventory(id), &token).await;
        assert_eq!(fetched.body["plant"]["id"], plant_id);
    }

    #[tokio::test]
    async fn renaming_onto_an_existing_size_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("nursery", "securepass").await;
        let plant_id = app.create_plant(&token, "Lavender", "Lavandula angustifolia").await;
        app.create_inventory(&token, plant_id, "Small").await;
        let large = app.create_inventory(&token, plant_id, "Large").await;

        let res = app
            .patch_with_token(&routes::inventory(large), &json!({"size": "Small"}), &token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.error_fields(), vec!["non_field_errors"]);
        let fetched = app.get_with_token(&routes::inventory(large), &token).await;
        assert_eq!(fetched.body["size"], "Large");
    }
}

mod listing {
    use super::*;

    #[tokio::test]
    async fn page_past_the_end_is_empty() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("nursery", "securepass").await;
        let plant_id = app.create_plant(&token, "Lavender", "Lavandula angustifolia").await;
        app.create_inventory(&token, plant_id, "Small").await;

        let res = app
            .get_without_token(&format!("{}?page=18446744073709551615", routes::INVENTORY))
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["data"], json!([]));
        assert_eq!(res.body["pagination"]["total"], 1);
    }

    #[tokio::test]
    async fn non_numeric_filters_return_json_errors() {
        let app = TestApp::spawn().await;

        let res = app
            .get_without_token(&format!("{}?nursery_id=abc", routes::INVENTORY))
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");

        let res = app.get_without_token("/api/v1/inventory/abc").await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod delete {
    use super::*;

    #[tokio::test]
    async fn delete_removes_the_row_only() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("nursery", "securepass").await;
        let plant_id = app.create_plant(&token, "Lavender", "Lavandula angustifolia").await;
        let id = app.create_inventory(&token, plant_id, "Small").await;

        let res = app.delete_with_token(&routes::inventory(id), &token).await;
        assert_eq!(res.status, 204);

        let again = app.delete_with_token(&routes::inventory(id), &token).await;
        assert_eq!(again.status, 404);
        assert_eq!(app.get_without_token(&routes::plant(plant_id)).await.status, 200);
    }
}
