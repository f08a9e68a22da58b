use reqwest::Method;
use reqwest::multipart::{Form, Part};
use serde_json::json;

use crate::common::{PNG_PIXEL, TestApp, routes};

mod library {
    use super::*;

    #[tokio::test]
    async fn upload_stores_the_file_and_serves_it() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("gardener", "securepass").await;

        let res = app.upload_image(&token, "leaf.PNG", PNG_PIXEL, None).await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["caption"], "Leaves");
        let path = res.body["image"].as_str().unwrap().to_string();
        assert!(path.starts_with("plants/additional/"), "{path}");
        assert!(path.ends_with(".png"), "{path}");
        assert!(app.media_exists(&path));

        let served = app.get_without_token(&format!("/media/{path}")).await;
        assert_eq!(served.status, 200);

        let list = app.get_without_token(routes::IMAGES).await;
        assert_eq!(list.body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unsupported_extension_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("gardener", "securepass").await;

        let res = app.upload_image(&token, "notes.txt", b"hello", None).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.error_fields(), vec!["file"]);
    }

    #[tokio::test]
    async fn missing_file_and_unknown_plant_are_reported_together() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("gardener", "securepass").await;

        let form = Form::new().text("caption", "Orphan").text("plant_id", "31337");
        let res = app
            .send_form(Method::POST, routes::IMAGES, form, Some(&token))
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.error_fields(), vec!["file", "plant_id"]);
        assert_eq!(
            res.error_message("file").as_deref(),
            Some("No file was submitted.")
        );
    }

    #[tokio::test]
    async fn upload_requires_authentication() {
        let app = TestApp::spawn().await;

        let part = Part::bytes(PNG_PIXEL.to_vec()).file_name("leaf.png");
        let res = app
            .send_form(Method::POST, routes::IMAGES, Form::new().part("file", part), None)
            .await;

        assert_eq!(res.status, 401);
    }

    #[tokio::test]
    async fn caption_can_be_changed() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("gardener", "securepass").await;
        let image_id = app.upload_image(&token, "leaf.png", PNG_PIXEL, None).await.id();

        let res = app
            .patch_with_token(&routes::image(image_id), &json!({"caption": "Autumn"}), &token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["caption"], "Autumn");
    }
}

mod links {
    use super::*;

    fn image_ids(plant: &serde_json::Value) -> Vec<i64> {
        plant["additional_images"]
            .as_array()
            .unwrap()
            .iter()
            .map(|i| i["id"].as_i64().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn upload_with_plant_id_links_the_image() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("gardener", "securepass").await;
        let plant_id = app.create_plant(&token, "Japanese Maple", "Acer palmatum").await;

        let image_id = app
            .upload_image(&token, "maple.png", PNG_PIXEL, Some(plant_id))
            .await
            .id();

        let plant = app.get_without_token(&routes::plant(plant_id)).await;
        assert_eq!(image_ids(&plant.body), vec![image_id as i64]);
    }

    #[tokio::test]
    async fn attach_is_idempotent_and_detach_keeps_the_image() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("gardener", "securepass").await;
        let plant_id = app.create_plant(&token, "Japanese Maple", "Acer palmatum").await;
        let image_id = app.upload_image(&token, "maple.png", PNG_PIXEL, None).await.id();
        let link = routes::plant_image(plant_id, image_id);

        assert_eq!(app.put_empty(&link, &token).await.status, 204);
        assert_eq!(app.put_empty(&link, &token).await.status, 204);
        let plant = app.get_without_token(&routes::plant(plant_id)).await;
        assert_eq!(image_ids(&plant.body), vec![image_id as i64]);

        assert_eq!(app.delete_with_token(&link, &token).await.status, 204);
        assert_eq!(app.delete_with_token(&link, &token).await.status, 404);

        let plant = app.get_without_token(&routes::plant(plant_id)).await;
        assert!(image_ids(&plant.body).is_empty());
        let list = app.get_without_token(routes::IMAGES).await;
        assert_eq!(list.body.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn attach_to_unknown_plant_is_not_found() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("gardener", "securepass").await;
        let image_id = app.upload_image(&token, "maple.png", PNG_PIXEL, None).await.id();

        let res = app
            .put_empty(&routes::plant_image(999, image_id), &token)
            .await;

        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn deleting_an_image_unlinks_it_and_removes_the_file() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("gardener", "securepass").await;
        let plant_id = app.create_plant(&token, "Japanese Maple", "Acer palmatum").await;
        let uploaded = app
            .upload_image(&token, "maple.png", PNG_PIXEL, Some(plant_id))
            .await;
        let path = uploaded.body["image"].as_str().unwrap().to_string();

        let res = app
            .delete_with_token(&routes::image(uploaded.id()), &token)
            .await;
        assert_eq!(res.status, 204);

        let plant = app.get_without_token(&routes::plant(plant_id)).await;
        assert!(image_ids(&plant.body).is_empty());
        assert!(!app.media_exists(&path));
    }

    #[tokio::test]
    async fn shared_file_survives_until_its_last_image_is_deleted() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("gardener", "securepass").await;
        let first = app.upload_image(&token, "a.png", PNG_PIXEL, None).await;
        let second = app.upload_image(&token, "b.png", PNG_PIXEL, None).await;
        let path = first.body["image"].as_str().unwrap().to_string();
        assert_eq!(second.body["image"], path.as_str());

        app.delete_with_token(&routes::image(first.id()), &token)
            .await;
        assert!(app.media_exists(&path));

        app.delete_with_token(&routes::image(second.id()), &token)
            .await;
        assert!(!app.media_exists(&path));
    }

    #[tokio::test]
    async fn failed_link_leaves_no_file_behind() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("gardener", "securepass").await;
        let plant_id = app.create_plant(&token, "Japanese Maple", "Acer palmatum").await;
        app.execute_sql("DROP TABLE plant_additional_image").await;

        let res = app
            .upload_image(&token, "maple.png", PNG_PIXEL, Some(plant_id))
            .await;

        assert_eq!(res.status, 500);
        assert_eq!(res.body["code"], "INTERNAL_ERROR");
        assert_eq!(app.media_file_count("plants/additional"), 0);
    }
}

mod main_image {
    use super::*;

    async fn put_main_image(app: &TestApp, token: &str, plant_id: i32, name: &str, bytes: &[u8]) -> crate::common::TestResponse {
        let part = Part::bytes(bytes.to_vec())
            .file_name(name.to_string())
            .mime_str("image/png")
            .unwrap();
        app.send_form(
            Method::PUT,
            &routes::main_image(plant_id),
            Form::new().part("file", part),
            Some(token),
        )
        .await
    }

    #[tokio::test]
    async fn main_image_is_set_and_replaced() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("gardener", "securepass").await;
        let plant_id = app.create_plant(&token, "Peace Lily", "Spathiphyllum wallisii").await;

        let res = put_main_image(&app, &token, plant_id, "lily.png", PNG_PIXEL).await;
        assert_eq!(res.status, 200, "{}", res.text);
        let first = res.body["main_image"].as_str().unwrap().to_string();
        assert!(first.starts_with("plants/main/"), "{first}");
        assert!(app.media_exists(&first));

        let mut other = PNG_PIXEL.to_vec();
        other.extend_from_slice(b"trailer");
        let res = put_main_image(&app, &token, plant_id, "lily2.png", &other).await;
        assert_eq!(res.status, 200, "{}", res.text);
        let second = res.body["main_image"].as_str().unwrap().to_string();
        assert_ne!(first, second);
        assert!(app.media_exists(&second));
        assert!(!app.media_exists(&first));
    }

    #[tokio::test]
    async fn deleting_the_plant_removes_its_main_image() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("gardener", "securepass").await;
        let plant_id = app.create_plant(&token, "Peace Lily", "Spathiphyllum wallisii").await;
        let res = put_main_image(&app, &token, plant_id, "lily.png", PNG_PIXEL).await;
        let path = res.body["main_image"].as_str().unwrap().to_string();

        let res = app.delete_with_token(&routes::plant(plant_id), &token).await;

        assert_eq!(res.status, 204);
        assert!(!app.media_exists(&path));
    }

    #[tokio::test]
    async fn unknown_plant_is_not_found() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("gardener", "securepass").await;

        let res = put_main_image(&app, &token, 404, "lily.png", PNG_PIXEL).await;

        assert_eq!(res.status, 404);
    }
}
