use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use ::common::storage::FilesystemMediaStore;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use sea_orm::DatabaseConnection;
use serde_json::{Value, json};
use tempfile::TempDir;

use nursery_server::config::{
    AppConfig, AuthConfig, CorsConfig, DatabaseConfig, MediaConfig, SeedConfig, ServerConfig,
};
use nursery_server::state::AppState;

pub mod routes {
    pub const REGISTER: &str = "/api/v1/auth/register";
    pub const LOGIN: &str = "/api/v1/auth/login";
    pub const ME: &str = "/api/v1/auth/me";
    pub const PLANTS: &str = "/api/v1/plants";
    pub const PLANTS_CSV: &str = "/api/v1/plants/upload_csv";
    pub const IMAGES: &str = "/api/v1/images";
    pub const INVENTORY: &str = "/api/v1/inventory";

    pub fn plant(id: i32) -> String {
        format!("/api/v1/plants/{id}")
    }

    pub fn use_as_template(plant_id: i32) -> String {
        format!("/api/v1/plants/{plant_id}/use_as_template")
    }

    pub fn plant_image(plant_id: i32, image_id: i32) -> String {
        format!("/api/v1/plants/{plant_id}/images/{image_id}")
    }

    pub fn main_image(plant_id: i32) -> String {
        format!("/api/v1/plants/{plant_id}/main_image")
    }

    pub fn image(id: i32) -> String {
        format!("/api/v1/images/{id}")
    }

    pub fn inventory(id: i32) -> String {
        format!("/api/v1/inventory/{id}")
    }
}

/// Smallest valid PNG: a 1x1 transparent pixel.
pub const PNG_PIXEL: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F, 0x15, 0xC4,
    0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00, 0x01, 0x00, 0x00,
    0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE,
    0x42, 0x60, 0x82,
];

pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub db: DatabaseConnection,
    pub media_root: PathBuf,
    // Dropped last; removes the database file and media directory.
    _dir: TempDir,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let db_url = format!("sqlite://{}?mode=rwc", dir.path().join("test.db").display());
        let media_root = dir.path().join("media");

        let app_config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors: CorsConfig {
                    allow_origins: vec![],
                    max_age: 3600,
                },
            },
            database: DatabaseConfig {
                url: db_url,
                max_connections: 5,
                min_connections: 1,
            },
            auth: AuthConfig {
                jwt_secret: "test-secret-for-integration-tests".to_string(),
                token_ttl_hours: 1,
            },
            media: MediaConfig {
                root: media_root.clone(),
                url_prefix: "/media".to_string(),
                max_upload_size: 1024 * 1024,
            },
            seed: SeedConfig::default(),
        };

        let db = nursery_server::database::init_db(&app_config.database)
            .await
            .expect("Failed to initialize test database");
        let media = FilesystemMediaStore::new(media_root.clone(), app_config.media.max_upload_size)
            .await
            .expect("Failed to initialize media store");

        let state = AppState {
            db: db.clone(),
            config: app_config,
            media: Arc::new(media),
        };

        let app = nursery_server::build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::new(),
            db,
            media_root,
            _dir: dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn post_with_token(&self, path: &str, body: &Value, token: &str) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn post_without_token(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    /// POST with no body at all.
    pub async fn post_empty(&self, path: &str, token: Option<&str>) -> TestResponse {
        let mut req = self.client.post(self.url(path));
        if let Some(token) = token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }
        let res = req.send().await.expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn get_with_token(&self, path: &str, token: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn get_without_token(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn patch_with_token(&self, path: &str, body: &Value, token: &str) -> TestResponse {
        let res = self
            .client
            .patch(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .json(body)
            .send()
            .await
            .expect("Failed to send PATCH request");

        TestResponse::from_response(res).await
    }

    pub async fn put_with_token(&self, path: &str, body: &Value, token: &str) -> TestResponse {
        let res = self
            .client
            .put(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .json(body)
            .send()
            .await
            .expect("Failed to send PUT request");

        TestResponse::from_response(res).await
    }

    /// PUT with no body, for link endpoints.
    pub async fn put_empty(&self, path: &str, token: &str) -> TestResponse {
        let res = self
            .client
            .put(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .expect("Failed to send PUT request");

        TestResponse::from_response(res).await
    }

    pub async fn delete_with_token(&self, path: &str, token: &str) -> TestResponse {
        let res = self
            .client
            .delete(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .expect("Failed to send DELETE request");

        TestResponse::from_response(res).await
    }

    pub async fn delete_without_token(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .delete(self.url(path))
            .send()
            .await
            .expect("Failed to send DELETE request");

        TestResponse::from_response(res).await
    }

    /// Send a multipart form with `method` (POST or PUT).
    pub async fn send_form(
        &self,
        method: reqwest::Method,
        path: &str,
        form: Form,
        token: Option<&str>,
    ) -> TestResponse {
        let mut req = self.client.request(method, self.url(path)).multipart(form);
        if let Some(token) = token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }
        let res = req
            .send()
            .await
            .expect("Failed to send multipart request");

        TestResponse::from_response(res).await
    }

    /// Upload a CSV file in the `file` field.
    pub async fn upload_csv(&self, csv: &str, token: Option<&str>) -> TestResponse {
        let part = Part::bytes(csv.as_bytes().to_vec())
            .file_name("plants.csv")
            .mime_str("text/csv")
            .expect("Failed to set MIME type");
        self.send_form(
            reqwest::Method::POST,
            routes::PLANTS_CSV,
            Form::new().part("file", part),
            token,
        )
        .await
    }

    /// Register a user and log in, returning the auth token.
    pub async fn create_authenticated_user(&self, username: &str, password: &str) -> String {
        let body = json!({
            "username": username,
            "password": password,
        });

        let reg = self.post_without_token(routes::REGISTER, &body).await;
        assert_eq!(reg.status, 201, "Registration failed: {}", reg.text);

        let res = self.post_without_token(routes::LOGIN, &body).await;
        assert_eq!(res.status, 200, "Login failed: {}", res.text);

        res.body["token"]
            .as_str()
            .expect("Login response should contain a token")
            .to_string()
    }

    /// Id of the user behind `token`.
    pub async fn user_id(&self, token: &str) -> i32 {
        let res = self.get_with_token(routes::ME, token).await;
        assert_eq!(res.status, 200, "me failed: {}", res.text);
        res.id()
    }

    /// Create a plant via the API and return its `id`.
    pub async fn create_plant(&self, token: &str, common_name: &str, scientific_name: &str) -> i32 {
        self.create_plant_with(token, plant_body(common_name, scientific_name))
            .await
    }

    /// Create a plant from a full JSON body and return its `id`.
    pub async fn create_plant_with(&self, token: &str, body: Value) -> i32 {
        let res = self.post_with_token(routes::PLANTS, &body, token).await;
        assert_eq!(res.status, 201, "create_plant failed: {}", res.text);
        res.id()
    }

    /// Create an inventory entry via the API and return its `id`.
    pub async fn create_inventory(&self, token: &str, plant_id: i32, size: &str) -> i32 {
        let res = self
            .post_with_token(
                routes::INVENTORY,
                &json!({
                    "plant_id": plant_id,
                    "quantity": 5,
                    "price": "12.50",
                    "size": size,
                }),
                token,
            )
            .await;
        assert_eq!(res.status, 201, "create_inventory failed: {}", res.text);
        res.id()
    }

    /// Upload a PNG to the image library, optionally linked to a plant.
    pub async fn upload_image(
        &self,
        token: &str,
        file_name: &str,
        bytes: &[u8],
        plant_id: Option<i32>,
    ) -> TestResponse {
        let part = Part::bytes(bytes.to_vec())
            .file_name(file_name.to_string())
            .mime_str("image/png")
            .expect("Failed to set MIME type");
        let mut form = Form::new().part("file", part).text("caption", "Leaves");
        if let Some(plant_id) = plant_id {
            form = form.text("plant_id", plant_id.to_string());
        }
        self.send_form(reqwest::Method::POST, routes::IMAGES, form, Some(token))
            .await
    }

    /// Whether a media path returned by the API exists on disk.
    pub fn media_exists(&self, relative: &str) -> bool {
        self.media_root.join(relative).is_file()
    }

    /// Number of stored files directly under a media folder.
    pub fn media_file_count(&self, folder: &str) -> usize {
        std::fs::read_dir(self.media_root.join(folder))
            .map(|entries| {
                entries
                    .filter_map(Result::ok)
                    .filter(|entry| entry.path().is_file())
                    .count()
            })
            .unwrap_or(0)
    }

    /// Run raw SQL against the test database.
    pub async fn execute_sql(&self, sql: &str) {
        use sea_orm::{ConnectionTrait, DbBackend, Statement};

        self.db
            .execute_raw(Statement::from_string(DbBackend::Sqlite, sql.to_string()))
            .await
            .expect("Failed to execute SQL");
    }
}

/// Minimal valid plant body. Everything else takes its default.
pub fn plant_body(common_name: &str, scientific_name: &str) -> Value {
    json!({
        "common_name": common_name,
        "scientific_name": scientific_name,
        "description": format!("{common_name} description"),
        "care_instructions": "Water weekly.",
        "light_requirement": "medium",
        "water_requirement": "medium",
    })
}

impl TestResponse {
    pub async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let text = res.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self { status, text, body }
    }

    pub fn id(&self) -> i32 {
        self.body["id"]
            .as_i64()
            .expect("response body should contain 'id'") as i32
    }

    /// Field names listed in a validation error body, in order.
    pub fn error_fields(&self) -> Vec<String> {
        self.body["errors"]
            .as_array()
            .map(|errors| {
                errors
                    .iter()
                    .filter_map(|e| e["field"].as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Message attached to `field` in a validation error body.
    pub fn error_message(&self, field: &str) -> Option<String> {
        self.body["errors"].as_array().and_then(|errors| {
            errors
                .iter()
                .find(|e| e["field"] == field)
                .and_then(|e| e["message"].as_str().map(str::to_string))
        })
    }
}
