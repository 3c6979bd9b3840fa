#![allow(dead_code)]

use serde_json::{json, Value};
use std::net::TcpListener;

use rideauth::configuration::{ApplicationSettings, JwtSettings};
use rideauth::startup::run;
use rideauth::store::Stores;

pub struct TestApp {
    pub address: String,
    pub stores: Stores,
    pub jwt: JwtSettings,
    pub client: reqwest::Client,
}

pub fn test_jwt_settings() -> JwtSettings {
    JwtSettings {
        user_secret: "test-rider-secret-key-at-least-32-chars".to_string(),
        captain_secret: "test-driver-secret-key-at-least-32-chars".to_string(),
        token_expiry: 604800,
        issuer: "rideauth-test".to_string(),
    }
}

pub async fn spawn_app() -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let stores = Stores::in_memory();
    let jwt = test_jwt_settings();
    let app_config = ApplicationSettings {
        host: "127.0.0.1".to_string(),
        port,
        secure_cookies: false,
    };

    let server = run(listener, stores.clone(), jwt.clone(), app_config)
        .expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address,
        stores,
        jwt,
        client: reqwest::Client::new(),
    }
}

pub fn rider_body(firstname: &str, email: &str, password: &str) -> Value {
    json!({
        "fullname": { "firstname": firstname },
        "email": email,
        "password": password
    })
}

pub fn captain_body(email: &str, password: &str) -> Value {
    json!({
        "fullname": { "firstname": "Raj", "lastname": "Kumar" },
        "email": email,
        "password": password,
        "vehicle": {
            "color": "black",
            "plate": "KA01AB1234",
            "capacity": 4,
            "vehicleType": "car"
        }
    })
}

impl TestApp {
    pub async fn post_json(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(&format!("{}{}", &self.address, path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get_with_bearer(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .get(&format!("{}{}", &self.address, path))
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_with_bearer(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .post(&format!("{}{}", &self.address, path))
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// Register a rider and return the issued token.
    pub async fn register_rider(&self, email: &str, password: &str) -> String {
        let response = self
            .post_json("/users/register", &rider_body("Ann", email, password))
            .await;
        assert_eq!(201, response.status().as_u16());
        let body: Value = response.json().await.expect("Failed to parse response");
        body["token"].as_str().expect("No token in response").to_string()
    }

    /// Register a captain and return the issued token.
    pub async fn register_captain(&self, email: &str, password: &str) -> String {
        let response = self
            .post_json("/captains/register", &captain_body(email, password))
            .await;
        assert_eq!(201, response.status().as_u16());
        let body: Value = response.json().await.expect("Failed to parse response");
        body["token"].as_str().expect("No token in response").to_string()
    }
}
