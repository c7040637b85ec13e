//! HTTP client for the ordering backend's REST API

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::{ClientConfig, ClientError, ClientResult};
use shared::models::{AnalyticsSnapshot, AnalyticsWindow, FullMenu, GrowthMetrics, Testimonial};
use shared::order::{Order, OrderStatus};
use shared::util::now_millis;

/// Mounted at the root, unlike the /api-prefixed endpoints.
const TESTIMONIALS_PATH: &str = "/testimonials";

/// HTTP client for network requests to the ordering backend
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
}

#[derive(Debug, Deserialize)]
struct OrderListResponse {
    orders: Vec<Order>,
}

/// Fields for creating or updating a dish. The image travels separately
/// as a multipart upload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DishDraft {
    pub name: String,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub subcategory_id: String,
}

/// Fields for submitting a testimonial.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestimonialDraft {
    pub author: String,
    pub rating: u8,
    pub text: String,
}

impl HttpClient {
    /// Create a new HTTP client from configuration
    pub fn new(config: &ClientConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        }
    }

    /// Set the authentication token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Clear the authentication token
    pub fn clear_token(&mut self) {
        self.token = None;
    }

    /// Get the current token
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Build authorization header value
    fn auth_header(&self) -> Option<String> {
        self.token.as_ref().map(|t| format!("Bearer {}", t))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.auth_header() {
            Some(auth) => request.header(reqwest::header::AUTHORIZATION, auth),
            None => request,
        }
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let request = self.authorize(self.client.get(self.url(path)));
        let response = request.send().await?;
        Self::handle_response(response).await
    }

    /// Make a POST request with JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let request = self.authorize(self.client.post(self.url(path)).json(body));
        let response = request.send().await?;
        Self::handle_response(response).await
    }

    /// Make a PUT request with JSON body
    pub async fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let request = self.authorize(self.client.put(self.url(path)).json(body));
        let response = request.send().await?;
        Self::handle_response(response).await
    }

    /// Make a DELETE request
    pub async fn delete(&self, path: &str) -> ClientResult<()> {
        let request = self.authorize(self.client.delete(self.url(path)));
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Self::status_error(status, response.text().await?));
        }
        Ok(())
    }

    /// Handle the HTTP response
    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await?;
            return Err(Self::status_error(status, text));
        }

        response.json().await.map_err(Into::into)
    }

    fn status_error(status: StatusCode, text: String) -> ClientError {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ClientError::Unauthorized,
            StatusCode::NOT_FOUND => ClientError::NotFound(text),
            StatusCode::BAD_REQUEST => ClientError::Validation(text),
            _ => ClientError::Internal(text),
        }
    }

    // ========== Auth API ==========

    /// Login with admin credentials; returns the JWT token
    pub async fn login(&self, username: &str, password: &str) -> ClientResult<String> {
        let response: LoginResponse = self
            .post("/api/auth/login", &LoginRequest { username, password })
            .await?;
        Ok(response.token)
    }

    // ========== Menu API ==========

    /// Fetch the full nested menu
    pub async fn full_menu(&self) -> ClientResult<FullMenu> {
        self.get("/api/menu/full").await
    }

    /// Create a dish under a subcategory
    pub async fn create_dish(&self, draft: &DishDraft) -> ClientResult<shared::models::Dish> {
        self.post("/api/menu/dishes", draft).await
    }

    /// Update an existing dish
    pub async fn update_dish(
        &self,
        dish_id: &str,
        draft: &DishDraft,
    ) -> ClientResult<shared::models::Dish> {
        self.put(&format!("/api/menu/dishes/{dish_id}"), draft).await
    }

    /// Delete a dish
    pub async fn delete_dish(&self, dish_id: &str) -> ClientResult<()> {
        self.delete(&format!("/api/menu/dishes/{dish_id}")).await
    }

    /// Toggle a dish's availability without touching its other fields
    pub async fn set_dish_availability(
        &self,
        dish_id: &str,
        available: bool,
    ) -> ClientResult<shared::models::Dish> {
        #[derive(Serialize)]
        struct AvailabilityRequest {
            available: bool,
        }

        self.put(
            &format!("/api/menu/dishes/{dish_id}/availability"),
            &AvailabilityRequest { available },
        )
        .await
    }

    /// Upload a dish image as multipart form data
    pub async fn upload_dish_image(
        &self,
        dish_id: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> ClientResult<shared::models::Dish> {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str("application/octet-stream")
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part("image", part);

        let request = self.authorize(
            self.client
                .post(self.url(&format!("/api/menu/dishes/{dish_id}/image")))
                .multipart(form),
        );
        let response = request.send().await?;
        Self::handle_response(response).await
    }

    // ========== Orders API ==========

    /// List orders, optionally narrowed by status and capped by limit
    pub async fn list_orders(
        &self,
        status: Option<OrderStatus>,
        limit: Option<u32>,
    ) -> ClientResult<Vec<Order>> {
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(status) = status {
            params.push(("status", status.as_str().to_string()));
        }
        if let Some(limit) = limit {
            params.push(("limit", limit.to_string()));
        }

        let mut path = "/api/payments/orders".to_string();
        if !params.is_empty() {
            let query: Vec<String> = params.iter().map(|(k, v)| format!("{k}={v}")).collect();
            path = format!("{path}?{}", query.join("&"));
        }

        let response: OrderListResponse = self.get(&path).await?;
        Ok(response.orders)
    }

    /// Update an order's status; returns the updated order
    pub async fn update_order_status(
        &self,
        order_id: &str,
        status: OrderStatus,
    ) -> ClientResult<Order> {
        #[derive(Serialize)]
        struct StatusRequest {
            status: OrderStatus,
        }

        self.put(
            &format!("/api/payments/orders/{order_id}/status"),
            &StatusRequest { status },
        )
        .await
    }

    // ========== Analytics API ==========

    pub async fn analytics_today(&self) -> ClientResult<AnalyticsWindow> {
        self.get("/api/analytics/today").await
    }

    pub async fn analytics_week(&self) -> ClientResult<AnalyticsWindow> {
        self.get("/api/analytics/week").await
    }

    pub async fn analytics_month(&self) -> ClientResult<AnalyticsWindow> {
        self.get("/api/analytics/month").await
    }

    pub async fn analytics_growth(&self) -> ClientResult<GrowthMetrics> {
        self.get("/api/analytics/growth").await
    }

    /// Fetch all four analytics endpoints into one snapshot
    pub async fn analytics_snapshot(&self) -> ClientResult<AnalyticsSnapshot> {
        let fetched_at = now_millis();
        let (today, week, month, growth) = tokio::try_join!(
            self.analytics_today(),
            self.analytics_week(),
            self.analytics_month(),
            self.analytics_growth(),
        )?;
        Ok(AnalyticsSnapshot {
            today,
            week,
            month,
            growth,
            fetched_at,
        })
    }

    // ========== Testimonials API ==========
    // The backend mounts testimonial routes at the root, without the
    // /api prefix the other endpoints carry.

    pub async fn list_testimonials(&self) -> ClientResult<Vec<Testimonial>> {
        self.get(TESTIMONIALS_PATH).await
    }

    pub async fn create_testimonial(&self, draft: &TestimonialDraft) -> ClientResult<Testimonial> {
        self.post(TESTIMONIALS_PATH, draft).await
    }

    pub async fn approve_testimonial(&self, id: &str) -> ClientResult<Testimonial> {
        #[derive(Serialize)]
        struct ApproveRequest {
            approved: bool,
        }

        self.put(
            &format!("{TESTIMONIALS_PATH}/{id}"),
            &ApproveRequest { approved: true },
        )
        .await
    }

    pub async fn delete_testimonial(&self, id: &str) -> ClientResult<()> {
        self.delete(&format!("{TESTIMONIALS_PATH}/{id}")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_normalized() {
        let config = ClientConfig::new("http://localhost:8080/");
        let client = HttpClient::new(&config);
        assert_eq!(client.url("/api/menu/full"), "http://localhost:8080/api/menu/full");
    }

    #[test]
    fn login_body_uses_username_field() {
        let body = serde_json::to_value(LoginRequest {
            username: "admin",
            password: "hunter2",
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({"username": "admin", "password": "hunter2"})
        );
    }

    #[test]
    fn testimonial_routes_skip_the_api_prefix() {
        let config = ClientConfig::new("http://localhost:8080");
        let client = HttpClient::new(&config);
        assert_eq!(
            client.url(TESTIMONIALS_PATH),
            "http://localhost:8080/testimonials"
        );
        assert_eq!(
            client.url(&format!("{TESTIMONIALS_PATH}/t-1")),
            "http://localhost:8080/testimonials/t-1"
        );
    }

    #[test]
    fn token_round_trip() {
        let config = ClientConfig::new("http://localhost:8080");
        let mut client = HttpClient::new(&config).with_token("jwt-abc");
        assert_eq!(client.token(), Some("jwt-abc"));
        assert_eq!(client.auth_header().as_deref(), Some("Bearer jwt-abc"));
        client.clear_token();
        assert_eq!(client.token(), None);
    }
}
