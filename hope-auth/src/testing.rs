use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use hope_shared::SessionIssuer;

use crate::config::AppConfig;
use crate::services::otp::{OtpCheck, OtpDispatch, OtpGateway, SmsNotifier};
use crate::services::phone::PhoneNumber;
use crate::services::verification::memory::MemoryVerificationStore;
use crate::store::memory::MemoryUserStore;
use crate::{router, AppState};

/// The only code [`FakeOtpGateway`] approves.
pub const VALID_CODE: &str = "123456";
pub const TEST_PASSWORD: &str = "s3cret-pass";
pub const TEST_SECRET: &str = "test-secret";

#[derive(Default)]
pub struct FakeOtpGateway {
    sent: Mutex<Vec<String>>,
    failure: Mutex<Option<String>>,
}

impl FakeOtpGateway {
    pub fn sent_to(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    pub fn fail_with(&self, message: &str) {
        *self.failure.lock().unwrap() = Some(message.to_string());
    }

    fn check_failure(&self) -> anyhow::Result<()> {
        match self.failure.lock().unwrap().as_ref() {
            Some(message) => Err(anyhow::anyhow!(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl OtpGateway for FakeOtpGateway {
    async fn request_code(&self, phone: &PhoneNumber) -> anyhow::Result<OtpDispatch> {
        self.check_failure()?;
        self.sent.lock().unwrap().push(phone.e164());
        Ok(OtpDispatch {
            status: "pending".into(),
        })
    }

    async fn check_code(&self, _phone: &PhoneNumber, code: &str) -> anyhow::Result<OtpCheck> {
        self.check_failure()?;
        let approved = code == VALID_CODE;
        Ok(OtpCheck {
            approved,
            status: if approved { "approved" } else { "pending" }.into(),
        })
    }
}

#[derive(Default)]
pub struct FakeSms {
    sent: Mutex<Vec<String>>,
    failing: Mutex<bool>,
}

impl FakeSms {
    pub fn sent_to(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    pub fn fail(&self) {
        *self.failing.lock().unwrap() = true;
    }
}

#[async_trait]
impl SmsNotifier for FakeSms {
    async fn send_sms(&self, phone: &PhoneNumber, _body: &str) -> anyhow::Result<()> {
        if *self.failing.lock().unwrap() {
            anyhow::bail!("SMS provider unavailable");
        }
        self.sent.lock().unwrap().push(phone.e164());
        Ok(())
    }
}

/// Router wired to in-memory stores and fake providers.
pub struct TestApp {
    pub state: AppState,
    pub users: Arc<MemoryUserStore>,
    pub otp: Arc<FakeOtpGateway>,
    pub verifications: Arc<MemoryVerificationStore>,
    pub sms: Option<Arc<FakeSms>>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::build(None)
    }

    pub fn with_sms() -> Self {
        Self::build(Some(Arc::new(FakeSms::default())))
    }

    fn build(sms: Option<Arc<FakeSms>>) -> Self {
        let config = config::Config::builder()
            .set_override("jwt_secret", TEST_SECRET)
            .and_then(|b| b.set_override("twilio_account_sid", "AC-test"))
            .and_then(|b| b.set_override("twilio_auth_token", "token"))
            .and_then(|b| b.set_override("twilio_verify_sid", "VA-test"))
            .and_then(|b| b.build())
            .unwrap();
        let config = AppConfig::from_config(config).unwrap();

        let users = Arc::new(MemoryUserStore::default());
        let otp = Arc::new(FakeOtpGateway::default());
        let verifications = Arc::new(MemoryVerificationStore::default());

        let state = AppState {
            sessions: SessionIssuer::new(TEST_SECRET, config.session_ttl_secs().unwrap()),
            config: Arc::new(config),
            users: users.clone(),
            otp: otp.clone(),
            verifications: verifications.clone(),
            sms: sms.clone().map(|s| s as Arc<dyn SmsNotifier>),
            redis: None,
            metrics: None,
        };

        Self {
            state,
            users,
            otp,
            verifications,
            sms,
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = router(self.state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes.to_vec())
    }

    fn json(bytes: &[u8]) -> Value {
        if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(bytes).unwrap()
        }
    }

    pub async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        self.post_raw(path, &body.to_string()).await
    }

    pub async fn post_raw(&self, path: &str, body: &str) -> (StatusCode, Value) {
        let request = Request::post(path)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let (status, bytes) = self.send(request).await;
        (status, Self::json(&bytes))
    }

    pub async fn get(&self, path: &str, bearer: Option<&str>) -> (StatusCode, Value) {
        let mut request = Request::get(path);
        if let Some(token) = bearer {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let (status, bytes) = self.send(request.body(Body::empty()).unwrap()).await;
        (status, Self::json(&bytes))
    }

    pub async fn get_raw(&self, path: &str) -> (StatusCode, String) {
        let request = Request::get(path).body(Body::empty()).unwrap();
        let (status, bytes) = self.send(request).await;
        (status, String::from_utf8(bytes).unwrap())
    }

    /// Runs verify-otp for a national number under country code 91.
    pub async fn verify(&self, national: &str) {
        let (status, body) = self
            .post(
                "/auth/verify-otp",
                json!({ "phoneNumber": national, "countryCode": "91", "otp": VALID_CODE }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "verify-otp failed: {body}");
    }

    pub async fn register(&self, national: &str, email: &str) -> Uuid {
        self.verify(national).await;
        let (status, body) = self
            .post(
                "/auth/register",
                json!({
                    "phoneNumber": national,
                    "name": "Asha",
                    "email": email,
                    "password": TEST_PASSWORD,
                    "otp": VALID_CODE,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
        body["user"]["userId"].as_str().unwrap().parse().unwrap()
    }
}
