use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;

const VERIFY_BASE_URL: &str = "https://verify.twilio.com/v2";
const API_BASE_URL: &str = "https://api.twilio.com/2010-04-01";

#[derive(Debug, thiserror::Error)]
pub enum TwilioError {
    #[error("request to Twilio failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{message}")]
    Api {
        status: u16,
        code: Option<i64>,
        message: String,
    },

    #[error("no sender number configured")]
    NoSender,
}

/// Response of `POST /Services/{sid}/Verifications`.
#[derive(Debug, Clone, Deserialize)]
pub struct Verification {
    pub sid: String,
    pub status: String,
}

/// Response of `POST /Services/{sid}/VerificationCheck`. A wrong code is not
/// an HTTP error: the check comes back with `status: "pending"`.
#[derive(Debug, Clone, Deserialize)]
pub struct VerificationCheck {
    pub status: String,
    #[serde(default)]
    pub valid: bool,
}

impl VerificationCheck {
    pub fn is_approved(&self) -> bool {
        self.status == "approved"
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: Option<i64>,
    message: String,
}

#[derive(Clone)]
pub struct TwilioClient {
    client: Client,
    account_sid: String,
    auth_token: String,
    verify_service_sid: String,
    from_number: Option<String>,
}

impl TwilioClient {
    pub fn new(account_sid: &str, auth_token: &str, verify_service_sid: &str) -> Self {
        Self {
            client: Client::new(),
            account_sid: account_sid.to_string(),
            auth_token: auth_token.to_string(),
            verify_service_sid: verify_service_sid.to_string(),
            from_number: None,
        }
    }

    /// Number used as `From` for plain SMS messages.
    pub fn with_sender(mut self, from_number: &str) -> Self {
        self.from_number = Some(from_number.to_string());
        self
    }

    pub fn has_sender(&self) -> bool {
        self.from_number.is_some()
    }

    /// Send a verification code over SMS to an E.164 number.
    pub async fn start_verification(&self, to: &str) -> Result<Verification, TwilioError> {
        let url = format!("{VERIFY_BASE_URL}/Services/{}/Verifications", self.verify_service_sid);
        let verification: Verification = self
            .post_form(&url, &[("To", to), ("Channel", "sms")])
            .await?;

        tracing::debug!(sid = %verification.sid, status = %verification.status, "verification started");
        Ok(verification)
    }

    pub async fn check_verification(&self, to: &str, code: &str) -> Result<VerificationCheck, TwilioError> {
        let url = format!("{VERIFY_BASE_URL}/Services/{}/VerificationCheck", self.verify_service_sid);
        let check: VerificationCheck = self.post_form(&url, &[("To", to), ("Code", code)]).await?;

        tracing::debug!(status = %check.status, "verification checked");
        Ok(check)
    }

    pub async fn send_message(&self, to: &str, body: &str) -> Result<(), TwilioError> {
        let from = self.from_number.as_deref().ok_or(TwilioError::NoSender)?;
        let url = format!("{API_BASE_URL}/Accounts/{}/Messages.json", self.account_sid);
        let _: serde_json::Value = self
            .post_form(&url, &[("To", to), ("From", from), ("Body", body)])
            .await?;

        tracing::debug!(to = %masked(to), "sms sent");
        Ok(())
    }

    async fn post_form<T: DeserializeOwned>(&self, url: &str, form: &[(&str, &str)]) -> Result<T, TwilioError> {
        let response = self
            .client
            .post(url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(form)
            .send()
            .await?;

        let response = error_for_status(response).await?;
        Ok(response.json::<T>().await?)
    }
}

async fn error_for_status(response: Response) -> Result<Response, TwilioError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(parse_error(status.as_u16(), &body))
}

/// Recipient for logs: everything but the last four characters hidden.
fn masked(to: &str) -> String {
    let chars: Vec<char> = to.chars().collect();
    let keep = chars.len().min(4);
    let hidden = chars.len() - keep;
    let tail: String = chars[hidden..].iter().collect();
    format!("{}{tail}", "*".repeat(hidden))
}

fn parse_error(status: u16, body: &str) -> TwilioError {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(err) => TwilioError::Api {
            status,
            code: err.code,
            message: err.message,
        },
        Err(_) => TwilioError::Api {
            status,
            code: None,
            message: format!("Twilio returned HTTP {status}"),
        },
    }
}
